//! Unrecoverable queue faults.
//!
//! An empty queue is never an error: pops and peeks report it through
//! `Option`/`bool`. A [`Fault`] is different. It means the caller broke a
//! precondition (or the allocator gave up) and the queue cannot continue, so
//! faults terminate through [`fatal`] instead of being returned.

/// A precondition violation or resource exhaustion inside the queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The wait-signal was requested a second time.
    #[error("queue: already initialized with a wait-signal")]
    AlreadyInitialized,

    /// `initialize` was called on a queue that already holds items.
    #[error("queue: initialize called on a non-empty queue (len {len})")]
    NotEmpty { len: usize },

    /// A blocking pop was attempted on a queue created without a wait-signal.
    #[error("queue: wait-signal is not enabled")]
    WaitSignalDisabled,

    /// Growing the ring to `capacity` slots failed.
    #[error("queue: failed to allocate {capacity} slots")]
    Allocation { capacity: usize },

    /// A byte record did not match the queue's fixed record size.
    #[error("queue: record is {actual} bytes, expected {expected}")]
    ItemSize { expected: usize, actual: usize },

    /// A byte queue was created with a zero record size.
    #[error("queue: item size must be greater than 0")]
    ZeroItemSize,
}

/// Reports `fault` and aborts the current operation by panicking.
///
/// Nothing has been mutated by the time this is called, so a caller that
/// catches the unwind still observes a consistent queue.
#[cold]
#[track_caller]
pub fn fatal(fault: Fault) -> ! {
    tracing::error!(%fault, "unrecoverable queue fault");
    panic!("{fault}")
}
