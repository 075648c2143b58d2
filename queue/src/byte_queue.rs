//! Fixed-size byte record queue.
//!
//! [`ByteQueue`] carries opaque records of one fixed length. It is a thin
//! layer over [`Queue`]: each record is stored as a [`BytesMut`] of exactly
//! `item_size` bytes, so ordering, growth and the wait-signal behave the same
//! as for typed queues.
//!
//! The stride is enforced on every push, pop and peek, but records are not
//! packed into one contiguous byte buffer: each slot holds its own
//! allocation. That costs one allocation per push in exchange for sharing the
//! ring engine with [`Queue`].

use bytes::{Bytes, BytesMut};

use crate::config::QueueConfig;
use crate::error::{Fault, fatal};
use crate::queue::Queue;
use crate::scan::Direction;
use crate::semaphore::Semaphore;

/// A thread-safe FIFO queue of fixed-size byte records.
///
/// # Example
///
/// ```
/// use workq_queue::ByteQueue;
///
/// let queue = ByteQueue::new(4);
/// queue.push(&7u32.to_le_bytes());
///
/// let mut out = [0u8; 4];
/// assert!(queue.pop_tail(&mut out));
/// assert_eq!(u32::from_le_bytes(out), 7);
/// ```
#[derive(Clone)]
pub struct ByteQueue {
    queue: Queue<BytesMut>,
    item_size: usize,
}

impl ByteQueue {
    /// Creates a queue of `item_size`-byte records without a wait-signal.
    ///
    /// # Panics
    ///
    /// Panics if `item_size` is 0.
    pub fn new(item_size: usize) -> Self {
        Self::with_config(item_size, QueueConfig::default())
    }

    /// Creates a queue of `item_size`-byte records from `config`.
    ///
    /// # Panics
    ///
    /// Panics if `item_size` is 0.
    pub fn with_config(item_size: usize, config: QueueConfig) -> Self {
        if item_size == 0 {
            fatal(Fault::ZeroItemSize);
        }
        ByteQueue {
            queue: Queue::with_config(config),
            item_size,
        }
    }

    /// Returns the fixed record length in bytes.
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// See [`Queue::initialize`].
    pub fn initialize(&self, use_wait_signal: bool) {
        self.queue.initialize(use_wait_signal);
    }

    /// Copies `item` into the queue.
    ///
    /// # Panics
    ///
    /// Panics if `item.len()` differs from the record size.
    pub fn push(&self, item: &[u8]) {
        self.check_len(item.len());
        self.queue.push(BytesMut::from(item));
    }

    /// Pops the oldest record into `out`.
    ///
    /// Returns false and leaves `out` untouched when the queue is empty.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the record size.
    pub fn pop_tail(&self, out: &mut [u8]) -> bool {
        self.check_len(out.len());
        match self.queue.pop_tail() {
            Some(record) => {
                out.copy_from_slice(&record);
                true
            }
            None => false,
        }
    }

    /// Copies the oldest record into `out` without removing it.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the record size.
    pub fn peek_tail(&self, out: &mut [u8]) -> bool {
        self.check_len(out.len());
        let guard = self.queue.lock();
        match guard.peek_tail() {
            Some(record) => {
                out.copy_from_slice(record);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the oldest record.
    pub fn pop_record(&self) -> Option<Bytes> {
        self.queue.pop_tail().map(BytesMut::freeze)
    }

    /// Blocks on the wait-signal, then pops exactly one record.
    ///
    /// # Panics
    ///
    /// Panics if the queue was created without a wait-signal.
    pub fn pop_wait(&self) -> Bytes {
        self.queue.pop_wait().freeze()
    }

    /// Visits records under the lock, allowing their bytes to be rewritten.
    ///
    /// Returns the number of records visited.
    pub fn scan<F>(&self, direction: Direction, mut f: F) -> usize
    where
        F: FnMut(&mut [u8]) -> bool,
    {
        self.queue.scan(direction, |record| f(&mut record[..]))
    }

    /// Returns the number of queued records.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// See [`Queue::wait_signal`].
    pub fn wait_signal(&self) -> Option<&Semaphore> {
        self.queue.wait_signal()
    }

    fn check_len(&self, actual: usize) {
        if actual != self.item_size {
            fatal(Fault::ItemSize {
                expected: self.item_size,
                actual,
            });
        }
    }
}
