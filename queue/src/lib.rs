//! Thread-safe growable FIFO job queue.
//!
//! This crate provides a ring-buffer queue for handing work items between
//! producer and consumer threads. It offers two queue types over one engine:
//!
//! - [`Queue<T>`]: A typed queue with value semantics
//! - [`ByteQueue`]: A queue of fixed-size opaque byte records
//!
//! # Ring Storage
//!
//! Items live in a [`Ring<T>`] whose capacity is always a power of two. The
//! ring never fills its last slot, so `head == tail` unambiguously means
//! empty. When a push would fill it, the capacity doubles and the wrapped
//! contents are relinearized in order. Capacity never shrinks.
//!
//! ```
//! use workq_queue::Queue;
//!
//! let queue = Queue::new();
//! queue.push("a");
//! queue.push("b");
//!
//! assert_eq!(queue.pop_tail(), Some("a"));
//! assert_eq!(queue.peek_tail(), Some("b"));
//! assert_eq!(queue.len(), 1);
//! ```
//!
//! # Wait-signal
//!
//! A queue can carry a counting [`Semaphore`] that gains one permit per push.
//! Consumers block in [`Queue::pop_wait`], which waits for one permit and pops
//! exactly one item:
//!
//! ```
//! use workq_queue::{Queue, QueueConfig};
//!
//! let queue = Queue::with_config(QueueConfig::new().wait_signal(true));
//! queue.push(1);
//! assert_eq!(queue.pop_wait(), 1);
//! ```
//!
//! # Scanning
//!
//! [`Queue::scan`] walks the queued items under the lock in either
//! [`Direction`], can rewrite them in place, and stops when the callback
//! returns false:
//!
//! ```
//! use workq_queue::{Direction, Queue};
//!
//! let queue = Queue::new();
//! for i in 1..=4 {
//!     queue.push(i);
//! }
//!
//! let mut seen = Vec::new();
//! queue.scan(Direction::Forward, |item| {
//!     seen.push(*item);
//!     *item != 3
//! });
//! assert_eq!(seen, vec![4, 3]);
//! ```
//!
//! # Faults
//!
//! An empty queue is reported through `Option`/`bool`. Misuse such as
//! initializing twice, blocking without a wait-signal or pushing a byte
//! record of the wrong size is a [`Fault`] and panics.
//!
//! # Thread Safety
//!
//! Queue types are `Send + Sync` and share their storage through `Clone`.

mod byte_queue;
mod config;
mod error;
mod queue;
mod ring;
mod scan;
mod semaphore;

pub use byte_queue::ByteQueue;
pub use config::QueueConfig;
pub use error::{Fault, fatal};
pub use queue::{Queue, QueueGuard};
pub use ring::Ring;
pub use scan::Direction;
pub use semaphore::Semaphore;
