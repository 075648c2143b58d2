//! Locked FIFO job queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::config::QueueConfig;
use crate::error::{Fault, fatal};
use crate::ring::Ring;
use crate::scan::Direction;
use crate::semaphore::Semaphore;

/// A thread-safe growable FIFO queue.
///
/// `Queue<T>` hands work items from producers to consumers. Every operation
/// holds one exclusive lock for its full duration; nothing ever blocks waiting
/// for data except [`pop_wait`](Queue::pop_wait).
///
/// # Semantics
///
/// - **Push**: Never blocks on data, grows the ring when needed
/// - **Pop/Peek**: Return `None` immediately when empty
/// - **Wait-signal**: Optional, counts one permit per push
///
/// # Wait-signal contract
///
/// When the wait-signal is enabled every consumer must follow the same loop:
/// wait for one permit, pop exactly one item, repeat. [`pop_wait`](Queue::pop_wait)
/// does exactly that. Callers that wait on [`wait_signal`](Queue::wait_signal)
/// themselves and then pop twice, or pop without waiting, desynchronize the
/// permit count from the item count. The queue cannot detect this.
///
/// # Example
///
/// ```
/// use workq_queue::{Queue, QueueConfig};
/// use std::thread;
///
/// let queue = Queue::with_config(QueueConfig::new().wait_signal(true));
/// let producer_queue = queue.clone();
///
/// let producer = thread::spawn(move || {
///     for i in 0..10 {
///         producer_queue.push(i);
///     }
/// });
///
/// let items: Vec<i32> = (0..10).map(|_| queue.pop_wait()).collect();
/// producer.join().unwrap();
/// assert_eq!(items, (0..10).collect::<Vec<_>>());
/// ```
pub struct Queue<T> {
    inner: Arc<QueueInner<T>>,
}

struct QueueInner<T> {
    ring: Mutex<Ring<T>>,
    signal: Semaphore,
    // Only flipped while `ring` is locked.
    signal_enabled: AtomicBool,
    name: Option<String>,
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Queue {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    /// Creates an empty queue without a wait-signal.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates an empty queue from `config`.
    pub fn with_config(config: QueueConfig) -> Self {
        Queue {
            inner: Arc::new(QueueInner {
                ring: Mutex::new(Ring::new()),
                signal: Semaphore::new(0),
                signal_enabled: AtomicBool::new(config.wait_signal),
                name: config.name,
            }),
        }
    }

    /// Enables the wait-signal on a queue built with [`Queue::new`].
    ///
    /// Must run before the first push.
    ///
    /// # Panics
    ///
    /// Panics if the queue already holds items or already has a wait-signal.
    pub fn initialize(&self, use_wait_signal: bool) {
        if let Err(fault) = self.try_initialize(use_wait_signal) {
            fatal(fault);
        }
    }

    /// Like [`initialize`](Queue::initialize) but reports the fault instead of
    /// panicking.
    pub fn try_initialize(&self, use_wait_signal: bool) -> Result<(), Fault> {
        let ring = self.inner.ring.lock();
        if !ring.is_empty() {
            return Err(Fault::NotEmpty { len: ring.len() });
        }
        if self.inner.signal_enabled.load(Ordering::Acquire) {
            return Err(Fault::AlreadyInitialized);
        }
        if use_wait_signal {
            self.inner.signal_enabled.store(true, Ordering::Release);
        }
        tracing::debug!(queue = self.name(), use_wait_signal, "queue initialized");
        Ok(())
    }

    /// Returns the label from the queue's config, or `"queue"`.
    pub fn name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or("queue")
    }

    /// Adds `item` at the head of the queue.
    ///
    /// When the wait-signal is enabled one permit is added after the lock is
    /// released.
    pub fn push(&self, item: T) {
        let mut ring = self.inner.ring.lock();
        ring.push(item);
        let signal = self.inner.signal_enabled.load(Ordering::Relaxed);
        drop(ring);

        if signal {
            self.inner.signal.signal(1);
        }
    }

    /// Removes and returns the oldest item, or `None` if the queue is empty.
    pub fn pop_tail(&self) -> Option<T> {
        self.inner.ring.lock().pop_tail()
    }

    /// Removes the oldest item into `out`.
    ///
    /// Returns false and leaves `out` untouched when the queue is empty.
    pub fn pop_tail_into(&self, out: &mut T) -> bool {
        match self.pop_tail() {
            Some(item) => {
                *out = item;
                true
            }
            None => false,
        }
    }

    /// Blocks on the wait-signal, then pops exactly one item.
    ///
    /// # Panics
    ///
    /// Panics if the queue was created without a wait-signal.
    pub fn pop_wait(&self) -> T {
        if !self.inner.signal_enabled.load(Ordering::Acquire) {
            fatal(Fault::WaitSignalDisabled);
        }
        loop {
            self.inner.signal.wait();
            if let Some(item) = self.pop_tail() {
                return item;
            }
            // A permit without an item means some consumer broke the
            // wait-then-pop contract.
            tracing::warn!(queue = self.name(), "wait-signal permit without a queued item");
        }
    }

    /// Returns the number of queued items.
    ///
    /// The value may be stale as soon as it is returned.
    pub fn len(&self) -> usize {
        self.inner.ring.lock().len()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.inner.ring.lock().capacity()
    }

    /// Drops every queued item. Capacity is kept.
    ///
    /// Wait-signal permits are not adjusted.
    pub fn clear(&self) {
        self.inner.ring.lock().clear();
    }

    /// Visits queued items under the lock, allowing in-place mutation.
    ///
    /// [`Direction::Forward`] starts at the newest item, [`Direction::Backward`]
    /// at the oldest. Returning false from `f` ends the scan. `f` must not call
    /// back into this queue: the lock is held and is not reentrant.
    ///
    /// Returns the number of items visited.
    pub fn scan<F>(&self, direction: Direction, f: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner.ring.lock().scan(direction, f)
    }

    /// Locks the queue for a sequence of operations.
    ///
    /// Producers and consumers block until the guard is dropped.
    pub fn lock(&self) -> QueueGuard<'_, T> {
        QueueGuard {
            ring: self.inner.ring.lock(),
        }
    }

    /// Returns the wait-signal if it is enabled.
    ///
    /// Consumers waiting on it directly must pop exactly one item per permit.
    pub fn wait_signal(&self) -> Option<&Semaphore> {
        if self.inner.signal_enabled.load(Ordering::Acquire) {
            Some(&self.inner.signal)
        } else {
            None
        }
    }
}

impl<T: Clone> Queue<T> {
    /// Returns a copy of the oldest item without removing it.
    ///
    /// Acting on the result without holding [`lock`](Queue::lock) races with
    /// other consumers.
    pub fn peek_tail(&self) -> Option<T> {
        self.inner.ring.lock().peek_tail().cloned()
    }

    /// Copies the oldest item into `out` without removing it.
    ///
    /// Returns false and leaves `out` untouched when the queue is empty.
    pub fn peek_tail_into(&self, out: &mut T) -> bool {
        match self.peek_tail() {
            Some(item) => {
                *out = item;
                true
            }
            None => false,
        }
    }

    /// Returns a copy of all queued items, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        let ring = self.inner.ring.lock();
        ring.iter(Direction::Backward).cloned().collect()
    }
}

impl<T: Default> Queue<T> {
    /// Pops the oldest item, or returns `T::default()` when empty.
    ///
    /// Use [`pop_tail`](Queue::pop_tail) to tell "empty" apart from a queued
    /// default value.
    pub fn pop_tail_or_default(&self) -> T {
        self.pop_tail().unwrap_or_default()
    }
}

impl<T: Clone + Default> Queue<T> {
    /// Peeks the oldest item, or returns `T::default()` when empty.
    pub fn peek_tail_or_default(&self) -> T {
        self.peek_tail().unwrap_or_default()
    }
}

/// Exclusive access to a [`Queue`], released on drop.
///
/// Pops through the guard do not consume wait-signal permits, so they break
/// the wait-then-pop contract of signal-driven consumers. Pushing is only
/// available on the queue itself so every push is matched by one permit.
pub struct QueueGuard<'a, T> {
    ring: MutexGuard<'a, Ring<T>>,
}

impl<T> QueueGuard<'_, T> {
    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns the number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the oldest item without removing it.
    pub fn peek_tail(&self) -> Option<&T> {
        self.ring.peek_tail()
    }

    /// Removes and returns the oldest item.
    pub fn pop_tail(&mut self) -> Option<T> {
        self.ring.pop_tail()
    }

    /// Same as [`Queue::scan`] on the already-held lock.
    pub fn scan<F>(&mut self, direction: Direction, f: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        self.ring.scan(direction, f)
    }

    /// Iterates over queued items in `direction`.
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = &T> + '_ {
        self.ring.iter(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn push_then_pop(queue: &Queue<String>, items: &[&str]) {
        for item in items {
            queue.push(item.to_string());
        }
        for item in items {
            assert_eq!(queue.pop_tail().as_deref(), Some(*item));
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = Queue::new();
        for i in 0..100 {
            queue.push(i);
        }
        for i in 0..100 {
            assert_eq!(queue.pop_tail(), Some(i));
        }
        assert_eq!(queue.pop_tail(), None);
    }

    #[test]
    fn test_growth_while_head_behind_tail() {
        let queue = Queue::new();
        push_then_pop(&queue, &["a", "b", "c"]);
        push_then_pop(&queue, &["1", "2", "3", "4"]);
        push_then_pop(&queue, &["x", "y", "z"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_len_tracks_pushes_and_pops() {
        let queue = Queue::new();
        for i in 0..10 {
            queue.push(i);
        }
        for _ in 0..4 {
            queue.pop_tail();
        }
        assert_eq!(queue.len(), 6);

        for i in 0..3 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 9);
    }

    #[test]
    fn test_empty_pop_and_peek() {
        let queue = Queue::<i32>::new();
        assert_eq!(queue.pop_tail(), None);
        assert_eq!(queue.peek_tail(), None);

        let mut out = 99;
        assert!(!queue.pop_tail_into(&mut out));
        assert!(!queue.peek_tail_into(&mut out));
        assert_eq!(out, 99);
        assert_eq!(queue.capacity(), 0);
    }

    #[test]
    fn test_peek_never_advances() {
        let queue = Queue::new();
        queue.push(1);
        queue.push(2);

        let mut out = 0;
        assert!(queue.peek_tail_into(&mut out));
        assert_eq!(out, 1);
        assert_eq!(queue.peek_tail(), Some(1));
        assert_eq!(queue.len(), 2);

        assert!(queue.pop_tail_into(&mut out));
        assert_eq!(out, 1);
        assert_eq!(queue.peek_tail(), Some(2));
    }

    #[test]
    fn test_or_default_accessors() {
        let queue = Queue::<String>::new();
        assert_eq!(queue.pop_tail_or_default(), "");
        assert_eq!(queue.peek_tail_or_default(), "");

        queue.push("job".to_string());
        assert_eq!(queue.peek_tail_or_default(), "job");
        assert_eq!(queue.pop_tail_or_default(), "job");
        assert_eq!(queue.pop_tail_or_default(), "");
    }

    #[test]
    fn test_scan_forward_early_exit() {
        let queue = Queue::new();
        for i in 1..=4 {
            queue.push(i);
        }

        let mut visited = Vec::new();
        queue.scan(Direction::Forward, |item| {
            visited.push(*item);
            *item != 3
        });
        assert_eq!(visited, vec![4, 3]);
    }

    #[test]
    fn test_scan_backward_early_exit() {
        let queue = Queue::new();
        for i in 1..=4 {
            queue.push(i);
        }

        let mut visited = Vec::new();
        let n = queue.scan(Direction::Backward, |item| {
            visited.push(*item);
            *item != 3
        });
        assert_eq!(visited, vec![1, 2, 3]);
        assert_eq!(n, 3);
    }

    #[test]
    fn test_scan_mutates_in_place() {
        let queue = Queue::new();
        for i in 1..=3 {
            queue.push(i);
        }
        queue.scan(Direction::Forward, |item| {
            *item += 100;
            true
        });
        assert_eq!(queue.to_vec(), vec![101, 102, 103]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let queue = Queue::new();
        for i in 0..5 {
            queue.push(i);
        }
        let capacity = queue.capacity();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), capacity);
    }

    #[test]
    fn test_guard_peek_then_pop() {
        let queue = Queue::new();
        queue.push(1);
        queue.push(2);

        {
            let mut guard = queue.lock();
            assert_eq!(guard.len(), 2);
            if guard.peek_tail() == Some(&1) {
                assert_eq!(guard.pop_tail(), Some(1));
            }
            let rest: Vec<_> = guard.iter(Direction::Backward).copied().collect();
            assert_eq!(rest, vec![2]);
        }

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_initialize_enables_wait_signal() {
        let queue = Queue::<i32>::new();
        assert!(queue.wait_signal().is_none());

        queue.initialize(true);
        assert!(queue.wait_signal().is_some());

        queue.push(5);
        assert_eq!(queue.wait_signal().map(Semaphore::count), Some(1));
        assert_eq!(queue.pop_wait(), 5);
        assert_eq!(queue.wait_signal().map(Semaphore::count), Some(0));
    }

    #[test]
    fn test_initialize_without_signal() {
        let queue = Queue::<i32>::new();
        queue.initialize(false);
        queue.push(1);
        assert!(queue.wait_signal().is_none());
    }

    #[test]
    fn test_try_initialize_faults() {
        let queue = Queue::new();
        queue.push(1);
        assert_eq!(queue.try_initialize(true), Err(Fault::NotEmpty { len: 1 }));

        let queue = Queue::<i32>::with_config(QueueConfig::new().wait_signal(true));
        assert_eq!(queue.try_initialize(true), Err(Fault::AlreadyInitialized));
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn test_initialize_twice_panics() {
        let queue = Queue::<i32>::new();
        queue.initialize(true);
        queue.initialize(true);
    }

    #[test]
    #[should_panic(expected = "wait-signal is not enabled")]
    fn test_pop_wait_without_signal_panics() {
        let queue = Queue::<i32>::new();
        queue.push(1);
        queue.pop_wait();
    }

    #[test]
    fn test_signal_counts_pushes() {
        let queue = Queue::with_config(QueueConfig::new().wait_signal(true));
        for i in 0..5 {
            queue.push(i);
        }
        assert_eq!(queue.wait_signal().map(Semaphore::count), Some(5));
    }

    #[test]
    fn test_pop_wait_blocks_until_push() {
        let queue = Queue::with_config(QueueConfig::new().wait_signal(true).name("jobs"));
        let consumer_queue = queue.clone();

        let consumer = thread::spawn(move || consumer_queue.pop_wait());

        // Give the consumer time to block
        thread::sleep(Duration::from_millis(10));
        queue.push(42);

        assert_eq!(consumer.join().unwrap(), 42);
        assert_eq!(queue.name(), "jobs");
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        let queue = Queue::with_config(QueueConfig::new().wait_signal(true));
        let producer_queue = queue.clone();

        let producer = thread::spawn(move || {
            for i in 0..1000u32 {
                producer_queue.push(i);
            }
        });

        let collected: Vec<u32> = (0..1000).map(|_| queue.pop_wait()).collect();
        producer.join().unwrap();

        assert_eq!(collected, (0..1000).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_is_send_sync_clone() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Queue<i32>>();
        assert_send_sync::<Queue<String>>();
    }
}
