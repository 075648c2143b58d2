//! Counting wait-signal.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A blocking counting semaphore.
///
/// [`Queue`](crate::Queue) signals it once per push when the wait-signal is
/// enabled. Consumers that wait on it directly must pop exactly one item per
/// successful wait; see [`Queue::wait_signal`](crate::Queue::wait_signal).
#[derive(Debug, Default)]
pub struct Semaphore {
    count: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with `initial` permits.
    pub fn new(initial: usize) -> Self {
        Semaphore {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Adds `n` permits and wakes up to `n` waiters.
    pub fn signal(&self, n: usize) {
        if n == 0 {
            return;
        }
        let mut count = self.count.lock();
        *count += n;
        drop(count);
        if n == 1 {
            self.available.notify_one();
        } else {
            self.available.notify_all();
        }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Takes a permit if one is available without blocking.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Blocks for at most `timeout` waiting for a permit.
    ///
    /// Returns true if a permit was taken. A timeout too large to represent
    /// as a deadline waits without one.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut count = self.count.lock();
        while *count == 0 {
            if self.available.wait_until(&mut count, deadline).timed_out() {
                break;
            }
        }
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Returns the current number of permits.
    pub fn count(&self) -> usize {
        *self.count.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_try_wait_counts_down() {
        let sem = Semaphore::new(2);
        assert!(sem.try_wait());
        assert!(sem.try_wait());
        assert!(!sem.try_wait());
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_signal_zero_is_noop() {
        let sem = Semaphore::default();
        sem.signal(0);
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_wait_timeout_expires() {
        let sem = Semaphore::new(0);
        let start = Instant::now();
        assert!(!sem.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_timeout_unbounded_takes_permit() {
        let sem = Semaphore::new(1);
        assert!(sem.wait_timeout(Duration::MAX));
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_wait_timeout_unbounded_released_by_signal() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter_sem = Arc::clone(&sem);

        let waiter = thread::spawn(move || waiter_sem.wait_timeout(Duration::MAX));

        thread::sleep(Duration::from_millis(10));
        sem.signal(1);

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_blocking_wait_released_by_signal() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter_sem = Arc::clone(&sem);

        let waiter = thread::spawn(move || {
            waiter_sem.wait();
            true
        });

        // Give the waiter time to block
        thread::sleep(Duration::from_millis(10));
        sem.signal(1);

        assert!(waiter.join().unwrap());
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_signal_many_wakes_all() {
        let sem = Arc::new(Semaphore::new(0));
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let sem = Arc::clone(&sem);
                thread::spawn(move || sem.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        sem.signal(4);

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
        assert_eq!(sem.count(), 0);
    }
}
