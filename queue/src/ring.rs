//! Growable power-of-two ring storage.

use crate::error::{Fault, fatal};
use crate::scan::{Direction, Positions};

/// Capacity of the first allocation.
const MIN_CAPACITY: usize = 2;

/// Unsynchronized FIFO ring buffer that grows on demand.
///
/// `Ring<T>` is the engine behind [`Queue`](crate::Queue). It owns its slots
/// exclusively and performs no locking of its own.
///
/// # Layout
///
/// - `capacity` is 0 until the first push, then always a power of two.
/// - `head` is the next slot to write, `tail` the next slot to read.
/// - At most `capacity - 1` slots are ever occupied, so `head == tail`
///   always means empty.
///
/// Growth doubles the capacity and relinearizes the live items so that the
/// oldest one lands at index 0. Capacity never shrinks.
#[derive(Debug)]
pub struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
}

impl<T> Default for Ring<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Ring<T> {
    /// Creates an empty ring without allocating.
    pub fn new() -> Self {
        Ring {
            slots: Vec::new(),
            head: 0,
            tail: 0,
        }
    }

    /// Returns the number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of live items.
    pub fn len(&self) -> usize {
        if self.slots.is_empty() {
            return 0;
        }
        self.head.wrapping_sub(self.tail) & self.mask()
    }

    /// Returns true if the ring holds no items.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Appends `item` at the head, growing first if the ring would fill up.
    pub fn push(&mut self, item: T) {
        if self.len() + 1 >= self.capacity() {
            self.grow();
        }
        self.slots[self.head] = Some(item);
        self.head = (self.head + 1) & self.mask();
    }

    /// Removes and returns the oldest item.
    pub fn pop_tail(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.tail].take();
        self.tail = (self.tail + 1) & self.mask();
        item
    }

    /// Returns the oldest item without removing it.
    pub fn peek_tail(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.tail].as_ref()
    }

    /// Drops every live item. Capacity is kept.
    pub fn clear(&mut self) {
        while self.pop_tail().is_some() {}
    }

    /// Visits live items in `direction`, stopping when `f` returns false.
    ///
    /// Returns the number of items visited, including the one that stopped
    /// the scan.
    pub fn scan<F>(&mut self, direction: Direction, mut f: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut visited = 0;
        for idx in Positions::new(self.tail, self.len(), self.capacity(), direction) {
            let item = self.slots[idx]
                .as_mut()
                .expect("occupied ring slot is vacant");
            visited += 1;
            if !f(item) {
                break;
            }
        }
        visited
    }

    /// Iterates over live items in `direction` without removing them.
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = &T> + '_ {
        Positions::new(self.tail, self.len(), self.capacity(), direction)
            .map(move |idx| {
                self.slots[idx]
                    .as_ref()
                    .expect("occupied ring slot is vacant")
            })
    }

    fn mask(&self) -> usize {
        self.slots.len().wrapping_sub(1)
    }

    fn grow(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = match old_capacity.checked_mul(2) {
            Some(n) => n.max(MIN_CAPACITY),
            None => fatal(Fault::Allocation {
                capacity: usize::MAX,
            }),
        };

        let mut slots: Vec<Option<T>> = Vec::new();
        if slots.try_reserve_exact(new_capacity).is_err() {
            fatal(Fault::Allocation {
                capacity: new_capacity,
            });
        }

        // Oldest item goes to index 0; a wrapped region becomes one run.
        let len = self.len();
        let mask = self.mask();
        for i in 0..len {
            slots.push(self.slots[(self.tail + i) & mask].take());
        }
        slots.resize_with(new_capacity, || None);

        self.slots = slots;
        self.tail = 0;
        self.head = len;

        tracing::debug!(old_capacity, new_capacity, len, "ring grown");
    }
}
