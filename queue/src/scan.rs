//! Directional traversal over the live slots of a ring.

/// Order in which [`scan`](crate::Queue::scan) visits queued items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Newest to oldest: starts at the most recently pushed item.
    #[default]
    Forward,
    /// Oldest to newest: starts at the item the next pop would return.
    Backward,
}

/// Slot indices of the occupied region of a ring, in scan order.
///
/// Indices are produced with mask arithmetic, so the walk wraps across the
/// end of the storage the same way head and tail do.
#[derive(Debug, Clone)]
pub(crate) struct Positions {
    next: usize,
    remaining: usize,
    mask: usize,
    direction: Direction,
}

impl Positions {
    /// `capacity` must be 0 or a power of two and `len` must fit in it.
    pub(crate) fn new(tail: usize, len: usize, capacity: usize, direction: Direction) -> Self {
        let mask = capacity.wrapping_sub(1);
        let next = match direction {
            Direction::Forward => tail.wrapping_add(len).wrapping_sub(1) & mask,
            Direction::Backward => tail,
        };
        Positions {
            next,
            remaining: len,
            mask,
            direction,
        }
    }
}

impl Iterator for Positions {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.next;
        self.next = match self.direction {
            Direction::Forward => idx.wrapping_sub(1) & self.mask,
            Direction::Backward => idx.wrapping_add(1) & self.mask,
        };
        self.remaining -= 1;
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Positions {}
