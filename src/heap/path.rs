//! Array-free position addressing
//!
//! Positions in a complete binary tree are numbered 1.. in level order.
//! Binary form of a position = route from the root:
//! leading 1 = start at root, then 0 = go left, 1 = go right.
//!
//!   6 = 0b110 → root, right, left

use crate::link::Direction;

/// Route from the root to a level-order position
///
/// Yields one [`Direction`] per level, O(log n) steps total.
#[derive(Debug, Clone, Copy)]
pub struct HeapPath {
    /// Target position (1-based)
    position: usize,

    /// Moves still to emit
    remaining: u32,
}

impl HeapPath {
    /// Route to `position`; `None` for position 0
    pub fn to_position(position: usize) -> Option<Self> {
        if position == 0 {
            return None;
        }
        let bit_len = usize::BITS - position.leading_zeros();
        Some(Self {
            position,
            remaining: bit_len - 1,
        })
    }

    /// Number of moves from the root (root = 0)
    #[inline]
    pub fn depth(&self) -> usize {
        self.remaining as usize
    }

    /// Level-order position of the parent (root has none)
    #[inline]
    pub fn parent_position(position: usize) -> Option<usize> {
        (position > 1).then_some(position / 2)
    }

    /// Which slot of its parent the position occupies
    #[inline]
    pub fn side(position: usize) -> Direction {
        if position % 2 == 0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

impl Iterator for HeapPath {
    type Item = Direction;

    fn next(&mut self) -> Option<Direction> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(if (self.position >> self.remaining) & 1 == 0 {
            Direction::Left
        } else {
            Direction::Right
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for HeapPath {}
