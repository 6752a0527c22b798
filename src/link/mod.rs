//! Linked node primitive
//!
//! Nodes live in an arena and refer to each other by [`NodeId`].
//! Every child slot has a matching parent back-reference, and the
//! arena keeps the two in step on every relink.

mod arena;

pub use arena::{LinkArena, LinkNode, NodeId};

/// Which child slot of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left child slot
    Left,

    /// Right child slot
    Right,
}

impl Direction {
    /// The other slot
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}
