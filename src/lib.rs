//! # Linked heaps, ordered trees and sliding-window statistics
//!
//! This library keeps rolling min/max/average statistics over a trailing time
//! window of price observations.
//!
//! ## Building blocks
//!
//! 1. **Link arena**: parent/child linked nodes addressed by stable [`NodeId`] handles
//! 2. **Indexed min-heap**: complete binary tree of linked nodes with O(log n)
//!    deletion of any entry through the handle returned at insertion
//! 3. **Ordered trees**: unbalanced BST and AVL tree behind one trait, with a
//!    generic pruned [`range_query`]
//! 4. **Sliding window**: one AVL tree keyed by timestamp plus a min-heap and a
//!    negated max-heap per series
//!
//! ## Usage Example
//!
//! ```
//! use chrono::{TimeZone, Utc, TimeDelta};
//! use tickwindow::{SlidingWindow, WindowConfig};
//!
//! let config = WindowConfig::new(TimeDelta::days(10)).unwrap();
//! let mut window = SlidingWindow::new(config);
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//!
//! window.add(t0, 10.0).unwrap();
//! let snapshot = window.add(t0 + TimeDelta::days(1), 20.0).unwrap();
//! assert_eq!(snapshot.min, 10.0);
//! assert_eq!(snapshot.max, 20.0);
//! assert_eq!(snapshot.average, 15.0);
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod link;   // Arena of parent/child linked nodes
pub mod heap;   // Linked min-heap with handle deletion
pub mod tree;   // Ordered key trees and range queries
pub mod window; // Sliding-window price statistics
pub mod market; // Per-series window tracking

// Re-exports for convenience
pub use heap::IndexedMinHeap;
pub use link::{Direction, LinkArena, LinkNode, NodeId};
pub use market::MarketTracker;
pub use tree::{range_query, AvlTree, BinarySearchTree, OrderedKeyTree};
pub use window::{SlidingWindow, WindowConfig, WindowSnapshot};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the linked structures and the window aggregator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// Absent key, empty heap, unknown series or a handle the structure does not own
    #[error("not found: {0}")]
    NotFound(String),

    /// Structural precondition violated
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A handle that is not a live node of the arena was used as a link
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Observation price is NaN or infinite
    #[error("invalid observation: price {price} is not finite")]
    InvalidObservation {
        /// Rejected price
        price: f64,
    },

    /// Observation is older than the most recent one
    #[error("observation at {time} is older than latest {latest}")]
    OutOfOrder {
        /// Timestamp of the rejected observation
        time: DateTime<Utc>,
        /// Most recent accepted timestamp
        latest: DateTime<Utc>,
    },

    /// Configuration invalid (e.g., zero window duration)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl StructureError {
    /// Helper for constructing not-found errors.
    pub fn not_found(msg: impl Into<String>) -> Self {
        StructureError::NotFound(msg.into())
    }

    /// Helper for constructing invalid-operation errors.
    pub fn invalid(msg: impl Into<String>) -> Self {
        StructureError::InvalidOperation(msg.into())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, StructureError>;
