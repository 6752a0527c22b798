//! Unbalanced binary search tree

use super::{place, remove, OrderedKeyTree};
use crate::link::{LinkArena, NodeId};
use crate::Result;

/// Plain binary search tree; depth follows insertion order
#[derive(Debug)]
pub struct BinarySearchTree<K, V> {
    arena: LinkArena<K, V>,
    root: Option<NodeId>,
}

impl<K: Ord, V> BinarySearchTree<K, V> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            arena: LinkArena::new(),
            root: None,
        }
    }
}

impl<K: Ord, V> OrderedKeyTree<K, V> for BinarySearchTree<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<()> {
        place(&mut self.arena, &mut self.root, key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &K) -> Result<V> {
        let (value, _) = remove(&mut self.arena, &mut self.root, key)?;
        Ok(value)
    }

    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn arena(&self) -> &LinkArena<K, V> {
        &self.arena
    }
}
