//! Linked min-heap with handle-based deletion
//!
//! The heap is a complete binary tree of arena nodes, not an array.
//! Sifting relinks whole nodes instead of copying payloads, so the
//! [`NodeId`] returned by `insert` follows its entry wherever it moves
//! and can later delete it in O(log n).

mod path;

pub use path::HeapPath;

use std::collections::VecDeque;

use crate::link::{Direction, LinkArena, NodeId};
use crate::{Result, StructureError};

/// Min-heap over linked nodes
#[derive(Debug)]
pub struct IndexedMinHeap<K, V> {
    arena: LinkArena<K, V>,
    root: Option<NodeId>,
    len: usize,
}

impl<K, V> IndexedMinHeap<K, V> {
    /// Create an empty heap
    pub fn new() -> Self {
        Self {
            arena: LinkArena::new(),
            root: None,
            len: 0,
        }
    }

    /// Number of entries in the heap
    pub fn len(&self) -> usize {
        self.len
    }

    /// No entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Root handle (minimum entry)
    pub fn peek_handle(&self) -> Option<NodeId> {
        self.root
    }

    /// Minimum entry
    pub fn peek(&self) -> Option<(&K, &V)> {
        self.root.and_then(|root| self.get(root))
    }

    /// Entry behind a handle, whether in the heap or detached
    pub fn get(&self, handle: NodeId) -> Option<(&K, &V)> {
        self.arena
            .get(handle)
            .map(|node| (node.key(), node.value()))
    }

    /// Whether `handle` is currently an entry of this heap
    pub fn contains(&self, handle: NodeId) -> bool {
        match self.arena.get(handle) {
            Some(node) => node.parent().is_some() || self.root == Some(handle),
            None => false,
        }
    }

    /// Underlying node storage
    pub fn arena(&self) -> &LinkArena<K, V> {
        &self.arena
    }

    /// Drop all entries; outstanding handles become stale
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    /// Node at a level-order position (root = 1)
    fn node_at(&self, position: usize) -> Result<NodeId> {
        if position == 0 || position > self.len {
            return Err(StructureError::not_found(format!(
                "position {position} out of bounds for heap of {}",
                self.len
            )));
        }
        let mut cursor = self
            .root
            .ok_or_else(|| StructureError::not_found("heap is empty"))?;
        if let Some(path) = HeapPath::to_position(position) {
            for direction in path {
                cursor = self.arena[cursor].child(direction).ok_or_else(|| {
                    StructureError::invalid(format!("no node on the path to position {position}"))
                })?;
            }
        }
        Ok(cursor)
    }

    /// Free a detached node and return its payload
    pub fn release(&mut self, handle: NodeId) -> Result<(K, V)> {
        if self.contains(handle) {
            return Err(StructureError::invalid(format!(
                "{handle} is still in the heap"
            )));
        }
        self.arena.free(handle)
    }

    /// Swap `x` with its parent by relinking, so that `x` takes the parent's
    /// place and the parent takes `x`'s.
    fn swap_with_parent(&mut self, x: NodeId) -> Result<()> {
        let p = self.arena[x]
            .parent()
            .ok_or_else(|| StructureError::invalid(format!("{x} has no parent")))?;
        let grandparent = self.arena[p].parent();
        let side_in_grandparent = match grandparent {
            Some(g) => Some(self.arena.side_of(g, p).ok_or_else(|| {
                StructureError::invalid(format!("{p} is not a child of its parent {g}"))
            })?),
            None => None,
        };

        let (pl, pr) = (self.arena[p].left(), self.arena[p].right());
        self.arena.set_left(p, None)?;
        self.arena.set_right(p, None)?;

        match (grandparent, side_in_grandparent) {
            (Some(g), Some(side)) => self.arena.set_child(g, side, Some(x))?,
            _ => self.root = Some(x),
        }

        let (xl, xr) = (self.arena[x].left(), self.arena[x].right());
        self.arena.set_left(x, None)?;
        self.arena.set_right(x, None)?;

        if pl == Some(x) {
            self.arena.set_left(x, Some(p))?;
            self.arena.set_right(x, pr)?;
        } else {
            self.arena.set_left(x, pl)?;
            self.arena.set_right(x, Some(p))?;
        }

        self.arena.set_left(p, xl)?;
        self.arena.set_right(p, xr)?;
        Ok(())
    }

    /// Put `leaf` in `node`'s structural position; `node` ends up unlinked
    fn replace_with_leaf(&mut self, node: NodeId, leaf: NodeId) -> Result<()> {
        if !self.arena[leaf].is_leaf() {
            return Err(StructureError::invalid(format!("{leaf} is not a leaf")));
        }
        let leaf_parent = self.arena[leaf]
            .parent()
            .ok_or_else(|| StructureError::invalid(format!("{leaf} has no parent")))?;

        self.arena.remove_leaf(leaf_parent, leaf)?;

        let (nl, nr) = (self.arena[node].left(), self.arena[node].right());
        self.arena.set_left(node, None)?;
        self.arena.set_right(node, None)?;
        self.arena.set_left(leaf, nl)?;
        self.arena.set_right(leaf, nr)?;

        match self.arena[node].parent() {
            None => self.root = Some(leaf),
            Some(parent) => {
                let side = self.arena.side_of(parent, node).ok_or_else(|| {
                    StructureError::invalid(format!("{node} is not a child of its parent"))
                })?;
                self.arena.set_child(parent, side, Some(leaf))?;
            }
        }
        Ok(())
    }
}

impl<K: PartialOrd, V> IndexedMinHeap<K, V> {
    /// Insert an entry, returning its handle
    pub fn insert(&mut self, key: K, value: V) -> Result<NodeId> {
        let node = self.arena.alloc(key, value);
        self.insert_node(node)?;
        Ok(node)
    }

    /// Re-insert a detached node owned by this heap
    pub fn insert_node(&mut self, node: NodeId) -> Result<NodeId> {
        let linked = self
            .arena
            .get(node)
            .ok_or_else(|| StructureError::not_found(format!("{node} does not belong to this heap")))?;
        if !linked.is_unlinked() || self.root == Some(node) {
            return Err(StructureError::invalid(format!(
                "{node} is already linked into the heap"
            )));
        }

        if self.root.is_none() {
            self.root = Some(node);
            self.len = 1;
            return Ok(node);
        }

        let position = self.len + 1;
        let parent = self.node_at(position / 2)?;
        self.arena
            .set_child(parent, HeapPath::side(position), Some(node))?;
        self.len += 1;

        self.sift_up(node)?;
        Ok(node)
    }

    /// Detach the minimum entry; the node stays allocated
    pub fn extract_node(&mut self) -> Result<NodeId> {
        let root = self
            .root
            .ok_or_else(|| StructureError::not_found("cannot extract from an empty heap"))?;

        if self.len == 1 {
            self.root = None;
            self.len = 0;
            return Ok(root);
        }

        let last = self.node_at(self.len)?;
        self.replace_with_leaf(root, last)?;
        self.len -= 1;
        self.sift_down(last)?;
        Ok(root)
    }

    /// Remove and return the minimum entry
    pub fn extract(&mut self) -> Result<(K, V)> {
        let node = self.extract_node()?;
        self.arena.free(node)
    }

    /// Detach an arbitrary entry; the node stays allocated
    pub fn delete_node(&mut self, handle: NodeId) -> Result<NodeId> {
        if self.root.is_none() {
            return Err(StructureError::not_found("cannot delete from an empty heap"));
        }
        if !self.contains(handle) {
            return Err(StructureError::not_found(format!(
                "{handle} is not in the heap"
            )));
        }

        if self.len == 1 {
            self.root = None;
            self.len = 0;
            return Ok(handle);
        }

        let last = self.node_at(self.len)?;
        if handle == last {
            let parent = self.arena[last]
                .parent()
                .ok_or_else(|| StructureError::invalid(format!("{last} has no parent")))?;
            self.arena.remove_leaf(parent, last)?;
            self.len -= 1;
            return Ok(handle);
        }

        self.replace_with_leaf(handle, last)?;
        self.len -= 1;

        let smaller_than_parent = match self.arena[last].parent() {
            Some(parent) => self.arena[last].key() < self.arena[parent].key(),
            None => false,
        };
        if smaller_than_parent {
            self.sift_up(last)?;
        } else {
            self.sift_down(last)?;
        }
        Ok(handle)
    }

    /// Remove an arbitrary entry and return it
    pub fn delete(&mut self, handle: NodeId) -> Result<(K, V)> {
        let node = self.delete_node(handle)?;
        self.arena.free(node)
    }

    fn sift_up(&mut self, node: NodeId) -> Result<()> {
        while let Some(parent) = self.arena[node].parent() {
            if self.arena[node].key() < self.arena[parent].key() {
                self.swap_with_parent(node)?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn sift_down(&mut self, node: NodeId) -> Result<()> {
        loop {
            let mut smallest = node;
            for direction in [Direction::Left, Direction::Right] {
                if let Some(child) = self.arena[node].child(direction) {
                    if self.arena[child].key() < self.arena[smallest].key() {
                        smallest = child;
                    }
                }
            }
            if smallest == node {
                return Ok(());
            }
            self.swap_with_parent(smallest)?;
        }
    }

    /// Check heap order, complete shape, link reciprocity and size
    ///
    /// Level-order walk: a complete tree never has a node after a gap.
    pub fn verify(&self) -> Result<()> {
        let Some(root) = self.root else {
            return if self.len == 0 {
                Ok(())
            } else {
                Err(StructureError::invalid(format!(
                    "empty heap reports {} entries",
                    self.len
                )))
            };
        };
        if self.arena[root].parent().is_some() {
            return Err(StructureError::invalid("root has a parent"));
        }

        let mut queue = VecDeque::from([root]);
        let mut seen_gap = false;
        let mut count = 0;

        while let Some(node) = queue.pop_front() {
            count += 1;
            for direction in [Direction::Left, Direction::Right] {
                match self.arena[node].child(direction) {
                    Some(child) => {
                        if seen_gap {
                            return Err(StructureError::invalid(format!(
                                "{child} follows a gap; shape is not complete"
                            )));
                        }
                        if self.arena[child].parent() != Some(node) {
                            return Err(StructureError::invalid(format!(
                                "{child} does not point back to its parent {node}"
                            )));
                        }
                        if self.arena[child].key() < self.arena[node].key() {
                            return Err(StructureError::invalid(format!(
                                "{child} is smaller than its parent {node}"
                            )));
                        }
                        queue.push_back(child);
                    }
                    None => seen_gap = true,
                }
            }
        }

        if count != self.len {
            return Err(StructureError::invalid(format!(
                "found {count} nodes but heap reports {}",
                self.len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(heap: &mut IndexedMinHeap<i32, ()>) -> Vec<i32> {
        let mut out = Vec::new();
        while let Ok((key, _)) = heap.extract() {
            heap.verify().unwrap();
            out.push(key);
        }
        out
    }

    #[test]
    fn test_extract_in_order() {
        let mut heap = IndexedMinHeap::new();
        for key in [5, 3, 8, 1] {
            heap.insert(key, ()).unwrap();
            heap.verify().unwrap();
        }
        assert_eq!(heap.len(), 4);
        assert_eq!(drain(&mut heap), vec![1, 3, 5, 8]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_empty_heap_errors() {
        let mut heap: IndexedMinHeap<i32, ()> = IndexedMinHeap::new();
        assert!(matches!(heap.extract(), Err(StructureError::NotFound(_))));

        let handle = heap.insert(1, ()).unwrap();
        heap.delete(handle).unwrap();
        assert!(matches!(
            heap.delete_node(handle),
            Err(StructureError::NotFound(_))
        ));
    }

    #[test]
    fn test_handles_survive_sifting() {
        let mut heap = IndexedMinHeap::new();
        let handles: Vec<_> = (0..20)
            .rev()
            .map(|key| (key, heap.insert(key, key * 10).unwrap()))
            .collect();

        for (key, handle) in &handles {
            assert_eq!(heap.get(*handle), Some((key, &(key * 10))));
        }
        assert_eq!(heap.peek(), Some((&0, &0)));
    }

    #[test]
    fn test_delete_interior_node() {
        let mut heap = IndexedMinHeap::new();
        let handles: Vec<_> = [1, 2, 3, 4, 5, 6, 7]
            .into_iter()
            .map(|key| heap.insert(key, ()).unwrap())
            .collect();

        // Key 2 sits at position 2, an interior node
        assert_eq!(heap.delete(handles[1]).unwrap(), (2, ()));
        assert_eq!(heap.len(), 6);
        heap.verify().unwrap();
        assert_eq!(drain(&mut heap), vec![1, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_delete_requiring_sift_up() {
        let mut heap = IndexedMinHeap::new();
        let handles: Vec<_> = [1, 10, 2, 11, 12, 3, 4]
            .into_iter()
            .map(|key| heap.insert(key, ()).unwrap())
            .collect();

        // Last node (4) replaces 11 under 10, then must climb above 10
        heap.delete(handles[3]).unwrap();
        heap.verify().unwrap();
        assert_eq!(drain(&mut heap), vec![1, 2, 3, 4, 10, 12]);
    }

    #[test]
    fn test_delete_last_and_root() {
        let mut heap = IndexedMinHeap::new();
        let a = heap.insert(1, ()).unwrap();
        let _b = heap.insert(2, ()).unwrap();
        let c = heap.insert(3, ()).unwrap();

        heap.delete(c).unwrap();
        heap.verify().unwrap();
        heap.delete(a).unwrap();
        heap.verify().unwrap();
        assert_eq!(heap.peek(), Some((&2, &())));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a = IndexedMinHeap::new();
        let mut b = IndexedMinHeap::new();
        let ha = a.insert(1, ()).unwrap();
        b.insert(1, ()).unwrap();

        assert!(matches!(b.delete_node(ha), Err(StructureError::NotFound(_))));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut heap = IndexedMinHeap::new();
        let old: Vec<_> = [3, 1, 2].into_iter().map(|k| heap.insert(k, k).unwrap()).collect();

        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.peek(), None);
        heap.verify().unwrap();

        // Slots are recycled but the old handles stay dead
        let fresh = heap.insert(7, 7).unwrap();
        assert!(old.iter().any(|h| h.slot() == fresh.slot()));
        for handle in &old {
            assert!(!heap.contains(*handle));
            assert_eq!(heap.get(*handle), None);
            assert!(matches!(heap.delete(*handle), Err(StructureError::NotFound(_))));
        }
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.extract().unwrap(), (7, 7));
    }

    #[test]
    fn test_detached_node_reinsert() {
        let mut heap = IndexedMinHeap::new();
        for key in [4, 2, 6] {
            heap.insert(key, ()).unwrap();
        }
        let min = heap.extract_node().unwrap();
        assert!(!heap.contains(min));
        assert_eq!(heap.get(min), Some((&2, &())));

        assert!(matches!(
            heap.insert_node(heap.peek_handle().unwrap()),
            Err(StructureError::InvalidOperation(_))
        ));

        heap.insert_node(min).unwrap();
        heap.verify().unwrap();
        assert_eq!(heap.peek_handle(), Some(min));

        let detached = heap.delete_node(min).unwrap();
        assert_eq!(heap.release(detached).unwrap(), (2, ()));
        assert_eq!(heap.arena().len(), 2);
    }
}
