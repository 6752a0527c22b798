//! Arena-backed linked nodes
//!
//! Node = (key, value) payload + left/right/parent slots.
//! Links are slot indices, so moving a node around a tree is a relink of
//! a few integers and a [`NodeId`] keeps naming the same entry.
//!
//! Freed slots are recycled; each reuse bumps the slot generation so an old
//! handle to the slot is rejected instead of aliasing the new occupant.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

use super::Direction;
use crate::{Result, StructureError};

static NEXT_ARENA_TAG: AtomicU32 = AtomicU32::new(1);

/// Stable handle to a node in a [`LinkArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    arena: u32,
    slot: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index inside the owning arena
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}@{}", self.slot, self.generation, self.arena)
    }
}

/// Linked node: payload plus parent/child references
#[derive(Debug, Clone)]
pub struct LinkNode<K, V> {
    key: K,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

impl<K, V> LinkNode<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
            parent: None,
        }
    }

    /// Node key
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Node value
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Mutable node value
    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Replace the value, returning the previous one
    pub fn set_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }

    /// Left child
    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child
    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Child in the given slot
    #[inline]
    pub fn child(&self, side: Direction) -> Option<NodeId> {
        match side {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Parent node, `None` for a root candidate
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// No children
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// No parent and no children
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.parent.is_none() && self.is_leaf()
    }

    fn child_slot(&mut self, side: Direction) -> &mut Option<NodeId> {
        match side {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}

impl<K: fmt::Display, V> fmt::Display for LinkNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.key)
    }
}

#[derive(Debug)]
struct Slot<K, V> {
    generation: u32,
    node: Option<LinkNode<K, V>>,
}

/// Owner of a set of linked nodes
#[derive(Debug)]
pub struct LinkArena<K, V> {
    tag: u32,
    slots: Vec<Slot<K, V>>,
    free: Vec<u32>,
    live: usize,
}

impl<K, V> LinkArena<K, V> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            tag: NEXT_ARENA_TAG.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of allocated nodes (linked or not)
    pub fn len(&self) -> usize {
        self.live
    }

    /// No allocated nodes
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocate an unlinked node
    pub fn alloc(&mut self, key: K, value: V) -> NodeId {
        let node = LinkNode::new(key, value);
        self.live += 1;

        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.node = Some(node);
            return NodeId {
                arena: self.tag,
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            arena: self.tag,
            slot,
            generation: 0,
        }
    }

    /// Release an unlinked node and hand back its payload
    pub fn free(&mut self, id: NodeId) -> Result<(K, V)> {
        let node = self
            .get(id)
            .ok_or_else(|| StructureError::not_found(format!("node {id} is not live")))?;
        if !node.is_unlinked() {
            return Err(StructureError::invalid(format!(
                "node {id} is still linked and cannot be freed"
            )));
        }

        let entry = &mut self.slots[id.slot()];
        let node = match entry.node.take() {
            Some(node) => node,
            None => return Err(StructureError::not_found(format!("node {id} is not live"))),
        };
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
        Ok((node.key, node.value))
    }

    /// Drop every node; outstanding handles become stale
    pub fn clear(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.node.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
        self.live = 0;
    }

    /// Whether `id` names a live node of this arena
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Node behind `id`, if live
    pub fn get(&self, id: NodeId) -> Option<&LinkNode<K, V>> {
        if id.arena != self.tag {
            return None;
        }
        self.slots
            .get(id.slot())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_ref())
    }

    /// Mutable node behind `id`, if live
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut LinkNode<K, V>> {
        if id.arena != self.tag {
            return None;
        }
        self.slots
            .get_mut(id.slot())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_mut())
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(StructureError::TypeMismatch(format!(
                "{id} is not a live node of this arena"
            )))
        }
    }

    /// Set the left child of `parent`
    pub fn set_left(&mut self, parent: NodeId, child: Option<NodeId>) -> Result<()> {
        self.set_child(parent, Direction::Left, child)
    }

    /// Set the right child of `parent`
    pub fn set_right(&mut self, parent: NodeId, child: Option<NodeId>) -> Result<()> {
        self.set_child(parent, Direction::Right, child)
    }

    /// Set a child slot, keeping parent references reciprocal
    ///
    /// The previous occupant of the slot loses its parent. The new child is
    /// detached from whatever slot held it before, so it never has two parents.
    pub fn set_child(
        &mut self,
        parent: NodeId,
        side: Direction,
        child: Option<NodeId>,
    ) -> Result<()> {
        self.check(parent)?;
        if let Some(child) = child {
            self.check(child)?;
            if self.is_ancestor_or_self(child, parent) {
                return Err(StructureError::invalid(format!(
                    "linking {child} under {parent} would create a cycle"
                )));
            }
        }

        let old = self[parent].child(side);
        if old == child {
            return Ok(());
        }
        if let Some(old) = old {
            self[old].parent = None;
        }
        if let Some(child) = child {
            if let Some(previous) = self[child].parent {
                let prev = &mut self[previous];
                if prev.left == Some(child) {
                    prev.left = None;
                } else if prev.right == Some(child) {
                    prev.right = None;
                }
            }
            self[child].parent = Some(parent);
        }
        *self[parent].child_slot(side) = child;
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self[id].parent;
        }
        false
    }

    /// Which slot of `parent` holds `child`, if any
    pub fn side_of(&self, parent: NodeId, child: NodeId) -> Option<Direction> {
        let node = self.get(parent)?;
        if node.left == Some(child) {
            Some(Direction::Left)
        } else if node.right == Some(child) {
            Some(Direction::Right)
        } else {
            None
        }
    }

    /// Detach a childless direct child of `parent`
    pub fn remove_leaf(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.check(parent)?;
        self.check(child)?;

        let side = self.side_of(parent, child).ok_or_else(|| {
            StructureError::invalid(format!("{child} is not a child of {parent}"))
        })?;
        if !self[child].is_leaf() {
            return Err(StructureError::invalid(format!("{child} is not a leaf")));
        }

        *self[parent].child_slot(side) = None;
        self[child].parent = None;
        Ok(child)
    }

    /// Number of nodes on the path from `id` to its root (root = 1)
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        self.check(id)?;
        let mut depth = 1;
        let mut cursor = self[id].parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self[parent].parent;
        }
        Ok(depth)
    }

    /// Exchange key/value payloads of two nodes, leaving links untouched
    pub fn swap_payload(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        self.check(a)?;
        self.check(b)?;
        if a == b {
            return Ok(());
        }

        let (lo, hi) = if a.slot < b.slot { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.slot());
        match (head[lo.slot()].node.as_mut(), tail[0].node.as_mut()) {
            (Some(x), Some(y)) => {
                std::mem::swap(&mut x.key, &mut y.key);
                std::mem::swap(&mut x.value, &mut y.value);
                Ok(())
            }
            _ => Err(StructureError::TypeMismatch(format!(
                "{a} or {b} is not a live node"
            ))),
        }
    }
}

impl<K, V> Index<NodeId> for LinkArena<K, V> {
    type Output = LinkNode<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.get(id)
            .unwrap_or_else(|| panic!("{id} is not a live node of this arena"))
    }
}

impl<K, V> IndexMut<NodeId> for LinkArena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("{id} is not a live node of this arena"))
    }
}
