//! AVL tree over linked nodes
//!
//! Same contract as the plain BST; after every insert or delete the path
//! back to the root is rebalanced so that sibling subtree heights differ
//! by at most one. Depth: O(log n).

use super::{place, remove, OrderedKeyTree, Placement};
use crate::link::{Direction, LinkArena, NodeId};
use crate::{Result, StructureError};

/// Height-balanced binary search tree
#[derive(Debug)]
pub struct AvlTree<K, V> {
    arena: LinkArena<K, V>,
    root: Option<NodeId>,

    /// Subtree height per arena slot (leaf = 1)
    heights: Vec<i32>,
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            arena: LinkArena::new(),
            root: None,
            heights: Vec::new(),
        }
    }

    /// Height of the whole tree (empty = 0)
    pub fn height(&self) -> usize {
        self.height_of(self.root) as usize
    }

    fn height_of(&self, node: Option<NodeId>) -> i32 {
        node.map_or(0, |id| self.heights[id.slot()])
    }

    fn update_height(&mut self, node: NodeId) {
        let left = self.height_of(self.arena[node].left());
        let right = self.height_of(self.arena[node].right());
        self.heights[node.slot()] = 1 + left.max(right);
    }

    fn balance_factor(&self, node: NodeId) -> i32 {
        self.height_of(self.arena[node].left()) - self.height_of(self.arena[node].right())
    }

    /// Rotate `node` down toward `toward`; its opposite child takes its place
    fn rotate(&mut self, node: NodeId, toward: Direction) -> Result<NodeId> {
        let pivot = self.arena[node].child(toward.opposite()).ok_or_else(|| {
            StructureError::invalid(format!("cannot rotate {node}: missing pivot child"))
        })?;
        let inner = self.arena[pivot].child(toward);
        let parent = self.arena[node].parent();
        let side = match parent {
            Some(p) => self.arena.side_of(p, node),
            None => None,
        };

        self.arena.set_child(node, toward.opposite(), inner)?;
        self.arena.set_child(pivot, toward, Some(node))?;
        match (parent, side) {
            (Some(p), Some(side)) => self.arena.set_child(p, side, Some(pivot))?,
            _ => self.root = Some(pivot),
        }

        self.update_height(node);
        self.update_height(pivot);
        Ok(pivot)
    }

    /// Restore balance at `node`, returning the node now at its position
    fn rebalance(&mut self, node: NodeId) -> Result<NodeId> {
        self.update_height(node);
        let balance = self.balance_factor(node);

        if balance > 1 {
            if let Some(left) = self.arena[node].left() {
                if self.balance_factor(left) < 0 {
                    self.rotate(left, Direction::Left)?;
                }
            }
            return self.rotate(node, Direction::Right);
        }
        if balance < -1 {
            if let Some(right) = self.arena[node].right() {
                if self.balance_factor(right) > 0 {
                    self.rotate(right, Direction::Right)?;
                }
            }
            return self.rotate(node, Direction::Left);
        }
        Ok(node)
    }

    fn rebalance_from(&mut self, start: Option<NodeId>) -> Result<()> {
        let mut cursor = start;
        while let Some(node) = cursor {
            let top = self.rebalance(node)?;
            cursor = self.arena[top].parent();
        }
        Ok(())
    }

    /// Check BST order plus stored heights and balance at every node
    pub fn verify_balance(&self) -> Result<()> {
        self.verify()?;

        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(node) = stack.pop() {
            let left = self.arena[node].left();
            let right = self.arena[node].right();
            let expected = 1 + self.height_of(left).max(self.height_of(right));
            if self.heights[node.slot()] != expected {
                return Err(StructureError::invalid(format!(
                    "stale height at {node}"
                )));
            }
            if self.balance_factor(node).abs() > 1 {
                return Err(StructureError::invalid(format!("{node} is unbalanced")));
            }
            stack.extend(left);
            stack.extend(right);
        }
        Ok(())
    }
}

impl<K: Ord, V> OrderedKeyTree<K, V> for AvlTree<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<()> {
        let Placement::Created(node) = place(&mut self.arena, &mut self.root, key, value)? else {
            return Ok(());
        };

        if self.heights.len() <= node.slot() {
            self.heights.resize(node.slot() + 1, 0);
        }
        self.heights[node.slot()] = 1;

        let parent = self.arena[node].parent();
        self.rebalance_from(parent)
    }

    fn delete(&mut self, key: &K) -> Result<V> {
        let (value, parent) = remove(&mut self.arena, &mut self.root, key)?;
        self.rebalance_from(parent)?;
        Ok(value)
    }

    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn arena(&self) -> &LinkArena<K, V> {
        &self.arena
    }
}
