//! Ordered key trees
//!
//! One contract ([`OrderedKeyTree`]), two implementations:
//! - [`BinarySearchTree`]: plain, unbalanced
//! - [`AvlTree`]: height-balanced, depth O(log n)
//!
//! [`range_query`] is written once against the trait.

mod avl;
mod bst;
mod range;

pub use avl::AvlTree;
pub use bst::BinarySearchTree;
pub use range::range_query;

use std::cmp::Ordering;

use crate::link::{Direction, LinkArena, NodeId};
use crate::{Result, StructureError};

/// Capability contract shared by the ordered trees
///
/// Keys are unique; left subtree keys < node key < right subtree keys.
pub trait OrderedKeyTree<K: Ord, V> {
    /// Insert a pair, or update the value in place if the key exists
    fn insert(&mut self, key: K, value: V) -> Result<()>;

    /// Remove a key and return its value
    fn delete(&mut self, key: &K) -> Result<V>;

    /// Root node, `None` when empty
    fn root(&self) -> Option<NodeId>;

    /// Node storage, for traversal
    fn arena(&self) -> &LinkArena<K, V>;

    /// Node holding `key`
    fn search(&self, key: &K) -> Result<NodeId> {
        find(self.arena(), self.root(), key)
            .ok_or_else(|| StructureError::not_found("key not in tree"))
    }

    /// Value stored under `key`
    fn get_value<'a>(&'a self, key: &K) -> Result<&'a V>
    where
        K: 'a,
    {
        let node = self.search(key)?;
        Ok(self.arena()[node].value())
    }

    /// Whether `key` is stored
    fn contains_key(&self, key: &K) -> bool {
        find(self.arena(), self.root(), key).is_some()
    }

    /// Number of stored keys
    fn len(&self) -> usize {
        self.arena().len()
    }

    /// No stored keys
    fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    /// Check BST order, parent links and size
    fn verify(&self) -> Result<()> {
        verify_order(self.arena(), self.root())
    }
}

fn find<K: Ord, V>(arena: &LinkArena<K, V>, root: Option<NodeId>, key: &K) -> Option<NodeId> {
    let mut cursor = root;
    while let Some(id) = cursor {
        let node = &arena[id];
        cursor = match key.cmp(node.key()) {
            Ordering::Less => node.left(),
            Ordering::Greater => node.right(),
            Ordering::Equal => return Some(id),
        };
    }
    None
}

fn minimum<K, V>(arena: &LinkArena<K, V>, mut node: NodeId) -> NodeId {
    while let Some(left) = arena[node].left() {
        node = left;
    }
    node
}

/// Outcome of the shared insertion descent
enum Placement {
    /// Key existed; value replaced
    Updated,
    /// New node linked in
    Created(NodeId),
}

/// Walk down from the root and either update in place or link a new leaf
fn place<K: Ord, V>(
    arena: &mut LinkArena<K, V>,
    root: &mut Option<NodeId>,
    key: K,
    value: V,
) -> Result<Placement> {
    let Some(mut cursor) = *root else {
        let node = arena.alloc(key, value);
        *root = Some(node);
        return Ok(Placement::Created(node));
    };

    loop {
        let side = match key.cmp(arena[cursor].key()) {
            Ordering::Less => Direction::Left,
            Ordering::Greater => Direction::Right,
            Ordering::Equal => {
                arena[cursor].set_value(value);
                return Ok(Placement::Updated);
            }
        };
        match arena[cursor].child(side) {
            Some(next) => cursor = next,
            None => {
                let node = arena.alloc(key, value);
                arena.set_child(cursor, side, Some(node))?;
                return Ok(Placement::Created(node));
            }
        }
    }
}

/// Unlink the node holding `key` and free it
///
/// A node with two children trades payloads with its in-order successor,
/// and the successor's position is the one spliced out. Returns the value
/// and the parent of the spliced position, where rebalancing would start.
fn remove<K: Ord, V>(
    arena: &mut LinkArena<K, V>,
    root: &mut Option<NodeId>,
    key: &K,
) -> Result<(V, Option<NodeId>)> {
    if root.is_none() {
        return Err(StructureError::not_found("cannot delete from an empty tree"));
    }
    let target = find(arena, *root, key)
        .ok_or_else(|| StructureError::not_found("key not in tree"))?;

    let target = match (arena[target].left(), arena[target].right()) {
        (Some(_), Some(right)) => {
            let successor = minimum(arena, right);
            arena.swap_payload(target, successor)?;
            successor
        }
        _ => target,
    };

    let child = arena[target].left().or(arena[target].right());
    let parent = arena[target].parent();

    if let Some(child) = child {
        if let Some(side) = arena.side_of(target, child) {
            arena.set_child(target, side, None)?;
        }
    }
    match parent {
        None => *root = child,
        Some(parent) => {
            let side = arena.side_of(parent, target).ok_or_else(|| {
                StructureError::invalid(format!("{target} is not a child of its parent"))
            })?;
            arena.set_child(parent, side, child)?;
        }
    }

    let (_, value) = arena.free(target)?;
    Ok((value, parent))
}

fn verify_order<K: Ord, V>(arena: &LinkArena<K, V>, root: Option<NodeId>) -> Result<()> {
    if let Some(root) = root {
        if arena[root].parent().is_some() {
            return Err(StructureError::invalid("root has a parent"));
        }
    }

    let mut stack = Vec::new();
    let mut cursor = root;
    let mut previous: Option<NodeId> = None;
    let mut count = 0;

    loop {
        while let Some(id) = cursor {
            for child in [arena[id].left(), arena[id].right()].into_iter().flatten() {
                if arena[child].parent() != Some(id) {
                    return Err(StructureError::invalid(format!(
                        "{child} does not point back to its parent {id}"
                    )));
                }
            }
            stack.push(id);
            cursor = arena[id].left();
        }
        let Some(id) = stack.pop() else { break };
        if let Some(prev) = previous {
            if arena[prev].key() >= arena[id].key() {
                return Err(StructureError::invalid(format!(
                    "in-order keys not strictly increasing at {id}"
                )));
            }
        }
        previous = Some(id);
        count += 1;
        cursor = arena[id].right();
    }

    if count != arena.len() {
        return Err(StructureError::invalid(format!(
            "reached {count} nodes but {} are allocated",
            arena.len()
        )));
    }
    Ok(())
}
