//! Pruned range traversal
//!
//! In-order walk with an explicit stack:
//!   key < low  → left subtree cannot match, go right only
//!   key > high → right subtree cannot match, and nothing later can either
//! Cost: O(k + depth) for k results.

use super::OrderedKeyTree;

/// All `(key, value)` pairs with `low <= key <= high`, ascending by key
///
/// Empty when nothing matches or when `low > high`.
pub fn range_query<K, V, T>(tree: &T, low: &K, high: &K) -> Vec<(K, V)>
where
    K: Ord + Clone,
    V: Clone,
    T: OrderedKeyTree<K, V> + ?Sized,
{
    let arena = tree.arena();
    let mut result = Vec::new();
    let mut stack = Vec::new();
    let mut cursor = tree.root();

    loop {
        while let Some(id) = cursor {
            let node = &arena[id];
            if node.key() < low {
                cursor = node.right();
            } else {
                stack.push(id);
                cursor = node.left();
            }
        }

        let Some(id) = stack.pop() else { break };
        let node = &arena[id];
        if node.key() > high {
            break;
        }
        result.push((node.key().clone(), node.value().clone()));
        cursor = node.right();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{AvlTree, BinarySearchTree};

    fn keys<V>(pairs: &[(i32, V)]) -> Vec<i32> {
        pairs.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_range_scenario() {
        let mut tree = BinarySearchTree::new();
        for key in [5, 2, 8, 1, 3] {
            tree.insert(key, key * 100).unwrap();
        }
        let result = range_query(&tree, &2, &5);
        assert_eq!(result, vec![(2, 200), (3, 300), (5, 500)]);
    }

    #[test]
    fn test_inverted_and_empty_ranges() {
        let mut tree = AvlTree::new();
        for key in 0..50 {
            tree.insert(key, ()).unwrap();
        }
        assert!(range_query(&tree, &30, &10).is_empty());
        assert!(range_query(&tree, &100, &200).is_empty());
        assert_eq!(keys(&range_query(&tree, &49, &49)), vec![49]);

        let empty: AvlTree<i32, ()> = AvlTree::new();
        assert!(range_query(&empty, &0, &10).is_empty());
    }

    #[test]
    fn test_works_through_trait_object() {
        let mut tree = BinarySearchTree::new();
        for key in [10, 4, 12, 6] {
            tree.insert(key, ()).unwrap();
        }
        let dynamic: &dyn OrderedKeyTree<i32, ()> = &tree;
        assert_eq!(keys(&range_query(dynamic, &5, &11)), vec![6, 10]);
    }
}
