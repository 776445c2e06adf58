//! Occurrence numbering for nodes sharing a `(category, name)` pair.

use std::collections::HashMap;

use crate::tree::Tree;

/// Assign `nth` to every reachable node in pre-order.
///
/// Counters are tree-wide per `(category, name)` and start at 0. Must be
/// re-run after a tree is rebuilt; `nth` is positional.
pub fn assign_nths(tree: &mut Tree) {
    let mut counters: HashMap<(String, String), usize> = HashMap::new();
    for id in tree.all_nodes() {
        let node = tree.get_mut(id);
        let counter = counters
            .entry((node.category.clone(), node.name.clone()))
            .or_insert(0);
        node.nth = *counter;
        *counter += 1;
    }
}
