//! Structural invariants of an accessibility tree.

use std::collections::{HashMap, HashSet};

use crate::tree::{NodeId, Tree};

/// Check invariants the type system does not enforce:
/// - The root has no parent
/// - Every reachable node appears once, under the parent it points to
/// - No duplicate element ids
/// - `nth` is contiguous per `(category, name)` in pre-order
pub fn validate_invariants(tree: &Tree) -> Vec<String> {
    let mut errors = Vec::new();
    let root = tree.root();
    if let Some(parent) = tree.parent(root) {
        errors.push(format!("root has parent {}", parent.index()));
    }

    let mut visited = HashSet::new();
    let mut element_ids = HashSet::new();
    let mut expected_nth: HashMap<(&str, &str), usize> = HashMap::new();
    for id in tree.all_nodes() {
        let node = tree.get(id);
        let path = describe(tree, id);
        if !visited.insert(id) {
            errors.push(format!("{path}: reachable more than once"));
            continue;
        }
        if !element_ids.insert(node.id) {
            errors.push(format!("duplicate id {} at {path}", node.id));
        }
        for child in node.children() {
            if tree.parent(*child) != Some(id) {
                errors.push(format!(
                    "{path}: child {} points to a different parent",
                    describe(tree, *child)
                ));
            }
        }
        let counter = expected_nth
            .entry((node.category.as_str(), node.name.as_str()))
            .or_insert(0);
        if node.nth != *counter {
            errors.push(format!("{path}: nth {} but expected {}", node.nth, counter));
        }
        *counter += 1;
    }
    errors
}

fn describe(tree: &Tree, id: NodeId) -> String {
    let node = tree.get(id);
    format!("{} '{}' [{}]", node.category, node.name, node.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::numbering::assign_nths;
    use crate::test_support::TreeBuilder;

    #[test]
    fn numbered_tree_is_valid() {
        let mut builder = TreeBuilder::new("RootWebArea", "Page");
        builder.child(builder.root(), "link", "A");
        builder.child(builder.root(), "link", "A");
        let mut tree = builder.build();
        assign_nths(&mut tree);
        assert!(validate_invariants(&tree).is_empty());
    }

    #[test]
    fn reports_stale_numbering_and_duplicate_ids() {
        let mut builder = TreeBuilder::new("RootWebArea", "Page");
        let first = builder.child(builder.root(), "link", "A");
        builder.child(builder.root(), "link", "A");
        let mut tree = builder.build();
        tree.get_mut(first).id = 3;

        let errors = validate_invariants(&tree);
        assert!(errors.iter().any(|err| err.contains("duplicate id 3")));
        assert!(errors.iter().any(|err| err.contains("nth 0 but expected 1")));
    }
}
