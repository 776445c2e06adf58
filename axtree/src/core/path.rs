//! Human-readable descriptions of nodes: one-line reprs, ancestor paths and
//! indented outlines.

use std::fmt::Write;

use crate::tree::{NodeId, Tree};

/// `category('name', id, key=value, ...)` without children.
pub fn repr_no_children(tree: &Tree, id: NodeId) -> String {
    let node = tree.get(id);
    let mut out = format!("{}('{}', {}", node.category, node.name, node.id);
    for (key, value) in node.properties.iter() {
        let _ = write!(out, ", {key}={value}");
    }
    out.push(')');
    out
}

/// Like [`repr_no_children`], followed by `children=[...]` when there are any.
pub fn repr(tree: &Tree, id: NodeId) -> String {
    let mut out = repr_no_children(tree, id);
    let children = tree.children(id);
    if !children.is_empty() {
        out.pop();
        let inner: Vec<String> = children.iter().map(|child| repr(tree, *child)).collect();
        let _ = write!(out, ", children=[{}])", inner.join(", "));
    }
    out
}

/// ` / `-joined reprs from the root down to `id`.
pub fn node_path(tree: &Tree, id: NodeId) -> String {
    let mut chain = vec![id];
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        chain.push(parent);
        current = parent;
    }
    chain
        .iter()
        .rev()
        .map(|node| repr_no_children(tree, *node))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Indented outline: `[id] category 'name' key=value`, four spaces per level.
pub fn outline(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    outline_inner(tree, id, 0, &mut out);
    out
}

fn outline_inner(tree: &Tree, id: NodeId, indent: usize, out: &mut String) {
    let node = tree.get(id);
    let _ = write!(
        out,
        "{}[{}] {} '{}'",
        "    ".repeat(indent),
        node.id,
        node.category,
        node.name
    );
    if !node.properties.is_empty() {
        let pairs: Vec<String> = node
            .properties
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        let _ = write!(out, " {}", pairs.join(" "));
    }
    out.push('\n');
    for child in tree.children(id) {
        outline_inner(tree, *child, indent + 1, out);
    }
}
