//! In-place normalization of an observation tree.
//!
//! Prunes children that add noise for a text reader (duplicated labels,
//! decorative icons, hidden or boilerplate nodes), folds a `time` node's
//! relative text into a property and merges fragmented text runs.

use crate::tree::{NodeId, PropertyValue, Tree};

const BOILERPLATE_CATEGORIES: &[&str] = &["article", "contentinfo", "svgroot"];

/// Normalize the whole tree in place and return it.
///
/// Idempotent: cleaning an already-cleaned tree changes nothing.
pub fn clean(tree: &mut Tree) -> &mut Tree {
    let root = tree.root();
    clean_node(tree, root);
    tree
}

/// Normalize the subtree rooted at `id`.
pub fn clean_node(tree: &mut Tree, id: NodeId) {
    let children = tree.children(id).to_vec();
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        // Children are cleaned before the rules look at them so that a single
        // pass reaches the fixed point (e.g. an image whose only child is pruned
        // is already childless here).
        clean_node(tree, child);
        if !is_excluded(tree, id, child) {
            kept.push(child);
        }
    }

    let mut kept = merge_text_runs(tree, kept);
    if let Some(relative) = foldable_relative_text(tree, id, &kept) {
        tree.get_mut(id).properties.insert("relative", relative);
        kept.clear();
    }
    tree.set_children(id, kept);
    tidy_properties(tree, id);
}

fn is_excluded(tree: &Tree, parent_id: NodeId, child_id: NodeId) -> bool {
    let parent = tree.get(parent_id);
    let child = tree.get(child_id);

    if child.is_category("statictext") && parent.name.contains(child.name.as_str()) {
        return true;
    }
    if child.is_category("image") && !child.has_children() {
        let stripped = child
            .name
            .trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '_');
        if stripped.is_empty() || stripped == parent.name {
            return true;
        }
    }
    if child.category == "link" && child.name.trim().is_empty() {
        return true;
    }
    if child.is_hidden() {
        return true;
    }
    if !child.has_children()
        && BOILERPLATE_CATEGORIES
            .iter()
            .any(|category| child.is_category(category))
    {
        return true;
    }
    // TODO: keep non-text children of buttons (icons, nested images) once the
    // renderer can show them; today every button child is discarded.
    if parent.category == "button" {
        return true;
    }
    child.category == "status" && child.name.is_empty() && !child.has_children()
}

/// Plain text runs: childless, property-less `statictext`.
fn is_plain_text(tree: &Tree, id: NodeId) -> bool {
    let node = tree.get(id);
    node.is_category("statictext") && !node.has_children() && node.properties.is_empty()
}

fn merge_text_runs(tree: &mut Tree, children: Vec<NodeId>) -> Vec<NodeId> {
    let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
    for child in children {
        if let Some(&previous) = merged.last() {
            if is_plain_text(tree, previous) && is_plain_text(tree, child) {
                let tail = tree.get(child).name.clone();
                let head = &mut tree.get_mut(previous).name;
                head.push(' ');
                head.push_str(&tail);
                continue;
            }
        }
        merged.push(child);
    }
    merged
}

/// A `time` node whose only remaining child is plain text keeps that text as
/// its `relative` property instead.
fn foldable_relative_text(tree: &Tree, id: NodeId, children: &[NodeId]) -> Option<String> {
    if tree.get(id).category != "time" {
        return None;
    }
    match children {
        [only] if is_plain_text(tree, *only) => Some(tree.get(*only).name.clone()),
        _ => None,
    }
}

fn tidy_properties(tree: &mut Tree, id: NodeId) {
    let is_root = tree.parent(id).is_none();
    let node = tree.get_mut(id);

    if let Some(PropertyValue::Text(hover)) = node.properties.get("hover_text") {
        let collapsed = hover.replace('\n', " ");
        if comparable(&collapsed) == comparable(&node.name) {
            node.properties.remove("hover_text");
        } else {
            node.properties.insert("hover_text", collapsed);
        }
    }

    if is_root {
        node.properties.remove("focused");
    }
}

fn comparable(text: &str) -> String {
    text.to_lowercase().replace([' ', '_'], "")
}
