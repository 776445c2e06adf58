//! Environment-free copies of a tree for recording and persistence.

use serde::{Deserialize, Serialize};

use crate::core::error::TreeError;
use crate::tree::{Node, NodeId, Properties, PropertyValue, Tree};

/// A detached tree: plain values only, indices instead of references.
///
/// Nodes are stored in pre-order, so a parent always precedes its children and
/// `nodes[0]` is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub root: usize,
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub category: String,
    pub name: String,
    pub id: i64,
    pub nth: usize,
    pub property_names: Vec<String>,
    pub property_values: Vec<PropertyValue>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Tree {
    /// Copy the reachable part of the tree into a [`Snapshot`].
    pub fn detach(&self) -> Snapshot {
        let order = self.all_nodes();
        let mut slots = vec![None; self.arena_len()];
        for (slot, id) in order.iter().enumerate() {
            slots[id.index()] = Some(slot);
        }
        let slot_of = |id: NodeId| slots[id.index()].unwrap_or_default();

        let nodes = order
            .iter()
            .map(|id| {
                let node = self.get(*id);
                SnapshotNode {
                    category: node.category.clone(),
                    name: node.name.clone(),
                    id: node.id,
                    nth: node.nth,
                    property_names: node.properties.names().to_vec(),
                    property_values: node.properties.values().to_vec(),
                    parent: node.parent().map(slot_of),
                    children: node.children().iter().map(|child| slot_of(*child)).collect(),
                }
            })
            .collect();
        Snapshot { root: 0, nodes }
    }

    /// Rebuild a live tree from a snapshot. Time values are re-parsed.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, TreeError> {
        if snapshot.nodes.is_empty() {
            return Err(TreeError::InvalidSnapshot("snapshot has no nodes".to_string()));
        }
        let mut nodes = Vec::with_capacity(snapshot.nodes.len());
        let mut links = Vec::with_capacity(snapshot.nodes.len());
        for (index, entry) in snapshot.nodes.iter().enumerate() {
            if entry.property_names.len() != entry.property_values.len() {
                return Err(TreeError::InvalidSnapshot(format!(
                    "node {index} has {} property names but {} values",
                    entry.property_names.len(),
                    entry.property_values.len()
                )));
            }
            let mut node = Node::new(entry.category.as_str(), entry.name.as_str(), entry.id)
                .with_properties(Properties::from_parallel(
                    entry.property_names.clone(),
                    entry.property_values.clone(),
                ));
            node.nth = entry.nth;
            nodes.push(node);
            links.push(entry.children.clone());
        }
        let tree = Self::from_parts(nodes, snapshot.root, &links)?;
        for (index, entry) in snapshot.nodes.iter().enumerate() {
            let actual = tree.parent(tree.node_id(index)).map(NodeId::index);
            if entry.parent.is_some() && entry.parent != actual {
                return Err(TreeError::InvalidSnapshot(format!(
                    "node {index} claims parent {:?} but is listed under {:?}",
                    entry.parent, actual
                )));
            }
        }
        Ok(tree)
    }
}
