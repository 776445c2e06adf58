//! Arena-backed accessibility tree.
//!
//! Nodes live in a single `Vec` owned by [`Tree`] and refer to each other by
//! [`NodeId`]. Parent links are plain indices, so the structure has no
//! reference cycles and detaching it is index copying.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::error::TreeError;
use crate::core::time::TimeValue;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Index of a node inside its owning [`Tree`].
///
/// Ids carry the stamp of the tree that issued them, so an id kept from an
/// earlier observation is rejected by [`Tree::contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    stamp: u64,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

/// A property value reported by the accessibility snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Equality for query filters: integers and floats compare by numeric value.
    pub fn loosely_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(left), Self::Float(right)) | (Self::Float(right), Self::Int(left)) => {
                *left as f64 == *right
            }
            _ => self == other,
        }
    }

    /// Truthiness used by state flags such as `checked` or `hidden`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Text(value) => matches!(value.as_str(), "true" | "mixed"),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered property mapping kept as two parallel sequences.
///
/// `names[i]` always describes `values[i]`; inserting a new key appends to
/// both, so iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    names: Vec<String>,
    values: Vec<PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parallel sequences. Extra entries in the longer side are dropped.
    pub fn from_parallel(names: Vec<String>, values: Vec<PropertyValue>) -> Self {
        let mut properties = Self::new();
        for (name, value) in names.into_iter().zip(values) {
            properties.insert(name, value);
        }
        properties
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.position(name).map(|index| &self.values[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set `name`, replacing an existing value in place or appending a new pair.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.values[index] = value,
            None => {
                self.names.push(name);
                self.values.push(value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let index = self.position(name)?;
        self.names.remove(index);
        Some(self.values.remove(index))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[PropertyValue] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }
}

/// One page element.
#[derive(Debug, Clone)]
pub struct Node {
    pub category: String,
    pub name: String,
    pub id: i64,
    pub nth: usize,
    pub properties: Properties,
    time: Option<TimeValue>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Create a detached node. `time` nodes parse their name eagerly.
    pub fn new(category: impl Into<String>, name: impl Into<String>, id: i64) -> Self {
        let category = category.into();
        let name = name.into();
        let time = if category == "time" {
            TimeValue::parse(&name)
        } else {
            None
        };
        Self {
            category,
            name,
            id,
            nth: 0,
            properties: Properties::new(),
            time,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name, value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn time(&self) -> Option<&TimeValue> {
        self.time.as_ref()
    }

    /// Calendar field of the parsed time value, if this node carries one.
    pub fn time_field(&self, key: &str) -> Option<i64> {
        self.time.as_ref().and_then(|time| time.field(key))
    }

    /// Resolve an attribute: properties first, then the time value's fields.
    pub fn attr(&self, key: &str) -> Result<PropertyValue, TreeError> {
        if let Some(value) = self.properties.get(key) {
            return Ok(value.clone());
        }
        if let Some(value) = self.time_field(key) {
            return Ok(PropertyValue::Int(value));
        }
        Err(TreeError::UnknownAttribute {
            category: self.category.clone(),
            attribute: key.to_string(),
        })
    }

    /// True when the `hidden` property is set.
    pub fn is_hidden(&self) -> bool {
        self.properties
            .get("hidden")
            .is_some_and(PropertyValue::is_truthy)
    }

    /// Case-insensitive category comparison for leaf roles such as `StaticText`.
    pub fn is_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// An accessibility tree: an arena of nodes with exactly one root.
///
/// Nodes removed by [`Tree::set_children`] stay in the arena but become
/// unreachable; every traversal starts from the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    stamp: u64,
}

impl Tree {
    pub fn new(mut root: Node) -> Self {
        root.parent = None;
        root.children.clear();
        let stamp = next_stamp();
        Self {
            nodes: vec![root],
            root: NodeId { index: 0, stamp },
            stamp,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index]
    }

    /// Checked lookup for ids coming from outside this tree. Pruned nodes and
    /// ids issued by another tree yield `None`.
    pub fn try_get(&self, id: NodeId) -> Option<&Node> {
        self.contains(id).then(|| self.get(id))
    }

    /// True when `id` was issued by this tree and is reachable from the root.
    pub fn contains(&self, id: NodeId) -> bool {
        if id.stamp != self.stamp || id.index >= self.nodes.len() {
            return false;
        }
        let mut current = id;
        // Bounded so that detached cycles cannot loop forever.
        for _ in 0..self.nodes.len() {
            if current == self.root {
                return true;
            }
            let Some(parent) = self.parent(current) else {
                return false;
            };
            if !self.children(parent).contains(&current) {
                return false;
            }
            current = parent;
        }
        false
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Append `node` as the last child of `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = self.node_id(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.index].children.push(id);
        id
    }

    /// Replace the child list of `id`. Dropped children become unreachable.
    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for child in &children {
            self.nodes[child.index].parent = Some(id);
        }
        self.nodes[id.index].children = children;
    }

    /// Id for an arena slot, stamped with this tree. The slot may be unreachable.
    pub(crate) fn node_id(&self, index: usize) -> NodeId {
        NodeId {
            index,
            stamp: self.stamp,
        }
    }

    /// Slots in the arena, including unreachable ones.
    pub(crate) fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Position of `id` among its parent's children.
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// `id` plus all of its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// All reachable nodes in pre-order.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    /// Assemble a tree from pre-built nodes and child links, checking that each
    /// index is used at most once and that the root is nobody's child.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        root: usize,
        links: &[Vec<usize>],
    ) -> Result<Self, TreeError> {
        if root >= nodes.len() {
            return Err(TreeError::InvalidSnapshot(format!(
                "root index {root} out of range for {} nodes",
                nodes.len()
            )));
        }
        let mut seen = vec![false; nodes.len()];
        seen[root] = true;
        let stamp = next_stamp();
        let mut tree = Self {
            nodes,
            root: NodeId { index: root, stamp },
            stamp,
        };
        for node in &mut tree.nodes {
            node.parent = None;
            node.children.clear();
        }
        if links.len() > tree.nodes.len() {
            return Err(TreeError::InvalidSnapshot(format!(
                "{} child lists for {} nodes",
                links.len(),
                tree.nodes.len()
            )));
        }
        for (parent, children) in links.iter().enumerate() {
            for &child in children {
                if child >= tree.nodes.len() {
                    return Err(TreeError::InvalidSnapshot(format!(
                        "node {parent} references missing child {child}"
                    )));
                }
                if seen[child] {
                    return Err(TreeError::InvalidSnapshot(format!(
                        "node {child} appears more than once"
                    )));
                }
                seen[child] = true;
                tree.nodes[child].parent = Some(tree.node_id(parent));
                let child_id = tree.node_id(child);
                tree.nodes[parent].children.push(child_id);
            }
        }
        Ok(tree)
    }
}

fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}
