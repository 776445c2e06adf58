//! Test-only helpers for building trees, observations and scripted
//! environments.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use serde_json::json;

use crate::core::types::Action;
use crate::io::env::{Environment, StepResult};
use crate::io::observation::{Observation, RawNode, RawProperty};
use crate::tree::{Node, NodeId, PropertyValue, Tree};

/// Incremental tree construction with deterministic element ids: the root is
/// `1`, each added child takes the next id.
///
/// Nodes are not numbered; call `assign_nths` when a test needs `nth`.
pub struct TreeBuilder {
    tree: Tree,
    next_id: i64,
}

impl TreeBuilder {
    pub fn new(category: &str, name: &str) -> Self {
        Self {
            tree: Tree::new(Node::new(category, name, 1)),
            next_id: 2,
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn child(&mut self, parent: NodeId, category: &str, name: &str) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.tree.add_child(parent, Node::new(category, name, id))
    }

    pub fn set_property(&mut self, id: NodeId, key: &str, value: impl Into<PropertyValue>) {
        self.tree.get_mut(id).properties.insert(key, value);
    }

    pub fn build(self) -> Tree {
        self.tree
    }
}

/// Structural view of a tree that ignores arena layout, for equality checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub category: String,
    pub name: String,
    pub properties: Vec<(String, String)>,
    pub children: Vec<Shape>,
}

pub fn shape_of(tree: &Tree) -> Shape {
    shape_at(tree, tree.root())
}

fn shape_at(tree: &Tree, id: NodeId) -> Shape {
    let node = tree.get(id);
    Shape {
        category: node.category.clone(),
        name: node.name.clone(),
        properties: node
            .properties
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        children: tree
            .children(id)
            .iter()
            .map(|child| shape_at(tree, *child))
            .collect(),
    }
}

pub fn raw_node(id: i64, role: &str, name: &str, child_ids: &[i64]) -> RawNode {
    RawNode {
        id,
        role: role.to_string(),
        name: name.to_string(),
        properties: Vec::new(),
        child_ids: child_ids.to_vec(),
    }
}

pub fn raw_property(name: &str, value: serde_json::Value) -> RawProperty {
    RawProperty {
        name: name.to_string(),
        value,
    }
}

pub fn observation(url: &str, nodes: Vec<RawNode>) -> Observation {
    Observation {
        url: url.to_string(),
        nodes,
    }
}

/// Wrap an observation as an uneventful step result.
pub fn step_result(observation: Observation) -> StepResult {
    StepResult {
        observation,
        reward: 0.0,
        done: false,
        truncated: false,
        info: json!({}),
    }
}

/// A small page with navigation, a heading and a button.
pub fn sample_observation_json() -> &'static str {
    r#"{
  "url": "https://shop.test/",
  "nodes": [
    {"id": 1, "role": "RootWebArea", "name": "Shop",
     "properties": [{"name": "focused", "value": true}], "child_ids": [2, 5]},
    {"id": 2, "role": "navigation", "name": "Main", "child_ids": [3, 4]},
    {"id": 3, "role": "link", "name": "Home"},
    {"id": 4, "role": "link", "name": "Cart"},
    {"id": 5, "role": "main", "name": "", "child_ids": [6, 7]},
    {"id": 6, "role": "heading", "name": "Welcome",
     "properties": [{"name": "level", "value": 1}]},
    {"id": 7, "role": "button", "name": "Sign in", "child_ids": [8]},
    {"id": 8, "role": "StaticText", "name": "Sign in now"}
  ]
}"#
}

/// Environment that replays queued step results and element positions.
///
/// Element centre queries fall back to `default_center` once the queue is
/// empty; steps fail once their queue is empty.
pub struct ScriptedEnvironment {
    steps: VecDeque<StepResult>,
    centers: VecDeque<(f64, f64)>,
    default_center: (f64, f64),
    actions: Vec<Action>,
    center_queries: Vec<i64>,
}

impl ScriptedEnvironment {
    pub fn new(steps: Vec<StepResult>) -> Self {
        Self {
            steps: steps.into(),
            centers: VecDeque::new(),
            default_center: (0.5, 0.2),
            actions: Vec::new(),
            center_queries: Vec::new(),
        }
    }

    pub fn with_centers(mut self, centers: Vec<(f64, f64)>) -> Self {
        self.centers = centers.into();
        self
    }

    pub fn with_default_center(mut self, center: (f64, f64)) -> Self {
        self.default_center = center;
        self
    }

    /// Every action passed to `step`, in order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn center_queries(&self) -> &[i64] {
        &self.center_queries
    }
}

impl Environment for ScriptedEnvironment {
    fn step(&mut self, action: &Action) -> Result<StepResult> {
        self.actions.push(action.clone());
        self.steps
            .pop_front()
            .ok_or_else(|| anyhow!("scripted environment has no step left for {action:?}"))
    }

    fn element_center(&mut self, element_id: i64) -> Result<(f64, f64)> {
        self.center_queries.push(element_id);
        Ok(self.centers.pop_front().unwrap_or(self.default_center))
    }
}
