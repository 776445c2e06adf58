//! Raw observation loading: schema validation, tree construction and
//! snapshot persistence.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::clean::clean;
use crate::core::detach::Snapshot;
use crate::core::numbering::assign_nths;
use crate::tree::{Node, Properties, PropertyValue, Tree};

const OBSERVATION_SCHEMA: &str = include_str!("../../schemas/observation.schema.json");

/// A page snapshot as delivered by the browser environment.
///
/// Nodes are flat; `child_ids` link them. The first node is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub url: String,
    pub nodes: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: i64,
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<RawProperty>,
    #[serde(default)]
    pub child_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    pub name: String,
    pub value: Value,
}

/// Parse and schema-check an observation from JSON text.
pub fn parse_observation(raw: &str) -> Result<Observation> {
    let value: Value = serde_json::from_str(raw).context("parse observation json")?;
    validate_schema(&value)?;
    serde_json::from_value(value).context("deserialize observation")
}

/// Load and schema-check an observation file.
pub fn load_observation(path: &Path) -> Result<Observation> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read observation {}", path.display()))?;
    parse_observation(&contents).with_context(|| format!("load observation {}", path.display()))
}

/// Build a numbered tree from an observation, without cleaning.
pub fn build_tree(observation: &Observation) -> Result<Tree> {
    let root_raw = observation
        .nodes
        .first()
        .ok_or_else(|| anyhow!("observation has no nodes"))?;
    let by_id: HashMap<i64, &RawNode> = observation
        .nodes
        .iter()
        .map(|node| (node.id, node))
        .collect();

    let mut tree = Tree::new(to_node(root_raw));
    let mut placed = HashSet::from([root_raw.id]);
    let mut pending = vec![(tree.root(), root_raw)];
    while let Some((parent, raw)) = pending.pop() {
        for child_id in &raw.child_ids {
            let Some(child_raw) = by_id.get(child_id) else {
                debug!(parent = raw.id, child = child_id, "skipping unknown child id");
                continue;
            };
            if !placed.insert(*child_id) {
                debug!(parent = raw.id, child = child_id, "skipping repeated child id");
                continue;
            }
            let child = tree.add_child(parent, to_node(child_raw));
            pending.push((child, child_raw));
        }
    }

    assign_nths(&mut tree);
    debug!(url = %observation.url, nodes = tree.all_nodes().len(), "built tree");
    Ok(tree)
}

/// Build, number and clean: the tree an agent should see.
pub fn build_clean_tree(observation: &Observation) -> Result<Tree> {
    let mut tree = build_tree(observation)?;
    clean(&mut tree);
    Ok(tree)
}

/// Write a detached tree as pretty JSON with a trailing newline.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(snapshot)?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write snapshot {}", path.display()))
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read snapshot {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse snapshot {}", path.display()))
}

fn to_node(raw: &RawNode) -> Node {
    let mut properties = Properties::new();
    for property in &raw.properties {
        if let Some(value) = property_value(&property.value) {
            properties.insert(property.name.as_str(), value);
        }
    }
    Node::new(raw.role.as_str(), raw.name.as_str(), raw.id).with_properties(properties)
}

fn property_value(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(PropertyValue::Bool(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Some(PropertyValue::Int(int)),
            None => number.as_f64().map(PropertyValue::Float),
        },
        Value::String(text) => Some(PropertyValue::Text(text.clone())),
        other => Some(PropertyValue::Text(other.to_string())),
    }
}

fn validate_schema(observation: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(OBSERVATION_SCHEMA).context("parse observation schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(observation) {
        let messages = compiled
            .iter_errors(observation)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "observation schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
