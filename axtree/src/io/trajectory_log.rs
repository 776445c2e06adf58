//! Trajectory persistence under `.axtree/trajectories/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::detach::Snapshot;
use crate::core::types::{Action, ActionRecord};
use crate::io::observation::Observation;

/// One agent-level step: where it happened, what the page looked like just
/// before, and what was done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighLevelRecord {
    pub url: String,
    pub snapshot: Snapshot,
    pub action: ActionRecord,
}

/// Low-level log entries alternate between a raw action and the observation
/// it produced. `stop` actions have no following observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LowLevelEntry {
    Action { action: Action },
    Observation { observation: Observation, info: Value },
}

#[derive(Debug, Clone)]
pub struct TrajectoryPaths {
    pub dir: PathBuf,
    pub high_level_path: PathBuf,
    pub low_level_path: PathBuf,
}

impl TrajectoryPaths {
    pub fn new(root: &Path, run_id: &str) -> Self {
        let dir = trajectories_dir(root).join(run_id);
        Self {
            dir: dir.clone(),
            high_level_path: dir.join("high_level.json"),
            low_level_path: dir.join("low_level.json"),
        }
    }
}

pub fn trajectories_dir(root: &Path) -> PathBuf {
    root.join(".axtree").join("trajectories")
}

/// Generate a run id that does not collide with an existing trajectory.
pub fn new_run_id(root: &Path) -> Result<String> {
    let base = format!("run-{}", Local::now().format("%Y%m%d-%H%M%S"));
    let dir = trajectories_dir(root);
    if !dir.join(&base).exists() {
        return Ok(base);
    }
    for suffix in 1..1000 {
        let candidate = format!("{base}-{suffix}");
        if !dir.join(&candidate).exists() {
            return Ok(candidate);
        }
    }
    Err(anyhow!("unable to allocate run id under {}", dir.display()))
}

pub struct TrajectoryWriteRequest<'a> {
    pub root: &'a Path,
    pub run_id: &'a str,
    pub high_level: &'a [HighLevelRecord],
    pub low_level: &'a [LowLevelEntry],
}

pub fn write_trajectories(request: &TrajectoryWriteRequest<'_>) -> Result<TrajectoryPaths> {
    if request.run_id.trim().is_empty() {
        return Err(anyhow!("run id must not be empty"));
    }
    let paths = TrajectoryPaths::new(request.root, request.run_id);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create trajectory dir {}", paths.dir.display()))?;

    write_json(&paths.high_level_path, &request.high_level)?;
    write_json(&paths.low_level_path, &request.low_level)?;
    info!(
        run_id = request.run_id,
        high_level = request.high_level.len(),
        low_level = request.low_level.len(),
        "wrote trajectories"
    );
    Ok(paths)
}

pub fn load_high_level(paths: &TrajectoryPaths) -> Result<Vec<HighLevelRecord>> {
    read_json(&paths.high_level_path)
}

pub fn load_low_level(paths: &TrajectoryPaths) -> Result<Vec<LowLevelEntry>> {
    read_json(&paths.low_level_path)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "reading trajectory");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}
