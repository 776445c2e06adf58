//! Session configuration stored as TOML (by default `.axtree/config.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Session configuration (TOML).
///
/// Missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Reject a second click/type/go-back within one turn.
    pub enforce_single_action: bool,

    pub viewport: ViewportConfig,
}

/// Where a target element should sit before it is clicked or typed into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    /// Upper edge of the target band, as a fraction of viewport height.
    pub band_top: f64,
    /// Lower edge of the target band.
    pub band_bottom: f64,
    /// Upper bound on scroll/arrow-key actions per adjustment.
    pub max_adjustments: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            band_top: 0.1,
            band_bottom: 0.4,
            max_adjustments: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enforce_single_action: true,
            viewport: ViewportConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        let viewport = &self.viewport;
        if !(0.0..=1.0).contains(&viewport.band_top) || !(0.0..=1.0).contains(&viewport.band_bottom)
        {
            return Err(anyhow!("viewport band must lie within 0.0..=1.0"));
        }
        if viewport.band_top > viewport.band_bottom {
            return Err(anyhow!("viewport.band_top must be <= viewport.band_bottom"));
        }
        if viewport.max_adjustments == 0 {
            return Err(anyhow!("viewport.max_adjustments must be > 0"));
        }
        Ok(())
    }
}

/// Conventional config location under a workspace root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(".axtree").join("config.toml")
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SessionConfig::default()`.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    if !path.exists() {
        let cfg = SessionConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SessionConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SessionConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
