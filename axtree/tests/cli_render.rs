//! CLI tests for `axtree` commands.
//!
//! Spawns the axtree binary against observation files and verifies output
//! and exit codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use axtree::exit_codes;
use axtree::io::config::{SessionConfig, load_config};
use axtree::io::observation::load_snapshot;
use axtree::test_support::sample_observation_json;

fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("page.json");
    fs::write(&path, sample_observation_json()).expect("write observation");
    path
}

fn axtree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_axtree"))
        .args(args)
        .output()
        .expect("run axtree")
}

#[test]
fn render_prints_markdown() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_sample(&temp);

    let output = axtree(&["render", path.to_str().expect("utf8 path")]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("## navigation Main"));
    assert!(stdout.contains("[link: Cart]"));
    assert!(stdout.contains("## Welcome"));
}

#[test]
fn outline_raw_keeps_button_text() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_sample(&temp);
    let path = path.to_str().expect("utf8 path");

    let cleaned = axtree(&["outline", path]);
    let raw = axtree(&["outline", path, "--raw"]);

    let cleaned = String::from_utf8(cleaned.stdout).expect("utf8");
    let raw = String::from_utf8(raw.stdout).expect("utf8");
    assert!(!cleaned.contains("StaticText"));
    assert!(raw.contains("[8] StaticText 'Sign in now'"));
    assert!(raw.starts_with("[1] RootWebArea 'Shop' focused=True\n"));
}

#[test]
fn find_exits_not_found_when_nothing_matches() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_sample(&temp);
    let path = path.to_str().expect("utf8 path");

    let found = axtree(&["find", path, "--category", "link", "--name", "cart"]);
    assert_eq!(found.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(found.stdout).expect("utf8");
    assert!(stdout.trim_end().ends_with("link('Cart', 4)"));

    let missing = axtree(&["find", path, "--category", "checkbox"]);
    assert_eq!(missing.status.code(), Some(exit_codes::NOT_FOUND));
}

#[test]
fn find_all_with_regex() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_sample(&temp);

    let output = axtree(&[
        "find",
        path.to_str().expect("utf8 path"),
        "--category",
        "li.k",
        "--regex",
        "--all",
    ]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn validate_rejects_schema_violations() {
    let temp = tempfile::tempdir().expect("tempdir");
    let good = write_sample(&temp);
    let bad = temp.path().join("bad.json");
    fs::write(&bad, r#"{"nodes": [{"id": "one", "role": "link"}]}"#).expect("write");

    let ok = axtree(&["validate", good.to_str().expect("utf8 path")]);
    assert_eq!(ok.status.code(), Some(exit_codes::OK));

    let failed = axtree(&["validate", bad.to_str().expect("utf8 path")]);
    assert_eq!(failed.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8(failed.stderr).expect("utf8");
    assert!(stderr.contains("schema validation failed"));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("nested").join("config.toml");
    let config = config.to_str().expect("utf8 path");

    let output = axtree(&["init", "--config", config]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        load_config(Path::new(config)).expect("load"),
        SessionConfig::default()
    );

    fs::write(config, "enforce_single_action = false\n").expect("edit");
    let again = axtree(&["init", "--config", config]);
    assert_eq!(again.status.code(), Some(exit_codes::OK));
    assert!(!load_config(Path::new(config)).expect("load").enforce_single_action);

    let forced = axtree(&["init", "--force", "--config", config]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
    assert!(load_config(Path::new(config)).expect("load").enforce_single_action);
}

#[test]
fn invalid_config_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_sample(&temp);
    let config = temp.path().join("config.toml");
    fs::write(&config, "[viewport]\nband_top = 0.6\nband_bottom = 0.2\n").expect("write");

    let output = axtree(&[
        "validate",
        path.to_str().expect("utf8 path"),
        "--config",
        config.to_str().expect("utf8 path"),
    ]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("load config"));
    assert!(stderr.contains("band_top"));
}

#[test]
fn snapshot_writes_detached_tree() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_sample(&temp);
    let out = temp.path().join("snapshot.json");

    let output = axtree(&[
        "snapshot",
        path.to_str().expect("utf8 path"),
        "--out",
        out.to_str().expect("utf8 path"),
    ]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let snapshot = load_snapshot(&out).expect("load snapshot");
    assert_eq!(snapshot.nodes[0].name, "Shop");
    assert!(snapshot.nodes.iter().all(|node| node.category != "StaticText"));
}
