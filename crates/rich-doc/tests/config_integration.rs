//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. Tests use
//! `info --json` to assert actual config values, not just process success.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Run `info --json` from a directory and parse the JSON output.
fn info_json(dir: &std::path::Path) -> Value {
    let output = cmd()
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());

    assert_eq!(json["config"]["log_level"], "info");
    assert_eq!(json["config"]["max_length"], 10_000);
    assert_eq!(json["config"]["count_unit"], "utf16");
    assert_eq!(json["config"]["max_depth"], 100);
    assert_eq!(json["config"]["unknown_fields"], "ignore");
    assert_eq!(json["config"]["unknown_kinds"], "reject");
    assert_eq!(json["config"]["strict_nesting"], false);
    assert!(
        json["config"]["config_file"].is_null(),
        "no config file should be reported"
    );
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "max_length = 280\n").unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["max_length"], 280);
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".rich-doc.toml")
    );
}

#[test]
fn discovers_short_name_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("richdoc.toml"), "strict_nesting = true\n").unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["strict_nesting"], true);
}

#[test]
fn discovers_config_in_parent_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "max_depth = 12\n").unwrap();
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let json = info_json(&nested);

    assert_eq!(json["config"]["max_depth"], 12);
}

#[test]
fn git_boundary_stops_search() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "max_length = 1\n").unwrap();
    let repo = tmp.path().join("repo");
    let nested = repo.join("src");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    let json = info_json(&nested);

    assert_eq!(json["config"]["max_length"], 10_000);
}

// =============================================================================
// Config File Formats
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".rich-doc.yaml"),
        "count_unit: chars\nunknown_kinds: preserve\n",
    )
    .unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["count_unit"], "chars");
    assert_eq!(json["config"]["unknown_kinds"], "preserve");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".rich-doc.json"),
        r#"{ "unknown_fields": "reject", "max_input_bytes": 4096 }"#,
    )
    .unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["unknown_fields"], "reject");
    assert_eq!(json["config"]["max_input_bytes"], 4096);
}

#[test]
fn disable_input_limit_hides_limit() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".rich-doc.toml"),
        "max_input_bytes = 4096\ndisable_input_limit = true\n",
    )
    .unwrap();

    let json = info_json(tmp.path());

    assert!(json["config"]["max_input_bytes"].is_null());
}

#[test]
fn invalid_config_value_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "count_unit = \"words\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "max_length = 280\n").unwrap();
    let explicit = tmp.path().join("override.toml");
    fs::write(&explicit, "max_length = 500\n").unwrap();

    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
            "info",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["config"]["max_length"], 500);
}

#[test]
fn env_var_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "max_length = 280\n").unwrap();

    let output = cmd()
        .env("RICH_DOC_MAX_LENGTH", "42")
        .env("RICH_DOC_COUNT_UNIT", "bytes")
        .args(["-C", tmp.path().to_str().unwrap(), "info", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["config"]["max_length"], 42);
    assert_eq!(json["config"]["count_unit"], "bytes");
}

#[test]
fn cli_flags_override_config_for_validation() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "max_depth = 1\n").unwrap();
    fs::write(
        tmp.path().join("doc.json"),
        r#"[{ "type": "numbered-list", "children": [{ "type": "list-item", "children": [] }] }]"#,
    )
    .unwrap();
    let dir = tmp.path().to_str().unwrap();

    cmd()
        .args(["-C", dir, "validate", "doc.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("depth_exceeded"));
    cmd()
        .args(["-C", dir, "validate", "doc.json", "--max-depth", "2"])
        .assert()
        .success();
}

#[test]
fn strict_nesting_from_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".rich-doc.toml"), "strict_nesting = true\n").unwrap();
    fs::write(tmp.path().join("doc.json"), r#"[{ "text": "loose" }]"#).unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "validate", "doc.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/0"));
}
