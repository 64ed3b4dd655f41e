//! CLI integration tests for logseq-md
//!
//! Every test runs the binary inside its own temporary directory with the
//! config locations pointed at it, so user configuration never leaks in.

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const IMAGE: &str = "22222222-2222-2222-2222-222222222222";
const REF_PAGE: &str = "11111111-1111-1111-1111-111111111111";

/// Get a command instance for the logseq-md binary, isolated in `dir`
fn md_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("logseq-md"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("LOGSEQ_MD_GRAPH");
    cmd
}

/// Writes a small graph snapshot and returns its path
fn write_graph(dir: &Path) -> PathBuf {
    let snapshot = serde_json::json!({
        "graph_root": "/graphs/notes",
        "current": "Daily Notes",
        "pages": [
            {
                "uuid": "p1",
                "name": "daily notes",
                "original-name": "Daily Notes",
                "blocks": [
                    {"uuid": "b1", "content": "TODO Read [[11111111-1111-1111-1111-111111111111]]"},
                    {"uuid": "b2", "content": "Figure: [[22222222-2222-2222-2222-222222222222]]",
                     "children": [{"uuid": "b3", "content": "caption #draft"}]}
                ]
            },
            {"uuid": REF_PAGE, "original-name": "Rust Book"}
        ],
        "assets": [
            {
                "uuid": IMAGE,
                "title": "Architecture",
                "properties": {"logseq.property.asset/type": "png"}
            }
        ]
    });

    let path = dir.join("graph.json");
    fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_export_prints_markdown() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    md_cmd(dir.path())
        .args(["export", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Daily Notes\n\nRead Rust Book"))
        .stdout(predicate::str::contains(format!(
            "Figure: ![Architecture](assets/{}.png)",
            IMAGE
        )))
        .stdout(predicate::str::contains("caption\n"))
        .stdout(predicate::str::contains("#draft").not());
}

#[test]
fn test_export_flags_override_defaults() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    md_cmd(dir.path())
        .args(["export", "--no-page-name", "--nested", "--include-tags", "--asset-path", "img"])
        .arg("--graph")
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Read Rust Book"))
        .stdout(predicate::str::contains(format!("(img/{}.png)", IMAGE)))
        .stdout(predicate::str::contains("- caption #draft"));
}

#[test]
fn test_export_json_format() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    let output = md_cmd(dir.path())
        .args(["--format", "json", "export", "--graph"])
        .arg(&graph)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["title"], "Daily Notes");
    assert!(value["markdown"].as_str().unwrap().contains("Rust Book"));
    assert_eq!(value["assets"][IMAGE]["type"], "png");
}

#[test]
fn test_export_to_file() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());
    let out = dir.path().join("daily.md");

    md_cmd(dir.path())
        .args(["export", "--graph"])
        .arg(&graph)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported Daily Notes"));

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("# Daily Notes"));
    assert!(written.ends_with('\n'));
}

#[test]
fn test_export_selected_page() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    md_cmd(dir.path())
        .args(["export", "--page", "rust book", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout("# Rust Book\n");
}

#[test]
fn test_export_focused_block() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    md_cmd(dir.path())
        .args(["export", "--block", "b2", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout("caption\n");
}

#[test]
fn test_export_without_active_page_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    md_cmd(dir.path())
        .args(["export", "--page", "Nowhere", "--graph"])
        .arg(&graph)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("NO_ACTIVE_PAGE"));
}

#[test]
fn test_missing_graph_fails() {
    let dir = TempDir::new().unwrap();

    md_cmd(dir.path())
        .args(["export", "--graph", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read graph snapshot"));
}

#[test]
fn test_yaml_snapshot() {
    let dir = TempDir::new().unwrap();
    let graph = dir.path().join("graph.yaml");
    fs::write(
        &graph,
        "current: p1\npages:\n  - uuid: p1\n    original-name: From YAML\n    blocks:\n      - uuid: b1\n        content: Hello from YAML\n",
    )
    .unwrap();

    md_cmd(dir.path())
        .args(["export", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout("# From YAML\n\nHello from YAML\n");
}

// =============================================================================
// Asset Tests
// =============================================================================

#[test]
fn test_assets_lists_registry() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());

    md_cmd(dir.path())
        .args(["assets", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{}\tpng\tassets/{}.png\t/graphs/notes/assets/{}.png\tArchitecture",
            IMAGE, IMAGE, IMAGE
        )));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_project_config_applies() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());
    fs::write(
        dir.path().join(".logseq-md.toml"),
        "[export]\nincludePageName = false\nasset_path = \"media\"\n",
    )
    .unwrap();

    md_cmd(dir.path())
        .args(["export", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Read Rust Book"))
        .stdout(predicate::str::contains(format!("(media/{}.png)", IMAGE)));
}

#[test]
fn test_explicit_config_wins_over_project() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path());
    fs::write(
        dir.path().join(".logseq-md.toml"),
        "[export]\ninclude_page_name = false\n",
    )
    .unwrap();
    let explicit = dir.path().join("explicit.toml");
    fs::write(&explicit, "[export]\ninclude_page_name = true\n").unwrap();

    md_cmd(dir.path())
        .args(["export", "--graph"])
        .arg(&graph)
        .arg("--config")
        .arg(&explicit)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Daily Notes"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".logseq-md.toml"),
        "[export]\nasset_path = \"/abs/assets\"\n",
    )
    .unwrap();

    md_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("asset_path must be relative"));
}

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();

    md_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no config files found"))
        .stdout(predicate::str::contains("asset_path = \"assets/\""))
        .stdout(predicate::str::contains("flatten_nested = true"));
}

#[test]
fn test_config_init_project() {
    let dir = TempDir::new().unwrap();

    md_cmd(dir.path())
        .args(["config", "init", "--project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = fs::read_to_string(dir.path().join(".logseq-md.toml")).unwrap();
    assert!(written.contains("[export]"));

    md_cmd(dir.path())
        .args(["config", "init", "--project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    md_cmd(dir.path())
        .args(["config", "init", "--project", "--force"])
        .assert()
        .success();
}
