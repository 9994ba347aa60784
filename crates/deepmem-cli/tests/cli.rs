use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::{TempDir, tempdir};

fn deepmem(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("deepmem").unwrap();
    cmd.arg("--storage")
        .arg(dir.path().join("memories.json"))
        .env_remove("DEEPMEM_STORAGE")
        .env_remove("DEEPMEM_LOG");
    cmd
}

fn add_json(dir: &TempDir, args: &[&str]) -> Value {
    let out = deepmem(dir)
        .arg("--json")
        .arg("add")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn test_add_then_get() {
    let dir = tempdir().unwrap();
    let added = add_json(
        &dir,
        &[
            "User",
            "prefers",
            "dark",
            "mode",
            "-t",
            "preferences,ui",
            "-c",
            "user-preferences",
            "-i",
            "8",
        ],
    );
    let id = added["id"].as_str().unwrap();
    assert_eq!(added["content"], "User prefers dark mode");
    assert_eq!(added["importance"], 8);

    deepmem(&dir)
        .args(["get", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Content: User prefers dark mode"))
        .stdout(predicate::str::contains("Tags: preferences, ui"));
}

#[test]
fn test_importance_is_clamped() {
    let dir = tempdir().unwrap();
    let added = add_json(&dir, &["too", "important", "-i", "15"]);
    assert_eq!(added["importance"], 10);
    let added = add_json(&dir, &["negative", "-i", "-3"]);
    assert_eq!(added["importance"], 1);
}

#[test]
fn test_unknown_id_fails() {
    let dir = tempdir().unwrap();
    for cmd in ["get", "delete"] {
        deepmem(&dir)
            .args([cmd, "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Memory not found: nope"));
    }
    deepmem(&dir)
        .args(["update", "nope", "--content", "x"])
        .assert()
        .failure();
}

#[test]
fn test_search_ranks_matches() {
    let dir = tempdir().unwrap();
    add_json(&dir, &["Weekly standup on Monday", "-i", "10"]);
    let api = add_json(&dir, &["API key stored", "-t", "api,credentials"]);

    let out = deepmem(&dir)
        .args(["--json", "search", "api"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let results: Vec<Value> = serde_json::from_slice(&out).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], api["id"]);
}

#[test]
fn test_list_text_output() {
    let dir = tempdir().unwrap();
    add_json(&dir, &["first", "-c", "work"]);
    add_json(&dir, &["second", "-c", "home"]);

    deepmem(&dir)
        .args(["list", "-c", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 memories"))
        .stdout(predicate::str::contains("| work | first"));
}

#[test]
fn test_clear_requires_confirmation() {
    let dir = tempdir().unwrap();
    add_json(&dir, &["keep"]);

    deepmem(&dir)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--confirm"));

    deepmem(&dir)
        .args(["clear", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 removed"));
}

#[test]
fn test_export_and_merge_import() {
    let dir = tempdir().unwrap();
    let existing = add_json(&dir, &["original", "-i", "4"]);
    let export = dir.path().join("backup.json");

    deepmem(&dir)
        .arg("export")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 memories"));
    assert!(export.exists());

    let payload = serde_json::json!([
        {"id": existing["id"].clone(), "content": "replaced?"},
        {"content": "brand new"},
    ])
    .to_string();
    deepmem(&dir)
        .args(["import", payload.as_str(), "--merge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 memories"));

    deepmem(&dir)
        .args(["get", existing["id"].as_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Content: original"));
}

#[test]
fn test_import_rejects_non_array() {
    let dir = tempdir().unwrap();
    deepmem(&dir)
        .args(["import", r#"{"content": "x"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: import failed"))
        .stderr(predicate::str::contains("array"));
}

#[test]
fn test_stats_on_empty_store() {
    let dir = tempdir().unwrap();
    let out = deepmem(&dir)
        .args(["--json", "stats"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stats: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["avgImportance"], 0.0);
    assert_eq!(stats["importanceDistribution"]["10"], 0);
}

#[test]
fn test_corrupt_storage_is_not_fatal() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("memories.json"), "{ broken").unwrap();

    deepmem(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 0 memories"));
}

#[test]
fn test_storage_env_var_selects_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("from-env.json");

    Command::cargo_bin("deepmem")
        .unwrap()
        .env("DEEPMEM_STORAGE", &path)
        .env_remove("DEEPMEM_LOG")
        .args(["add", "routed", "by", "env"])
        .assert()
        .success();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("routed by env"));
}
