//! CLI-level tests driven through the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use aegis_cli::checkpoint::{CursorStore, ResourceKind};
use aegis_cli::config::{ENV_API_CLIENT_ID, ENV_CONFIG_DIR};

fn aegis(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aegis").unwrap();
    cmd.env(ENV_API_CLIENT_ID, "client-test")
        .env(ENV_CONFIG_DIR, config_dir.path());
    cmd
}

#[test]
fn test_help_lists_resource_subcommands() {
    Command::cargo_bin("aegis")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("alerts"))
        .stdout(predicate::str::contains("audit-log"))
        .stdout(predicate::str::contains("file-events"));
}

#[test]
fn test_clear_unknown_checkpoint_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    aegis(&dir)
        .args(["alerts", "clear-checkpoint", "nightly"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_clear_existing_checkpoint_removes_it() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-test", ResourceKind::Alert);
    store.replace("nightly", "1714564800.000000").unwrap();
    store.replace_items("nightly", &["a-1".to_string()]).unwrap();

    aegis(&dir)
        .args(["alerts", "clear-checkpoint", "nightly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checkpoint 'nightly' cleared."));

    assert!(store.get("nightly").unwrap().is_none());
}

#[test]
fn test_list_checkpoints_when_empty() {
    let dir = TempDir::new().unwrap();
    aegis(&dir)
        .args(["audit-log", "list-checkpoints"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No checkpoints found."));
}

#[test]
fn test_list_checkpoints_shows_names_not_companions() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-test", ResourceKind::FileEvent);
    store.replace("export", "{\"pageSize\":500}").unwrap();
    store
        .replace_items("export", &["fe-1".to_string()])
        .unwrap();

    aegis(&dir)
        .args(["file-events", "list-checkpoints"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("fe-1").not());
}

#[test]
fn test_overlap_without_checkpoint_is_rejected() {
    let dir = TempDir::new().unwrap();
    aegis(&dir)
        .args(["alerts", "search", "--overlap", "60"])
        .assert()
        .code(2);
}

#[test]
fn test_search_without_credentials_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("aegis").unwrap();
    cmd.env(ENV_CONFIG_DIR, dir.path())
        .env_remove(ENV_API_CLIENT_ID)
        .env_remove("AEGIS_API_SECRET")
        .args(["alerts", "search"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing credential"));
}
