//! Integration tests for the CLI binary.
//!
//! This test is registered as a [[test]] in the cis-publisher-cli crate
//! so that CARGO_BIN_EXE_cis-publish is available.

use std::path::Path;
use std::process::{Command, Output};

const SKELETON: &str = include_str!("../fixtures/skeleton.json");

/// Get a Command pointing to the `cis-publish` binary, isolated from the
/// caller's environment.
fn cis_publish(store: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cis-publish"));
    cmd.env_remove("PUBLISHER_SIGNING_KEY")
        .env_remove("PUBLISHER_NAME")
        .env_remove("DRY_RUN")
        .env_remove("CIS_STORE")
        .arg("--store")
        .arg(store);
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A store holding the skeleton and one active profile.
fn seeded_store() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let skeleton_path = dir.path().join("skeleton-in.json");
    std::fs::write(&skeleton_path, SKELETON).unwrap();

    let mut person: serde_json::Value = serde_json::from_str(SKELETON).unwrap();
    person["primary_email"]["value"] = "jdoe@example.com".into();
    person["primary_username"]["value"] = "jdoe".into();
    person["user_id"]["value"] = "ad|Example-LDAP|jdoe".into();
    person["active"]["value"] = true.into();
    let person_path = dir.path().join("jdoe-in.json");
    std::fs::write(&person_path, serde_json::to_vec(&person).unwrap()).unwrap();

    let output = cis_publish(&dir.path().join("store"))
        .arg("import")
        .arg("--skeleton")
        .arg(&skeleton_path)
        .arg(&person_path)
        .output()
        .expect("failed to execute cis-publish import");
    assert_success(&output, "import");
    dir
}

fn generate_key() -> String {
    let dir = tempfile::tempdir().unwrap();
    let output = cis_publish(dir.path())
        .arg("keygen")
        .output()
        .expect("failed to execute cis-publish keygen");
    assert_success(&output, "keygen");
    stdout(&output)
        .lines()
        .find_map(|line| line.strip_prefix("PUBLISHER_SIGNING_KEY="))
        .expect("keygen prints a signing key")
        .to_string()
}

#[test]
fn cli_responds_to_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = cis_publish(dir.path())
        .arg("--help")
        .output()
        .expect("failed to execute cis-publish --help");
    assert_success(&output, "cis-publish --help");
    assert!(stdout(&output).contains("Usage"));
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let dir = tempfile::tempdir().unwrap();
    let output = cis_publish(dir.path())
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute cis-publish");
    assert!(!output.status.success());
}

#[test]
fn cli_show_profile() {
    let dir = seeded_store();
    let output = cis_publish(&dir.path().join("store"))
        .args(["show", "--email", "jdoe@example.com"])
        .output()
        .expect("failed to execute cis-publish show");
    assert_success(&output, "show");

    let flat: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(flat["primary_username"], "jdoe");
    assert!(flat["identities"].is_object());
}

#[test]
fn cli_show_unknown_profile_fails() {
    let dir = seeded_store();
    let output = cis_publish(&dir.path().join("store"))
        .args(["show", "--email", "nobody@example.com"])
        .output()
        .expect("failed to execute cis-publish show");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn cli_set_publishes_change() {
    let dir = seeded_store();
    let store = dir.path().join("store");
    let key = generate_key();

    let output = cis_publish(&store)
        .env("PUBLISHER_SIGNING_KEY", &key)
        .args([
            "set",
            "--email",
            "jdoe@example.com",
            "--field",
            "pgp_public_keys",
            "--value",
            r#"{"k1": "ABC"}"#,
            "--display-level",
            "staff",
        ])
        .output()
        .expect("failed to execute cis-publish set");
    assert_success(&output, "set");
    let out = stdout(&output);
    assert!(out.contains("pgp_public_keys: +k1"), "got: {out}");
    assert!(out.contains("Published 1 change(s)"), "got: {out}");

    // the same write again is a no-op
    let output = cis_publish(&store)
        .env("PUBLISHER_SIGNING_KEY", &key)
        .args([
            "set",
            "--email",
            "jdoe@example.com",
            "--field",
            "pgp_public_keys",
            "--value",
            r#"{"k1": "ABC"}"#,
        ])
        .output()
        .expect("failed to execute cis-publish set");
    assert_success(&output, "second set");
    assert!(stdout(&output).contains("No changes"));
}

#[test]
fn cli_dry_run_env_is_presence_only() {
    let dir = seeded_store();
    let store = dir.path().join("store");

    for value in ["1", "yes", "", "false"] {
        let output = cis_publish(&store)
            .env("DRY_RUN", value)
            .args(["show", "--email", "jdoe@example.com"])
            .output()
            .expect("failed to execute cis-publish show");
        assert_success(&output, &format!("show with DRY_RUN={value:?}"));
    }

    let key = generate_key();
    let output = cis_publish(&store)
        .env("PUBLISHER_SIGNING_KEY", &key)
        .env("DRY_RUN", "1")
        .args([
            "set",
            "--email",
            "jdoe@example.com",
            "--field",
            "fun_title",
            "--value",
            "Chief Tinkerer",
            "--display-level",
            "public",
        ])
        .output()
        .expect("failed to execute cis-publish set");
    assert_success(&output, "dry-run set");
    let out = stdout(&output);
    assert!(out.contains("Dry run: 1 change(s) not published"), "got: {out}");

    let output = cis_publish(&store)
        .args(["show", "--email", "jdoe@example.com"])
        .output()
        .expect("failed to execute cis-publish show");
    let flat: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(flat["fun_title"].is_null(), "dry run wrote to the store");
}

#[test]
fn cli_set_without_key_fails() {
    let dir = seeded_store();
    let output = cis_publish(&dir.path().join("store"))
        .args([
            "set",
            "--email",
            "jdoe@example.com",
            "--field",
            "fun_title",
            "--value",
            "Chief Tinkerer",
            "--display-level",
            "public",
        ])
        .output()
        .expect("failed to execute cis-publish set");
    assert!(!output.status.success());
}

#[test]
fn cli_sync_from_dump() {
    let dir = seeded_store();
    let dump_path = dir.path().join("dump.json");
    std::fs::write(
        &dump_path,
        serde_json::to_vec(&serde_json::json!({
            "jdoe@example.com": {
                "distinguished_name": "mail=jdoe@example.com,o=com,dc=example",
                "user_id": "jdoe",
                "groups": ["team_moco"],
                "ssh_public_keys": ["ssh-ed25519 AAAA jdoe"],
                "posix": {"uid": "jdoe"}
            },
            "ghost@example.com": {
                "distinguished_name": "mail=ghost@example.com,o=com,dc=example",
                "user_id": "ghost"
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let output = cis_publish(&dir.path().join("store"))
        .env("PUBLISHER_SIGNING_KEY", generate_key())
        .args(["sync", "--workers", "2", "--dump"])
        .arg(&dump_path)
        .output()
        .expect("failed to execute cis-publish sync");
    assert_success(&output, "sync");
    let out = stdout(&output);
    assert!(out.contains("1 accounts synchronized."), "got: {out}");
    assert!(out.contains("mismatches: ghost@example.com"), "got: {out}");
}

#[test]
fn cli_check_empty() {
    let dir = seeded_store();
    let output = cis_publish(&dir.path().join("store"))
        .args(["check-empty", "--user-id", "ad|Example-LDAP|jdoe"])
        .output()
        .expect("failed to execute cis-publish check-empty");
    assert_success(&output, "check-empty");
    assert!(stdout(&output).contains("jdoe@example.com is empty"));
}
