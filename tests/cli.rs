//! End-to-end tests for the `home-registry` binary against the local store.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Run inside `dir` with a local store under it and no inherited configuration.
fn registry(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("home-registry");
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("FIRESTORE_ACCESS_TOKEN")
        .env_remove("FIRESTORE_EMULATOR_HOST")
        .env_remove("FIRESTORE_PROJECT_ID")
        .env_remove("GOOGLE_APPLICATION_CREDENTIALS")
        .env_remove("HOMEGRAPH_API_KEY")
        .env_remove("HOMEGRAPH_API_KEY_FILE")
        .env_remove("HOMEGRAPH_BASE_URL")
        .env("REGISTRY_STORE", "local")
        .env("REGISTRY_LOCAL_ROOT", dir.join("registry"));
    cmd
}

/// Run a command that must succeed and return the key from `<collection>/<key> was added`.
fn add(dir: &Path, args: &[&str]) -> String {
    let output = registry(dir).args(args).output().unwrap();
    assert!(output.status.success(), "{args:?}: {}", String::from_utf8_lossy(&output.stderr));
    let line = String::from_utf8(output.stdout).unwrap();
    let path = line.trim().strip_suffix(" was added").unwrap().to_string();
    path.rsplit('/').next().unwrap().to_string()
}

#[test]
fn no_subcommand_prints_usage_and_exits_255() {
    let dir = TempDir::new().unwrap();
    registry(dir.path())
        .assert()
        .code(255)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn user_device_round_trip() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();

    let u1 = add(d, &["add_user", "--name", "alice"]);
    let d1 = add(
        d,
        &["add_device", "--manufacturer", "X", "--model", "Y", "--type", "LIGHT", "--traits", "OnOff"],
    );
    let r1 = add(d, &["add_remote", "--mac-addr", "AA:BB", "--type", "IR"]);
    add(d, &["add_user_device", "--device-id", &d1, "--user-id", &u1, "--remote-id", &r1]);

    let output = registry(d)
        .args(["get_user_device", "--user-id", &u1, "--full"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["deviceId"], d1.as_str());
    assert_eq!(records[0]["userId"], u1.as_str());
    assert_eq!(records[0]["remoteId"], r1.as_str());
    assert_eq!(records[0]["userReference"]["name"], "alice");

    registry(d)
        .args(["get_user", "--user-id", &u1])
        .assert()
        .success()
        .stdout(format!("users/{u1}: alice\n"));
}

#[test]
fn dangling_binding_fails_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let u1 = add(dir.path(), &["add_user"]);

    registry(dir.path())
        .args(["add_user_device", "--device-id", "nope", "--user-id", &u1, "--remote-id", "r"])
        .assert()
        .code(1)
        .stdout("")
        .stderr("nope cannot be referenced, check Devices\n");
}

#[test]
fn remote_code_upsert_updates_in_place() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();
    let d1 = add(
        d,
        &["add_device", "--manufacturer", "X", "--model", "Y", "--type", "AC", "--traits", "OnOff"],
    );

    for value in ["power=on", "power=off"] {
        registry(d)
            .args(["add_remote_code", "--device-id", &d1, "--remote-type", "IR", "--action", "OnOff"])
            .args(["--values", value])
            .assert()
            .success();
    }

    let stored = d.join("registry").join("devices").join(&d1).join("IR").join("OnOff.json");
    assert!(stored.is_file());
    registry(d)
        .args(["get_remote_code", "--device-id", &d1])
        .assert()
        .success()
        .stdout(format!("devices/{d1}/IR/OnOff: power=off\n"));

    registry(d)
        .args(["add_remote_code", "--device-id", &d1, "--remote-type", "IR", "--action", "OnOff"])
        .args(["--values", "mode=cool", "--values", "broken"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken"));
    registry(d)
        .args(["get_remote_code", "--device-id", &d1, "--remote-type", "IR"])
        .assert()
        .stdout(predicate::str::contains("mode").not());
}

#[test]
fn deleting_missing_record_fails() {
    let dir = TempDir::new().unwrap();
    registry(dir.path())
        .args(["del_device", "--device-id", "ghost"])
        .assert()
        .code(1)
        .stderr("devices/ghost does not exist\n");
}

#[test]
fn env_file_supplies_configuration() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("from-env-file");
    std::fs::write(
        dir.path().join("registry.env"),
        format!("REGISTRY_LOCAL_ROOT={}\n", root.display()),
    )
    .unwrap();

    let mut cmd = registry(dir.path());
    cmd.env_remove("REGISTRY_LOCAL_ROOT")
        .args(["--env-file", "registry.env", "add_user"])
        .assert()
        .success();
    assert!(root.join("users").is_dir());
}

#[test]
fn invalid_ids_are_reported_as_missing() {
    let dir = TempDir::new().unwrap();
    registry(dir.path())
        .args(["del_user", "--user-id", "a/b"])
        .assert()
        .code(1)
        .stderr("users/a/b does not exist\n");
    registry(dir.path())
        .args(["get_device", "--device-id", ".."])
        .assert()
        .success()
        .stdout("");
}
