#![allow(dead_code)]

use assert_cmd::cargo_bin;
use std::path::Path;
use std::process::Command;

pub const SECRET: &str = "test-secret";

/// A `locksall` invocation isolated from the caller's environment and pointed
/// at `storage`.
pub fn locksall(storage: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("locksall"));
    cmd.env_remove("LOCKSALL_SESSION")
        .env_remove("LOCKSALL_SESSION_SECRET")
        .env_remove("EARLY_ACCESS_STORAGE_PATH")
        .arg("--storage-path")
        .arg(storage)
        .arg("--seed")
        .arg("11");
    cmd
}

/// Same as `locksall`, with a configured secret and a matching session.
pub fn authenticated(storage: &Path) -> Command {
    let mut cmd = locksall(storage);
    cmd.arg("--session-secret")
        .arg(SECRET)
        .arg("--session")
        .arg(SECRET);
    cmd
}

pub fn read_store(path: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(path).expect("Failed to read store");
    serde_json::from_str(&raw).expect("Store is not valid JSON")
}
