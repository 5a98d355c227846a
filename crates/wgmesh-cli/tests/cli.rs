//! End-to-end tests for the `wgmesh` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wgmesh_config::{KeyMaterial, WgConfig};

fn wgmesh() -> Command {
    let mut cmd = Command::cargo_bin("wgmesh").expect("wgmesh binary");
    cmd.env_remove("WGMESH_WG")
        .env_remove("WGMESH_WG_QUICK")
        .env_remove("WGMESH_PUBLIC_IP_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_node(dir: &Path, name: &str, address: &str) -> PathBuf {
    let path = dir.join(format!("{name}.conf"));
    let keys = KeyMaterial::generate(false);
    std::fs::write(
        &path,
        format!(
            "[Interface]\n# Name = {name}\nAddress = {address}\n\
             ListenPort = 51820\nPrivateKey = {}\n",
            keys.private_key
        ),
    )
    .expect("write");
    path
}

fn reread(path: &Path) -> WgConfig {
    WgConfig::parse(&std::fs::read_to_string(path).expect("read")).expect("parse")
}

#[test]
fn show_prints_summary_without_private_key() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_node(dir.path(), "hub", "10.0.0.1/24");
    let private_key = reread(&path).interface.private_key;

    wgmesh()
        .arg("show")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Interface hub"))
        .stdout(predicate::str::contains("No peers."))
        .stdout(predicate::str::contains(private_key).not());
}

#[test]
fn show_json() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_node(dir.path(), "hub", "10.0.0.1/24");

    let output = wgmesh()
        .args(["--format", "json", "show"])
        .arg(&path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["listen_port"], 51820);
}

#[test]
fn malformed_config_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.conf");
    std::fs::write(&path, "[Peer]\nPublicKey = K\n").expect("write");

    wgmesh()
        .arg("show")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn add_peer_then_show() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_node(dir.path(), "hub", "10.0.0.1/24");

    wgmesh()
        .arg("add-peer")
        .arg(&path)
        .args([
            "--public-key",
            "PEERKEY",
            "--allowed-ips",
            "10.0.0.2/32,10.0.1.0/24",
            "--endpoint",
            "peer.example.com:51820",
            "--name",
            "laptop",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("added"));

    wgmesh()
        .arg("show")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("PEERKEY"))
        .stdout(predicate::str::contains("10.0.0.2/32, 10.0.1.0/24"));
}

#[test]
fn pair_dry_run_with_native_keys() {
    let dir = TempDir::new().expect("tempdir");
    let a = write_node(dir.path(), "a", "10.0.0.1/24");
    let b = write_node(dir.path(), "b", "10.0.0.2/24");
    let before = std::fs::read_to_string(&a).expect("read");

    wgmesh()
        .args(["pair", "--native-keys", "--dry-run"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));
    assert_eq!(std::fs::read_to_string(&a).expect("read"), before);
}

#[test]
fn pair_writes_both_files() {
    let dir = TempDir::new().expect("tempdir");
    let a = write_node(dir.path(), "a", "10.0.0.1/24");
    let b = write_node(dir.path(), "b", "10.0.0.2/24");

    wgmesh()
        .args(["pair", "--native-keys", "--keepalive", "25"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    let (a, b) = (reread(&a), reread(&b));
    assert_eq!(a.peers.len(), 1);
    assert_eq!(b.peers.len(), 1);
    assert_eq!(a.peers[0].allowed_ips, vec!["10.0.0.2/32"]);
    assert_eq!(b.peers[0].name.as_deref(), Some("a"));
}

#[test]
fn check_reports_missing_wg() {
    wgmesh()
        .args(["check", "--wg", "/nonexistent/wgmesh-test/wg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
