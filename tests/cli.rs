//! Command-line behavior of the `ndt` binary
//!
//! Only subcommands that stay on the loopback interface or never touch the
//! network are exercised here.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::net::TcpListener;
use std::process::Command;
use tempfile::TempDir;

fn ndt() -> Command {
    let mut cmd = Command::cargo_bin("ndt").unwrap();
    cmd.env_remove("NDT_SCAN_TIMEOUT_MS")
        .env_remove("NDT_PING_COUNT")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    ndt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("trace"))
        .stdout(predicate::str::contains("troubleshoot"));
}

#[test]
fn test_version_flag() {
    ndt()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_presets_table() {
    ndt()
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Web"))
        .stdout(predicate::str::contains("1-1024"));
}

#[test]
fn test_presets_json() {
    let output = ndt().args(["presets", "--json"]).output().unwrap();
    assert!(output.status.success());

    let presets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let presets = presets.as_array().unwrap();
    assert_eq!(presets.len(), 7);

    let web = presets.iter().find(|p| p["name"] == "Web").unwrap();
    let ports: Vec<u64> = web["ports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_u64().unwrap())
        .collect();
    assert!(ports.contains(&80));
    assert!(ports.contains(&443));
}

#[test]
fn test_scan_rejects_invalid_ports() {
    ndt()
        .args(["scan", "127.0.0.1", "--ports", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ports"));

    ndt()
        .args(["scan", "127.0.0.1", "--ports", "70000"])
        .assert()
        .failure();
}

#[test]
fn test_scan_loopback_json() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let open = listener.local_addr().unwrap().port();

    let output = ndt()
        .args(["scan", "127.0.0.1", "--json", "--timeout-ms", "500", "--ports"])
        .arg(open.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["host"], "127.0.0.1");
    assert_eq!(report["stopped"], false);
    assert_eq!(report["results"][0]["port"], u64::from(open));
    assert_eq!(report["results"][0]["status"], "Open");
}

#[test]
fn test_write_example_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ndt.env");

    ndt()
        .args(["config", "--write-example"])
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("# NDT_PING_COUNT="));
    assert!(content.contains("# NDT_SPEEDTEST_SERVERS="));
}

#[test]
fn test_settings_file_feeds_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ndt.env");
    fs::write(&path, "NDT_PING_COUNT=7\nNDT_SCAN_TIMEOUT_MS=250\n").unwrap();

    ndt()
        .args(["config", "--env-file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ping Count: 7"))
        .stdout(predicate::str::contains("Scan Timeout: 250ms"));
}

#[test]
fn test_invalid_settings_value_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ndt.env");
    fs::write(&path, "NDT_PING_COUNT=0\n").unwrap();

    ndt()
        .args(["presets", "--env-file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ping count must be between 1 and 100"));
}

#[test]
fn test_missing_settings_file() {
    ndt()
        .args(["presets", "--env-file", "/nonexistent/ndt.env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Settings file not found"));
}

#[cfg(not(windows))]
#[test]
fn test_windows_only_action_reports_failure() {
    ndt()
        .args(["action", "reset-winsock"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Reset Winsock"));
}

#[cfg(not(windows))]
#[test]
fn test_netbios_lookup_unsupported_off_windows() {
    ndt()
        .args(["netbios", "192.168.1.30", "--json"])
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("\"error\"")
                .and(predicate::str::contains("not supported")),
        );
}

#[test]
fn test_netbios_rejects_hostnames() {
    ndt()
        .args(["netbios", "fileserver"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid IPv4 address"));
}
