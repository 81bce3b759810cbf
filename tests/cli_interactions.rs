//! CLI behavior tests
//!
//! These run the real binary and check flags, configuration errors and
//! startup failures without performing any speed test.

use predicates::prelude::*;
use std::fs;
use assert_cmd::Command;
use std::time::Duration;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "LISTEN_ADDRESS", "LISTEN_PORT", "SERVE_MODE", "TIMEOUT_SECONDS",
    "SOURCE_ADDRESS", "SPEEDTEST_SERVERS", "STATIC_DIR", "ENABLE_COLOR", "LOG_FORMAT",
];

/// Command running in an empty directory with a clean environment
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("speedtest-exporter").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_version_flags() {
    let dir = TempDir::new().unwrap();

    for flag in ["--version", "-v"] {
        create_test_cmd(&dir)
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--address"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--source-address"));
}

#[test]
fn test_invalid_flag_values() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--mode", "both"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid serve mode"));

    create_test_cmd(&dir)
        .args(["--timeout", "0"])
        .assert()
        .failure();

    create_test_cmd(&dir)
        .arg("--no-such-flag")
        .assert()
        .failure();
}

#[test]
fn test_invalid_address_is_config_error() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--address", "not-an-ip"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[CONFIG]"))
        .stderr(predicate::str::contains("Invalid listen address"));
}

#[test]
fn test_env_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "SPEEDTEST_SERVERS=ftp://speed.example.net\n").unwrap();

    create_test_cmd(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HTTP or HTTPS"));
}

#[test]
fn test_cli_overrides_invalid_env() {
    let dir = TempDir::new().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    // LISTEN_ADDRESS is invalid but --address wins, so startup reaches bind
    create_test_cmd(&dir)
        .env("LISTEN_ADDRESS", "not-an-ip")
        .args(["--address", "127.0.0.1", "--port", &port])
        .timeout(Duration::from_secs(10))
        .assert()
        .code(2);
}

#[test]
fn test_port_in_use_exits_with_bind_error() {
    let dir = TempDir::new().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    create_test_cmd(&dir)
        .args(["--address", "127.0.0.1", "--port", &port])
        .timeout(Duration::from_secs(10))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("[BIND]"))
        .stderr(predicate::str::contains("Startup help"));
}
