//! Integration tests for the `seedctl` CLI binary.
//!
//! Offline tests cover argument parsing, help, completions and error
//! exit codes. End-to-end tests run the binary against a mocked
//! Transmission RPC endpoint.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const RPC: &str = "/transmission/rpc";

/// Build a [`Command`] for the `seedctl` binary with env isolation.
///
/// Clears all `SEEDCTL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn seedctl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("seedctl");
    cmd.env("HOME", "/tmp/seedctl-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/seedctl-cli-test-nonexistent")
        .env_remove("SEEDCTL_PROFILE")
        .env_remove("SEEDCTL_URL")
        .env_remove("SEEDCTL_USERNAME")
        .env_remove("SEEDCTL_PASSWORD")
        .env_remove("SEEDCTL_OUTPUT")
        .env_remove("SEEDCTL_INSECURE")
        .env_remove("SEEDCTL_TIMEOUT")
        .env_remove("SEEDCTL_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--no-rc");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn success(arguments: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": "success", "arguments": arguments }))
}

async fn daemon_with_torrents() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({ "method": "torrent-get" })))
        .respond_with(success(json!({
            "torrents": [
                { "id": 1, "name": "ubuntu-24.04.iso", "status": 6, "percentDone": 1.0,
                  "sizeWhenDone": 6_000_000_000_i64, "leftUntilDone": 0, "uploadRatio": 1.7,
                  "magnetLink": "magnet:?xt=urn:btih:ubuntu" },
                { "id": 2, "name": "debian-12.iso", "status": 4, "percentDone": 0.25,
                  "sizeWhenDone": 700_000_000, "leftUntilDone": 525_000_000,
                  "uploadRatio": 0.1 }
            ]
        })))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || seedctl_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(uri: &str, rest: &[&str]) -> Vec<String> {
    let mut all = vec!["--url".to_owned(), uri.to_owned()];
    all.extend(rest.iter().map(|s| (*s).to_owned()));
    all
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    seedctl_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Transmission")
                .and(predicate::str::contains("--url"))
                .and(predicate::str::contains("--output")),
        );
}

#[test]
fn test_version_flag() {
    seedctl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seedctl"));
}

#[test]
fn test_no_command_prints_overview() {
    seedctl_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("list").and(predicate::str::contains("filter")));
}

#[test]
fn test_help_filter_topic() {
    seedctl_cmd()
        .args(["help", "filter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("~"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    seedctl_cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    seedctl_cmd()
        .args(["--completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_settings_listing_needs_no_daemon() {
    seedctl_cmd()
        .args(["-o", "plain", "settings", "poll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("poll.interval=5"));
}

#[test]
fn test_fields_listing() {
    seedctl_cmd()
        .args(["-o", "plain", "fields", "tracker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("domain"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_unknown_command_is_usage_error() {
    let output = seedctl_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("frobnicate"), "Expected command name in:\n{text}");
}

#[test]
fn test_filter_syntax_error_points_at_field() {
    let output = seedctl_cmd()
        .args(["ls", "nosuchfield>3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("filter_syntax") && text.contains("nosuchfield"),
        "Expected filter diagnostic in:\n{text}"
    );
}

#[test]
fn test_invalid_setting_value() {
    let output = seedctl_cmd()
        .args(["set", "poll.interval", "soon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_output_format() {
    let output = seedctl_cmd()
        .args(["--output", "invalid", "ls"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unreachable_daemon_is_connection_error() {
    let output = seedctl_cmd()
        .args(["--url", "http://127.0.0.1:9", "--timeout", "2", "ls"])
        .output()
        .unwrap();
    assert!(
        matches!(output.status.code(), Some(7 | 8)),
        "Expected connection or timeout exit code, got {:?}",
        output.status.code()
    );
}

#[test]
fn test_missing_explicit_rc_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("seedctl");
    cmd.env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["--rc", "/nonexistent/seedctl-rc", "help"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("seedctl-rc"));
}

#[test]
fn test_rc_file_seeds_settings() {
    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("rc");
    std::fs::write(&rc, "# test rc\nset poll.interval 2\n").unwrap();
    let mut cmd = cargo_bin_cmd!("seedctl");
    cmd.env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("--rc")
        .arg(&rc)
        .args(["-o", "plain", "settings", "poll.interval"])
        .assert()
        .success()
        .stdout(predicate::str::contains("poll.interval=2"));
}

// ── Against a mocked daemon ─────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_json_against_daemon() {
    let server = daemon_with_torrents().await;
    let output = run(args(&server.uri(), &["-o", "json", "ls", "-s", "name", "iso"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let torrents: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = torrents
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["debian-12.iso", "ubuntu-24.04.iso"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_plain_filters_ids() {
    let server = daemon_with_torrents().await;
    let output = run(args(&server.uri(), &["-o", "plain", "ls", "leeching"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_reports_each_torrent() {
    let server = daemon_with_torrents().await;
    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-stop",
            "arguments": { "ids": [1] }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["--color", "never", "stop", "ubuntu"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stopped ubuntu-24.04.iso"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_without_filter_is_a_usage_error() {
    let server = daemon_with_torrents().await;
    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({ "method": "torrent-stop" })))
        .respond_with(success(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["stop"])).await;
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("missing argument FILTER"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_magnet_prints_links() {
    let server = daemon_with_torrents().await;
    let output = run(args(&server.uri(), &["uri", "ubuntu"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "magnet:?xt=urn:btih:ubuntu"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_details_plain_lists_fields() {
    let server = daemon_with_torrents().await;
    let output = run(args(&server.uri(), &["-o", "plain", "details", "id=2"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l == "name=debian-12.iso"), "{stdout}");
    assert!(stdout.lines().any(|l| l == "limit-ratio=global"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_daemon_refusal_exits_with_partial_failure() {
    let server = daemon_with_torrents().await;
    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({ "method": "torrent-verify" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": "torrent is busy", "arguments": {} })),
        )
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["--color", "never", "verify", "debian"])).await;
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("torrent is busy"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_match_exits_not_found() {
    let server = daemon_with_torrents().await;
    let output = run(args(&server.uri(), &["start", "fedora"])).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chain_skips_after_failure_with_and() {
    let server = daemon_with_torrents().await;
    let output = run(args(
        &server.uri(),
        &["-o", "plain", "start", "fedora", "&", "ls"],
    ))
    .await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(output.stdout.is_empty());
}
