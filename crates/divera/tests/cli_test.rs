//! Integration tests for the `divera` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without any server; the account commands run against a wiremock DIVERA.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PULL: &str = "/api/v2/pull/all";
const SET_STATUS: &str = "/api/v2/statusgeber/set-status";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `divera` binary with env isolation.
///
/// Clears all `DIVERA_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
/// Stdin is an empty pipe, so nothing is ever prompted for.
fn divera_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("divera");
    cmd.env("HOME", "/tmp/divera-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/divera-cli-test-nonexistent")
        .env_remove("DIVERA_PROFILE")
        .env_remove("DIVERA_BASE_URL")
        .env_remove("DIVERA_ACCESSKEY")
        .env_remove("DIVERA_OUTPUT")
        .env_remove("DIVERA_TIMEOUT")
        .env_remove("DIVERA_DEFAULT_PROFILE")
        .env_remove("RUST_LOG")
        .write_stdin("");
    cmd
}

/// `divera_cmd` aimed at a mock server with a throwaway access key.
fn divera_against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = divera_cmd();
    cmd.args(["--accesskey", "test-key", "--base-url", &server.uri()]);
    cmd
}

/// `divera_cmd` reading its configuration from `dir`.
///
/// On Linux the config file lives at `$XDG_CONFIG_HOME/divera/config.toml`.
fn divera_with_config(dir: &tempfile::TempDir, toml: &str) -> assert_cmd::Command {
    let config_dir = dir.path().join("divera");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), toml).unwrap();

    let mut cmd = divera_cmd();
    cmd.env("HOME", dir.path()).env("XDG_CONFIG_HOME", dir.path());
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a blocking command off the async test runtime, so the mock server
/// keeps answering meanwhile.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn pull_body(ucr: i64) -> Value {
    json!({
        "success": true,
        "data": {
            "user": { "firstname": "Erika", "lastname": "Muster" },
            "status": { "status_id": 1 },
            "ucr_default": ucr,
            "ucr_active": ucr,
            "ucr": { (ucr.to_string()): { "id": ucr, "name": "FF Nord", "usergroup_id": 4 } },
            "cluster": {
                "name": "FF Nord",
                "version_id": 3,
                "status": {
                    "1": { "id": 1, "name": "Available" },
                    "2": { "id": 2, "name": "On Duty" }
                },
                "consumer": {
                    "11": { "id": 11, "firstname": "Max", "lastname": "Muster", "status": "active" },
                    "12": { "id": 12, "firstname": "Eva", "lastname": "Muster", "status": "inactive" }
                },
                "vehicle": {
                    "7": { "id": 7, "shortname": "HLF", "fmsstatus_id": 2, "lat": 52.52, "lng": 13.40 }
                }
            },
            "alarm": { "items": [], "sorting": [] }
        }
    })
}

async fn mount_pull(server: &MockServer, ucr: i64) {
    Mock::given(method("GET"))
        .and(path(PULL))
        .and(query_param("accesskey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_body(ucr)))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = divera_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    divera_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("DIVERA 24/7")
            .and(predicate::str::contains("onboard"))
            .and(predicate::str::contains("entities"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("probe-alarm")),
    );
}

#[test]
fn test_version_flag() {
    divera_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("divera"));
}

#[test]
fn test_completions_zsh() {
    divera_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    divera_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_status_subcommands_exist() {
    divera_cmd()
        .args(["status", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list").and(predicate::str::contains("set")));
}

// ── Error cases without a server ────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = divera_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_show_without_config() {
    divera_cmd()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("divera onboard"));
}

#[test]
fn test_unknown_profile() {
    divera_cmd()
        .args(["--profile", "wache", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wache"));
}

#[test]
fn test_config_show_no_config() {
    divera_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_path() {
    divera_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_invalid_output_format() {
    let output = divera_cmd()
        .args(["--output", "invalid", "show"])
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
fn test_scan_interval_out_of_range_is_usage_error() {
    divera_cmd()
        .args(["--accesskey", "k", "--scan-interval", "5", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("scan_interval"));
}

#[test]
fn test_plain_http_base_url_rejected() {
    divera_cmd()
        .args([
            "--accesskey",
            "k",
            "--base-url",
            "http://divera.example.org",
            "show",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_probe_alarm_requires_yes_without_terminal() {
    divera_cmd()
        .args(["--accesskey", "k", "probe-alarm"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_config_profiles_marks_default() {
    let dir = tempfile::tempdir().unwrap();
    let toml = r#"
default_profile = "wache"

[profiles.wache]
accesskey = "secret-one"
ucrs = [100]

[profiles.leitstelle]
accesskey = "secret-two"
"#;
    divera_with_config(&dir, toml)
        .args(["-o", "json", "config", "profiles"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"wache\"")
                .and(predicate::str::contains("leitstelle"))
                .and(predicate::str::contains("secret").not()),
        );
}

#[test]
fn test_config_use_switches_default_profile() {
    let dir = tempfile::tempdir().unwrap();
    let toml = r#"
default_profile = "wache"

[profiles.wache]
accesskey = "k"

[profiles.leitstelle]
accesskey = "k"
"#;
    divera_with_config(&dir, toml)
        .args(["config", "use", "leitstelle"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("divera").join("config.toml")).unwrap();
    assert!(
        written.contains("default_profile = \"leitstelle\""),
        "{written}"
    );
}

#[test]
fn test_config_use_unknown_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    divera_with_config(&dir, "[profiles.wache]\naccesskey = \"k\"\n")
        .args(["config", "use", "nord"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nord"));
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_show_json_summarizes_account() {
    let server = MockServer::start().await;
    mount_pull(&server, 100).await;

    let mut cmd = divera_against(&server);
    cmd.args(["--ucr", "100", "-o", "json", "show"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let summaries: Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &summaries[0];
    assert_eq!(first["ucr_id"], 100);
    assert_eq!(first["cluster"], "FF Nord");
    assert_eq!(first["helpers"], 2);
    assert_eq!(first["user_status"], "Available");
    assert_eq!(first["open_alarm"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entities_plain_lists_unique_ids() {
    let server = MockServer::start().await;
    mount_pull(&server, 100).await;

    let mut cmd = divera_against(&server);
    cmd.args(["--ucr", "100", "-o", "plain", "entities"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("divera247_100_status_active\t1"), "{stdout}");
    assert!(stdout.contains("divera247_100_vehicle_7_state\t2"), "{stdout}");
    assert!(!stdout.contains("trigger_test_alarm"), "buttons hidden without --all");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_profile_key_from_env_var() {
    let server = MockServer::start().await;
    mount_pull(&server, 100).await;

    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        "default_profile = \"wache\"\n\n[profiles.wache]\nbase_url = \"{}\"\naccesskey_env = \"FF_WACHE_KEY\"\nucrs = [100]\n",
        server.uri()
    );
    let mut cmd = divera_with_config(&dir, &toml);
    cmd.env("FF_WACHE_KEY", "test-key")
        .args(["-o", "json", "show"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let summaries: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summaries[0]["ucr_id"], 100);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_access_key_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PULL))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let mut cmd = divera_against(&server);
    cmd.arg("show");
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_set_by_name_posts_status_id() {
    let server = MockServer::start().await;
    mount_pull(&server, 100).await;
    Mock::given(method("POST"))
        .and(path(SET_STATUS))
        .and(body_json(json!({ "Status": { "id": 2 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = divera_against(&server);
    cmd.args(["--ucr", "100", "status", "set", "on duty"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_set_unknown_name_sends_nothing() {
    let server = MockServer::start().await;
    mount_pull(&server, 100).await;
    Mock::given(method("POST"))
        .and(path(SET_STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = divera_against(&server);
    cmd.args(["--ucr", "100", "status", "set", "bogus"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("On Duty"));
}
