//! Binary invocation tests (assert_cmd).

mod common;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;

/// A command isolated from the caller's environment and config files.
fn gmail_watch_cmd(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("gmail-watch");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("GCP_PROJECT")
        .env_remove("PUBSUB_TOPIC")
        .env_remove("GMAIL_ID")
        .env_remove("GMAIL_API_BASE")
        .env_remove("GMAIL_WATCH_TOKEN_FILE")
        .env_remove("GMAIL_WATCH_CLIENT_SECRETS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_version() {
    let (_tmp, dir) = common::temp_dir();
    gmail_watch_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gmail-watch"));
}

#[test]
fn test_cli_help() {
    let (_tmp, dir) = common::temp_dir();
    gmail_watch_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Register Gmail push notifications"));
}

#[test]
fn test_missing_mailbox_fails_before_auth() {
    let (_tmp, dir) = common::temp_dir();
    gmail_watch_cmd(&dir)
        .env("GCP_PROJECT", "my-project")
        .env("PUBSUB_TOPIC", "gmail-events")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GMAIL_ID is not set"));
}

#[test]
fn test_missing_project_fails() {
    let (_tmp, dir) = common::temp_dir();
    gmail_watch_cmd(&dir)
        .env("PUBSUB_TOPIC", "gmail-events")
        .env("GMAIL_ID", "me")
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GCP_PROJECT is not set"));
}

#[test]
fn test_invalid_label_filter_rejected() {
    let (_tmp, dir) = common::temp_dir();
    gmail_watch_cmd(&dir)
        .args(["--label-filter-behavior", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("label-filter-behavior"));
}

#[test]
fn test_auth_without_client_secrets_fails() {
    let (_tmp, dir) = common::temp_dir();
    gmail_watch_cmd(&dir)
        .arg("auth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("client_credentials.json not found"));
}

#[test]
fn test_malformed_config_file_fails() {
    let (_tmp, dir) = common::temp_dir();
    std::fs::write(dir.join(".gmail-watch.toml"), "[watch\nproject = ").unwrap();
    gmail_watch_cmd(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn test_auth_reports_valid_cached_token() {
    let (_tmp, dir) = common::temp_dir();
    common::write_token(
        &dir,
        "ya29.cached",
        Some("1//refresh"),
        &common::future_expiry(),
        "https://oauth2.googleapis.com/token",
    );
    gmail_watch_cmd(&dir)
        .arg("auth")
        .assert()
        .success()
        .stdout(predicate::str::contains("still valid"));
}

#[test]
fn test_watch_end_to_end_with_config_file() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/gmail/v1/users/me/watch")
        .match_header("authorization", "Bearer ya29.cached")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "labelIds": ["INBOX"],
            "topicName": "projects/file-project/topics/gmail-events"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"historyId":"4242","expiration":"1700000000000"}"#)
        .create();

    let (_tmp, dir) = common::temp_dir();
    common::write_token(
        &dir,
        "ya29.cached",
        Some("1//refresh"),
        &common::future_expiry(),
        "https://oauth2.googleapis.com/token",
    );
    std::fs::write(
        dir.join(".gmail-watch.toml"),
        "[watch]\nproject = \"file-project\"\ntopic = \"gmail-events\"\n",
    )
    .unwrap();

    gmail_watch_cmd(&dir)
        .env("GMAIL_ID", "me")
        .env("GMAIL_API_BASE", server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"historyId\": \"4242\""));

    mock.assert();
}

#[test]
fn test_stop_end_to_end() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/gmail/v1/users/me/stop")
        .with_status(204)
        .create();

    let (_tmp, dir) = common::temp_dir();
    common::write_token(
        &dir,
        "ya29.cached",
        Some("1//refresh"),
        &common::future_expiry(),
        "https://oauth2.googleapis.com/token",
    );

    let api_base = server.url();
    gmail_watch_cmd(&dir)
        .args(["stop", "--user", "me", "--api-base", api_base.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped push notifications for me"));

    mock.assert();
}
