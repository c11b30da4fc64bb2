//! Smoke tests for hubkit-cli
//!
//! These tests run the built binary end to end without network access.

use std::io::Write;
use std::process::{Command, Output};

fn hubkit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hubkit"))
        .args(args)
        .output()
        .expect("Failed to execute hubkit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn keygen() -> (String, String) {
    let output = hubkit(&["keygen", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    (
        value["secret"].as_str().unwrap().to_string(),
        value["address"].as_str().unwrap().to_string(),
    )
}

fn write_config(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(json.as_bytes()).unwrap();
    file
}

/// Test that the CLI can show help
#[test]
fn test_cli_help() {
    let output = hubkit(&["--help"]);
    let text = stdout(&output);
    assert!(output.status.success());
    for command in ["keygen", "challenge", "token", "verify"] {
        assert!(text.contains(command), "Help should mention '{}'", command);
    }
}

#[test]
fn test_keygen_is_deterministic_from_secret() {
    let (secret, address) = keygen();
    let output = hubkit(&["keygen", "--json", "--secret", &secret]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["address"], address.as_str());
    assert_eq!(address.len(), 40);
}

#[test]
fn test_challenge_lists_current_and_legacy() {
    let output = hubkit(&["challenge", "hub.example.com"]);
    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains("blockstack_storage_please_sign"));
    assert!(text.contains("2018"));
}

#[test]
fn test_token_then_verify() {
    let (secret, address) = keygen();
    let config = write_config(r#"{"serverName": "hub.example.com"}"#);

    let output = hubkit(&[
        "token",
        "--secret",
        &secret,
        "--server-name",
        "hub.example.com",
        "--scope",
        "putFilePrefix:public/",
    ]);
    assert!(output.status.success());
    let header = stdout(&output).trim().to_string();
    assert!(header.starts_with("bearer v1:"));

    let config_path = config.path().to_str().unwrap();
    let output = hubkit(&[
        "verify",
        "--config",
        config_path,
        "--address",
        &address,
        "--header",
        &header,
        "--path",
        "public/a.txt",
    ]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains(&format!("dry-run://{}/public/a.txt", address)));

    let output = hubkit(&[
        "verify",
        "--config",
        config_path,
        "--address",
        &address,
        "--header",
        &header,
        "--path",
        "private/a.txt",
    ]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_verify_rejects_revoked_token() {
    let (secret, address) = keygen();
    let config = write_config(r#"{"serverName": "hub.example.com"}"#);

    let output = hubkit(&[
        "token",
        "--secret",
        &secret,
        "--server-name",
        "hub.example.com",
        "--issued-at",
        "1000",
    ]);
    let header = stdout(&output).trim().to_string();

    let output = hubkit(&[
        "verify",
        "--config",
        config.path().to_str().unwrap(),
        "--address",
        &address,
        "--header",
        &header,
        "--floor",
        "2000",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("AuthTokenTimestamp"));
}

#[test]
fn test_legacy_token_for_wrong_server_rejected() {
    let (secret, address) = keygen();
    let config = write_config(r#"{"serverName": "hub.example.com"}"#);

    let output = hubkit(&[
        "token",
        "--secret",
        &secret,
        "--server-name",
        "other.example.com",
        "--legacy",
    ]);
    let header = stdout(&output).trim().to_string();
    assert!(header.starts_with("bearer "));

    let output = hubkit(&[
        "verify",
        "--config",
        config.path().to_str().unwrap(),
        "--address",
        &address,
        "--header",
        &header,
    ]);
    assert_eq!(output.status.code(), Some(1));
}
