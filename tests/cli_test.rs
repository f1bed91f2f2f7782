//! Command-line tests for the `webqa` binary
//!
//! Each test runs the binary from an empty temporary directory with the
//! credential variables removed, so neither a local `.env` nor the
//! developer's environment leaks in.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CREDENTIAL_VARS: [&str; 8] = [
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "GOOGLE_API_KEY",
    "GOOGLE_SEARCH_ENGINE_ID",
    "WEBQA_MODEL",
    "WEBQA_MAX_STEPS",
    "WEBQA_RECURSION_LIMIT",
    "WEBQA_SEARCH_BASE_URL",
];

fn webqa(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("webqa").expect("binary is built");
    cmd.current_dir(workdir.path());
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    webqa(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("context"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn test_tools_without_search_credentials() {
    let dir = TempDir::new().unwrap();
    webqa(&dir)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("calculator"))
        .stdout(predicate::str::contains("datecalculator"))
        .stdout(predicate::str::contains("web_search").not());
}

#[test]
fn test_tools_json_with_search_credentials() {
    let dir = TempDir::new().unwrap();
    let output = webqa(&dir)
        .args(["tools", "--json"])
        .env("GOOGLE_API_KEY", "test-key")
        .env("GOOGLE_SEARCH_ENGINE_ID", "test-cx")
        .output()
        .unwrap();
    assert!(output.status.success());

    let tools: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["calculator", "datetime", "datecalculator", "web_search"]
    );
    assert_eq!(
        tools[0]["parameters"]["properties"]["expression"]["type"],
        "string"
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_config_dir, config_path) = common::temp_config_file("agent:\n  loop_window: 1\n");
    webqa(&dir)
        .arg("--config")
        .arg(&config_path)
        .arg("tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("loop_window"));
}

#[test]
fn test_ask_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    webqa(&dir)
        .args(["ask", "What is 2 + 2?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}

#[test]
fn test_context_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    webqa(&dir)
        .args(["context", "Who?", "--file", "missing.txt"])
        .env("ANTHROPIC_API_KEY", "test-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read context file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_json_runs_calculator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("IMPORTANT: The previous tool call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::anthropic_reply(
            "THOUGHT: The calculator returned 392\nFINAL ANSWER: 15 * 23 + 47 = 392",
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::anthropic_reply(
            "THOUGHT: I need to calculate this\nTOOL: calculator\nINPUT: 15 * 23 + 47",
        )))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = webqa(&dir)
        .args(["ask", "--json", "What is 15 * 23 + 47?"])
        .env("ANTHROPIC_API_KEY", "test-key")
        .env("ANTHROPIC_BASE_URL", server.uri())
        .output()
        .unwrap();
    assert!(output.status.success());

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["answer"], "15 * 23 + 47 = 392");
    assert_eq!(outcome["steps"][0]["tool"], "calculator");
    assert_eq!(outcome["steps"][0]["observation"], "Result: 392");
    assert!(outcome["error"].is_null());
}
