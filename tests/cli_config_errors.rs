//! Configuration failures must fail fast, before any side effect.

#![cfg(unix)]

mod common;

use std::fs;

use common::{stderr_str, TestEnv};

#[test]
fn missing_config_fails_with_no_side_effects() {
    let env = TestEnv::new();
    fs::remove_file(&env.config).unwrap();

    let output = env.run();

    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("configuration file not found"));

    // Fail fast: no log file, no project directory, no stub ever invoked.
    assert!(!env.log_file().exists());
    assert!(!env.project_dir().exists());
    assert!(env.calls().is_empty());
}

#[test]
fn missing_secrets_fails_with_no_side_effects() {
    let env = TestEnv::new();
    fs::remove_file(&env.secrets).unwrap();

    let output = env.run();

    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("configuration file not found"));
    assert!(!env.log_file().exists());
    assert!(env.calls().is_empty());
}

#[test]
fn malformed_config_reports_invalid() {
    let env = TestEnv::new();
    fs::write(&env.config, "[github\nbroken").unwrap();

    let output = env.run();

    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("invalid configuration"));
    assert!(env.calls().is_empty());
}

#[test]
fn malformed_secrets_reports_invalid() {
    let env = TestEnv::new();
    fs::write(&env.secrets, "= not toml").unwrap();

    let output = env.run();

    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("invalid configuration"));
}

#[test]
fn incomplete_config_names_the_field() {
    let env = TestEnv::new();
    let stripped = fs::read_to_string(&env.config)
        .unwrap()
        .replace("branch = \"main\"\n", "");
    fs::write(&env.config, stripped).unwrap();

    let output = env.run();

    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("missing required field 'github.branch'"));
    assert!(env.calls().is_empty());
}

#[test]
fn empty_field_counts_as_incomplete() {
    let env = TestEnv::new();
    let emptied = fs::read_to_string(&env.config)
        .unwrap()
        .replace("app_name = \"demo\"", "app_name = \"\"");
    fs::write(&env.config, emptied).unwrap();

    let output = env.run();

    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("missing required field 'pm2.app_name'"));
}

#[test]
fn unknown_config_key_is_a_warning_not_an_error() {
    let env = TestEnv::new();
    env.append_config("\n[extras]\nunused = true\n");

    let output = env.run();

    assert!(output.status.success());
    assert!(env.log_contents().contains("WARN: unknown configuration key"));
}
