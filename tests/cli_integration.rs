//! Integration tests for the nnue-eval CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nnue_bin() -> Command {
    Command::cargo_bin("nnue-eval").expect("binary is built")
}

#[test]
fn test_version_command() {
    nnue_bin()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nnue-eval"))
        .stdout(predicate::str::contains("0x7af32f16"));
}

#[test]
fn test_help_command() {
    nnue_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_invalid_command() {
    nnue_bin()
        .arg("invalid-command-that-does-not-exist")
        .assert()
        .failure();
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("nnue.toml");

    nnue_bin()
        .arg("init")
        .arg("--path")
        .arg(temp_dir.path())
        .assert()
        .success();

    let content = std::fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[general]"));
    assert!(content.contains("[eval]"));
    assert!(content.contains("skip_loading_eval = false"));
}

#[test]
fn test_export_then_verify_and_inspect() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let net = temp_dir.path().join("nn.bin");

    nnue_bin()
        .current_dir(temp_dir.path())
        .arg("export")
        .arg("--output")
        .arg(&net)
        .assert()
        .success();
    assert!(net.exists());

    nnue_bin()
        .current_dir(temp_dir.path())
        .arg("verify")
        .arg(&net)
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded"));

    nnue_bin()
        .arg("inspect")
        .arg("--json")
        .arg(&net)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"compatible\": true"))
        .stdout(predicate::str::contains("Features=PieceSquare"));
}

#[test]
fn test_verify_rejects_trailing_byte() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let net = temp_dir.path().join("nn.bin");

    nnue_bin()
        .current_dir(temp_dir.path())
        .args(["export", "--output"])
        .arg(&net)
        .assert()
        .success();

    let mut bytes = std::fs::read(&net).expect("read exported file");
    bytes.push(0);
    std::fs::write(&net, bytes).expect("rewrite file");

    nnue_bin()
        .current_dir(temp_dir.path())
        .arg("verify")
        .arg(&net)
        .assert()
        .failure();
}

#[test]
fn test_verify_honours_skip_loading_eval() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("nnue.toml");
    std::fs::write(&config_path, "[eval]\nskip_loading_eval = true\n").expect("write config");

    nnue_bin()
        .arg("--config")
        .arg(&config_path)
        .arg("verify")
        .arg(temp_dir.path().join("missing.bin"))
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}
