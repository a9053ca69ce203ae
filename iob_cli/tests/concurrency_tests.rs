//! Concurrency tests for the iob binary.
//!
//! These tests verify that multiple processes can safely append to and
//! read from the same dose log (file locking).

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("iob"))
}

fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("config.toml"), "").expect("Failed to write config");
    temp_dir
}

fn log_dose(data_dir: &Path, units: &str) {
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--config")
        .arg(data_dir.join("config.toml"))
        .args(["log", "--units", units])
        .assert()
        .success();
}

#[test]
fn test_concurrent_dose_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (1..=8)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || log_dose(&data_dir, &i.to_string()))
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let content = fs::read_to_string(data_dir.join("doses.jsonl")).expect("Failed to read log");
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 8, "Expected 8 doses, got {}", lines.len());

    // Every line must be a complete record
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("interleaved write");
        assert!(value["amount"].as_f64().is_some());
    }
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    log_dose(&data_dir, "1");

    let writer = {
        let data_dir = data_dir.clone();
        thread::spawn(move || {
            for _ in 0..4 {
                log_dose(&data_dir, "0.5");
            }
        })
    };

    for _ in 0..4 {
        cli()
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--config")
            .arg(data_dir.join("config.toml"))
            .args(["status", "--json"])
            .assert()
            .success();
    }

    writer.join().expect("writer thread panicked");

    let content = fs::read_to_string(data_dir.join("doses.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 5);
}
