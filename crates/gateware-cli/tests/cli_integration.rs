//! Integration tests for the gateware-sim CLI.

use anyhow as _;
use clap as _;
use gateware_cli as _;
use gateware_core as _;
use serde as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing as _;
use tracing_subscriber as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("gateware-sim")
}

fn create_temp_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn gateware_sim(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .output()
        .expect("failed to run gateware-sim")
}

#[test]
fn phase_step_matches_reference_value() {
    let output = gateware_sim(&["phase-step", "--clock-hz", "1000000", "--frequency", "440"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1889786\n");
}

#[test]
fn inexact_pll_warns_on_stderr() {
    let output = gateware_sim(&["pll", "--input-mhz", "16", "--output-mhz", "33.3"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0 65 5\n33 MHz\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("PLL: requested 33.3 MHz, got 33 MHz").count(), 1);
    assert!(stderr.contains("WARN"));
}

#[test]
fn out_of_range_pll_exits_with_error() {
    let output = gateware_sim(&["pll", "--input-mhz", "5", "--output-mhz", "50"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"));
    assert!(stderr.contains("no PLL configuration"));
}

#[test]
fn simulate_with_pll_config_reports_json() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_temp_file(
        temp_dir.path(),
        "board.json",
        br#"{ "nco": { "width": 10, "samples": 256 }, "pll": { "output_mhz": 48.0 } }"#,
    );

    let output = gateware_sim(&[
        "simulate",
        "--ticks",
        "1000",
        "--config",
        config.to_str().unwrap(),
        "--json",
    ]);
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["stats"]["sync_ticks"], 1000);
    assert_eq!(summary["stats"]["signal_ticks"], 3000);
    assert_eq!(summary["pll"]["coefficients"]["divf"], 47);
    assert_eq!(summary["led"], true);
    assert_eq!(summary["firmware_done"], true);
}

#[test]
fn simulate_accepts_a_firmware_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let firmware = create_temp_file(temp_dir.path(), "firmware.bin", &[0x93, 0x00, 0x40]);

    let output = gateware_sim(&[
        "simulate",
        "--ticks",
        "50",
        "--firmware",
        firmware.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sync ticks:     50"));
    assert!(stdout.contains("led:            on"));
}

#[test]
fn malformed_config_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_temp_file(temp_dir.path(), "bad.json", b"{ not json");

    let output = gateware_sim(&[
        "simulate",
        "--ticks",
        "1",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid config"));
}

#[test]
fn invalid_design_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_temp_file(
        temp_dir.path(),
        "odd.json",
        br#"{ "nco": { "samples": 1000 } }"#,
    );

    let output = gateware_sim(&[
        "simulate",
        "--ticks",
        "1",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid simulator configuration"));
}
