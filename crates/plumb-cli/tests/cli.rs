// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Integration tests for `plumb check`.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const SERVICE: &str = "package service

import \"context\"

func Load(id string) string {
	_ = context.TODO()
	return id
}
";

fn tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("src").join("service");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("service.go"), SERVICE).unwrap();
    fs::create_dir_all(dir.path().join("modcache")).unwrap();
    dir
}

fn plumb(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plumb"))
        .arg("check")
        .arg("--root")
        .arg(dir.join("src"))
        .arg("--modcache")
        .arg(dir.join("modcache"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("PLUMB_LOG")
        .output()
        .expect("failed to run plumb")
}

#[test]
fn check_reports_and_exits_three() {
    let dir = tree();
    let out = plumb(dir.path(), &[]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(3));
    assert!(stdout.contains("warning[direct]: Plumb context"), "stdout: {}", stdout);
    assert!(stdout.contains("service/service.go:6:6"), "stdout: {}", stdout);
}

#[test]
fn json_output_lists_fixes() {
    let dir = tree();
    let out = plumb(dir.path(), &["--format", "json"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(3));
    assert!(stdout.contains("\"category\": \"direct\""), "stdout: {}", stdout);
    assert!(stdout.contains("\"new_text\": \"ctx context.Context, \""), "stdout: {}", stdout);
}

#[test]
fn fix_rewrites_and_exits_zero() {
    let dir = tree();
    let out = plumb(dir.path(), &["--fix"]);
    assert_eq!(out.status.code(), Some(0));

    let fixed = fs::read_to_string(dir.path().join("src/service/service.go")).unwrap();
    assert!(fixed.contains("func Load(ctx context.Context, id string) string {"));
    assert!(!fixed.contains("context.TODO()"));

    let again = plumb(dir.path(), &[]);
    assert_eq!(again.status.code(), Some(0));
}

#[test]
fn missing_root_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let out = plumb(dir.path(), &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error"));
}
