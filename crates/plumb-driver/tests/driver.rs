// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Driver tests over temporary source trees.

use std::fs;
use std::path::Path;

use plumb_diagnostics::Category;
use plumb_driver::{DriverConfig, DriverError};
use tempfile::TempDir;

const PRODUCER: &str = "package producer

import \"context\"

func Dial(addr string) error {
	_ = context.TODO()
	return nil
}
";

const CONSUMER: &str = "package main

import \"multi/producer\"

func main() {
	_ = producer.Dial(\"localhost\")
}
";

const FIXED_PRODUCER: &str = "package producer

import \"context\"

func Dial(ctx context.Context, addr string) error {
	return nil
}
";

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// A source tree with a producer and a consumer, plus an empty module cache.
fn tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/multi/producer/producer.go", PRODUCER);
    write(dir.path(), "src/multi/consumer/main.go", CONSUMER);
    fs::create_dir_all(dir.path().join("modcache")).unwrap();
    dir
}

fn config(dir: &TempDir) -> DriverConfig {
    DriverConfig::with_root(dir.path().join("src")).with_modcache(dir.path().join("modcache"))
}

#[test]
fn reports_without_touching_files() {
    let dir = tree();
    let report = plumb_driver::run(&config(&dir)).unwrap();

    let categories: Vec<_> = report.diagnostics.iter().map(|d| d.category).collect();
    assert_eq!(categories.len(), 2);
    assert!(categories.contains(&Category::Direct));
    assert!(categories.contains(&Category::Continuation));
    assert_eq!(report.units, 2, "built-in packages are not analyzed");
    assert_eq!(report.files_fixed, 0);

    let producer = fs::read_to_string(dir.path().join("src/multi/producer/producer.go")).unwrap();
    assert_eq!(producer, PRODUCER);
    let diag = &report.diagnostics[0];
    assert!(report.source(&diag.file).is_some());
}

#[test]
fn applies_fixes_across_packages() {
    let dir = tree();
    let report = plumb_driver::run(&config(&dir).with_apply(true)).unwrap();
    assert_eq!(report.files_fixed, 2);

    let consumer = fs::read_to_string(dir.path().join("src/multi/consumer/main.go")).unwrap();
    assert!(consumer.contains("\tctx := context.Background()\n"));
    assert!(consumer.contains("producer.Dial(ctx, \"localhost\")"));
    assert!(consumer.contains("\"context\""));

    let again = plumb_driver::run(&config(&dir)).unwrap();
    assert!(again.diagnostics.is_empty());
}

#[test]
fn patterns_select_reported_packages() {
    let dir = tree();
    let config = config(&dir).with_patterns(vec!["./multi/consumer".to_string()]);
    let report = plumb_driver::run(&config).unwrap();

    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].category, Category::Continuation);
    assert_eq!(report.units, 2);
}

#[test]
fn facts_file_carries_over_between_runs() {
    let dir = tree();
    let facts = dir.path().join("facts.json");
    plumb_driver::run(&config(&dir).with_facts_path(&facts)).unwrap();
    assert!(fs::read_to_string(&facts).unwrap().contains("multi/producer.Dial"));

    // The producer was fixed by hand; its callers still need plumbing
    write(dir.path(), "src/multi/producer/producer.go", FIXED_PRODUCER);
    let report = plumb_driver::run(&config(&dir).with_facts_path(&facts)).unwrap();
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].category, Category::Continuation);

    let without = plumb_driver::run(&config(&dir)).unwrap();
    assert!(without.diagnostics.is_empty());
}

#[test]
fn malformed_facts_file_is_ignored() {
    let dir = tree();
    let facts = dir.path().join("facts.json");
    fs::write(&facts, "{ not json").unwrap();

    let report = plumb_driver::run(&config(&dir).with_facts_path(&facts)).unwrap();
    assert_eq!(report.diagnostics.len(), 2);
    assert!(fs::read_to_string(&facts).unwrap().contains("multi/producer.Dial"));
}

#[test]
fn modcache_code_is_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "modcache/example.com/lib/lib.go",
        "package lib\n\nimport \"context\"\n\nfunc Get() {\n\t_ = context.TODO()\n}\n",
    );
    write(
        dir.path(),
        "src/app/app.go",
        "package app\n\nimport \"example.com/lib\"\n\nfunc Run() {\n\tlib.Get()\n}\n",
    );

    let report = plumb_driver::run(&config(&dir)).unwrap();
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.units, 2);
}

#[test]
fn missing_source_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = plumb_driver::run(&config(&dir)).unwrap_err();
    assert!(matches!(err, DriverError::Package(_)));
}

#[test]
fn unparsable_units_are_skipped_with_their_importers() {
    let dir = tree();
    write(dir.path(), "src/other/other.go", "package other\n\nfunc F(x int) {\n\tswitch x {\n\t}\n}\n");
    write(
        dir.path(),
        "src/user/user.go",
        "package user\n\nimport (\n\t\"context\"\n\t\"other\"\n)\n\nfunc G() {\n\tother.F(1)\n\t_ = context.TODO()\n}\n",
    );

    let report = plumb_driver::run(&config(&dir)).unwrap();
    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.units, 2);
    assert!(report.skipped["other"].contains("other.go"), "{:?}", report.skipped);
    assert!(report.skipped["user"].contains("\"other\""), "{:?}", report.skipped);
    assert!(report.diagnostics.iter().all(|d| !d.file.ends_with("user.go")));
}

#[test]
fn block_comments_do_not_stop_analysis() {
    let dir = tree();
    write(
        dir.path(),
        "src/licensed/licensed.go",
        "/*\n * Copyright header.\n */\n\npackage licensed\n\nimport \"context\"\n\nfunc Get() /* inline */ {\n\t_ = context.TODO()\n}\n",
    );

    let config = config(&dir).with_patterns(vec!["licensed".to_string()]);
    let report = plumb_driver::run(&config).unwrap();
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].category, Category::Direct);
}
