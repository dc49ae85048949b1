//! CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn sift() -> Command {
    Command::cargo_bin("sift").expect("binary")
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path.to_string_lossy().into_owned()
}

#[test]
fn extract_echoes_a_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "hw.py", "X = 1\ny = 2\n");

    sift()
        .args(["extract", &path])
        .assert()
        .success()
        .stdout("X = 1\ny = 2\n");
}

#[test]
fn extract_flattens_a_notebook() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = serde_json::json!({
        "cells": [{"cell_type": "code", "metadata": {}, "source": ["Z = 9\n"]}]
    })
    .to_string();
    let path = write_file(&dir, "hw.ipynb", &document);

    sift()
        .args(["extract", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Z = 9"));
}

#[test]
fn sanitize_lists_declarations_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(
        &dir,
        "hw.py",
        "import os\nx = 1\nX = 2\ndef f():\n    pass\n",
    );

    sift()
        .args(["sanitize", &path])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("import os")
                .and(predicate::str::contains("constant X"))
                .and(predicate::str::contains("def f"))
                .and(predicate::str::contains("constant x").not()),
        );
}

#[test]
fn load_prints_bindings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "hw.py", "LIMIT = 2 + 3\ndef f():\n    pass\n");

    sift()
        .args(["load", &path])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("namespace hw.py")
                .and(predicate::str::contains("LIMIT = 5"))
                .and(predicate::str::contains("f = <function f>")),
        );
}

#[test]
fn load_respects_module_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "hw.py", "X = 1\n");

    sift()
        .args(["load", &path, "--module-name", "submission"])
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace submission"));
}

#[test]
fn unfiltered_load_keeps_plain_assignments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "hw.py", "x = 1\nif x:\n    pass\n");

    sift()
        .args(["load", &path, "--unfiltered", "--module-name", "m"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x = 1"));
}

#[test]
fn unknown_extension_fails_with_a_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "hw.txt", "X = 1\n");

    sift()
        .args(["extract", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown extension"));
}

#[test]
fn syntax_errors_fail_with_the_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "hw.py", "X = 'unclosed\n");

    sift()
        .args(["load", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}
