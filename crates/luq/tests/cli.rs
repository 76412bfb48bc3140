//! CLI integration tests for luq commands.
//!
//! These tests focus on exit codes and the presence of key output,
//! not exact formatting which may change.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to get a luq command.
fn luq() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("luq").unwrap()
}

mod parse {
    use super::*;

    #[test]
    fn prints_ast_tree() {
        luq()
            .args(["parse", "a OR b AND c"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Or").and(predicate::str::contains("And")));
    }

    #[test]
    fn json_output_is_valid() {
        let assert = luq()
            .args(["parse", "--json", "title:dog^2"])
            .assert()
            .success();

        let value: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
        assert!(value.get("Term").is_some());
    }

    #[test]
    fn error_renders_caret_context() {
        luq()
            .args(["parse", "(a b"])
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("closing parenthesis")
                    .and(predicate::str::contains("^")),
            );
    }

    #[test]
    fn and_flag_changes_implicit_join() {
        luq()
            .args(["parse", "jakarta apache"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Or"));

        luq()
            .args(["parse", "--and", "jakarta apache"])
            .assert()
            .success()
            .stdout(predicate::str::contains("And"));
    }

    #[test]
    fn leading_wildcard_flag() {
        luq().args(["parse", "*term"]).assert().failure();

        luq()
            .args(["parse", "--leading-wildcard", "*term"])
            .assert()
            .success();
    }

    #[test]
    fn max_depth_flag() {
        luq()
            .args(["parse", "--max-depth", "2", "(((a)))"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("resource limit"));
    }

    #[test]
    fn multiple_queries_are_labelled() {
        luq()
            .args(["parse", "a", "b"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("query: a").and(predicate::str::contains("query: b")),
            );
    }
}

mod tokens {
    use super::*;

    #[test]
    fn dumps_token_stream() {
        luq()
            .args(["tokens", "title:dog^2"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Word")
                    .and(predicate::str::contains("Colon"))
                    .and(predicate::str::contains("Carat")),
            );
    }

    #[test]
    fn json_output_is_valid() {
        let assert = luq()
            .args(["tokens", "--json", "a OR b"])
            .assert()
            .success();

        let value: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn lex_errors_fail() {
        luq()
            .args(["tokens", "\"unterminated"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unterminated"));
    }
}

mod check {
    use super::*;

    #[test]
    fn reports_failures_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        fs::write(&path, "a AND b\n\"unterminated\n").unwrap();

        luq()
            .args(["check", path.to_str().unwrap()])
            .assert()
            .failure()
            .stdout(
                predicate::str::contains("ok    a AND b")
                    .and(predicate::str::contains("FAIL  \"unterminated"))
                    .and(predicate::str::contains("1 passed, 1 failed")),
            );
    }

    #[test]
    fn passes_clean_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        fs::write(&path, "# fixtures\n\njakarta apache\ntitle:guide^2\n").unwrap();

        luq()
            .args(["check", path.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 passed, 0 failed"));
    }

    #[test]
    fn reads_stdin_with_dash() {
        luq()
            .args(["check", "-"])
            .write_stdin("a OR b\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("1 passed, 0 failed"));
    }

    #[test]
    fn missing_file_fails() {
        luq()
            .args(["check", "does-not-exist.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read"));
    }
}
