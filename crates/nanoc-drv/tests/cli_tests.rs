//! Black-box CLI tests driving the `nanoc` binary directly.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nanoc() -> Command {
    Command::cargo_bin("nanoc").expect("nanoc binary should build")
}

#[test]
fn help_mentions_usage() {
    nanoc().arg("--help").assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_prints_something() {
    nanoc().arg("--version").assert().success().stdout(predicate::str::contains("nanoc"));
}

#[test]
fn compiles_a_file_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("main.c");
    std::fs::write(&input, "int main(void) { return 2; }").unwrap();

    nanoc()
        .arg(&input)
        .arg("--target")
        .arg("linux")
        .assert()
        .success()
        .stdout(predicate::str::contains("main:"));
}

#[test]
fn compiles_a_file_to_an_output_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("main.c");
    let output = dir.path().join("main.s");
    std::fs::write(&input, "int main(void) { return 0; }").unwrap();

    nanoc().arg(&input).arg("-o").arg(&output).assert().success();
    assert!(output.exists());
}

#[test]
fn print_tokens_stops_before_assembly() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("main.c");
    std::fs::write(&input, "int main(void) { return 0; }").unwrap();

    nanoc()
        .arg(&input)
        .arg("--print-tokens")
        .assert()
        .success()
        .stdout(predicate::str::contains("Eof").or(predicate::str::contains("Int")));
}

#[test]
fn reads_from_standard_input_when_given_a_dash() {
    nanoc()
        .arg("-")
        .write_stdin("int main(void) { return 1; }")
        .assert()
        .success()
        .stdout(predicate::str::contains("main:"));
}

#[test]
fn a_lexical_error_exits_nonzero_with_a_stage_prefixed_message() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.c");
    std::fs::write(&input, "int main(void) { return `; }").unwrap();

    nanoc().arg(&input).assert().failure().code(1).stderr(predicate::str::contains("Lexer Error"));
}

#[test]
fn an_unknown_target_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("main.c");
    std::fs::write(&input, "int main(void) { return 0; }").unwrap();

    nanoc().arg(&input).arg("--target").arg("plan9").assert().failure();
}
