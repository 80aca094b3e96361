use assert_cmd::Command;
use predicates::str::{contains, diff};

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.assert().success();
}

#[test]
fn runs_postage_rounds() {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.arg("run")
        .arg("tests/files/postage.mail")
        .arg("--minimal")
        .arg("--input")
        .arg("1,0,7,9,0,4")
        .arg("--memory")
        .arg("1");

    cmd.assert().success().stdout(diff("2\n-1\n8\n1\n"));
}

#[test]
fn runs_relay_with_preloaded_memory() {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.arg("run")
        .arg("tests/files/relay.mail")
        .arg("--minimal")
        .arg("--input")
        .arg("3,4,5")
        .arg("--memory")
        .arg("10");

    cmd.assert().success().stdout(diff("13\n"));
}

#[test]
fn checks_valid_program() {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.arg("check").arg("tests/files/postage.mail");

    cmd.assert().success().stdout(contains("no errors found!"));
}

#[test]
fn check_rejects_unknown_instruction() {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.arg("check").arg("tests/files/scramble.mail");

    cmd.assert().failure().stderr(contains("SCRAMBLE"));
}

#[test]
fn run_surfaces_memory_fault() {
    // relay.mail reads cell 0, which does not exist without --memory
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.arg("run")
        .arg("tests/files/relay.mail")
        .arg("--minimal")
        .arg("--input")
        .arg("1");

    cmd.assert().failure();
}

#[test]
fn run_rejects_unknown_extension() {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.arg("run").arg("tests/files/postage.txt");

    cmd.assert().failure();
}
