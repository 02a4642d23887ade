use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn ticker_help_works() {
    Command::cargo_bin("ticker")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("personal task tracker"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        vec!["init"],
        vec!["add"],
        vec!["list"],
        vec!["show"],
        vec!["toggle"],
        vec!["rm"],
        vec!["groups"],
        vec!["depends"],
        vec!["depends", "clear"],
    ];

    for cmd in subcommands {
        Command::cargo_bin("ticker")
            .expect("binary")
            .args(&cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn missing_subcommand_fails() {
    Command::cargo_bin("ticker")
        .expect("binary")
        .assert()
        .failure();
}
