use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn triage_help_works() {
    Command::cargo_bin("triage")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Eisenhower-matrix"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "add",
        "list",
        "edit",
        "categorize",
        "complete",
        "archive",
        "delete",
        "stats",
        "sync",
        "data",
    ];

    for cmd in subcommands {
        Command::cargo_bin("triage")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}
