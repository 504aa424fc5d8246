mod support;

use chrono::{Duration, Utc};
use predicates::str::contains;
use serde_json::{json, Value};

use support::{triage_cmd, TestStore};

fn parse_stdout(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("json envelope")
}

fn capture(messages: Value) -> String {
    serde_json::to_string_pretty(&messages).expect("capture json")
}

#[test]
fn sync_imports_candidates_uncategorized() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    let recent = (Utc::now() - Duration::hours(2)).to_rfc3339();
    let path = store.write_file(
        "mail.json",
        &capture(json!([
            {
                "subject": "Re: BDC-101 deploy failed",
                "sender": "ci@example.com",
                "date": recent,
                "body": "rollback needed, see also BM-7"
            },
            {
                "subject": "BDC-101 still failing",
                "sender": "ci@example.com",
                "date": recent,
                "body": ""
            }
        ])),
    )?;

    let output = triage_cmd(&store)
        .args(["sync", "run", "--from"])
        .arg(&path)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = parse_stdout(&output);

    // BDC-101 deduplicated across the capture, BM-7 found in a body
    assert_eq!(value["data"]["discovered"], 2);
    assert_eq!(value["data"]["added"].as_array().unwrap().len(), 2);

    let output = triage_cmd(&store)
        .args(["list", "--quadrant", "uncategorized", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tasks = parse_stdout(&output);
    let titles: Vec<&str> = tasks["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["BDC-101 deploy failed", "BDC-101 deploy failed"]);
    let tickets: Vec<&str> = tasks["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["ticket"].as_str().unwrap())
        .collect();
    assert_eq!(tickets, vec!["BDC-101", "BM-7"]);
    Ok(())
}

#[test]
fn newer_capture_replaces_older_import() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    let older = (Utc::now() - Duration::hours(6)).to_rfc3339();
    let newer = (Utc::now() - Duration::hours(1)).to_rfc3339();

    let first = store.write_file(
        "first.json",
        &capture(json!([
            {"subject": "BDC-55 flaky test", "sender": "qa@example.com", "date": older}
        ])),
    )?;
    triage_cmd(&store)
        .args(["sync", "run", "--from"])
        .arg(&first)
        .assert()
        .success();

    let second = store.write_file(
        "second.json",
        &capture(json!([
            {"subject": "Re: BDC-55 now blocking release", "sender": "qa@example.com", "date": newer}
        ])),
    )?;
    let output = triage_cmd(&store)
        .args(["sync", "run", "--from"])
        .arg(&second)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = parse_stdout(&output);
    assert_eq!(
        value["data"]["duplicates_resolved"],
        json!(["BDC-55"])
    );

    let output = triage_cmd(&store)
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tasks = parse_stdout(&output);
    assert_eq!(tasks["data"].as_array().unwrap().len(), 1);
    assert_eq!(tasks["data"][0]["title"], "BDC-55 now blocking release");

    // Replaying the stale capture changes nothing
    triage_cmd(&store)
        .args(["sync", "run", "--from"])
        .arg(&first)
        .assert()
        .success();
    let output = triage_cmd(&store)
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tasks = parse_stdout(&output);
    assert_eq!(tasks["data"].as_array().unwrap().len(), 1);
    assert_eq!(tasks["data"][0]["title"], "BDC-55 now blocking release");
    Ok(())
}

#[test]
fn failed_sync_records_attempt_without_committing() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    triage_cmd(&store)
        .args(["sync", "run", "--from", "/nonexistent/mail.json"])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("Ticket source unreachable"));

    let output = triage_cmd(&store)
        .args(["sync", "status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = parse_stdout(&output);
    assert!(value["data"]["last_sync_attempt"].is_string());
    assert!(value["data"]["last_successful_sync"].is_null());
    assert_eq!(value["data"]["failed_sync_attempts"], 1);

    let output = triage_cmd(&store)
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(parse_stdout(&output)["data"].as_array().unwrap().is_empty());
    Ok(())
}

#[test]
fn window_reports_configured_look_back() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    let output = triage_cmd(&store)
        .args(["sync", "window", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = parse_stdout(&output);
    assert_eq!(value["data"]["initial_sync_days"], 7);
    assert_eq!(value["data"]["safety_net_hours"], 24);
    assert!(value["data"]["window_start"].is_string());
    Ok(())
}

#[test]
fn custom_ticket_pattern_limits_import() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;
    store.write_config("[sync]\nticket_pattern = '\\bBM-\\d+\\b'\n")?;

    let recent = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let path = store.write_file(
        "mail.json",
        &capture(json!([
            {"subject": "BDC-1 ignored, BM-2 imported", "sender": "a@example.com", "date": recent}
        ])),
    )?;

    let output = triage_cmd(&store)
        .args(["sync", "run", "--from"])
        .arg(&path)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = parse_stdout(&output);
    let added = value["data"]["added"].as_array().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["ticket"], "BM-2");
    Ok(())
}
