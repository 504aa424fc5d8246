use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway data directory for one test's board
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[allow(dead_code)]
    pub fn write_file(&self, rel_path: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[allow(dead_code)]
    pub fn write_config(&self, contents: &str) -> Result<PathBuf> {
        self.write_file("triage.toml", contents)
    }
}

/// Command pinned to the test store's data directory
pub fn triage_cmd(store: &TestStore) -> Command {
    let mut cmd = Command::cargo_bin("triage").expect("binary");
    cmd.arg("--data-dir").arg(store.path());
    cmd
}

/// Run `triage add` and return the new task's id
#[allow(dead_code)]
pub fn add_task(store: &TestStore, title: &str, extra_args: &[&str]) -> String {
    let output = triage_cmd(store)
        .arg("add")
        .arg(title)
        .args(extra_args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("add json");
    value["data"]["id"].as_str().expect("task id").to_string()
}
