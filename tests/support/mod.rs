#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway working directory holding a task store and optional config.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join("taskboard.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// `taskboard` pointed at this board's store, run from its directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskboard_cmd();
        cmd.current_dir(self.path())
            .env("TASKBOARD_STORE", self.store_path())
            .env_remove("TASKBOARD_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run taskboard");
        serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
            panic!(
                "stdout was not JSON ({err}): {}",
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }

    /// Create a task and return its id.
    pub fn add(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let envelope = self.json(&full);
        assert_eq!(envelope["status"], "success", "add failed: {envelope}");
        envelope["data"]["id"]
            .as_str()
            .expect("task id")
            .to_string()
    }
}

pub fn taskboard_cmd() -> Command {
    Command::cargo_bin("taskboard").expect("binary")
}
