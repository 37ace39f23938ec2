#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Config that makes login instant and always successful
pub const FAST_CONFIG: &str = r#"
[tasks]
refresh_delay_ms = 0

[session]
login_delay_ms = 0
failure_rate = 0.0
"#;

/// A throwaway zenith data directory
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// Data directory with a config that logs in instantly
    pub fn fast() -> Self {
        let test_dir = Self::new();
        test_dir.write_config(FAST_CONFIG);
        test_dir
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        self.write_file("config.toml", contents)
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read_file(&self, rel_path: &str) -> Option<String> {
        fs::read_to_string(self.dir.path().join(rel_path)).ok()
    }

    /// `zenith --dir <tempdir>` with tracing disabled
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("zenith").expect("binary");
        cmd.env_remove("RUST_LOG")
            .env_remove("ZENITH_DIR")
            .arg("--dir")
            .arg(self.dir.path());
        cmd
    }

    pub fn login(&self) {
        self.cmd().arg("login").assert().success();
    }

    /// Run a `--json` command and return the parsed envelope
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run zenith");
        serde_json::from_slice(&output.stdout).expect("json output")
    }

    /// Add a task and return its id
    pub fn add_task(&self, title: &str, due: &str) -> String {
        let value = self.json(&["task", "add", title, "--due", due]);
        assert_eq!(value["status"], "success", "add failed: {value}");
        value["data"]["id"].as_str().expect("id").to_string()
    }
}
