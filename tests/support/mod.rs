//! Test support utilities for opden integration tests.
//!
//! Provides an isolated test environment and a fake `op` executable so the
//! binary can be exercised end to end without the real 1Password CLI.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Test environment with an isolated temp directory.
///
/// No process-global state is mutated; child processes use
/// `.current_dir()` so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory for the test; fake `op` scripts live here.
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Create an opden command with a scrubbed environment.
    ///
    /// `OPDEN_OP_PATH` and `OP_ACCOUNT` are removed so ambient developer
    /// configuration cannot leak into assertions.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("opden").expect("failed to find opden binary");
        cmd.env_remove("OPDEN_OP_PATH");
        cmd.env_remove("OP_ACCOUNT");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Write a fake `op` executable with the given shell body.
    ///
    /// The script runs with the test directory as its working directory, so
    /// bodies can drop marker files to prove (or disprove) invocation.
    #[cfg(unix)]
    pub fn fake_op(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join("op");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write fake op");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("failed to chmod fake op");
        path
    }

    /// Create an opden command wired to a fake `op` with the given body.
    #[cfg(unix)]
    pub fn cmd_with_fake(&self, body: &str) -> Command {
        let op = self.fake_op(body);
        let mut cmd = self.cmd();
        cmd.arg("--op-path").arg(op);
        cmd
    }

    /// Whether a file exists inside the test directory.
    pub fn has_file(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Absolute path of a file inside the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(Path::new(name))
    }
}
