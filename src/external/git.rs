//! # Version-control backend.
//!
//! [`VersionControl::publish`] runs three steps in a working directory:
//!
//! ```text
//! stage  ── ok ──► commit ── ok ──► push ── ok ──► Ok(output of all steps)
//!   │                │                │
//!   └── err ─────────┴── err ─────────┴── err ──► Err(first failing step)
//! ```
//!
//! A failing step is reported on its own; the remaining steps are not attempted.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProcessError;
use crate::external::process;

/// Stage / commit / push capability.
#[async_trait]
pub trait VersionControl: Send + Sync + 'static {
    /// Stages every change under `dir`.
    async fn stage(&self, dir: &Path) -> Result<String, ProcessError>;

    /// Commits staged changes with `message`.
    async fn commit(&self, dir: &Path, message: &str) -> Result<String, ProcessError>;

    /// Pushes the current branch.
    async fn push(&self, dir: &Path) -> Result<String, ProcessError>;

    /// Stage, commit and push, stopping at the first failure.
    async fn publish(&self, dir: &Path, message: &str) -> Result<String, ProcessError> {
        let mut out = self.stage(dir).await?;
        out.push_str(&self.commit(dir, message).await?);
        out.push_str(&self.push(dir).await?);
        Ok(out)
    }
}

/// `git` backed [`VersionControl`].
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
}

impl Default for Git {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Git {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn step(&self, dir: &Path, step: &str, args: &[&str]) -> Result<String, ProcessError> {
        let label = format!("{} {step}", self.program);
        let res = process::run(
            &label,
            Command::new(&self.program)
                .arg(step)
                .args(args)
                .current_dir(dir),
        )
        .await;
        if let Err(err) = &res {
            tracing::error!(dir = %dir.display(), step, error = %err, "version control step failed");
        }
        res
    }
}

#[async_trait]
impl VersionControl for Git {
    async fn stage(&self, dir: &Path) -> Result<String, ProcessError> {
        self.step(dir, "add", &["."]).await
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<String, ProcessError> {
        self.step(dir, "commit", &["-m", message]).await
    }

    async fn push(&self, dir: &Path) -> Result<String, ProcessError> {
        self.step(dir, "push", &[]).await
    }
}
