//! # Cluster jobs.
//!
//! Concrete [`Task`](crate::Task)s backed by external processes, one package each:
//!
//! | Job               | Backend                  | Directory                          |
//! |-------------------|--------------------------|------------------------------------|
//! | [`GenerationJob`] | [`CodeGenerator`] per language | `<proto_dir>/<pkg>/proto` → `<output_dir>/<pkg>/<lang>` |
//! | [`ValidationJob`] | [`CodeGenerator::validate`] | `<proto_dir>/<pkg>/proto`       |
//! | [`PushJob`]       | [`VersionControl::publish`] | `<proto_dir>/<pkg>`              |
//!
//! Every job returns a one-line summary on success.
//!
//! [`CodeGenerator`]: crate::CodeGenerator
//! [`CodeGenerator::validate`]: crate::CodeGenerator::validate
//! [`VersionControl::publish`]: crate::VersionControl::publish

mod generation;
mod push;
mod validation;

pub use generation::GenerationJob;
pub use push::PushJob;
pub use validation::ValidationJob;

use std::path::{Path, PathBuf};

use crate::error::TaskError;

/// `.proto` files directly inside `dir`, sorted by path.
pub(crate) async fn proto_files(dir: &Path) -> Result<Vec<PathBuf>, TaskError> {
    let context = || format!("failed to read {}", dir.display());
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| TaskError::io(context(), e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TaskError::io(context(), e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "proto") && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(TaskError::Invalid {
            reason: format!("no .proto files in {}", dir.display()),
        });
    }
    files.sort();
    Ok(files)
}
