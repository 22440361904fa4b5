//! # External process collaborators.
//!
//! - [`process`]: runs a command and captures combined output;
//! - [`protoc`]: [`CodeGenerator`] trait and the `protoc` backend;
//! - [`git`]: [`VersionControl`] trait and the `git` backend (stage, commit, push).
//!
//! Contract shared by all backends: exit status 0 → `Ok(combined output)`;
//! non-zero → [`ProcessError::Failed`](crate::ProcessError::Failed) with the output
//! verbatim; binary not found → [`ProcessError::Spawn`](crate::ProcessError::Spawn).

pub(crate) mod process;
mod git;
mod protoc;

pub use git::{Git, VersionControl};
pub use protoc::{CodeGenerator, CodegenRequest, Protoc};
