//! Error types used by the protovisor runtime, its tasks and collaborators.
//!
//! This module defines the error taxonomy:
//!
//! - [`TaskError`]: errors raised by individual task executions.
//! - [`AggregateError`]: the composite error returned by a cluster run when some tasks failed.
//! - [`ProcessError`]: an external process (protoc, git) could not be started or exited non-zero.
//! - [`RegistryError`]: errors from a [`Registry`](crate::Registry) backend.
//! - [`RegistrationError`]: failures of the registration workflow, tagged with the failing state.
//! - [`ConfigError`]: configuration could not be loaded.
//!
//! Most types provide `as_label` for logs.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::registration::RegistrationState;

/// Separator placed after each failure message inside an [`AggregateError`].
pub const AGGREGATE_SEPARATOR: &str = "; ";

/// # Errors produced by an external process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The binary could not be started (missing, not executable, ...).
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited with a non-zero status.
    #[error("'{program}' exited with {}", status_text(.status))]
    Failed {
        /// Program that was invoked.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        status: Option<i32>,
        /// Combined stdout + stderr, verbatim.
        output: String,
    },
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl ProcessError {
    /// Captured diagnostic output, if the process got far enough to produce any.
    pub fn output(&self) -> Option<&str> {
        match self {
            ProcessError::Spawn { .. } => None,
            ProcessError::Failed { output, .. } => Some(output),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Spawn { .. } => "process_spawn",
            ProcessError::Failed { .. } => "process_failed",
        }
    }
}

/// # Errors produced by task execution.
///
/// A task error is captured at the task boundary by the
/// [`ClusterManager`](crate::ClusterManager); it never aborts sibling tasks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Missing or malformed input.
    #[error("invalid input: {reason}")]
    Invalid {
        /// What was wrong with the input.
        reason: String,
    },

    /// Reading or writing a file failed.
    #[error("{context}: {source}")]
    Io {
        /// What the task was doing.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An external process failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Generic failure with a message.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Io`].
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TaskError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use protovisor::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.as_label(), "task_failed");
    /// assert_eq!(err.to_string(), "disk full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Invalid { .. } => "task_invalid",
            TaskError::Io { .. } => "task_io",
            TaskError::Process(_) => "task_process",
            TaskError::Fail { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message, including process output when there is any.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Process(ProcessError::Failed { output, .. }) if !output.is_empty() => {
                format!("{self}\n{}", output.trim_end())
            }
            _ => self.to_string(),
        }
    }
}

/// One failed slot of a cluster run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Submission index of the task.
    pub index: usize,
    /// Task name.
    pub task: String,
    /// Failure message (the task error's `Display`).
    pub message: String,
}

/// # Composite error of a cluster run.
///
/// Present iff at least one task failed. Its `Display` is `"errors occurred: "` followed by
/// every failing task's message and [`AGGREGATE_SEPARATOR`], in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    failures: Vec<TaskFailure>,
}

impl AggregateError {
    /// Builds the aggregate, returning `None` when there is nothing to aggregate.
    pub(crate) fn from_failures(mut failures: Vec<TaskFailure>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by_key(|f| f.index);
        Some(Self { failures })
    }

    /// Failed slots in submission order.
    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    /// Concatenated failure messages, each followed by the separator.
    pub fn joined(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}{AGGREGATE_SEPARATOR}", f.message))
            .collect()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errors occurred: {}", self.joined())
    }
}

impl std::error::Error for AggregateError {}

/// # Errors produced by a registry backend.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A service with this name is already registered.
    #[error("service '{name}' is already registered")]
    AlreadyRegistered {
        /// Service name.
        name: String,
    },

    /// No service with this name.
    #[error("service '{name}' not found")]
    NotFound {
        /// Service name.
        name: String,
    },

    /// The backend itself failed (network, storage, ...).
    #[error("registry backend error: {error}")]
    Backend {
        /// The underlying error message.
        error: String,
    },
}

/// # Failures of the registration workflow.
///
/// Each variant corresponds to the state the workflow was in when it failed,
/// see [`RegistrationError::failed_in`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The request was rejected during validation.
    #[error("invalid registration request: {reason}")]
    Invalid {
        /// What was wrong with the request.
        reason: String,
    },

    /// The registry refused the service.
    #[error("failed to register service: {0}")]
    Registry(#[from] RegistryError),

    /// The shared definition file could not be updated.
    #[error("failed to update definition file {}: {source}", path.display())]
    Store {
        /// Path of the shared definition file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Code generation failed.
    #[error("failed to regenerate code: {0}")]
    CodeGen(#[source] ProcessError),
}

impl RegistrationError {
    /// The workflow state in which the failure happened.
    pub fn failed_in(&self) -> RegistrationState {
        match self {
            RegistrationError::Invalid { .. } => RegistrationState::Validating,
            RegistrationError::Registry(_) | RegistrationError::Store { .. } => {
                RegistrationState::MutatingDefinition
            }
            RegistrationError::CodeGen(_) => RegistrationState::Regenerating,
        }
    }

    /// Raw diagnostic output of the failing external process, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            RegistrationError::CodeGen(e) => e.output(),
            _ => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::Invalid { .. } => "registration_invalid",
            RegistrationError::Registry(_) => "registration_registry",
            RegistrationError::Store { .. } => "registration_store",
            RegistrationError::CodeGen(_) => "registration_codegen",
        }
    }
}

/// # Configuration could not be loaded.
#[derive(Error, Debug)]
#[error("failed to load configuration: {0}")]
pub struct ConfigError(#[from] config::ConfigError);

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, message: &str) -> TaskFailure {
        TaskFailure {
            index,
            task: format!("t{index}"),
            message: message.to_string(),
        }
    }

    #[test]
    fn aggregate_absent_without_failures() {
        assert!(AggregateError::from_failures(Vec::new()).is_none());
    }

    #[test]
    fn aggregate_orders_by_submission_index() {
        let err = AggregateError::from_failures(vec![failure(3, "b"), failure(1, "a")]).unwrap();
        assert_eq!(err.joined(), "a; b; ");
        assert_eq!(err.to_string(), "errors occurred: a; b; ");
        assert_eq!(err.failures()[0].index, 1);
    }

    #[test]
    fn registration_error_reports_state() {
        let err = RegistrationError::CodeGen(ProcessError::Failed {
            program: "protoc".into(),
            status: Some(1),
            output: "global.proto:3:1: Expected top-level statement".into(),
        });
        assert_eq!(err.failed_in(), RegistrationState::Regenerating);
        assert_eq!(
            err.diagnostic(),
            Some("global.proto:3:1: Expected top-level statement")
        );
        assert_eq!(
            RegistrationError::Invalid { reason: "x".into() }.failed_in(),
            RegistrationState::Validating
        );
    }

    #[test]
    fn task_message_includes_process_output() {
        let err = TaskError::from(ProcessError::Failed {
            program: "git".into(),
            status: Some(128),
            output: "fatal: not a git repository\n".into(),
        });
        assert_eq!(err.as_label(), "task_process");
        assert_eq!(
            err.as_message(),
            "'git' exited with status 128\nfatal: not a git repository"
        );
    }
}
