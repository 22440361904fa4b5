//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: one async entry point producing a typed
//! result or a [`TaskError`]. The common handle type is [`TaskRef`], an
//! `Arc<dyn Task<Output = T>>` suitable for handing to a
//! [`ClusterManager`](crate::ClusterManager).
//!
//! Tasks share no state unless it is injected explicitly (e.g. an `Arc` field).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// # Shared handle to a task object.
pub type TaskRef<T> = Arc<dyn Task<Output = T>>;

/// # Asynchronous unit of work.
///
/// A `Task` has a stable [`name`](Task::name) and an async [`execute`](Task::execute)
/// method. The output type is the "payload" of the task: different tasks share the same
/// shape with different payload types.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use protovisor::{Task, TaskError};
///
/// struct Count(&'static str);
///
/// #[async_trait]
/// impl Task for Count {
///     type Output = usize;
///
///     fn name(&self) -> &str { "count" }
///
///     async fn execute(&self) -> Result<usize, TaskError> {
///         Ok(self.0.len())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Result payload; `Default` supplies the slot value when the task fails.
    type Output: Default + Send + 'static;

    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Runs the task to completion.
    async fn execute(&self) -> Result<Self::Output, TaskError>;
}
