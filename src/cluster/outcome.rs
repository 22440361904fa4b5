//! # Result of one cluster run.

use crate::error::AggregateError;

/// Ordered results of a [`ClusterManager::run_tasks`](crate::ClusterManager::run_tasks) call.
///
/// `results[i]` belongs to the i-th submitted task; a failed slot holds `T::default()`.
/// `error` is present iff at least one task failed.
#[derive(Debug)]
pub struct RunOutcome<T> {
    /// One slot per submitted task, in submission order.
    pub results: Vec<T>,
    /// Aggregated failures, `None` when every task succeeded.
    pub error: Option<AggregateError>,
}

impl<T> RunOutcome<T> {
    /// True if no task failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, discarding the partial results on failure.
    pub fn into_result(self) -> Result<Vec<T>, AggregateError> {
        match self.error {
            None => Ok(self.results),
            Some(err) => Err(err),
        }
    }
}
