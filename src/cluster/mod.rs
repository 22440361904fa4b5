//! # Cluster: concurrent fan-out of independent tasks.
//!
//! - [`manager`]: [`ClusterManager`] collects tasks and runs them in parallel;
//! - [`outcome`]: [`RunOutcome`] ordered results plus the aggregated error.

mod manager;
mod outcome;

pub use manager::ClusterManager;
pub use outcome::RunOutcome;
