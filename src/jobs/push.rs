use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::TaskError;
use crate::external::VersionControl;
use crate::tasks::Task;

/// Stages, commits and pushes one package directory.
pub struct PushJob {
    name: String,
    package: String,
    repo_dir: PathBuf,
    message: String,
    vcs: Arc<dyn VersionControl>,
}

impl PushJob {
    pub fn new(
        cfg: &Config,
        package: impl Into<String>,
        message: impl Into<String>,
        vcs: Arc<dyn VersionControl>,
    ) -> Self {
        let package = package.into();
        Self {
            name: format!("push:{package}"),
            repo_dir: cfg.package_repo_dir(&package),
            package,
            message: message.into(),
            vcs,
        }
    }
}

#[async_trait]
impl Task for PushJob {
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<String, TaskError> {
        tracing::info!(package = %self.package, repo = %self.repo_dir.display(), "pushing protobufs");
        self.vcs.publish(&self.repo_dir, &self.message).await?;
        Ok(format!("Pushed protobufs for package '{}'", self.package))
    }
}
