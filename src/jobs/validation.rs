use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::TaskError;
use crate::external::CodeGenerator;
use crate::tasks::Task;

use super::proto_files;

/// Checks that every definition file of one package compiles.
pub struct ValidationJob {
    name: String,
    package: String,
    proto_dir: PathBuf,
    codegen: Arc<dyn CodeGenerator>,
}

impl ValidationJob {
    pub fn new(cfg: &Config, package: impl Into<String>, codegen: Arc<dyn CodeGenerator>) -> Self {
        let package = package.into();
        Self {
            name: format!("validate:{package}"),
            proto_dir: cfg.package_proto_dir(&package),
            package,
            codegen,
        }
    }
}

#[async_trait]
impl Task for ValidationJob {
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<String, TaskError> {
        let files = proto_files(&self.proto_dir).await?;
        if let Err(err) = self.codegen.validate(&self.proto_dir, &files).await {
            tracing::error!(package = %self.package, error = %err, output = err.output().unwrap_or(""), "validation failed");
            return Err(err.into());
        }
        tracing::info!(package = %self.package, files = files.len(), "validation successful");
        Ok(format!("Validation successful for package '{}'", self.package))
    }
}
