use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::TaskError;
use crate::external::{CodeGenerator, CodegenRequest};
use crate::tasks::Task;

use super::proto_files;

/// Generates code for one package, one generator run per language.
pub struct GenerationJob {
    name: String,
    package: String,
    proto_dir: PathBuf,
    /// `(language, output directory)`
    targets: Vec<(String, PathBuf)>,
    codegen: Arc<dyn CodeGenerator>,
}

impl GenerationJob {
    pub fn new(cfg: &Config, package: impl Into<String>, codegen: Arc<dyn CodeGenerator>) -> Self {
        let package = package.into();
        let targets = cfg
            .languages
            .iter()
            .map(|lang| (lang.clone(), cfg.package_output_dir(&package, lang)))
            .collect();
        Self {
            name: format!("generate:{package}"),
            proto_dir: cfg.package_proto_dir(&package),
            package,
            targets,
            codegen,
        }
    }
}

#[async_trait]
impl Task for GenerationJob {
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<String, TaskError> {
        tracing::info!(package = %self.package, "generating protobufs");
        let files = proto_files(&self.proto_dir).await?;

        for (lang, out_dir) in &self.targets {
            tokio::fs::create_dir_all(out_dir).await.map_err(|e| {
                TaskError::io(format!("failed to create {}", out_dir.display()), e)
            })?;

            let request = CodegenRequest {
                proto_paths: vec![self.proto_dir.clone()],
                out_dir: out_dir.clone(),
                languages: vec![lang.clone()],
                files: files.clone(),
            };
            self.codegen.generate(&request).await?;
            tracing::info!(package = %self.package, lang = %lang, "protobufs generated");
        }

        Ok(format!("Protobufs generated for package '{}'", self.package))
    }
}
