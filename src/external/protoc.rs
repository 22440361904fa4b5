//! # Code generation backend.
//!
//! [`CodeGenerator`] is the pass/fail contract the workflow and the generation jobs
//! depend on; [`Protoc`] implements it by invoking the protocol compiler:
//!
//! ```text
//! protoc --<lang>_out=<out> --<lang>-grpc_out=<out> ... --proto_path=<dir>... <files...>
//! protoc --proto_path=<dir> --descriptor_set_out=<null> <files...>      (validate)
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProcessError;
use crate::external::process;

#[cfg(unix)]
const NULL_DEVICE: &str = "/dev/null";
#[cfg(not(unix))]
const NULL_DEVICE: &str = "NUL";

/// One code generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenRequest {
    /// Search paths for definitions (`--proto_path`, in order).
    pub proto_paths: Vec<PathBuf>,
    /// Output directory passed to every language plugin.
    pub out_dir: PathBuf,
    /// Target languages (`go`, `python`, ...).
    pub languages: Vec<String>,
    /// Definition files to compile.
    pub files: Vec<PathBuf>,
}

/// External code generator.
#[async_trait]
pub trait CodeGenerator: Send + Sync + 'static {
    /// Generates code; returns the combined tool output on success.
    async fn generate(&self, request: &CodegenRequest) -> Result<String, ProcessError>;

    /// Checks that `files` compile, without writing generated code.
    async fn validate(&self, proto_path: &Path, files: &[PathBuf]) -> Result<String, ProcessError>;
}

/// `protoc` backed [`CodeGenerator`].
#[derive(Debug, Clone)]
pub struct Protoc {
    program: String,
}

impl Default for Protoc {
    fn default() -> Self {
        Self::new("protoc")
    }
}

impl Protoc {
    /// Uses `program` as the compiler binary (name on `PATH` or full path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for a generation run, in invocation order.
    pub fn generate_args(request: &CodegenRequest) -> Vec<String> {
        let out = request.out_dir.display();
        let mut args = Vec::with_capacity(
            request.languages.len() * 2 + request.proto_paths.len() + request.files.len(),
        );
        for lang in &request.languages {
            args.push(format!("--{lang}_out={out}"));
            args.push(format!("--{lang}-grpc_out={out}"));
        }
        args.extend(
            request
                .proto_paths
                .iter()
                .map(|p| format!("--proto_path={}", p.display())),
        );
        args.extend(request.files.iter().map(|f| f.display().to_string()));
        args
    }
}

#[async_trait]
impl CodeGenerator for Protoc {
    async fn generate(&self, request: &CodegenRequest) -> Result<String, ProcessError> {
        let args = Self::generate_args(request);
        process::run(&self.program, Command::new(&self.program).args(&args)).await
    }

    async fn validate(&self, proto_path: &Path, files: &[PathBuf]) -> Result<String, ProcessError> {
        process::run(
            &self.program,
            Command::new(&self.program)
                .arg(format!("--proto_path={}", proto_path.display()))
                .arg(format!("--descriptor_set_out={NULL_DEVICE}"))
                .args(files),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CodegenRequest {
        CodegenRequest {
            proto_paths: vec![PathBuf::from("proto"), PathBuf::from("proto/microservices")],
            out_dir: PathBuf::from("generated"),
            languages: vec!["go".into(), "python".into()],
            files: vec![PathBuf::from("proto/global.proto")],
        }
    }

    #[test]
    fn generate_args_cover_every_language() {
        assert_eq!(
            Protoc::generate_args(&request()),
            vec![
                "--go_out=generated",
                "--go-grpc_out=generated",
                "--python_out=generated",
                "--python-grpc_out=generated",
                "--proto_path=proto",
                "--proto_path=proto/microservices",
                "proto/global.proto",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_compiler_output_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let fake = crate::external::testing::script(
            dir.path(),
            "protoc",
            "echo \"global.proto:7:1: Expected top-level statement\" 1>&2\nexit 1",
        );

        let protoc = Protoc::new(fake.display().to_string());
        let err = protoc.generate(&request()).await.unwrap_err();
        assert_eq!(
            err.output(),
            Some("global.proto:7:1: Expected top-level statement\n")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn validate_passes_search_path_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let fake = crate::external::testing::script(dir.path(), "protoc", "echo \"$@\"");

        let protoc = Protoc::new(fake.display().to_string());
        let out = protoc
            .validate(Path::new("pkg/proto"), &[PathBuf::from("pkg/proto/a.proto")])
            .await
            .unwrap();
        assert_eq!(
            out.trim_end(),
            format!("--proto_path=pkg/proto --descriptor_set_out={NULL_DEVICE} pkg/proto/a.proto")
        );
    }
}
