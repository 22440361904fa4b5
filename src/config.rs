//! # Runtime configuration.
//!
//! Provides [`Config`], the settings shared by the registration workflow, the cluster
//! jobs and the binary.
//!
//! Layering (later wins):
//! 1. [`Config::default`]
//! 2. optional TOML file passed to [`Config::load`]
//! 3. `PROTOVISOR_*` environment variables (`PROTOVISOR_OUTPUT_DIR=./gen`,
//!    `PROTOVISOR_LANGUAGES=go,python`)
//!
//! The binary applies command-line flags on top of the loaded value.
//!
//! ## Example file
//! ```toml
//! global_proto = "./proto/global.proto"
//! proto_dir = "./proto/microservices"
//! output_dir = "./generated"
//! languages = ["go", "python"]
//! default_version = "v1"
//! ```

use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix of the environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "PROTOVISOR";

/// Settings for the protovisor runtime.
///
/// ## Field semantics
/// - `global_proto`: shared definition file that registrations append to; must exist
/// - `proto_dir`: search path for definitions; packages live in `<proto_dir>/<package>/proto`
/// - `output_dir`: root directory for generated code
/// - `languages`: target languages for generation (`--<lang>_out`, `--<lang>-grpc_out`)
/// - `protoc` / `git`: binaries to invoke (name on `PATH` or full path)
/// - `default_version`: version recorded when a registration request has none
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global_proto: PathBuf,
    pub proto_dir: PathBuf,
    pub output_dir: PathBuf,
    pub languages: Vec<String>,
    pub protoc: String,
    pub git: String,
    pub default_version: String,
}

impl Config {
    /// Loads defaults, then `path` (if given, must exist), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("languages"),
        );

        let cfg: Config = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Definition directory of one package: `<proto_dir>/<package>/proto`.
    pub fn package_proto_dir(&self, package: &str) -> PathBuf {
        self.proto_dir.join(package).join("proto")
    }

    /// Working directory of one package: `<proto_dir>/<package>`.
    pub fn package_repo_dir(&self, package: &str) -> PathBuf {
        self.proto_dir.join(package)
    }

    /// Output directory of one package and language: `<output_dir>/<package>/<lang>`.
    pub fn package_output_dir(&self, package: &str, language: &str) -> PathBuf {
        self.output_dir.join(package).join(language)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `global_proto = ./proto/global.proto`
    /// - `proto_dir = ./proto/microservices`
    /// - `output_dir = ./generated`
    /// - `languages = ["go"]`
    /// - `protoc = "protoc"`, `git = "git"`
    /// - `default_version = "v1"`
    fn default() -> Self {
        Self {
            global_proto: PathBuf::from("./proto/global.proto"),
            proto_dir: PathBuf::from("./proto/microservices"),
            output_dir: PathBuf::from("./generated"),
            languages: vec!["go".to_string()],
            protoc: "protoc".to_string(),
            git: "git".to_string(),
            default_version: "v1".to_string(),
        }
    }
}
