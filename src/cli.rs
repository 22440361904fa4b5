//! Command line of the `protovisor` binary.
//!
//! ## Commands
//!
//! - `protovisor register` - Register a service and regenerate code
//! - `protovisor generate` - Regenerate code (shared definition or per package)
//! - `protovisor validate` - Check that package definitions compile
//! - `protovisor push` - Stage, commit and push package directories
//! - `protovisor serve` - Wait for signals: `SIGHUP` reloads, `SIGINT`/`SIGTERM` stop
//!
//! ## Configuration
//!
//! Loaded from defaults, the file given by `--config` (or `PROTOVISOR_CONFIG`) and
//! `PROTOVISOR_*` variables; the flags below override the loaded values.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use protovisor::{Config, ConfigError};

/// Protovisor - shared proto definition and code generation manager.
#[derive(Debug, Parser)]
#[command(name = "protovisor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(long, env = "PROTOVISOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shared definition file registrations append to.
    #[arg(long)]
    pub global_proto: Option<PathBuf>,

    /// Directory holding per-package definitions.
    #[arg(long)]
    pub proto_dir: Option<PathBuf>,

    /// Directory for generated code.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Target languages, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub languages: Vec<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Loads the configuration and applies command-line overrides.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut cfg = Config::load(self.config.as_deref())?;
        self.apply(&mut cfg);
        Ok(cfg)
    }

    fn apply(&self, cfg: &mut Config) {
        if let Some(path) = &self.global_proto {
            cfg.global_proto = path.clone();
        }
        if let Some(dir) = &self.proto_dir {
            cfg.proto_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if !self.languages.is_empty() {
            cfg.languages = self.languages.clone();
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register a service, append its stub and regenerate code.
    Register(RegisterArgs),
    /// Regenerate code from the shared definition, or for the given packages.
    Generate(PackagesArgs),
    /// Check that the given packages' definitions compile.
    Validate(PackagesArgs),
    /// Stage, commit and push the given package directories.
    Push(PushArgs),
    /// Run until SIGINT/SIGTERM; SIGHUP reloads configuration and regenerates.
    Serve,
}

/// Arguments for `register`.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Service name (`[A-Za-z][A-Za-z0-9_]*`).
    #[arg(long)]
    pub name: String,

    /// Domain to register the service under.
    #[arg(long)]
    pub domain: String,

    /// Service version (defaults to the configured default version).
    #[arg(long)]
    pub version: Option<String>,
}

/// Package list shared by `generate` and `validate`.
#[derive(Debug, Args)]
pub struct PackagesArgs {
    /// Package names under the proto directory.
    pub packages: Vec<String>,
}

/// Arguments for `push`.
#[derive(Debug, Args)]
pub struct PushArgs {
    /// Package names under the proto directory.
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Commit message.
    #[arg(long, short, default_value = "Update protobufs")]
    pub message: String,
}
