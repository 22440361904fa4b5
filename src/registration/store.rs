//! # Shared definition file.
//!
//! [`DefinitionStore`] appends one stub entry per registered service to the shared
//! definition file. The file must already exist; it is never created or truncated here.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::registry::ServiceMetadata;

/// Append-only access to the shared definition file.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    path: PathBuf,
}

impl DefinitionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stub entry appended for service `name`.
    pub fn service_stub(name: &str, metadata: &ServiceMetadata) -> String {
        format!(
            r#"
// {name}: domain={domain} version={version}
service {name}Service {{
  rpc ExampleRPC ({name}Request) returns ({name}Response) {{}}
}}

message {name}Request {{
  string message = 1;
}}

message {name}Response {{
  string message = 1;
}}
"#,
            domain = metadata.domain,
            version = metadata.version,
        )
    }

    /// Appends the stub for `name` to the end of the file.
    pub async fn append_service(
        &self,
        name: &str,
        metadata: &ServiceMetadata,
    ) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(Self::service_stub(name, metadata).as_bytes())
            .await?;
        file.flush().await
    }
}
