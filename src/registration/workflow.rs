//! # Registrar: serialized service registration.
//!
//! ```text
//! register(req)
//!   ├─► lock manager mutex  (concurrent registrations queue here)
//!   ├─► Validating          name / domain / version checks, version default
//!   ├─► MutatingDefinition  registry.register_service  ─► ServiceRegistered
//!   │                       store.append_service       ─► GlobalDefinitionUpdated
//!   ├─► Regenerating        codegen.generate           ─► CodeGenerated
//!   └─► Succeeded / Failed  (guard dropped on every path)
//! ```
//!
//! State transitions only happen under the lock, so [`Registrar::state`] always reports the
//! call that holds it. Every failure emits one `Error` event and returns a [`RegistrationError`] that knows
//! the state it failed in. Earlier steps are not undone: a failed regeneration leaves the
//! registry entry and the appended stub in place.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{RegistrationError, RegistryError};
use crate::events::{Event, EventBus, EventKind, Payload};
use crate::external::{CodeGenerator, CodegenRequest, Protoc};
use crate::registry::{InMemoryRegistry, Registry, ServiceMetadata};

use super::{DefinitionStore, RegistrationState};

/// Input of [`Registrar::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub name: String,
    pub domain: String,
    /// Falls back to [`Config::default_version`] when `None`.
    pub version: Option<String>,
}

impl RegistrationRequest {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            version: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub metadata: ServiceMetadata,
    /// Combined output of the code generator.
    pub codegen_output: String,
}

/// Builder for a [`Registrar`] with replaceable collaborators.
///
/// Defaults: [`InMemoryRegistry`], [`Protoc`] using `cfg.protoc`, a fresh [`EventBus`].
pub struct RegistrarBuilder {
    cfg: Config,
    registry: Option<Arc<dyn Registry>>,
    codegen: Option<Arc<dyn CodeGenerator>>,
    bus: Option<EventBus>,
}

impl RegistrarBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            registry: None,
            codegen: None,
            bus: None,
        }
    }

    /// Uses `registry` instead of a fresh in-memory one.
    pub fn with_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses `codegen` instead of `protoc`.
    pub fn with_codegen(mut self, codegen: Arc<dyn CodeGenerator>) -> Self {
        self.codegen = Some(codegen);
        self
    }

    /// Publishes workflow events on `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> Registrar {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(InMemoryRegistry::new()));
        let codegen = self
            .codegen
            .unwrap_or_else(|| Arc::new(Protoc::new(self.cfg.protoc.clone())));

        Registrar {
            store: DefinitionStore::new(self.cfg.global_proto.clone()),
            bus: self.bus.unwrap_or_default(),
            cfg: self.cfg,
            registry,
            codegen,
            lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(RegistrationState::Idle),
        }
    }
}

/// Registers services and keeps generated code in sync with the shared definition file.
pub struct Registrar {
    cfg: Config,
    registry: Arc<dyn Registry>,
    codegen: Arc<dyn CodeGenerator>,
    store: DefinitionStore,
    bus: EventBus,
    lock: tokio::sync::Mutex<()>,
    state: Mutex<RegistrationState>,
}

impl Registrar {
    /// Builds a registrar with default collaborators.
    pub fn new(cfg: Config) -> Self {
        RegistrarBuilder::new(cfg).build()
    }

    pub fn builder(cfg: Config) -> RegistrarBuilder {
        RegistrarBuilder::new(cfg)
    }

    /// Bus this registrar publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// State of the call holding the lock, or of the last one to finish.
    pub fn state(&self) -> RegistrationState {
        *self.state.lock()
    }

    /// Registers one service, appends its stub and regenerates code.
    pub async fn register(
        &self,
        req: RegistrationRequest,
    ) -> Result<Registration, RegistrationError> {
        let _guard = self.lock.lock().await;

        self.transition(RegistrationState::Validating);
        let (name, metadata) = match self.validate(req) {
            Ok(v) => v,
            Err(err) => return Err(self.fail(err)),
        };

        self.transition(RegistrationState::MutatingDefinition);
        if let Err(err) = self
            .registry
            .register_service(&name, metadata.clone())
            .await
        {
            return Err(self.fail(err.into()));
        }
        self.bus.emit(
            Event::new(
                EventKind::ServiceRegistered,
                format!("Service '{name}' registered"),
            )
            .with_payload(Payload::Service {
                name: Arc::from(name.as_str()),
                metadata: metadata.clone(),
            }),
        );

        if let Err(source) = self.store.append_service(&name, &metadata).await {
            return Err(self.fail(RegistrationError::Store {
                path: self.store.path().to_path_buf(),
                source,
            }));
        }
        self.bus.emit(Event::new(
            EventKind::GlobalDefinitionUpdated,
            format!("Global definition updated for service '{name}'"),
        ));

        let codegen_output = self.run_codegen().await?;
        self.transition(RegistrationState::Succeeded);
        tracing::info!(service = %name, domain = %metadata.domain, version = %metadata.version, "service registered");

        Ok(Registration {
            name,
            metadata,
            codegen_output,
        })
    }

    /// Regenerates code from the shared definition file without registering anything.
    pub async fn regenerate(&self) -> Result<String, RegistrationError> {
        let _guard = self.lock.lock().await;
        let out = self.run_codegen().await?;
        self.transition(RegistrationState::Succeeded);
        Ok(out)
    }

    /// Looks `name` up in the registry.
    pub async fn lookup(&self, name: &str) -> Result<ServiceMetadata, RegistryError> {
        self.registry.get_service(name).await
    }

    /// Code generation request covering the shared definition file.
    pub fn codegen_request(&self) -> CodegenRequest {
        let global = &self.cfg.global_proto;
        let global_dir = match global.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        CodegenRequest {
            proto_paths: vec![global_dir, self.cfg.proto_dir.clone()],
            out_dir: self.cfg.output_dir.clone(),
            languages: self.cfg.languages.clone(),
            files: vec![global.clone()],
        }
    }

    /// Caller holds the manager lock.
    async fn run_codegen(&self) -> Result<String, RegistrationError> {
        self.transition(RegistrationState::Regenerating);
        match self.codegen.generate(&self.codegen_request()).await {
            Ok(out) => {
                self.bus.emit(Event::new(
                    EventKind::CodeGenerated,
                    "Code regenerated successfully",
                ));
                Ok(out)
            }
            Err(err) => Err(self.fail(RegistrationError::CodeGen(err))),
        }
    }

    fn validate(
        &self,
        req: RegistrationRequest,
    ) -> Result<(String, ServiceMetadata), RegistrationError> {
        if !is_identifier(&req.name) {
            return Err(RegistrationError::Invalid {
                reason: format!("service name '{}' is not a valid identifier", req.name),
            });
        }
        if req.domain.trim().is_empty() {
            return Err(RegistrationError::Invalid {
                reason: "domain must not be empty".to_string(),
            });
        }
        // Both end up on the stub's comment line.
        if !is_single_line(&req.domain) {
            return Err(RegistrationError::Invalid {
                reason: format!("domain {:?} contains control characters", req.domain),
            });
        }
        if let Some(v) = req.version.as_deref().filter(|v| !is_single_line(v)) {
            return Err(RegistrationError::Invalid {
                reason: format!("version {v:?} contains control characters"),
            });
        }
        let version = match req.version {
            Some(v) if !v.trim().is_empty() => v,
            _ => self.cfg.default_version.clone(),
        };
        Ok((req.name, ServiceMetadata::new(req.domain, version)))
    }

    fn fail(&self, err: RegistrationError) -> RegistrationError {
        self.transition(RegistrationState::Failed);
        tracing::error!(
            failed_in = %err.failed_in(),
            label = err.as_label(),
            error = %err,
            "registration failed"
        );
        let mut ev = Event::error(err.to_string());
        if let Some(diag) = err.diagnostic() {
            ev = ev.with_diagnostic(diag);
        }
        self.bus.emit(ev);
        err
    }

    fn transition(&self, next: RegistrationState) {
        let prev = std::mem::replace(&mut *self.state.lock(), next);
        tracing::debug!(from = %prev, to = %next, "registration state");
    }
}

/// `[A-Za-z][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_single_line(s: &str) -> bool {
    !s.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Notify, mpsc};

    /// Code generator double: optional failure, gating and in-flight accounting.
    #[derive(Default)]
    struct FakeCodegen {
        fail_with: Option<String>,
        delay: Option<Duration>,
        entered: Notify,
        release: Option<Arc<Notify>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CodeGenerator for FakeCodegen {
        async fn generate(&self, _request: &CodegenRequest) -> Result<String, ProcessError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            if let Some(gate) = &self.release {
                gate.notified().await;
            }
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match &self.fail_with {
                Some(output) => Err(ProcessError::Failed {
                    program: "protoc".into(),
                    status: Some(1),
                    output: output.clone(),
                }),
                None => Ok("generated\n".into()),
            }
        }

        async fn validate(
            &self,
            _proto_path: &Path,
            _files: &[PathBuf],
        ) -> Result<String, ProcessError> {
            Ok(String::new())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        global: PathBuf,
        cfg: Config,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.proto");
        std::fs::write(&global, "syntax = \"proto3\";\n").unwrap();
        let cfg = Config {
            global_proto: global.clone(),
            proto_dir: dir.path().join("microservices"),
            output_dir: dir.path().join("generated"),
            ..Config::default()
        };
        Fixture {
            _dir: dir,
            global,
            cfg,
        }
    }

    fn registrar(cfg: Config, codegen: Arc<FakeCodegen>) -> (Registrar, mpsc::UnboundedReceiver<Event>) {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::unbounded_channel();
        bus.subscribe_fn("recorder", move |ev| {
            let _ = tx.send(ev.clone());
        });
        let reg = Registrar::builder(cfg)
            .with_codegen(codegen)
            .with_bus(bus)
            .build();
        (reg, rx)
    }

    fn kinds(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[tokio::test]
    async fn successful_registration_emits_events_in_order() {
        let fx = fixture();
        let (reg, mut rx) = registrar(fx.cfg.clone(), Arc::new(FakeCodegen::default()));

        let done = reg
            .register(RegistrationRequest::new("Billing", "payments"))
            .await
            .unwrap();
        assert_eq!(done.metadata, ServiceMetadata::new("payments", "v1"));
        assert_eq!(done.codegen_output, "generated\n");
        assert_eq!(reg.state(), RegistrationState::Succeeded);
        assert_eq!(
            reg.lookup("Billing").await.unwrap(),
            ServiceMetadata::new("payments", "v1")
        );

        reg.bus().close().await;
        assert_eq!(
            kinds(&mut rx),
            vec![
                EventKind::ServiceRegistered,
                EventKind::GlobalDefinitionUpdated,
                EventKind::CodeGenerated,
            ]
        );
        let text = std::fs::read_to_string(&fx.global).unwrap();
        assert!(text.contains("service BillingService {"));
    }

    #[tokio::test]
    async fn service_registered_event_carries_metadata() {
        let fx = fixture();
        let (reg, mut rx) = registrar(fx.cfg.clone(), Arc::new(FakeCodegen::default()));

        reg.register(RegistrationRequest::new("Ledger", "finance").with_version("v2"))
            .await
            .unwrap();
        reg.bus().close().await;

        let first = rx.try_recv().unwrap();
        let (name, meta) = first.service().unwrap();
        assert_eq!(name, "Ledger");
        assert_eq!(meta, &ServiceMetadata::new("finance", "v2"));
    }

    #[tokio::test]
    async fn failed_codegen_keeps_stub_and_reports_diagnostic() {
        let fx = fixture();
        let codegen = Arc::new(FakeCodegen {
            fail_with: Some("global.proto:9:1: Expected top-level statement".into()),
            ..FakeCodegen::default()
        });
        let (reg, mut rx) = registrar(fx.cfg.clone(), codegen);

        let err = reg
            .register(RegistrationRequest::new("Billing", "payments"))
            .await
            .unwrap_err();
        assert_eq!(err.failed_in(), RegistrationState::Regenerating);
        assert_eq!(reg.state(), RegistrationState::Failed);

        reg.bus().close().await;
        let events: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        let last = events.last().unwrap();
        assert!(last.is_error());
        assert_eq!(
            last.diagnostic(),
            Some("global.proto:9:1: Expected top-level statement")
        );
        assert!(!events.iter().any(|e| e.kind == EventKind::CodeGenerated));

        // No rollback.
        let text = std::fs::read_to_string(&fx.global).unwrap();
        assert!(text.contains("service BillingService {"));
        assert!(reg.lookup("Billing").await.is_ok());
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_mutation() {
        let fx = fixture();
        let codegen = Arc::new(FakeCodegen::default());
        let (reg, mut rx) = registrar(fx.cfg.clone(), Arc::clone(&codegen));

        for req in [
            RegistrationRequest::new("", "payments"),
            RegistrationRequest::new("9lives", "payments"),
            RegistrationRequest::new("Bill-ing", "payments"),
            RegistrationRequest::new("Billing", "  "),
            RegistrationRequest::new("Billing", "pay\n}garbage {"),
            RegistrationRequest::new("Billing", "payments").with_version("v1\nservice Evil {}"),
            RegistrationRequest::new("Billing", "payments\r"),
            RegistrationRequest::new("Billing", "payments").with_version("v1\t"),
        ] {
            let err = reg.register(req).await.unwrap_err();
            assert_eq!(err.failed_in(), RegistrationState::Validating);
            assert!(matches!(err, RegistrationError::Invalid { .. }));
        }

        reg.bus().close().await;
        assert_eq!(kinds(&mut rx), vec![EventKind::Error; 8]);
        assert!(reg.lookup("Billing").await.is_err());
        assert_eq!(codegen.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            std::fs::read_to_string(&fx.global).unwrap(),
            "syntax = \"proto3\";\n"
        );
    }

    #[tokio::test]
    async fn duplicate_registration_fails_in_mutation() {
        let fx = fixture();
        let (reg, _rx) = registrar(fx.cfg.clone(), Arc::new(FakeCodegen::default()));

        reg.register(RegistrationRequest::new("Billing", "payments"))
            .await
            .unwrap();
        let err = reg
            .register(RegistrationRequest::new("Billing", "payments"))
            .await
            .unwrap_err();
        assert_eq!(err.failed_in(), RegistrationState::MutatingDefinition);
        assert!(matches!(
            err,
            RegistrationError::Registry(RegistryError::AlreadyRegistered { .. })
        ));

        let text = std::fs::read_to_string(&fx.global).unwrap();
        assert_eq!(text.matches("service BillingService").count(), 1);
    }

    #[tokio::test]
    async fn missing_definition_file_fails_after_registry_update() {
        let fx = fixture();
        std::fs::remove_file(&fx.global).unwrap();
        let (reg, mut rx) = registrar(fx.cfg.clone(), Arc::new(FakeCodegen::default()));

        let err = reg
            .register(RegistrationRequest::new("Billing", "payments"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Store { .. }));
        assert_eq!(err.failed_in(), RegistrationState::MutatingDefinition);

        reg.bus().close().await;
        assert_eq!(
            kinds(&mut rx),
            vec![EventKind::ServiceRegistered, EventKind::Error]
        );
        assert!(!fx.global.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_are_serialized() {
        let fx = fixture();
        let codegen = Arc::new(FakeCodegen {
            delay: Some(Duration::from_millis(20)),
            ..FakeCodegen::default()
        });
        let (reg, _rx) = registrar(fx.cfg.clone(), Arc::clone(&codegen));
        let reg = Arc::new(reg);

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let reg = Arc::clone(&reg);
                tokio::spawn(async move {
                    reg.register(RegistrationRequest::new(format!("Svc{i}"), "d"))
                        .await
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(codegen.calls.load(Ordering::SeqCst), 5);
        assert_eq!(codegen.max_in_flight.load(Ordering::SeqCst), 1);
        let text = std::fs::read_to_string(&fx.global).unwrap();
        for i in 0..5 {
            assert_eq!(text.matches(&format!("service Svc{i}Service {{")).count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn queued_call_does_not_overwrite_state_of_running_call() {
        let fx = fixture();
        let release = Arc::new(Notify::new());
        let codegen = Arc::new(FakeCodegen {
            release: Some(Arc::clone(&release)),
            ..FakeCodegen::default()
        });
        let (reg, _rx) = registrar(fx.cfg.clone(), Arc::clone(&codegen));
        let reg = Arc::new(reg);

        let running = tokio::spawn({
            let reg = Arc::clone(&reg);
            async move {
                reg.register(RegistrationRequest::new("Billing", "payments"))
                    .await
            }
        });
        codegen.entered.notified().await;
        assert_eq!(reg.state(), RegistrationState::Regenerating);

        let queued = tokio::spawn({
            let reg = Arc::clone(&reg);
            async move { reg.register(RegistrationRequest::new("", "payments")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!queued.is_finished());
        assert_eq!(reg.state(), RegistrationState::Regenerating);

        release.notify_one();
        running.await.unwrap().unwrap();
        let err = queued.await.unwrap().unwrap_err();
        assert_eq!(err.failed_in(), RegistrationState::Validating);
        assert_eq!(reg.state(), RegistrationState::Failed);
    }

    #[tokio::test]
    async fn regenerate_only_runs_codegen() {
        let fx = fixture();
        let codegen = Arc::new(FakeCodegen::default());
        let (reg, mut rx) = registrar(fx.cfg.clone(), Arc::clone(&codegen));

        assert_eq!(reg.regenerate().await.unwrap(), "generated\n");
        reg.bus().close().await;
        assert_eq!(kinds(&mut rx), vec![EventKind::CodeGenerated]);
        assert_eq!(codegen.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn codegen_request_searches_definition_dirs() {
        let cfg = Config::default();
        let reg = Registrar::builder(cfg)
            .with_codegen(Arc::new(FakeCodegen::default()))
            .build();
        let req = reg.codegen_request();
        assert_eq!(
            req.proto_paths,
            vec![
                PathBuf::from("./proto"),
                PathBuf::from("./proto/microservices")
            ]
        );
        assert_eq!(req.files, vec![PathBuf::from("./proto/global.proto")]);
        assert_eq!(req.languages, vec!["go"]);
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("Billing"));
        assert!(is_identifier("a_1"));
        assert!(!is_identifier("_a"));
        assert!(!is_identifier("a b"));
    }
}
