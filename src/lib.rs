//! # protovisor
//!
//! **Protovisor** keeps a shared protocol definition file and the code generated from it
//! in sync while services register themselves.
//!
//! It provides three cooperating pieces: a cluster runner that executes independent
//! tasks in parallel and aggregates their failures, an event bus that lets any number of
//! listeners observe lifecycle events, and a serialized registration workflow that
//! appends service stubs to the shared definition and regenerates code. A signal
//! controller turns process signals into shutdown / reload actions for the host.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  CLI / host ──────────────┬──────────────────────────────┬─────────────────────┐
//!        │                  ▼                              ▼                     ▼
//!        │      ┌──────────────────────────┐   ┌────────────────────┐  ┌──────────────────┐
//!        │      │ Registrar                │   │ ClusterManager<T>  │  │ LifecycleSignal- │
//!        │      │ - Registry (trait)       │   │ - pending tasks    │  │ Controller       │
//!        │      │ - DefinitionStore        │   │ - tokio::spawn x N │  │ SIGINT/SIGTERM → │
//!        │      │ - CodeGenerator (trait)  │   │ - join barrier     │  │   Shutdown       │
//!        │      │ - async mutex            │   │ - AggregateError   │  │ SIGHUP → Reload  │
//!        │      └────────────┬─────────────┘   └─────────┬──────────┘  └────────┬─────────┘
//!        │                   │ emit                      │ emit (optional)      │ mpsc (cap 1)
//!        │                   ▼                           ▼                      ▼
//!        │      ┌────────────────────────────────────────────────┐          host loop
//!        └────► │ EventBus (snapshot of listeners, per-listener  │
//!     subscribe │ unbounded queue + worker, panics isolated)     │
//!               └───────┬───────────────┬───────────────┬────────┘
//!                       ▼               ▼               ▼
//!                   LogWriter      SubscribeFn        custom
//! ```
//!
//! ### Registration
//! ```text
//! register(req) ─► lock ─► validate ─► registry ─► append stub ─► codegen ─► unlock
//!                              │            │             │             │
//!                            Error  ServiceRegistered  GlobalDefinition- CodeGenerated / Error
//!                                                       Updated
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Async units of work with a typed output.                     | [`Task`], [`TaskFn`], [`TaskRef`]           |
//! | **Cluster**       | Run tasks in parallel, collect ordered results and failures. | [`ClusterManager`], [`RunOutcome`]          |
//! | **Events**        | Runtime listener registry with non-blocking fan-out.         | [`EventBus`], [`Event`], [`Subscribe`]      |
//! | **Registration**  | Serialized register → append → regenerate workflow.          | [`Registrar`], [`RegistrationState`]        |
//! | **Signals**       | Process signals to shutdown / reload actions.                | [`LifecycleSignalController`]               |
//! | **Collaborators** | Registry, code generator and version control backends.       | [`Registry`], [`CodeGenerator`], [`VersionControl`] |
//! | **Jobs**          | Per-package generation, validation and push tasks.           | [`GenerationJob`], [`ValidationJob`], [`PushJob`] |
//! | **Errors**        | Typed errors for tasks, runs and registration.               | [`TaskError`], [`AggregateError`], [`RegistrationError`] |
//! | **Configuration** | Defaults, TOML file and `PROTOVISOR_*` environment.          | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use protovisor::{ClusterManager, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cluster = ClusterManager::<u32>::new();
//!     cluster.add_task(TaskFn::arc("one", || async { Ok::<_, TaskError>(1u32) }));
//!     cluster.add_task(TaskFn::arc("two", || async {
//!         Err::<u32, _>(TaskError::fail("disk full"))
//!     }));
//!
//!     let outcome = cluster.run_tasks().await;
//!     assert_eq!(outcome.results, vec![1, 0]);
//!     assert_eq!(
//!         outcome.error.map(|e| e.to_string()).as_deref(),
//!         Some("errors occurred: disk full; ")
//!     );
//! }
//! ```
mod cluster;
mod config;
mod error;
mod events;
mod external;
mod jobs;
mod registration;
mod registry;
mod signals;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use cluster::{ClusterManager, RunOutcome};
pub use config::{Config, ENV_PREFIX};
pub use error::{
    AGGREGATE_SEPARATOR, AggregateError, ConfigError, ProcessError, RegistrationError,
    RegistryError, TaskError, TaskFailure,
};
pub use events::{Event, EventBus, EventKind, ListenerId, Payload};
pub use external::{CodeGenerator, CodegenRequest, Git, Protoc, VersionControl};
pub use jobs::{GenerationJob, PushJob, ValidationJob};
pub use registration::{
    DefinitionStore, Registrar, RegistrarBuilder, Registration, RegistrationRequest,
    RegistrationState,
};
pub use registry::{InMemoryRegistry, Registry, ServiceMetadata};
pub use signals::{
    ChannelSignals, ControllerExit, ControllerState, LifecycleSignal, LifecycleSignalController,
    OsSignals, SignalAction, SignalSource,
};
pub use subscribers::{LogWriter, Subscribe, SubscribeFn};
pub use tasks::{Task, TaskFn, TaskRef};
