//! Protovisor CLI.
//!
//! The entry point for the `protovisor` binary.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protovisor::{
    ClusterManager, Config, EventBus, GenerationJob, Git, InMemoryRegistry,
    LifecycleSignalController, LogWriter, OsSignals, Protoc, PushJob, Registrar,
    RegistrationRequest, SignalAction, TaskRef, ValidationJob,
};

use cli::{Cli, Commands, PackagesArgs, PushArgs, RegisterArgs};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = cli.load_config().context("failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let bus = EventBus::new();
        bus.subscribe(Arc::new(LogWriter::new()));
        let registry = Arc::new(InMemoryRegistry::new());

        let res = match &cli.command {
            Commands::Register(args) => register(args, cfg, registry, &bus).await,
            Commands::Generate(args) => generate(args, cfg, registry, &bus).await,
            Commands::Validate(args) => validate(args, &cfg, &bus).await,
            Commands::Push(args) => push(args, &cfg, &bus).await,
            Commands::Serve => serve(&cli, cfg, registry, &bus).await,
        };

        bus.close().await;
        res
    })
}

fn registrar(cfg: Config, registry: Arc<InMemoryRegistry>, bus: &EventBus) -> Registrar {
    Registrar::builder(cfg)
        .with_registry(registry)
        .with_bus(bus.clone())
        .build()
}

async fn register(
    args: &RegisterArgs,
    cfg: Config,
    registry: Arc<InMemoryRegistry>,
    bus: &EventBus,
) -> Result<()> {
    let mut req = RegistrationRequest::new(&args.name, &args.domain);
    if let Some(version) = &args.version {
        req = req.with_version(version);
    }

    let done = registrar(cfg, registry, bus).register(req).await?;
    println!(
        "Service '{}' registered (domain={}, version={})",
        done.name, done.metadata.domain, done.metadata.version
    );
    Ok(())
}

async fn generate(
    args: &PackagesArgs,
    cfg: Config,
    registry: Arc<InMemoryRegistry>,
    bus: &EventBus,
) -> Result<()> {
    if args.packages.is_empty() {
        registrar(cfg, registry, bus).regenerate().await?;
        println!("Code regenerated successfully");
        return Ok(());
    }

    let codegen = Arc::new(Protoc::new(cfg.protoc.clone()));
    let tasks = args
        .packages
        .iter()
        .map(|pkg| -> TaskRef<String> { Arc::new(GenerationJob::new(&cfg, pkg, codegen.clone())) })
        .collect();
    run_jobs(tasks, bus).await
}

async fn validate(args: &PackagesArgs, cfg: &Config, bus: &EventBus) -> Result<()> {
    let codegen = Arc::new(Protoc::new(cfg.protoc.clone()));
    let tasks = args
        .packages
        .iter()
        .map(|pkg| -> TaskRef<String> { Arc::new(ValidationJob::new(cfg, pkg, codegen.clone())) })
        .collect();
    run_jobs(tasks, bus).await
}

async fn push(args: &PushArgs, cfg: &Config, bus: &EventBus) -> Result<()> {
    let git = Arc::new(Git::new(cfg.git.clone()));
    let tasks = args
        .packages
        .iter()
        .map(|pkg| -> TaskRef<String> {
            Arc::new(PushJob::new(cfg, pkg, &args.message, git.clone()))
        })
        .collect();
    run_jobs(tasks, bus).await
}

/// Runs `tasks` in parallel and prints the summaries of those that succeeded.
async fn run_jobs(tasks: Vec<TaskRef<String>>, bus: &EventBus) -> Result<()> {
    let cluster = ClusterManager::new().with_bus(bus.clone());
    for task in tasks {
        cluster.add_task(task);
    }

    let outcome = cluster.run_tasks().await;
    for line in outcome.results.iter().filter(|s| !s.is_empty()) {
        println!("{line}");
    }
    match outcome.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn serve(
    cli: &Cli,
    cfg: Config,
    registry: Arc<InMemoryRegistry>,
    bus: &EventBus,
) -> Result<()> {
    let source = OsSignals::new().context("failed to install signal handlers")?;
    let token = CancellationToken::new();
    let (mut actions, controller) =
        LifecycleSignalController::with_token(source, token.clone()).spawn();

    let mut current = registrar(cfg, Arc::clone(&registry), bus);
    tracing::info!("serving: SIGHUP reloads, SIGINT/SIGTERM shut down");

    while let Some(action) = actions.recv().await {
        match action {
            SignalAction::Reload => {
                match cli.load_config() {
                    Ok(cfg) => current = registrar(cfg, Arc::clone(&registry), bus),
                    Err(err) => {
                        tracing::error!(error = %err, "reload failed, keeping previous configuration");
                        continue;
                    }
                }
                // Failures are already reported on the bus.
                let _ = current.regenerate().await;
            }
            SignalAction::Shutdown => break,
        }
    }

    token.cancel();
    let exit = controller.await?;
    tracing::info!(?exit, "shutting down");
    Ok(())
}
