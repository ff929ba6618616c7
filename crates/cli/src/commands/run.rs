//! `run` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use auth::CredentialStore;
use contracts::ServiceBlueprint;
use engine::Engine;
use flusher::StorageSink;
use gateway::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_service(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref listen) = args.listen {
        info!(listen = %listen, "Overriding listen address from CLI");
        blueprint.server.listen_addr = listen.clone();
    }
    if let Some(ref files_dir) = args.files_dir {
        info!(files_dir = %files_dir.display(), "Overriding storage directory from CLI");
        blueprint.storage.files_dir = files_dir.clone();
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(CliError::from)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        listen = %blueprint.server.listen_addr,
        storage = ?blueprint.storage.kind,
        files_dir = %blueprint.storage.files_dir.display(),
        destinations = blueprint.destinations.len(),
        tokens = blueprint.auth.valid_tokens.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let sink =
        StorageSink::from_config(&blueprint.storage).context("Failed to create storage sink")?;
    let credentials = CredentialStore::from_config(&blueprint.auth, &blueprint.bindings)
        .map_err(CliError::from)?;
    let engine = Engine::new(blueprint.engine.clone(), blueprint.retry, Arc::new(sink));

    // Binding the listener is the only fatal startup step after config
    let addr = blueprint.server.listen_addr.clone();
    let listener = gateway::bind(&addr)
        .await
        .map_err(|e| CliError::bind(&addr, e.to_string()))?;

    let cancel = CancellationToken::new();
    let state = AppState::new(
        Arc::new(credentials),
        Arc::clone(engine.registry()),
        engine.handle(),
    );
    let server = tokio::spawn(gateway::serve(
        listener,
        gateway::router(state),
        cancel.clone(),
    ));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, draining buffers...");
        signal_cancel.cancel();
    });

    info!("Starting engine...");
    let result = engine.run(blueprint.destination_keys(), cancel.clone()).await;
    // Stop the gateway even when the engine failed to start
    cancel.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Gateway failed"),
        Err(e) => error!(error = ?e, "Gateway task panicked"),
    }

    let stats = result.map_err(CliError::from)?;
    info!(
        records_written = stats.flush.records_written,
        records_lost = stats.flush.records_lost,
        uptime_secs = stats.uptime.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Engine drained"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("bufferd finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires; the other one still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ServiceBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  Listen: {}", blueprint.server.listen_addr);

    let engine = &blueprint.engine;
    println!("\nEngine:");
    println!("  Dispatcher workers: {}", engine.dispatcher_workers);
    println!(
        "  Delivery workers: {} (max {})",
        engine.initial_delivery_workers, engine.max_delivery_workers
    );
    println!(
        "  Capacity: ingress {}, per destination {}",
        engine.ingress_capacity, engine.delivery_capacity
    );
    println!("  Flush interval: {} ms", engine.flush_interval_ms);
    println!(
        "  Retry: {} attempts, {} ms apart",
        blueprint.retry.max_attempts, blueprint.retry.retry_delay_ms
    );

    println!("\nStorage:");
    println!("  Kind: {:?}", blueprint.storage.kind);
    println!("  Directory: {}", blueprint.storage.files_dir.display());

    if !blueprint.destinations.is_empty() {
        println!("\nDestinations ({}):", blueprint.destinations.len());
        for destination in &blueprint.destinations {
            println!("  - {}", destination.key);
        }
    }

    println!();
}
