//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ServiceBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    listen_addr: String,
    engine: EngineInfo,
    storage: StorageInfo,
    destinations: Vec<String>,
    token_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bindings: Vec<BindingInfo>,
}

#[derive(Serialize)]
struct EngineInfo {
    dispatcher_workers: usize,
    initial_delivery_workers: usize,
    max_delivery_workers: usize,
    ingress_capacity: usize,
    delivery_capacity: usize,
    flush_interval_ms: u64,
    max_attempts: u32,
    retry_delay_ms: u64,
}

#[derive(Serialize)]
struct StorageInfo {
    kind: String,
    files_dir: String,
}

#[derive(Serialize)]
struct BindingInfo {
    token: String,
    destination: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

/// Show only the first characters of a token
fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}***")
}

fn build_config_info(blueprint: &ServiceBlueprint, args: &InfoArgs) -> ConfigInfo {
    let engine = &blueprint.engine;

    let bindings = if args.bindings {
        blueprint
            .bindings
            .iter()
            .map(|b| BindingInfo {
                token: mask_token(&b.token),
                destination: b.destination.to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        listen_addr: blueprint.server.listen_addr.clone(),
        engine: EngineInfo {
            dispatcher_workers: engine.dispatcher_workers,
            initial_delivery_workers: engine.initial_delivery_workers,
            max_delivery_workers: engine.max_delivery_workers,
            ingress_capacity: engine.ingress_capacity,
            delivery_capacity: engine.delivery_capacity,
            flush_interval_ms: engine.flush_interval_ms,
            max_attempts: blueprint.retry.max_attempts,
            retry_delay_ms: blueprint.retry.retry_delay_ms,
        },
        storage: StorageInfo {
            kind: format!("{:?}", blueprint.storage.kind),
            files_dir: blueprint.storage.files_dir.display().to_string(),
        },
        destinations: blueprint
            .destinations
            .iter()
            .map(|d| d.key.to_string())
            .collect(),
        token_count: blueprint.auth.valid_tokens.len(),
        bindings,
    }
}

fn print_config_info(blueprint: &ServiceBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   bufferd Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🌐 Server");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   └─ Listen: {}", blueprint.server.listen_addr);

    let engine = &blueprint.engine;
    println!("\n⚙️  Engine");
    println!("   ├─ Dispatcher workers: {}", engine.dispatcher_workers);
    println!(
        "   ├─ Delivery workers: {} → {}",
        engine.initial_delivery_workers, engine.max_delivery_workers
    );
    println!("   ├─ Ingress capacity: {}", engine.ingress_capacity);
    println!("   ├─ Delivery capacity: {}", engine.delivery_capacity);
    println!("   ├─ Flush interval: {} ms", engine.flush_interval_ms);
    println!(
        "   └─ Retry: {} × {} ms",
        blueprint.retry.max_attempts, blueprint.retry.retry_delay_ms
    );

    println!("\n💾 Storage");
    println!("   ├─ Kind: {:?}", blueprint.storage.kind);
    println!("   └─ Directory: {}", blueprint.storage.files_dir.display());

    println!("\n📤 Destinations ({})", blueprint.destinations.len());
    for (i, destination) in blueprint.destinations.iter().enumerate() {
        let is_last = i == blueprint.destinations.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!("   {} {}", prefix, destination.key);
    }

    println!("\n🔑 Tokens: {}", blueprint.auth.valid_tokens.len());
    if args.bindings && !blueprint.bindings.is_empty() {
        for (i, binding) in blueprint.bindings.iter().enumerate() {
            let is_last = i == blueprint.bindings.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} → {}",
                prefix,
                mask_token(&binding.token),
                binding.destination
            );
        }
    }

    println!();
}
