//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ServiceBlueprint, StorageKind};
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    listen_addr: String,
    storage: String,
    destination_count: usize,
    token_count: usize,
    binding_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    listen_addr: blueprint.server.listen_addr.clone(),
                    storage: format!("{:?}", blueprint.storage.kind),
                    destination_count: blueprint.destinations.len(),
                    token_count: blueprint.auth.valid_tokens.len(),
                    binding_count: blueprint.bindings.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ServiceBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.auth.valid_tokens.is_empty() {
        warnings.push("auth.valid_tokens is empty - every request will be rejected".to_string());
    }

    if blueprint.destinations.is_empty() {
        warnings.push(
            "No destinations configured - they are only registered through /add-user".to_string(),
        );
    }

    if blueprint.storage.kind == StorageKind::Log {
        warnings.push("storage.kind is 'log' - records are logged, not persisted".to_string());
    }

    let engine = &blueprint.engine;
    if engine.initial_delivery_workers == engine.max_delivery_workers {
        warnings.push(
            "engine.max_delivery_workers equals initial_delivery_workers - worker growth disabled"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Listen: {}", summary.listen_addr);
            println!("  Storage: {}", summary.storage);
            println!("  Destinations: {}", summary.destination_count);
            println!("  Tokens: {}", summary.token_count);
            println!("  Bindings: {}", summary.binding_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
