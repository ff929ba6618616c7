//! 配置校验模块
//!
//! 校验规则：
//! - 引擎容量与 worker 数量 > 0
//! - initial_delivery_workers <= max_delivery_workers
//! - flush_interval_ms > 0, retry.max_attempts >= 1
//! - destination key 合法且唯一
//! - 绑定的 token 已声明、唯一，且目的地已声明

use std::collections::HashSet;

use contracts::{ContractError, ServiceBlueprint};

/// 校验 ServiceBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    validate_server(blueprint)?;
    validate_engine(blueprint)?;
    validate_retry(blueprint)?;
    validate_destinations(blueprint)?;
    validate_bindings(blueprint)?;
    Ok(())
}

fn validate_server(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    if blueprint.server.listen_addr.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.listen_addr",
            "listen address cannot be empty",
        ));
    }
    Ok(())
}

/// 校验引擎参数
fn validate_engine(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let engine = &blueprint.engine;

    let positive = [
        ("engine.dispatcher_workers", engine.dispatcher_workers),
        (
            "engine.initial_delivery_workers",
            engine.initial_delivery_workers,
        ),
        ("engine.max_delivery_workers", engine.max_delivery_workers),
        ("engine.ingress_capacity", engine.ingress_capacity),
        ("engine.delivery_capacity", engine.delivery_capacity),
    ];
    for (field, value) in positive {
        if value == 0 {
            return Err(ContractError::config_validation(field, "must be > 0"));
        }
    }

    if engine.initial_delivery_workers > engine.max_delivery_workers {
        return Err(ContractError::config_validation(
            "engine.initial_delivery_workers / engine.max_delivery_workers",
            format!(
                "initial_delivery_workers ({}) must be <= max_delivery_workers ({})",
                engine.initial_delivery_workers, engine.max_delivery_workers
            ),
        ));
    }

    if engine.flush_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "engine.flush_interval_ms",
            "must be > 0",
        ));
    }

    Ok(())
}

/// 校验重试策略
fn validate_retry(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    if blueprint.retry.max_attempts == 0 {
        return Err(ContractError::config_validation(
            "retry.max_attempts",
            "at least one write attempt is required",
        ));
    }
    Ok(())
}

/// 校验 destination key 合法性与唯一性
fn validate_destinations(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, destination) in blueprint.destinations.iter().enumerate() {
        destination.key.validate().map_err(|e| {
            ContractError::config_validation(format!("destinations[{idx}].key"), e.to_string())
        })?;
        if !seen.insert(destination.key.as_str()) {
            return Err(ContractError::config_validation(
                format!("destinations[key={}]", destination.key),
                "duplicate destination key",
            ));
        }
    }
    Ok(())
}

/// 校验凭证绑定
fn validate_bindings(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let valid_tokens: HashSet<_> = blueprint.auth.valid_tokens.iter().map(String::as_str).collect();
    let destinations: HashSet<_> = blueprint
        .destinations
        .iter()
        .map(|d| d.key.as_str())
        .collect();

    let mut bound = HashSet::new();
    for (idx, binding) in blueprint.bindings.iter().enumerate() {
        if !valid_tokens.contains(binding.token.as_str()) {
            return Err(ContractError::config_validation(
                format!("bindings[{idx}].token"),
                "token is not listed in auth.valid_tokens",
            ));
        }
        if !bound.insert(binding.token.as_str()) {
            return Err(ContractError::config_validation(
                format!("bindings[{idx}].token"),
                "duplicate binding: a token can only be bound to one destination",
            ));
        }
        if !destinations.contains(binding.destination.as_str()) {
            return Err(ContractError::config_validation(
                format!("bindings[{idx}].destination"),
                format!(
                    "destination '{}' not found in destinations",
                    binding.destination
                ),
            ));
        }
    }
    Ok(())
}
