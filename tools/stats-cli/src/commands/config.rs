//! Configuration management commands.

use std::path::PathBuf;

use anyhow::{bail, Result};
use stats_core::Environment;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Get { key } => get_config(&key, ctx),
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx),
        ConfigCommand::Init { endpoint, force } => init_config(&endpoint, force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let gateway = ctx.config.resolved_gateway()?;

    if ctx.output.is_json() {
        let mut effective = ctx.config.clone();
        effective.gateway = gateway;
        ctx.output.json(&effective);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "<none, using defaults>"),
    }

    // Gateway section (environment overrides applied)
    ctx.output.info("");
    ctx.output.info("[gateway]");
    ctx.output
        .kv("endpoint", gateway.endpoint().unwrap_or("<unset>"));
    ctx.output
        .kv("cache_ttl_secs", &gateway.cache_ttl_secs.to_string());
    ctx.output.kv(
        "request_timeout_secs",
        &gateway.request_timeout_secs.to_string(),
    );
    ctx.output.kv(
        "connect_timeout_secs",
        &gateway.connect_timeout_secs.to_string(),
    );
    ctx.output.kv("environment", gateway.environment.as_str());

    // Server section
    ctx.output.info("");
    ctx.output.info("[server]");
    ctx.output.kv("addr", &ctx.config.server.addr);

    if let Some(ref filter) = ctx.config.logging.filter {
        ctx.output.info("");
        ctx.output.info("[logging]");
        ctx.output.kv("filter", filter);
    }

    Ok(())
}

fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let Some(config_path) = ctx.config_path.clone() else {
        bail!("No config file found. Run `stats config init` to create one.");
    };
    let path = config_path.to_string_lossy();

    let mut config = CliConfig::load(&path)?;
    set_config_value(&mut config, key, value)?;
    config.save(&path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn init_config(endpoint: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path: PathBuf = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, generate_default_config(endpoint))?;

    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let gateway = ctx.config.resolved_gateway()?;
    let mut warnings: Vec<String> = Vec::new();

    if gateway.connect_timeout_secs >= gateway.request_timeout_secs {
        warnings.push(
            "gateway.connect_timeout_secs is not below request_timeout_secs".to_string(),
        );
    }
    if gateway.environment == Environment::Development {
        warnings.push("gateway.environment is development; info logs are enabled".to_string());
    }
    if ctx.config.server.addr.parse::<std::net::SocketAddr>().is_err() {
        warnings.push(format!(
            "server.addr '{}' is not an IP:port pair",
            ctx.config.server.addr
        ));
    }

    if let Err(e) = gateway.validate() {
        ctx.output.error(&format!("Error: {}", e));
        for warning in &warnings {
            ctx.output.warn(&format!("Warning: {}", warning));
        }
        bail!("Configuration is invalid");
    }

    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();
    let gateway = &config.gateway;

    match parts.as_slice() {
        ["gateway", "endpoint"] => Ok(gateway
            .endpoint()
            .map(|e| format!("\"{}\"", e))
            .unwrap_or_else(|| "null".to_string())),
        ["gateway", "cache_ttl_secs"] => Ok(gateway.cache_ttl_secs.to_string()),
        ["gateway", "request_timeout_secs"] => Ok(gateway.request_timeout_secs.to_string()),
        ["gateway", "connect_timeout_secs"] => Ok(gateway.connect_timeout_secs.to_string()),
        ["gateway", "environment"] => Ok(format!("\"{}\"", gateway.environment)),
        ["server", "addr"] => Ok(format!("\"{}\"", config.server.addr)),
        ["logging", "filter"] => Ok(config
            .logging
            .filter
            .as_ref()
            .map(|f| format!("\"{}\"", f))
            .unwrap_or_else(|| "null".to_string())),
        _ => bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let gateway = &mut config.gateway;

    match parts.as_slice() {
        ["gateway", "endpoint"] => gateway.endpoint = Some(value.to_string()),
        ["gateway", "cache_ttl_secs"] => gateway.cache_ttl_secs = value.parse()?,
        ["gateway", "request_timeout_secs"] => gateway.request_timeout_secs = value.parse()?,
        ["gateway", "connect_timeout_secs"] => gateway.connect_timeout_secs = value.parse()?,
        ["gateway", "environment"] => gateway.environment = value.parse()?,
        ["server", "addr"] => config.server.addr = value.to_string(),
        ["logging", "filter"] => config.logging.filter = Some(value.to_string()),
        _ => bail!("Unknown or read-only config key: {}", key),
    }

    Ok(())
}
