//! CLI command implementations.

pub mod config;
pub mod dashboard;
pub mod query;
pub mod serve;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use stats_gateway::SparqlGateway;
use stats_observability::{LogSink, Logger};

use crate::context::Context;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (default: server.addr from config).
    #[arg(short, long)]
    pub addr: Option<String>,
}

/// Arguments for the query command.
#[derive(Args)]
pub struct QueryArgs {
    /// Query ID (e.g. totalArticles, topAuthors).
    pub query_id: String,

    /// Bypass the cache.
    #[arg(short, long)]
    pub refresh: bool,

    /// Print the raw SPARQL JSON results.
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the dashboard command.
#[derive(Args)]
pub struct DashboardArgs {
    /// Bypass the cache for every metric.
    #[arg(short, long)]
    pub refresh: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Set a config value.
    Set {
        /// Config key (dot-separated).
        key: String,
        /// Value to set.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// SPARQL endpoint URL to write into the file.
        #[arg(short, long, default_value = "http://localhost:7200/repositories/news")]
        endpoint: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

/// Build a gateway from the resolved configuration, logging through `tracing`.
pub fn build_gateway(ctx: &Context) -> Result<SparqlGateway> {
    let config = ctx.config.resolved_gateway()?;
    ctx.output.debug(&format!(
        "endpoint: {}",
        config.endpoint().unwrap_or("<unset>")
    ));

    let logger = Logger::new(config.environment).with_sink(LogSink::Tracing);
    let gateway = SparqlGateway::from_config(config)
        .context("Failed to create SPARQL gateway")?
        .with_logger(logger);
    Ok(gateway)
}
