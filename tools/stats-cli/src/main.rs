//! Stats CLI - Command line tool for the archive statistics gateway.
//!
//! Commands:
//! - `stats serve` - Run the HTTP server
//! - `stats query` - Run one statistics query
//! - `stats dashboard` - Load every statistic
//! - `stats config` - Manage configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, DashboardArgs, QueryArgs, ServeArgs};

/// Stats CLI - Serve and query archive statistics from a SPARQL endpoint
#[derive(Parser)]
#[command(name = "stats")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the statistics HTTP server
    Serve(ServeArgs),

    /// Run a single statistics query
    Query(QueryArgs),

    /// Load every statistic
    Dashboard(DashboardArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    logging::init(ctx.config.logging.filter.as_deref(), ctx.output.is_verbose())?;

    // Execute command
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, &ctx).await,
        Commands::Query(args) => commands::query::run(args, &ctx).await,
        Commands::Dashboard(args) => commands::dashboard::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
