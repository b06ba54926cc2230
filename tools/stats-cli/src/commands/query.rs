//! Run a single statistics query.

use anyhow::{anyhow, Result};
use serde::Serialize;
use stats_core::SparqlResult;
use stats_gateway::ExecuteOptions;

use super::{build_gateway, QueryArgs};
use crate::context::Context;
use crate::output::{format_duration, status_badge};

#[derive(Serialize)]
struct QueryReport<'a> {
    query_id: &'a str,
    cache_status: String,
    served_from_cache: bool,
    fetched_at: String,
    data: &'a SparqlResult,
}

/// Run the query command.
pub async fn run(args: QueryArgs, ctx: &Context) -> Result<()> {
    let gateway = build_gateway(ctx)?;
    let options = ExecuteOptions::default().with_force_refresh(args.refresh);

    let outcome = gateway
        .execute(&args.query_id, options)
        .await
        .map_err(|e| match e.details() {
            Some(details) => anyhow!("{}: {}", e.user_message(), details),
            None => anyhow!("{} ({})", e.user_message(), e),
        })?;

    if args.raw {
        ctx.output.json(outcome.data.as_json());
        return Ok(());
    }

    if ctx.output.is_json() {
        ctx.output.json(&QueryReport {
            query_id: &args.query_id,
            cache_status: outcome.cache_status.to_string(),
            served_from_cache: outcome.served_from_cache,
            fetched_at: outcome.timestamp.to_rfc3339(),
            data: &outcome.data,
        });
        return Ok(());
    }

    let headers = gateway.cache_headers(&outcome);
    ctx.output.header(&args.query_id);
    ctx.output
        .kv("cache", &status_badge(&outcome.cache_status.to_string()));
    ctx.output.kv(
        "fetched",
        &format!(
            "{} ({} ago)",
            outcome.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            format_duration(headers.age().unwrap_or(0))
        ),
    );
    ctx.output.kv("rows", &outcome.data.len().to_string());

    for binding in outcome.data.bindings() {
        let cols: Vec<String> = binding
            .iter()
            .map(|(var, term)| format!("{}={}", var, term.value))
            .collect();
        ctx.output.list_item(&cols.join("  "));
    }

    Ok(())
}
