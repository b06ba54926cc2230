//! Load every statistic at once.

use std::sync::Arc;

use anyhow::{bail, Result};
use stats_gateway::{MetricValue, Statistic, StatisticsLoader};

use super::{build_gateway, DashboardArgs};
use crate::context::Context;
use crate::output::status_badge;

/// Run the dashboard command.
pub async fn run(args: DashboardArgs, ctx: &Context) -> Result<()> {
    let gateway = Arc::new(build_gateway(ctx)?);
    let loader = StatisticsLoader::new(gateway);

    let dashboard = loader.load(args.refresh, None).await;

    if ctx.output.is_json() {
        ctx.output.json(&dashboard);
    } else {
        ctx.output.header("Archive statistics");
        for metric in &dashboard.metrics {
            let id = metric.query_id.as_str();
            match &metric.value {
                MetricValue::Available { statistic, .. } => print_statistic(ctx, id, statistic),
                MetricValue::Unavailable { reason } => {
                    ctx.output
                        .table_row(&[id, &status_badge("unavailable"), reason], &[18, 12, 0]);
                }
            }
        }
    }

    if dashboard.available() == 0 {
        bail!("No statistics could be loaded");
    }

    Ok(())
}

fn print_statistic(ctx: &Context, id: &str, statistic: &Statistic) {
    match statistic {
        Statistic::Count { value } => {
            ctx.output.table_row(&[id, &value.to_string()], &[18, 0]);
        }
        Statistic::Range { earliest, latest } => {
            ctx.output
                .table_row(&[id, &format!("{} .. {}", earliest, latest)], &[18, 0]);
        }
        Statistic::Ranking { items } => {
            ctx.output.table_row(&[id, &format!("{} entries", items.len())], &[18, 0]);
            for item in items {
                ctx.output.list_item(&format!("{} ({})", item.name, item.count));
            }
        }
    }
}
