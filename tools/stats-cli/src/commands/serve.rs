//! Run the HTTP server.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use stats_server::StatsServer;

use super::{build_gateway, ServeArgs};
use crate::context::Context;

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let gateway = build_gateway(ctx)?;
    if let Err(e) = gateway.config().validate() {
        // Queries will fail with a misconfiguration error until this is fixed.
        ctx.output.warn(&format!("{}", e));
    }

    let addr = args.addr.unwrap_or_else(|| ctx.config.server.addr.clone());
    ctx.output.success(&format!("Serving statistics on http://{}", addr));

    StatsServer::new(Arc::new(gateway))
        .run(&addr)
        .await
        .with_context(|| format!("Server on {} failed", addr))
}
