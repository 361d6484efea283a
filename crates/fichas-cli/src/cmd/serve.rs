use anyhow::Context;

use super::Ctx;

/// `fichas serve`: run the HTTP API until interrupted.
pub fn run(ctx: &Ctx, port: Option<u16>, bind: Option<String>, open: bool) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let port = port.unwrap_or(config.server.port);
    let bind = bind.unwrap_or(config.server.bind);
    let store = ctx.open_store()?;

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(async move { fichas_server::serve(store, &bind, port, open).await })
}
