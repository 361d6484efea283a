use anyhow::Context;
use fichas_core::config::Config;
use fichas_core::paths;

use super::{rel, Ctx};
use crate::output::print_json;

/// Create `.fichas/`, write a default config if none exists and bootstrap
/// the database. Safe to run repeatedly.
pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let wrote_config =
        Config::write_default_if_missing(&ctx.root).context("failed to write config")?;

    let db_path = ctx.database_path()?;
    ctx.open_store()?;

    if ctx.json {
        print_json(&serde_json::json!({
            "root": ctx.root,
            "config_created": wrote_config,
            "database": db_path,
        }))?;
    } else {
        if wrote_config {
            println!("Wrote {}", paths::CONFIG_FILE);
        }
        println!("Database ready: {}", rel(&ctx.root, &db_path));
    }
    Ok(())
}
