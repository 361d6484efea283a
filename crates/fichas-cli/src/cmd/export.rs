use anyhow::Context;
use fichas_core::export;
use std::path::Path;

use super::{rel, Ctx};
use crate::output::print_json;

/// `fichas export [--output <file>]`: write a JSON snapshot of every ficha.
pub fn run(ctx: &Ctx, output: &Path) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let snapshot =
        export::snapshot(store.as_ref(), chrono::Utc::now()).context("failed to read store")?;
    let path = if output.is_absolute() {
        output.to_path_buf()
    } else {
        ctx.root.join(output)
    };
    export::write_json(&path, &snapshot)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if ctx.json {
        print_json(&serde_json::json!({
            "path": path,
            "fichas": snapshot.fichas.len(),
            "summary": snapshot.summary,
        }))?;
    } else {
        println!(
            "Exported {} fichas to {}",
            snapshot.fichas.len(),
            rel(&ctx.root, &path)
        );
    }
    Ok(())
}
