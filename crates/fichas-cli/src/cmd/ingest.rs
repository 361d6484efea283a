use anyhow::Context;
use fichas_core::ingest::ingest_all;
use fichas_core::NewFicha;
use std::path::Path;

use super::Ctx;
use crate::output::print_json;

/// `fichas ingest <file>`: insert a JSON array of discovered leads.
pub fn run(ctx: &Ctx, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let batch: Vec<NewFicha> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of fichas", file.display()))?;

    let store = ctx.open_store()?;
    let report = ingest_all(store.as_ref(), batch, chrono::Utc::now());

    if ctx.json {
        print_json(&report)?;
    } else {
        println!(
            "Inserted {} fichas ({} duplicates skipped, {} failed)",
            report.inserted, report.duplicates, report.failed
        );
    }
    Ok(())
}
