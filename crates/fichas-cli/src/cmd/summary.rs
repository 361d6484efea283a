use anyhow::Context;
use fichas_core::AggregationService;

use super::Ctx;
use crate::output::{print_json, print_table};

/// `fichas summary`
pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let aggregation = AggregationService::new(ctx.open_store()?);
    let stats = aggregation.stats().context("failed to compute summary")?;

    if ctx.json {
        return print_json(&stats);
    }

    let (s, p) = (stats.summary, stats.priorities);

    let row = |label: &str, n: u64| vec![label.to_string(), n.to_string()];
    print_table(
        &["METRIC", "COUNT"],
        vec![
            row("total", s.total),
            row("pending", s.pending),
            row("contacted", s.contacted),
            row("discarded", s.discarded),
            row("processed", s.processed),
            row("unprocessed", s.unprocessed),
        ],
    );
    println!();
    print_table(
        &["PRIORITY", "COUNT"],
        vec![
            row("high", p.high),
            row("medium", p.medium),
            row("low", p.low),
            row("unranked", p.unranked),
        ],
    );
    Ok(())
}
