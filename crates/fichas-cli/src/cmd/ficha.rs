use anyhow::{anyhow, Context};
use fichas_core::{
    Ficha, FichaState, FichaStore, LifecycleService, Priority, TriageFilter, TriageService,
};

use super::{display_opt, Ctx};
use crate::output::{print_json, print_table, truncate};

fn parse_priority(raw: Option<&str>) -> anyhow::Result<Option<Priority>> {
    raw.map(|p| Priority::normalize(p).ok_or_else(|| anyhow!("unknown priority: {p}")))
        .transpose()
}

fn print_list(fichas: &[Ficha], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&fichas);
    }
    if fichas.is_empty() {
        println!("No fichas.");
        return Ok(());
    }
    let rows = fichas
        .iter()
        .map(|f| {
            vec![
                f.id.clone(),
                f.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                display_opt(&f.recommended_channel),
                truncate(&display_opt(&f.institution), 30),
                truncate(&display_opt(&f.title), 50),
            ]
        })
        .collect();
    print_table(&["ID", "PRIORITY", "CHANNEL", "INSTITUTION", "TITLE"], rows);
    Ok(())
}

/// `fichas pending`: pending fichas in triage order.
pub fn pending(ctx: &Ctx, query: Option<String>, priority: Option<&str>) -> anyhow::Result<()> {
    let filter = TriageFilter {
        query,
        priority: parse_priority(priority)?,
    };
    let triage = TriageService::new(ctx.open_store()?);
    let fichas = triage.rank_pending().context("failed to rank pending fichas")?;
    print_list(&filter.apply(fichas), ctx.json)
}

/// `fichas list --state <state>`
pub fn list(
    ctx: &Ctx,
    state: &str,
    query: Option<String>,
    priority: Option<&str>,
) -> anyhow::Result<()> {
    let state: FichaState = state.parse().with_context(|| format!("unknown state: {state}"))?;
    let filter = TriageFilter {
        query,
        priority: parse_priority(priority)?,
    };
    let triage = TriageService::new(ctx.open_store()?);
    let fichas = triage
        .list(state)
        .with_context(|| format!("failed to list {state} fichas"))?;
    print_list(&filter.apply(fichas), ctx.json)
}

/// `fichas show <id>`
pub fn show(ctx: &Ctx, id: &str) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let f = store
        .get(id)
        .with_context(|| format!("ficha '{id}' not found"))?;

    if ctx.json {
        return print_json(&f);
    }

    println!("Ficha:       {}", f.id);
    println!("URL:         {}", f.url);
    if let Some(ref title) = f.title {
        println!("Title:       {title}");
    }
    if let Some(ref inst) = f.institution {
        println!("Institution: {inst}");
    }
    println!(
        "Priority:    {}",
        f.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("State:       {}", f.state);
    println!("Processed:   {}", if f.processed { "yes" } else { "no" });
    println!("Channel:     {}", display_opt(&f.recommended_channel));
    for (label, value) in [
        ("Email", &f.email),
        ("Phone", &f.phone),
        ("Username", &f.username),
        ("Platform", &f.social_platform),
        ("Subreddit", &f.subreddit),
        ("FB group", &f.facebook_group),
    ] {
        if let Some(v) = value {
            println!("{:<13}{v}", format!("{label}:"));
        }
    }
    println!("Created:     {}", f.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(at) = f.contacted_at {
        println!("Contacted:   {}", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(ref proposal) = f.proposal_text {
        println!("\nProposal:\n{proposal}");
    }
    Ok(())
}

/// `fichas contact <id>`
pub fn contact(ctx: &Ctx, id: &str) -> anyhow::Result<()> {
    let lifecycle = LifecycleService::new(ctx.open_store()?);
    let f = lifecycle
        .mark_contacted(id)
        .with_context(|| format!("cannot mark '{id}' as contacted"))?;
    if ctx.json {
        print_json(&f)?;
    } else {
        println!("Marked '{id}' as contacted");
    }
    Ok(())
}

/// `fichas discard <id>`
pub fn discard(ctx: &Ctx, id: &str) -> anyhow::Result<()> {
    let lifecycle = LifecycleService::new(ctx.open_store()?);
    let f = lifecycle
        .mark_discarded(id)
        .with_context(|| format!("cannot discard '{id}'"))?;
    if ctx.json {
        print_json(&f)?;
    } else {
        println!("Discarded '{id}'");
    }
    Ok(())
}

/// `fichas discard-low`
pub fn discard_low(ctx: &Ctx) -> anyhow::Result<()> {
    let lifecycle = LifecycleService::new(ctx.open_store()?);
    let outcome = lifecycle
        .bulk_discard_low_priority()
        .context("bulk discard failed")?;
    if ctx.json {
        print_json(&outcome)?;
    } else {
        println!(
            "Discarded {} low-priority fichas ({} failed)",
            outcome.succeeded, outcome.failed
        );
    }
    Ok(())
}
