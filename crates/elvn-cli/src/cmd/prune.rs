//! `elvn prune`: drop stale events from the device journal.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use clap::Args;
use elvn_core::journal::prune_journal;
use serde::Serialize;

use super::{JournalContext, journal_failure};
use crate::output::{OutputMode, human_kv, render};

/// Arguments for `elvn prune`.
#[derive(Args, Debug, Default)]
pub struct PruneArgs {
    /// Staleness window in days. Defaults to `journal.stale_days`.
    #[arg(long)]
    pub days: Option<i64>,

    /// Report what would be dropped without rewriting the journal.
    #[arg(long)]
    pub dry_run: bool,
}

/// Report payload for `elvn prune`.
#[derive(Debug, Serialize)]
pub struct PruneReport {
    pub journal: String,
    pub days: i64,
    pub kept: usize,
    pub dropped: usize,
    /// Undecodable lines removed by the rewrite.
    pub bad_lines: usize,
    pub dry_run: bool,
}

/// Execute `elvn prune`.
pub fn run_prune(
    args: &PruneArgs,
    output: OutputMode,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let ctx = JournalContext::load(output, config_path)?;
    let path = ctx.journal_path();
    let days = args.days.unwrap_or(ctx.config.journal.stale_days);

    let outcome = prune_journal(
        &path,
        days,
        Utc::now(),
        ctx.config.journal.lock_timeout(),
        args.dry_run,
    )
    .map_err(|e| journal_failure(output, e))?;

    let report = PruneReport {
        journal: path.display().to_string(),
        days,
        kept: outcome.kept.len(),
        dropped: outcome.dropped.len(),
        bad_lines: outcome.skipped.len(),
        dry_run: args.dry_run,
    };
    render(output, &report, render_prune_human)
}

fn render_prune_human(report: &PruneReport, w: &mut dyn Write) -> io::Result<()> {
    human_kv(w, "journal", &report.journal)?;
    human_kv(w, "window", format!("{} days", report.days))?;
    human_kv(w, "kept", report.kept.to_string())?;
    human_kv(w, "dropped", report.dropped.to_string())?;
    if report.bad_lines > 0 {
        human_kv(w, "bad lines", report.bad_lines.to_string())?;
    }
    if report.dry_run {
        writeln!(w, "dry run: journal unchanged")?;
    }
    Ok(())
}
