//! `elvn merge`: pick one winning event per item across two journals.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use elvn_core::sync::{ItemStore, MergeResult, ReplayStats, merge_events};
use serde::Serialize;

use super::decode::EventView;
use super::{SkippedView, read_journal_file};
use crate::output::{OutputMode, human_kv, render};

/// Arguments for `elvn merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Journal of this device.
    #[arg(value_name = "LOCAL")]
    pub local: PathBuf,

    /// Journal received from the other device.
    #[arg(value_name = "REMOTE")]
    pub remote: PathBuf,

    /// Replay the winners and print the resulting items.
    #[arg(long)]
    pub items: bool,
}

#[derive(Debug, Serialize)]
pub struct ReplayView {
    pub written: usize,
    pub removed: usize,
    pub skipped: usize,
    /// Item key (`n:1`, `l:b`, `t:timer`) to raw payload after replay.
    pub items: BTreeMap<String, String>,
}

/// Report payload for `elvn merge`.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    /// Winning event per item key.
    pub winners: BTreeMap<String, EventView>,
    pub discarded: usize,
    pub duplicates_skipped: usize,
    pub unidentified: Vec<EventView>,
    pub skipped_lines: Vec<SkippedView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<ReplayView>,
}

impl MergeReport {
    fn new(merged: &MergeResult, skipped_lines: Vec<SkippedView>) -> Self {
        Self {
            winners: merged
                .winners
                .iter()
                .map(|(key, event)| (key.to_string(), EventView::new(event)))
                .collect(),
            discarded: merged.discarded,
            duplicates_skipped: merged.duplicates_skipped,
            unidentified: merged.unidentified.iter().map(EventView::new).collect(),
            skipped_lines,
            replay: None,
        }
    }
}

fn replay_view(merged: &MergeResult) -> ReplayView {
    let mut store = ItemStore::new();
    let ReplayStats {
        written,
        removed,
        skipped,
    } = store.replay(merged);
    let items = store
        .iter()
        .map(|(key, raw)| (key.to_string(), raw.to_string()))
        .collect();
    ReplayView {
        written,
        removed,
        skipped,
        items,
    }
}

/// Execute `elvn merge`.
pub fn run_merge(args: &MergeArgs, output: OutputMode) -> anyhow::Result<()> {
    let local = read_journal_file(output, &args.local)?;
    let remote = read_journal_file(output, &args.remote)?;

    let merged = merge_events(&local.events, &remote.events);

    let mut skipped_lines = SkippedView::from_scan(&local);
    skipped_lines.extend(SkippedView::from_scan(&remote));

    let mut report = MergeReport::new(&merged, skipped_lines);
    if args.items {
        report.replay = Some(replay_view(&merged));
    }

    render(output, &report, render_merge_human)
}

fn render_merge_human(report: &MergeReport, w: &mut dyn Write) -> io::Result<()> {
    for (key, event) in &report.winners {
        writeln!(
            w,
            "{key:<13}  {:<7}  {}  {}",
            event.kind.as_str(),
            event.timestamp,
            event.item
        )?;
    }
    human_kv(w, "items", report.winners.len().to_string())?;
    human_kv(w, "discarded", report.discarded.to_string())?;
    human_kv(w, "duplicates", report.duplicates_skipped.to_string())?;
    if !report.unidentified.is_empty() {
        human_kv(w, "unidentified", report.unidentified.len().to_string())?;
    }
    if !report.skipped_lines.is_empty() {
        human_kv(w, "bad lines", report.skipped_lines.len().to_string())?;
    }
    if let Some(replay) = &report.replay {
        writeln!(w)?;
        for (key, raw) in &replay.items {
            writeln!(w, "{key:<13}  {raw}")?;
        }
        human_kv(
            w,
            "replayed",
            format!(
                "{} written, {} removed, {} skipped",
                replay.written, replay.removed, replay.skipped
            ),
        )?;
    }
    Ok(())
}
