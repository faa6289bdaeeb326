//! `elvn decode`: print the events of a journal.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use chrono::SecondsFormat;
use clap::Args;
use elvn_core::event::{EventKind, SyncEvent};
use elvn_core::journal::{JournalScan, parse_journal_bytes};
use serde::Serialize;

use super::{SkippedView, read_journal_file};
use crate::output::{OutputMode, render};

/// Arguments for `elvn decode`.
#[derive(Args, Debug, Default)]
pub struct DecodeArgs {
    /// Journal file to decode. Reads stdin when absent.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// One decoded event.
#[derive(Debug, Serialize)]
pub struct EventView {
    pub kind: EventKind,
    pub code: char,
    pub timestamp_ms: i64,
    pub timestamp: String,
    pub item_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub item: String,
}

impl EventView {
    pub fn new(event: &SyncEvent) -> Self {
        let resolved = event.item().resolve().ok();
        Self {
            kind: event.kind(),
            code: event.kind().code(),
            timestamp_ms: event.timestamp_ms(),
            timestamp: event.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
            item_type: resolved.as_ref().map_or("raw", |item| item.type_name()),
            item_id: resolved.as_ref().and_then(|item| item.item_id()),
            item: event.item().to_raw(),
        }
    }
}

/// Report payload for `elvn decode`.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    pub events: Vec<EventView>,
    pub skipped: Vec<SkippedView>,
}

impl DecodeReport {
    pub fn from_scan(scan: &JournalScan) -> Self {
        Self {
            events: scan.events.iter().map(EventView::new).collect(),
            skipped: SkippedView::from_scan(scan),
        }
    }
}

/// Execute `elvn decode`.
pub fn run_decode(args: &DecodeArgs, output: OutputMode) -> anyhow::Result<()> {
    let scan = match &args.file {
        Some(path) => read_journal_file(output, path)?,
        None => {
            let mut input = Vec::new();
            io::stdin()
                .read_to_end(&mut input)
                .context("Failed to read journal from stdin")?;
            parse_journal_bytes(&input)
        }
    };

    render(output, &DecodeReport::from_scan(&scan), render_decode_human)
}

fn render_decode_human(report: &DecodeReport, w: &mut dyn Write) -> io::Result<()> {
    for event in &report.events {
        writeln!(
            w,
            "{}  {:<7}  {:<5}  {:<13}  {}",
            event.timestamp,
            event.kind.as_str(),
            event.item_type,
            event.item_id.as_deref().unwrap_or("-"),
            event.item
        )?;
    }
    for skipped in &report.skipped {
        writeln!(
            w,
            "skipped line {} [{}]: {}",
            skipped.line, skipped.code, skipped.error
        )?;
    }
    writeln!(
        w,
        "{} events, {} skipped",
        report.events.len(),
        report.skipped.len()
    )
}
