//! `elvn encode`: build a raw event line.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Args;
use elvn_core::error::ErrorCode;
use elvn_core::event::{EventKind, MAX_TIMESTAMP_MS, SyncEvent};
use elvn_core::item::{ItemHandle, decode_item};
use elvn_core::journal::append_event;
use serde::Serialize;
use tracing::info;

use super::{JournalContext, journal_failure};
use crate::output::{CliError, OutputMode, human_kv, render, render_error};

/// Arguments for `elvn encode`.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Event kind (create, modify, append, replace, plan, unplan, done,
    /// undone, run, delete).
    #[arg(long)]
    pub kind: EventKind,

    /// Item payload in its raw form, e.g. `l{"color":"b","label":"Work"}`.
    #[arg(long, value_name = "PAYLOAD")]
    pub item: String,

    /// Event time in epoch milliseconds. Defaults to now.
    #[arg(long, value_name = "MS", allow_hyphen_values = true)]
    pub at: Option<i64>,

    /// Append the event to the configured journal.
    #[arg(long)]
    pub append: bool,
}

/// Report payload for `elvn encode`.
#[derive(Debug, Serialize)]
pub struct EncodeReport {
    pub raw: String,
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

/// Validate an item payload given in its raw form.
pub fn parse_item(raw: &str) -> anyhow::Result<ItemHandle> {
    decode_item(raw).with_context(|| format!("invalid item payload '{raw}'"))
}

/// Event time for `--at`, or now when absent.
///
/// Only values the raw timestamp field can hold are accepted.
pub fn resolve_timestamp(at: Option<i64>) -> anyhow::Result<DateTime<Utc>> {
    let Some(ms) = at else {
        return Ok(Utc::now());
    };
    anyhow::ensure!(
        (0..=MAX_TIMESTAMP_MS).contains(&ms),
        "timestamp {ms} is outside 0..={MAX_TIMESTAMP_MS}"
    );
    DateTime::<Utc>::from_timestamp_millis(ms)
        .with_context(|| format!("timestamp {ms} is out of range"))
}

/// Render `err` under `code`, then return it.
fn fail<T>(output: OutputMode, code: ErrorCode, err: anyhow::Error) -> anyhow::Result<T> {
    render_error(output, &CliError::coded(code, format!("{err:#}")))?;
    Err(err)
}

/// Execute `elvn encode`.
pub fn run_encode(
    args: &EncodeArgs,
    output: OutputMode,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let item = parse_item(&args.item).or_else(|e| fail(output, ErrorCode::MalformedItem, e))?;
    let timestamp = resolve_timestamp(args.at)
        .or_else(|e| fail(output, ErrorCode::TimestampOutOfRange, e))?;
    let event = SyncEvent::at(item, args.kind, None, timestamp);

    let mut journal = None;
    if args.append {
        let ctx = JournalContext::load(output, config_path)?;
        let path = ctx.journal_path();
        append_event(&path, &event, ctx.config.journal.lock_timeout())
            .map_err(|e| journal_failure(output, e))?;
        info!(path = %path.display(), kind = %event.kind(), "event appended");
        journal = Some(path.display().to_string());
    }

    let report = EncodeReport {
        raw: event.to_raw(),
        item_id: event.item_id(),
        journal,
    };
    render(output, &report, render_encode_human)
}

fn render_encode_human(report: &EncodeReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", report.raw)?;
    if let Some(journal) = &report.journal {
        human_kv(w, "appended", journal)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_event_at_explicit_time() {
        let item = parse_item("l{\"color\":\"g\",\"label\":\"Home\"}").expect("item");
        let timestamp = resolve_timestamp(Some(1_700_000_000_000)).expect("timestamp");
        let event = SyncEvent::at(item, EventKind::Plan, None, timestamp);
        assert_eq!(event.to_raw(), "41700000000000l{\"color\":\"g\",\"label\":\"Home\"}");
        assert_eq!(event.item_id().as_deref(), Some("g"));
    }

    #[test]
    fn rejects_invalid_payload() {
        let err = parse_item("x{}").expect_err("bad tag");
        assert!(format!("{err:#}").contains("invalid item payload"));
    }

    #[test]
    fn timestamp_must_fit_the_field() {
        assert!(resolve_timestamp(Some(0)).is_ok());
        assert!(resolve_timestamp(Some(MAX_TIMESTAMP_MS)).is_ok());
        for ms in [-5, MAX_TIMESTAMP_MS + 1, i64::MAX] {
            let err = resolve_timestamp(Some(ms)).expect_err("out of range");
            assert!(err.to_string().contains("outside"), "{err}");
        }
    }
}
