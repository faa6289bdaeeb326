//! The device journal: one raw sync event per line.
//!
//! Reading is lenient. A line that fails to decode, including one that is
//! not UTF-8, is reported in [`JournalScan::skipped`] with its 1-indexed
//! line number and a `warn!`, and reading continues with the next line.
//! Writing is single-writer and serialized through a [`JournalLock`] on
//! `<journal>.lock`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::event::writer::write_line;
use crate::event::{DecodeError, SyncEvent, from_raw_bytes};
use crate::lock::{JournalLock, LockError};

/// Errors raised by journal file operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("failed to read journal {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write journal {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl JournalError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::JournalReadFailed,
            Self::Write { .. } => ErrorCode::JournalWriteFailed,
            Self::Lock(e) => e.code(),
        }
    }
}

/// A journal line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-indexed line number.
    pub line: usize,
    pub error: DecodeError,
    /// The line as text; invalid UTF-8 is shown as U+FFFD.
    pub raw: String,
}

/// Result of reading a journal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalScan {
    /// Decoded events in file order.
    pub events: Vec<SyncEvent>,
    /// Lines that failed to decode.
    pub skipped: Vec<SkippedLine>,
}

/// Decode every line of a journal, skipping blank and malformed lines.
#[must_use]
pub fn parse_journal(input: &str) -> JournalScan {
    parse_journal_bytes(input.as_bytes())
}

/// [`parse_journal`] over raw file bytes.
///
/// Lines are split on `\n` before any UTF-8 check, so one corrupt line
/// costs only that line.
#[must_use]
pub fn parse_journal_bytes(input: &[u8]) -> JournalScan {
    let mut scan = JournalScan::default();

    for (i, line) in input.split(|&b| b == b'\n').enumerate() {
        let line_no = i + 1;
        match from_raw_bytes(line) {
            Ok(Some(event)) => scan.events.push(event),
            Ok(None) => {}
            Err(error) => {
                warn!(
                    line = line_no,
                    code = %error.code(),
                    %error,
                    "skipping undecodable journal line"
                );
                scan.skipped.push(SkippedLine {
                    line: line_no,
                    error,
                    raw: String::from_utf8_lossy(line).trim_end_matches('\r').to_string(),
                });
            }
        }
    }

    scan
}

/// Render events as journal text, one newline-terminated line per event.
#[must_use]
pub fn render_journal(events: &[SyncEvent]) -> String {
    events.iter().map(write_line).collect()
}

/// Read and decode a journal file. A missing file is an empty journal.
///
/// # Errors
///
/// Returns [`JournalError::Read`] if the file exists but cannot be read.
pub fn read_journal(path: &Path) -> Result<JournalScan, JournalError> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "journal missing, treating as empty");
            return Ok(JournalScan::default());
        }
        Err(source) => {
            return Err(JournalError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(parse_journal_bytes(&content))
}

/// Append one event to the journal under the journal lock.
///
/// # Errors
///
/// Returns [`JournalError::Lock`] if the lock cannot be taken within
/// `lock_timeout`, or [`JournalError::Write`] if the append fails.
pub fn append_event(
    path: &Path,
    event: &SyncEvent,
    lock_timeout: Duration,
) -> Result<(), JournalError> {
    let _lock = JournalLock::acquire(&JournalLock::path_for(path), lock_timeout)?;
    let write_err = |source| JournalError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(write_line(event).as_bytes())
        .map_err(write_err)?;
    debug!(path = %path.display(), kind = %event.kind(), "appended journal event");
    Ok(())
}

/// Replace the journal contents with `events` under the journal lock.
///
/// Writes to a temp file in the journal's directory and persists it over
/// the journal, so readers never observe a half-written file.
///
/// # Errors
///
/// Returns [`JournalError::Lock`] on lock timeout, or [`JournalError::Write`]
/// if the temp file cannot be written or persisted.
pub fn write_journal(
    path: &Path,
    events: &[SyncEvent],
    lock_timeout: Duration,
) -> Result<(), JournalError> {
    let lock = JournalLock::acquire(&JournalLock::path_for(path), lock_timeout)?;
    rewrite_locked(&lock, path, events)
}

/// Rewrite the journal while `_lock` is held.
///
/// A failed write or persist drops the temp file, which deletes it.
fn rewrite_locked(
    _lock: &JournalLock,
    path: &Path,
    events: &[SyncEvent],
) -> Result<(), JournalError> {
    let write_err = |source| JournalError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(render_journal(events).as_bytes())
        .map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!(path = %path.display(), events = events.len(), "rewrote journal");
    Ok(())
}

/// What [`prune_journal`] found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub kept: Vec<SyncEvent>,
    pub dropped: Vec<SyncEvent>,
    /// Undecodable lines; a rewrite removes them.
    pub skipped: Vec<SkippedLine>,
    /// Whether the journal file was replaced.
    pub rewritten: bool,
}

/// Drop events older than `days` at `now` from the journal file.
///
/// The lock is held from the read through the rewrite, so an append from
/// another process either lands before the read or waits for the rewrite.
/// The file is left alone when nothing would change or `dry_run` is set.
///
/// # Errors
///
/// Returns [`JournalError::Lock`] on lock timeout, [`JournalError::Read`] if
/// the journal cannot be read, or [`JournalError::Write`] if the rewrite
/// fails.
pub fn prune_journal(
    path: &Path,
    days: i64,
    now: DateTime<Utc>,
    lock_timeout: Duration,
    dry_run: bool,
) -> Result<PruneOutcome, JournalError> {
    let lock = JournalLock::acquire(&JournalLock::path_for(path), lock_timeout)?;
    let scan = read_journal(path)?;
    let (kept, dropped) = prune_stale(scan.events, days, now);

    let changed = !dropped.is_empty() || !scan.skipped.is_empty();
    let rewritten = changed && !dry_run;
    if rewritten {
        rewrite_locked(&lock, path, &kept)?;
        info!(
            path = %path.display(),
            kept = kept.len(),
            dropped = dropped.len(),
            bad_lines = scan.skipped.len(),
            "journal pruned"
        );
    }

    Ok(PruneOutcome {
        kept,
        dropped,
        skipped: scan.skipped,
        rewritten,
    })
}

/// Split events into those younger than `days` at `now` and the stale rest.
#[must_use]
pub fn prune_stale(
    events: Vec<SyncEvent>,
    days: i64,
    now: DateTime<Utc>,
) -> (Vec<SyncEvent>, Vec<SyncEvent>) {
    events
        .into_iter()
        .partition(|event| !event.stale_at(days, now))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
