//! Raw event writer.
//!
//! Serializes a [`SyncEvent`] to its single-line raw form:
//!
//! ```text
//! {kind code}{timestamp ms, zero-padded to TIMESTAMP_FIELD_WIDTH}{item payload}
//! ```
//!
//! Guarantees:
//!
//! - Deterministic: the same event always produces the same bytes.
//! - Total: every event encodes; out-of-range timestamps are clamped into
//!   the field rather than rejected.
//! - No line terminator; [`crate::journal`] adds one per line.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{SyncEvent, TIMESTAMP_FIELD_WIDTH};

/// Serialize an event to its raw form (without trailing newline).
#[must_use]
pub fn to_raw(event: &SyncEvent) -> String {
    let payload = event.item().to_raw();
    let mut line = String::with_capacity(1 + TIMESTAMP_FIELD_WIDTH + payload.len());
    line.push(event.kind().code());
    line.push_str(&timestamp_field(event.timestamp()));
    line.push_str(&payload);
    line
}

/// Serialize an event with a trailing newline, ready to append to a journal.
#[must_use]
pub fn write_line(event: &SyncEvent) -> String {
    let mut line = to_raw(event);
    line.push('\n');
    line
}

/// Render a timestamp as exactly [`TIMESTAMP_FIELD_WIDTH`] decimal digits.
///
/// Pre-epoch instants clamp to zero. Instants too large for the field keep
/// their low-order digits.
#[must_use]
pub fn timestamp_field(timestamp: DateTime<Utc>) -> String {
    let ms = timestamp.timestamp_millis();
    if ms < 0 {
        warn!(ms, "pre-epoch timestamp clamped to 0 in raw event");
    }
    let digits = format!("{:0width$}", ms.max(0), width = TIMESTAMP_FIELD_WIDTH);
    if digits.len() > TIMESTAMP_FIELD_WIDTH {
        warn!(
            ms,
            width = TIMESTAMP_FIELD_WIDTH,
            "timestamp wider than raw field, keeping low-order digits"
        );
        return digits[digits.len() - TIMESTAMP_FIELD_WIDTH..].to_string();
    }
    digits
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
