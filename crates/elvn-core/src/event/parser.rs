//! Raw event parser.
//!
//! Decodes the single-line raw form produced by [`super::writer`]. Field
//! boundaries are positional:
//!
//! ```text
//! byte 0                           kind code
//! bytes 1..=TIMESTAMP_FIELD_WIDTH  decimal milliseconds
//! remaining bytes                  item payload (left unresolved)
//! ```
//!
//! Parsing is lenient where it is safe to be: an unreadable timestamp
//! becomes the epoch, which loses every precedence comparison against a
//! real event of the same kind. An unknown kind code is an error for that
//! line only; [`crate::journal::parse_journal`] skips it and keeps reading.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::types::EventKind;
use super::{SyncEvent, TIMESTAMP_FIELD_WIDTH};
use crate::error::ErrorCode;
use crate::item::ItemHandle;

/// Length of the positional header: kind code plus timestamp field.
pub const HEADER_LEN: usize = 1 + TIMESTAMP_FIELD_WIDTH;

/// Errors that make a single raw line undecodable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The first character is not a registered kind code.
    #[error("unknown event kind code {0:?}")]
    UnknownKind(char),

    /// The line ends before the timestamp field does.
    #[error("raw event is {found} bytes, expected at least {expected}")]
    Truncated {
        /// Bytes present.
        found: usize,
        /// Header length.
        expected: usize,
    },

    /// A positional field boundary falls inside a multi-byte character.
    #[error("field boundary at byte {0} splits a UTF-8 character")]
    FieldBoundary(usize),

    /// The line bytes are not UTF-8.
    #[error("line is not valid UTF-8 after byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
}

impl DecodeError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownKind(_) => ErrorCode::UnknownEventKind,
            Self::Truncated { .. } => ErrorCode::TruncatedEvent,
            Self::FieldBoundary(_) => ErrorCode::FieldBoundary,
            Self::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
        }
    }
}

/// Decode one raw event line.
///
/// A trailing `\n` or `\r\n` is ignored. Returns `Ok(None)` for an empty or
/// whitespace-only line. The decoded event has no command and its item is an
/// unresolved [`ItemHandle::Raw`].
///
/// # Errors
///
/// Returns [`DecodeError`] if the kind code is unknown or the line is too
/// short to hold the header.
pub fn from_raw(raw: &str) -> Result<Option<SyncEvent>, DecodeError> {
    let line = raw.trim_end_matches('\n').trim_end_matches('\r');
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mut chars = line.chars();
    let code = chars.next().ok_or(DecodeError::Truncated {
        found: 0,
        expected: HEADER_LEN,
    })?;
    let kind = EventKind::from_code(code).ok_or(DecodeError::UnknownKind(code))?;

    if line.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            found: line.len(),
            expected: HEADER_LEN,
        });
    }
    if !line.is_char_boundary(HEADER_LEN) {
        return Err(DecodeError::FieldBoundary(HEADER_LEN));
    }

    // Kind codes are ASCII, so byte 1 is always a boundary.
    let time_part = &line[1..HEADER_LEN];
    let payload = &line[HEADER_LEN..];

    Ok(Some(SyncEvent::at(
        ItemHandle::Raw(payload.to_string()),
        kind,
        None,
        parse_timestamp(time_part),
    )))
}

/// Decode one raw line given as bytes, as read from a journal file.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidUtf8`] if the bytes are not UTF-8, otherwise
/// whatever [`from_raw`] returns.
pub fn from_raw_bytes(raw: &[u8]) -> Result<Option<SyncEvent>, DecodeError> {
    let line = std::str::from_utf8(raw).map_err(|e| DecodeError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    from_raw(line)
}

/// Parse the timestamp field, falling back to the epoch on any error.
#[must_use]
pub fn parse_timestamp(field: &str) -> DateTime<Utc> {
    match field.parse::<i64>() {
        Ok(ms) => {
            DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        }
        Err(e) => {
            debug!(field, error = %e, "unparseable event timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{List, Note};
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid ms")
    }

    fn decode(raw: &str) -> SyncEvent {
        from_raw(raw)
            .expect("should decode")
            .expect("should not be empty")
    }

    #[test]
    fn decodes_header_and_leaves_payload_raw() {
        let event = decode(r#"01700000000000n0000000000042{"text":"Buy milk"}"#);
        assert_eq!(event.kind(), EventKind::Create);
        assert_eq!(event.timestamp(), at_ms(1_700_000_000_000));
        assert_eq!(
            event.item(),
            &ItemHandle::Raw(r#"n0000000000042{"text":"Buy milk"}"#.into())
        );
        assert!(event.command().is_none());
    }

    #[test]
    fn payload_resolves_to_typed_item() {
        let event = decode(r#"61700000000000n0000000000042{"text":"Buy milk"}"#);
        let resolved = event.resolved().expect("valid note");
        assert_eq!(
            resolved.item(),
            &ItemHandle::Note(Note::new(42, None, "Buy milk"))
        );
        assert_eq!(resolved.item_id().as_deref(), Some("42"));
    }

    #[test]
    fn every_kind_code_decodes() {
        for kind in EventKind::ALL {
            let raw = format!("{}0000000000001l{{}}", kind.code());
            assert_eq!(decode(&raw).kind(), kind);
        }
    }

    #[test]
    fn empty_and_blank_lines_are_none() {
        assert_eq!(from_raw(""), Ok(None));
        assert_eq!(from_raw("   "), Ok(None));
        assert_eq!(from_raw("\n"), Ok(None));
        assert_eq!(from_raw("\r\n"), Ok(None));
    }

    #[test]
    fn trailing_newline_is_ignored() {
        let event = decode("51700000000000l{}\r\n");
        assert_eq!(event.item(), &ItemHandle::Raw("l{}".into()));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = from_raw("x1700000000000l{}").expect_err("should fail");
        assert_eq!(err, DecodeError::UnknownKind('x'));
        assert_eq!(err.code(), ErrorCode::UnknownEventKind);
    }

    #[test]
    fn multibyte_kind_is_unknown() {
        let err = from_raw("é1700000000000l{}").expect_err("should fail");
        assert_eq!(err, DecodeError::UnknownKind('é'));
    }

    #[test]
    fn short_line_is_truncated() {
        let err = from_raw("0170000").expect_err("should fail");
        assert_eq!(
            err,
            DecodeError::Truncated {
                found: 7,
                expected: HEADER_LEN
            }
        );
    }

    #[test]
    fn header_only_line_has_empty_payload() {
        let event = decode("01700000000000");
        assert_eq!(event.item(), &ItemHandle::Raw(String::new()));
    }

    #[test]
    fn boundary_inside_character_is_rejected() {
        // 12 ASCII digits then a two-byte character straddling byte 13/14.
        let err = from_raw("0170000000000é").expect_err("should fail");
        assert_eq!(err, DecodeError::FieldBoundary(HEADER_LEN));
    }

    #[test]
    fn non_utf8_bytes_are_rejected() {
        let err = from_raw_bytes(b"0170000000000\xff\xfe junk").expect_err("should fail");
        assert_eq!(err, DecodeError::InvalidUtf8 { valid_up_to: 13 });
        assert_eq!(err.code(), ErrorCode::InvalidUtf8);
    }

    #[test]
    fn utf8_bytes_decode_like_str() {
        let event = from_raw_bytes(b"51700000000000l{}\n")
            .expect("decode")
            .expect("non-empty");
        assert_eq!(event.kind(), EventKind::Unplan);
        assert_eq!(from_raw_bytes(b""), Ok(None));
    }

    #[test]
    fn malformed_timestamp_falls_back_to_epoch() {
        let event = decode("2abcdefghijklml{}");
        assert_eq!(event.kind(), EventKind::Append);
        assert_eq!(event.timestamp(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(event.item(), &ItemHandle::Raw("l{}".into()));
    }

    #[test]
    fn parse_timestamp_fallbacks() {
        assert_eq!(parse_timestamp("0000000000000"), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp("12a"), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp(""), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp("0000000000042"), at_ms(42));
    }

    #[test]
    fn reencode_decoded_event_is_byte_identical() {
        let original = SyncEvent::at(
            List::new("b", "Work"),
            EventKind::Replace,
            None,
            at_ms(1_362_771_947_351),
        );
        let raw = original.to_raw();
        assert_eq!(decode(&raw).to_raw(), raw);
    }
}
