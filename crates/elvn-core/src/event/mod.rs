//! Sync events: one recorded mutation on one item.
//!
//! # Raw format
//!
//! A sync event is persisted as a single line with no delimiters; field
//! boundaries are positional:
//!
//! ```text
//! {kind code: 1 char}{timestamp ms: TIMESTAMP_FIELD_WIDTH digits}{item payload}
//! ```
//!
//! Encoding lives in [`writer`], decoding in [`parser`]. The attached
//! [`CommandResult`] is in-memory metadata only and never reaches the raw
//! form.

pub mod parser;
pub mod types;
pub mod writer;

pub use parser::{DecodeError, from_raw, from_raw_bytes};
pub use types::{EventKind, UnknownEventKind};
pub use writer::to_raw;

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SubsecRound, Utc};

use crate::item::{ItemError, ItemHandle, ItemKey};

/// Width of the timestamp field in the raw form.
///
/// Thirteen decimal digits hold epoch milliseconds through the year 2286.
/// Deliberately independent of [`crate::item::ID_WIDTH`].
pub const TIMESTAMP_FIELD_WIDTH: usize = 13;

/// Largest epoch millisecond value the timestamp field holds without
/// truncation.
pub const MAX_TIMESTAMP_MS: i64 = 9_999_999_999_999;

/// Milliseconds in one day, for [`SyncEvent::stale`].
pub const MS_PER_DAY: i64 = 86_400_000;

/// Outcome of the command that produced an event.
///
/// Kept so the caller can show undo information; it is never written to the
/// journal and is always absent on decoded events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// The command line as typed.
    pub input: String,
    /// Message shown to the user, if any.
    pub message: Option<String>,
}

impl CommandResult {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A single mutation on one item.
///
/// Equality compares item, kind and timestamp (the command is not part of an
/// event's identity). Hashing uses the item's [`ItemKey`] alone, so every
/// event for one item collides in hashed containers, whatever the snapshot
/// or whether the payload is still raw.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    item: ItemHandle,
    kind: EventKind,
    command: Option<CommandResult>,
    timestamp: DateTime<Utc>,
}

impl SyncEvent {
    /// Record `kind` on `item` now.
    pub fn new(item: impl Into<ItemHandle>, kind: EventKind) -> Self {
        Self::with_command(item, kind, None)
    }

    /// Record `kind` on `item` now, keeping the command outcome.
    pub fn with_command(
        item: impl Into<ItemHandle>,
        kind: EventKind,
        command: Option<CommandResult>,
    ) -> Self {
        Self::at(item, kind, command, Utc::now())
    }

    /// Fully explicit constructor. The timestamp is truncated to whole
    /// milliseconds, the resolution of the raw form.
    pub fn at(
        item: impl Into<ItemHandle>,
        kind: EventKind,
        command: Option<CommandResult>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            item: item.into(),
            kind,
            command,
            timestamp: timestamp.trunc_subsecs(3),
        }
    }

    #[must_use]
    pub const fn item(&self) -> &ItemHandle {
        &self.item
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub const fn command(&self) -> Option<&CommandResult> {
        self.command.as_ref()
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Timestamp as milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Encode into the raw single-line form.
    #[must_use]
    pub fn to_raw(&self) -> String {
        writer::to_raw(self)
    }

    /// Decode a raw line. See [`parser::from_raw`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for an unknown kind code or a line too short
    /// to hold the header.
    pub fn from_raw(raw: &str) -> Result<Option<Self>, DecodeError> {
        parser::from_raw(raw)
    }

    /// Identifier of the item this event mutates, or `None` when the item is
    /// an unresolved raw payload.
    #[must_use]
    pub fn item_id(&self) -> Option<String> {
        self.item.item_id()
    }

    /// Identifier of the item, resolving a raw payload first.
    ///
    /// `None` when the payload does not decode.
    #[must_use]
    pub fn resolved_item_id(&self) -> Option<String> {
        match &self.item {
            ItemHandle::Raw(_) => self.item.resolve().ok()?.item_id(),
            typed => typed.item_id(),
        }
    }

    /// Typed identity of the item, or `None` for an unresolved raw payload.
    #[must_use]
    pub fn item_key(&self) -> Option<ItemKey> {
        self.item.item_key()
    }

    /// Typed identity of the item, resolving a raw payload first.
    ///
    /// `None` when the payload does not decode.
    #[must_use]
    pub fn resolved_item_key(&self) -> Option<ItemKey> {
        match &self.item {
            ItemHandle::Raw(_) => self.item.resolve().ok()?.item_key(),
            typed => typed.item_key(),
        }
    }

    /// Copy of this event with its item resolved to a typed variant.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if the raw payload is not a valid item.
    pub fn resolved(&self) -> Result<Self, ItemError> {
        Ok(Self {
            item: self.item.resolve()?,
            kind: self.kind,
            command: self.command.clone(),
            timestamp: self.timestamp,
        })
    }

    /// Whether more than `days` whole days have elapsed since this event.
    #[must_use]
    pub fn stale(&self, days: i64) -> bool {
        self.stale_at(days, Utc::now())
    }

    /// [`Self::stale`] measured against an explicit `now`.
    ///
    /// Elapsed time only; no calendar alignment. Zero or negative `days`
    /// makes every past event stale.
    #[must_use]
    pub fn stale_at(&self, days: i64, now: DateTime<Utc>) -> bool {
        let limit = days.saturating_mul(MS_PER_DAY);
        let elapsed = now
            .timestamp_millis()
            .saturating_sub(self.timestamp.timestamp_millis());
        elapsed > limit
    }

    /// Candidate content for the item after this event.
    ///
    /// Every kind except [`EventKind::Delete`] yields the item's full raw
    /// payload; `Delete` yields `None`, the tombstone. `file_body` is the
    /// current content and is left for the replay driver to compose with.
    #[must_use]
    pub fn apply(&self, _file_body: Option<&str>) -> Option<String> {
        match self.kind {
            EventKind::Create
            | EventKind::Modify
            | EventKind::Append
            | EventKind::Replace
            | EventKind::Plan
            | EventKind::Unplan
            | EventKind::Done
            | EventKind::Undone
            | EventKind::Run => Some(self.item.to_raw()),
            EventKind::Delete => None,
        }
    }

    /// Whether this event takes precedence over `other`.
    ///
    /// - no `other`: always after;
    /// - different kinds: always after, in both directions;
    /// - same kind: after iff strictly later.
    ///
    /// Because two events of different kinds are each "after" the other, the
    /// rule is only deterministic when folded in a fixed scan order; see
    /// [`crate::sync::merge::pick_winner`].
    #[must_use]
    pub fn after(&self, other: Option<&Self>) -> bool {
        let Some(other) = other else {
            return true;
        };
        if self.kind != other.kind {
            return true;
        }
        self.timestamp > other.timestamp
    }
}

impl PartialEq for SyncEvent {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item && self.kind == other.kind && self.timestamp == other.timestamp
    }
}

impl Eq for SyncEvent {}

impl Hash for SyncEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.resolved_item_key() {
            Some(key) => key.hash(state),
            None => self.item.to_raw().hash(state),
        }
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
