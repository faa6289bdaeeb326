//! Domain items carried by sync events.
//!
//! Three item types exist: [`Note`] (tasks and ideas), [`List`] (a colored
//! task list) and the singleton [`TimerInfo`]. Events decoded from a journal
//! carry an untyped [`ItemHandle::Raw`] payload which is resolved into one of
//! the typed variants only when the caller needs it, so decoding never has
//! to know the concrete item type up front.

pub mod codec;

pub use codec::{ID_WIDTH, ItemError, TIMER_ID, decode_item, encode_item};

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// A task or an idea.
///
/// Tasks belong to a list through `color`; ideas have no color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub text: String,
    #[serde(default)]
    pub planned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
}

impl Note {
    /// Create an unplanned, open note.
    pub fn new(id: u64, color: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            id,
            color: color.map(str::to_string),
            text: text.into(),
            planned: false,
            completed_on: None,
        }
    }

    /// Ideas are notes without a list color.
    #[must_use]
    pub const fn is_idea(&self) -> bool {
        self.color.is_none()
    }
}

/// A task list, keyed by its color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct List {
    pub color: String,
    pub label: String,
}

impl List {
    pub fn new(color: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            label: label.into(),
        }
    }
}

/// State of the single pomodoro-style timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<u64>,
    /// Milliseconds since epoch when the timer was started.
    pub started_ms: i64,
    pub duration_ms: u64,
}

/// Identity of an item across snapshots: its type plus its id.
///
/// Ids are only unique within a type, so a note with id 42 and a list with
/// color `"42"` have different keys. Displays as `n:42`, `l:b` or `t:timer`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKey {
    Note(u64),
    List(String),
    Timer,
}

impl ItemKey {
    /// The id within the item's type, as [`ItemHandle::item_id`] reports it.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Note(id) => id.to_string(),
            Self::List(color) => color.clone(),
            Self::Timer => TIMER_ID.to_string(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note(id) => write!(f, "n:{id}"),
            Self::List(color) => write!(f, "l:{color}"),
            Self::Timer => write!(f, "t:{TIMER_ID}"),
        }
    }
}

// Serialized as its display form so it can key a JSON object.
impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Reference to the item a sync event mutates.
///
/// `Raw` holds a payload exactly as read from a journal; the typed variants
/// hold a snapshot of the item taken when the event was constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemHandle {
    Raw(String),
    Note(Note),
    List(List),
    Timer(TimerInfo),
}

impl ItemHandle {
    /// Identifier within the item's type. Not unique across types; group by
    /// [`Self::item_key`] instead.
    ///
    /// Returns `None` for an unresolved raw payload.
    #[must_use]
    pub fn item_id(&self) -> Option<String> {
        match self {
            Self::Note(note) => Some(note.id.to_string()),
            Self::List(list) => Some(list.color.clone()),
            Self::Timer(_) => Some(TIMER_ID.to_string()),
            Self::Raw(_) => None,
        }
    }

    /// Typed identity used to group events per item.
    ///
    /// Returns `None` for an unresolved raw payload.
    #[must_use]
    pub fn item_key(&self) -> Option<ItemKey> {
        match self {
            Self::Note(note) => Some(ItemKey::Note(note.id)),
            Self::List(list) => Some(ItemKey::List(list.color.clone())),
            Self::Timer(_) => Some(ItemKey::Timer),
            Self::Raw(_) => None,
        }
    }

    /// Raw payload for this item.
    ///
    /// A raw handle is returned verbatim, so re-encoding a decoded event
    /// reproduces the original bytes.
    #[must_use]
    pub fn to_raw(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            typed => encode_item(typed),
        }
    }

    /// Resolve a raw payload into its typed variant.
    ///
    /// Typed handles are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if the raw payload is not a valid item encoding.
    pub fn resolve(&self) -> Result<Self, ItemError> {
        match self {
            Self::Raw(raw) => decode_item(raw),
            typed => Ok(typed.clone()),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Raw(_))
    }

    /// Short type label for logs and CLI output.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Note(_) => "note",
            Self::List(_) => "list",
            Self::Timer(_) => "timer",
        }
    }
}

impl From<Note> for ItemHandle {
    fn from(note: Note) -> Self {
        Self::Note(note)
    }
}

impl From<List> for ItemHandle {
    fn from(list: List) -> Self {
        Self::List(list)
    }
}

impl From<TimerInfo> for ItemHandle {
    fn from(timer: TimerInfo) -> Self {
        Self::Timer(timer)
    }
}
