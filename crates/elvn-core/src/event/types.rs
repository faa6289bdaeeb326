//! Event kind registry.
//!
//! Each of the ten mutation kinds is bound to a single character code that
//! leads every raw event line. Codes are opaque identifiers; their ordering
//! carries no meaning.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// The ten mutation kinds a sync event can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A new note or list.
    Create,
    /// Any field change not covered by a more specific kind.
    Modify,
    /// Text appended to a note.
    Append,
    /// Note text replaced.
    Replace,
    /// Task planned for today.
    Plan,
    /// Task removed from today's plan.
    Unplan,
    /// Task completed.
    Done,
    /// Completed task reopened.
    Undone,
    /// Timer started on a task.
    Run,
    /// Item removed (tombstone).
    Delete,
}

/// Reverse lookup built once from [`EventKind::ALL`]; read-only afterwards.
static BY_CODE: LazyLock<HashMap<char, EventKind>> =
    LazyLock::new(|| EventKind::ALL.iter().map(|kind| (kind.code(), *kind)).collect());

/// Error returned when parsing an unknown event kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown event kind '{}': expected one of create, modify, append, \
             replace, plan, unplan, done, undone, run, delete",
            self.raw
        )
    }
}

impl std::error::Error for UnknownEventKind {}

impl EventKind {
    /// All kinds in code order.
    pub const ALL: [Self; 10] = [
        Self::Create,
        Self::Modify,
        Self::Append,
        Self::Replace,
        Self::Plan,
        Self::Unplan,
        Self::Done,
        Self::Undone,
        Self::Run,
        Self::Delete,
    ];

    /// The single-character code written at position 0 of a raw event.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Create => '0',
            Self::Modify => '1',
            Self::Append => '2',
            Self::Replace => '3',
            Self::Plan => '4',
            Self::Unplan => '5',
            Self::Done => '6',
            Self::Undone => '7',
            Self::Run => '8',
            Self::Delete => '9',
        }
    }

    /// Look up the kind bound to `code`.
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        BY_CODE.get(&code).copied()
    }

    /// Lowercase name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Append => "append",
            Self::Replace => "replace",
            Self::Plan => "plan",
            Self::Unplan => "unplan",
            Self::Done => "done",
            Self::Undone => "undone",
            Self::Run => "run",
            Self::Delete => "delete",
        }
    }

    #[must_use]
    pub const fn is_delete(self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind { raw: s.to_string() })
    }
}

// Custom serde: serialize as the lowercase name.
impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_match_wire_table() {
        let expected = [
            (EventKind::Create, '0'),
            (EventKind::Modify, '1'),
            (EventKind::Append, '2'),
            (EventKind::Replace, '3'),
            (EventKind::Plan, '4'),
            (EventKind::Unplan, '5'),
            (EventKind::Done, '6'),
            (EventKind::Undone, '7'),
            (EventKind::Run, '8'),
            (EventKind::Delete, '9'),
        ];
        for (kind, code) in expected {
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn codes_are_injective() {
        let codes: HashSet<char> = EventKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), EventKind::ALL.len());
    }

    #[test]
    fn from_code_inverts_code() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn from_code_unknown_is_none() {
        assert_eq!(EventKind::from_code('x'), None);
        assert_eq!(EventKind::from_code('#'), None);
        assert_eq!(EventKind::from_code(' '), None);
    }

    #[test]
    fn registry_is_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    EventKind::ALL
                        .iter()
                        .all(|k| EventKind::from_code(k.code()) == Some(*k))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("thread"));
        }
    }

    #[test]
    fn fromstr_roundtrip() {
        for kind in EventKind::ALL {
            let parsed: EventKind = kind.to_string().parse().expect("should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn fromstr_rejects_unknown() {
        let err = "archive".parse::<EventKind>().unwrap_err();
        assert_eq!(err.raw, "archive");
        assert!(err.to_string().contains("expected one of"));
    }

    #[test]
    fn serde_json_uses_name() {
        let json = serde_json::to_string(&EventKind::Unplan).expect("serialize");
        assert_eq!(json, "\"unplan\"");
        let back: EventKind = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, EventKind::Unplan);
    }

    #[test]
    fn only_delete_is_delete() {
        let deletes: Vec<_> = EventKind::ALL.into_iter().filter(|k| k.is_delete()).collect();
        assert_eq!(deletes, vec![EventKind::Delete]);
    }
}
