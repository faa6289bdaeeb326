//! Merge and replay of event histories across devices.

pub mod merge;
pub mod replay;

pub use merge::{MergeResult, merge_events, pick_winner};
pub use replay::{ItemStore, ReplayOutcome, ReplayStats};

use std::collections::HashMap;

use crate::event::SyncEvent;
use crate::item::ItemKey;

/// Grouping key for [`latest_per_item`].
#[derive(Debug, PartialEq, Eq, Hash)]
enum LatestKey {
    Item(ItemKey),
    Undecoded(String),
}

/// Keep only the latest event per item, in chronological order.
///
/// Events are keyed by resolved [`ItemKey`]; events whose payload does not
/// decode are keyed by the payload itself, so identical payloads still
/// collapse. On equal timestamps the later input wins.
#[must_use]
pub fn latest_per_item(events: impl IntoIterator<Item = SyncEvent>) -> Vec<SyncEvent> {
    let mut latest: HashMap<LatestKey, SyncEvent> = HashMap::new();
    for event in events {
        let key = event
            .resolved_item_key()
            .map_or_else(|| LatestKey::Undecoded(event.item().to_raw()), LatestKey::Item);
        match latest.get(&key) {
            Some(current) if current.timestamp() > event.timestamp() => {}
            _ => {
                latest.insert(key, event);
            }
        }
    }
    let mut kept: Vec<SyncEvent> = latest.into_values().collect();
    kept.sort_by_cached_key(|event| (event.timestamp_ms(), event.to_raw()));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::item::{ItemHandle, List, Note};
    use chrono::{DateTime, TimeZone, Utc};

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid ms")
    }

    #[test]
    fn keeps_latest_per_item() {
        let events = vec![
            SyncEvent::at(Note::new(1, None, "a"), EventKind::Create, None, at_ms(1)),
            SyncEvent::at(Note::new(2, None, "b"), EventKind::Create, None, at_ms(2)),
            SyncEvent::at(Note::new(1, None, "a2"), EventKind::Replace, None, at_ms(3)),
        ];
        let kept = latest_per_item(events);
        let kinds: Vec<_> = kept.iter().map(SyncEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::Create, EventKind::Replace]);
        assert_eq!(kept[1].item_id().as_deref(), Some("1"));
    }

    #[test]
    fn older_event_does_not_replace_newer() {
        let events = vec![
            SyncEvent::at(Note::new(1, None, "new"), EventKind::Modify, None, at_ms(9)),
            SyncEvent::at(Note::new(1, None, "old"), EventKind::Modify, None, at_ms(4)),
        ];
        let kept = latest_per_item(events);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].timestamp_ms(), 9);
    }

    #[test]
    fn undecodable_items_collapse_by_payload() {
        let raw = || ItemHandle::Raw("?not an item".into());
        let events = vec![
            SyncEvent::at(raw(), EventKind::Create, None, at_ms(1)),
            SyncEvent::at(raw(), EventKind::Modify, None, at_ms(2)),
        ];
        let kept = latest_per_item(events);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind(), EventKind::Modify);
    }

    #[test]
    fn note_and_list_with_same_id_both_survive() {
        let events = vec![
            SyncEvent::at(Note::new(7, None, "idea"), EventKind::Create, None, at_ms(1)),
            SyncEvent::at(List::new("7", "Seven"), EventKind::Create, None, at_ms(2)),
        ];
        let kept = latest_per_item(events);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].item_key(), Some(ItemKey::Note(7)));
        assert_eq!(kept[1].item_key(), Some(ItemKey::List("7".into())));
    }

    #[test]
    fn raw_and_typed_events_share_an_item() {
        let typed = SyncEvent::at(List::new("g", "Work"), EventKind::Create, None, at_ms(1));
        let raw = SyncEvent::from_raw(
            &SyncEvent::at(List::new("g", "Home"), EventKind::Modify, None, at_ms(2)).to_raw(),
        )
        .expect("decode")
        .expect("non-empty");
        let kept = latest_per_item([typed, raw]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].resolved_item_id().as_deref(), Some("g"));
        assert_eq!(kept[0].kind(), EventKind::Modify);
    }
}
