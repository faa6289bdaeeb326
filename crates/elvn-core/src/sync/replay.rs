//! Replay of merge winners into an item store.
//!
//! The store maps [`ItemKey`] to the item's raw payload. Each winning event is
//! projected with [`SyncEvent::apply`]: a payload replaces the stored one, a
//! tombstone removes the item.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::merge::MergeResult;
use crate::event::SyncEvent;
use crate::item::{ItemError, ItemHandle, ItemKey};

/// What replaying a single event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    Written,
    Removed,
    /// The event's item had no key.
    Skipped,
}

/// Counters from [`ItemStore::replay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub written: usize,
    pub removed: usize,
    pub skipped: usize,
}

/// Raw item payloads keyed by item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStore {
    items: BTreeMap<ItemKey, String>,
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an item under its own key. Raw handles are ignored.
    pub fn insert(&mut self, item: &ItemHandle) -> bool {
        let Some(key) = item.item_key() else {
            return false;
        };
        self.items.insert(key, item.to_raw());
        true
    }

    #[must_use]
    pub fn get(&self, key: &ItemKey) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Decode the stored payload for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if the stored payload is not a valid item.
    pub fn item(&self, key: &ItemKey) -> Result<Option<ItemHandle>, ItemError> {
        self.get(key)
            .map(|raw| ItemHandle::Raw(raw.to_string()).resolve())
            .transpose()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.items.keys()
    }

    /// Stored payloads in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &str)> {
        self.items.iter().map(|(key, raw)| (key, raw.as_str()))
    }

    /// Apply a single event to the store.
    ///
    /// The event's item must be resolved for it to have a key; raw handles
    /// are skipped.
    pub fn apply_event(&mut self, event: &SyncEvent) -> ReplayOutcome {
        let Some(key) = event.item_key() else {
            debug!(raw = %event, "no item key, skipping replay");
            return ReplayOutcome::Skipped;
        };
        match event.apply(self.get(&key)) {
            Some(payload) => {
                self.items.insert(key, payload);
                ReplayOutcome::Written
            }
            None => {
                self.items.remove(&key);
                ReplayOutcome::Removed
            }
        }
    }

    /// Apply every winner of a merge.
    pub fn replay(&mut self, merge: &MergeResult) -> ReplayStats {
        let mut stats = ReplayStats::default();
        for event in merge.winners.values() {
            match self.apply_event(event) {
                ReplayOutcome::Written => stats.written += 1,
                ReplayOutcome::Removed => stats.removed += 1,
                ReplayOutcome::Skipped => stats.skipped += 1,
            }
        }
        info!(
            written = stats.written,
            removed = stats.removed,
            skipped = stats.skipped,
            items = self.len(),
            "replayed merge winners"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::item::{List, Note};
    use crate::sync::merge::merge_events;
    use chrono::{DateTime, TimeZone, Utc};

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid ms")
    }

    #[test]
    fn write_then_tombstone() {
        let mut store = ItemStore::new();
        let note = Note::new(1, Some("b"), "Test task");
        let create = SyncEvent::at(note.clone(), EventKind::Create, None, at_ms(1));
        let delete = SyncEvent::at(note.clone(), EventKind::Delete, None, at_ms(2));

        assert_eq!(store.apply_event(&create), ReplayOutcome::Written);
        assert_eq!(
            store.item(&ItemKey::Note(1)).expect("decode"),
            Some(ItemHandle::Note(note))
        );

        assert_eq!(store.apply_event(&delete), ReplayOutcome::Removed);
        assert!(store.get(&ItemKey::Note(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn raw_event_is_skipped() {
        let mut store = ItemStore::new();
        let raw = SyncEvent::at(ItemHandle::Raw("l{}".into()), EventKind::Create, None, at_ms(1));
        assert_eq!(store.apply_event(&raw), ReplayOutcome::Skipped);
        assert!(store.is_empty());
    }

    #[test]
    fn replay_merge_result() {
        let mut store = ItemStore::new();
        store.insert(&ItemHandle::Note(Note::new(1, Some("b"), "old text")));
        store.insert(&ItemHandle::List(List::new("g", "Personal")));

        let mut done = Note::new(1, Some("b"), "old text");
        done.completed_on = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
        let local = vec![SyncEvent::at(done.clone(), EventKind::Done, None, at_ms(10))];
        let remote = vec![SyncEvent::at(
            List::new("g", "Personal"),
            EventKind::Delete,
            None,
            at_ms(20),
        )];

        let stats = store.replay(&merge_events(&local, &remote));
        assert_eq!(
            stats,
            ReplayStats {
                written: 1,
                removed: 1,
                skipped: 0
            }
        );
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![&ItemKey::Note(1)]);
        assert_eq!(
            store.item(&ItemKey::Note(1)).expect("decode"),
            Some(ItemHandle::Note(done))
        );
    }

    #[test]
    fn note_and_list_with_same_id_do_not_overwrite() {
        let mut store = ItemStore::new();
        let list = List::new("42", "Numbers");
        store.insert(&ItemHandle::List(list.clone()));
        let create = SyncEvent::at(Note::new(42, Some("42"), "Count"), EventKind::Create, None, at_ms(1));

        assert_eq!(store.apply_event(&create), ReplayOutcome::Written);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.item(&ItemKey::List("42".into())).expect("decode"),
            Some(ItemHandle::List(list))
        );
    }

    #[test]
    fn insert_ignores_raw_handles() {
        let mut store = ItemStore::new();
        assert!(!store.insert(&ItemHandle::Raw("n1{}".into())));
        assert_eq!(store.len(), 0);
    }
}
