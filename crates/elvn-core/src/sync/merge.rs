//! Pairwise merge of two event histories.
//!
//! # Merge Semantics
//!
//! Events from both sides are resolved to typed items and grouped by
//! [`ItemKey`], so a note and a list that share an id stay apart. Within a group, exact duplicates (same raw form) are dropped and the
//! remaining candidates are folded left with [`SyncEvent::after`]:
//!
//! ```text
//! winner = None
//! for candidate in sorted(group):
//!     if candidate.after(winner): winner = candidate
//! ```
//!
//! ## Scan Order
//!
//! Candidates are sorted by `(timestamp, kind code, raw form)`, all
//! ascending. `after` alone is not antisymmetric (two events of different
//! kinds are each "after" the other), so the fold order is what makes the
//! result deterministic and identical on every replica:
//!
//! - a later event of a different kind always replaces the current winner;
//! - a same-kind event replaces it only when strictly later.

use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use crate::event::SyncEvent;
use crate::item::ItemKey;

/// The result of merging two event sets.
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    /// Winning event per item.
    pub winners: BTreeMap<ItemKey, SyncEvent>,
    /// Candidates that lost to a winner.
    pub discarded: usize,
    /// Input events skipped because an identical event was already seen.
    pub duplicates_skipped: usize,
    /// Events whose item payload could not be resolved.
    pub unidentified: Vec<SyncEvent>,
}

/// Scan-order key: `(timestamp ms, kind code, raw form)`.
fn scan_key(event: &SyncEvent) -> (i64, char, String) {
    (event.timestamp_ms(), event.kind().code(), event.to_raw())
}

/// Fold [`SyncEvent::after`] over `candidates` in scan order.
///
/// Returns `None` only for an empty input.
pub fn pick_winner<'a, I>(candidates: I) -> Option<&'a SyncEvent>
where
    I: IntoIterator<Item = &'a SyncEvent>,
{
    let mut sorted: Vec<&SyncEvent> = candidates.into_iter().collect();
    sorted.sort_by_cached_key(|event| scan_key(event));
    sorted
        .into_iter()
        .fold(None, |winner, candidate| {
            if candidate.after(winner) {
                Some(candidate)
            } else {
                winner
            }
        })
}

/// Merge `local` and `remote` into one winning event per item.
#[must_use]
pub fn merge_events(local: &[SyncEvent], remote: &[SyncEvent]) -> MergeResult {
    let mut result = MergeResult::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(local.len() + remote.len());
    let mut groups: BTreeMap<ItemKey, Vec<SyncEvent>> = BTreeMap::new();

    for event in local.iter().chain(remote) {
        if !seen.insert(event.to_raw()) {
            result.duplicates_skipped += 1;
            continue;
        }
        let resolved = match event.resolved() {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(raw = %event, error = %e, "skipping event with unresolvable item");
                result.unidentified.push(event.clone());
                continue;
            }
        };
        match resolved.item_key() {
            Some(key) => groups.entry(key).or_default().push(resolved),
            None => result.unidentified.push(resolved),
        }
    }

    for (key, candidates) in groups {
        let count = candidates.len();
        if let Some(winner) = pick_winner(&candidates) {
            result.discarded += count - 1;
            result.winners.insert(key, winner.clone());
        }
    }

    info!(
        local = local.len(),
        remote = remote.len(),
        items = result.winners.len(),
        discarded = result.discarded,
        duplicates = result.duplicates_skipped,
        unidentified = result.unidentified.len(),
        "merged event histories"
    );

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::item::{ItemHandle, List, Note};
    use chrono::{DateTime, TimeZone, Utc};

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid ms")
    }

    fn note(id: u64, text: &str, kind: EventKind, ms: i64) -> SyncEvent {
        SyncEvent::at(Note::new(id, Some("b"), text), kind, None, at_ms(ms))
    }

    /// Round-trip through the raw form, as a remote journal would deliver it.
    fn remote(event: &SyncEvent) -> SyncEvent {
        SyncEvent::from_raw(&event.to_raw())
            .expect("decode")
            .expect("non-empty")
    }

    #[test]
    fn pick_winner_empty_is_none() {
        let empty: [SyncEvent; 0] = [];
        assert!(pick_winner(&empty).is_none());
    }

    #[test]
    fn same_kind_later_wins_regardless_of_input_order() {
        let early = note(1, "old", EventKind::Modify, 1_000);
        let late = note(1, "new", EventKind::Modify, 2_000);
        let a = [early.clone(), late.clone()];
        let b = [late.clone(), early];
        assert_eq!(pick_winner(&a), Some(&late));
        assert_eq!(pick_winner(&b), Some(&late));
    }

    #[test]
    fn different_kinds_later_in_scan_wins() {
        let done = note(1, "task", EventKind::Done, 1_000);
        let undone = note(1, "task", EventKind::Undone, 2_000);
        assert_eq!(pick_winner(&[undone.clone(), done]), Some(&undone));
    }

    #[test]
    fn same_kind_same_time_keeps_first_in_scan() {
        let a = note(1, "aaa", EventKind::Modify, 1_000);
        let b = note(1, "bbb", EventKind::Modify, 1_000);
        // Ties on time and kind fall back to raw order; the later one is not
        // strictly after, so the first stays.
        assert_eq!(pick_winner(&[b, a.clone()]), Some(&a));
    }

    #[test]
    fn merge_picks_one_winner_per_item() {
        let local = vec![
            note(1, "buy milk", EventKind::Create, 1_000),
            note(2, "call bob", EventKind::Create, 1_100),
        ];
        let remote_events = [
            note(1, "buy milk", EventKind::Done, 5_000),
            note(2, "call bob", EventKind::Delete, 6_000),
        ];
        let remote_side: Vec<SyncEvent> = remote_events.iter().map(remote).collect();

        let merged = merge_events(&local, &remote_side);
        assert_eq!(merged.winners.len(), 2);
        assert_eq!(merged.winners[&ItemKey::Note(1)].kind(), EventKind::Done);
        assert_eq!(merged.winners[&ItemKey::Note(2)].kind(), EventKind::Delete);
        assert_eq!(merged.discarded, 2);
        assert_eq!(merged.duplicates_skipped, 0);
        assert!(merged.unidentified.is_empty());
    }

    #[test]
    fn winners_have_resolved_items() {
        let local = vec![remote(&note(9, "x", EventKind::Create, 1))];
        let merged = merge_events(&local, &[]);
        assert!(merged.winners[&ItemKey::Note(9)].item().is_resolved());
    }

    #[test]
    fn identical_events_on_both_sides_are_deduplicated() {
        let shared = note(3, "same", EventKind::Plan, 2_000);
        let merged = merge_events(&[shared.clone()], &[remote(&shared)]);
        assert_eq!(merged.duplicates_skipped, 1);
        assert_eq!(merged.discarded, 0);
        assert_eq!(merged.winners[&ItemKey::Note(3)], shared);
    }

    #[test]
    fn unresolvable_payloads_are_set_aside() {
        let bad = SyncEvent::at(ItemHandle::Raw("?garbage".into()), EventKind::Modify, None, at_ms(1));
        let good = SyncEvent::at(List::new("g", "Personal"), EventKind::Create, None, at_ms(2));
        let merged = merge_events(&[good], &[bad.clone()]);
        assert_eq!(merged.winners.len(), 1);
        assert_eq!(merged.unidentified, vec![bad]);
    }

    #[test]
    fn note_and_list_with_same_id_are_separate_items() {
        let task = note(42, "task", EventKind::Create, 1_000);
        let list = SyncEvent::at(List::new("42", "Numbers"), EventKind::Modify, None, at_ms(2_000));
        let merged = merge_events(&[task.clone()], &[remote(&list)]);

        assert_eq!(merged.winners.len(), 2);
        assert_eq!(merged.discarded, 0);
        assert_eq!(merged.winners[&ItemKey::Note(42)], task);
        assert_eq!(merged.winners[&ItemKey::List("42".into())], list);
    }

    #[test]
    fn merge_is_symmetric_in_sides() {
        let local = vec![
            note(1, "a", EventKind::Plan, 1_000),
            note(1, "a", EventKind::Unplan, 3_000),
        ];
        let remote_side = vec![note(1, "a", EventKind::Plan, 2_000)];
        let ab = merge_events(&local, &remote_side);
        let ba = merge_events(&remote_side, &local);
        assert_eq!(ab.winners, ba.winners);
        assert_eq!(ab.winners[&ItemKey::Note(1)].kind(), EventKind::Unplan);
    }
}
