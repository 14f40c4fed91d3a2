use crate::error::HistoryError;
use crate::history::types::{RawEvent, SyncEvent};

/// Default capacity of a history view, matching one screenful of rows.
pub const DEFAULT_MAX_ITEMS: usize = 30;

#[derive(Debug, Clone)]
struct Slot {
    event: SyncEvent,
    /// Insertion counter, used to break timestamp ties: a later insert
    /// sorts above (and survives eviction over) an earlier one.
    seq: u64,
}

/// Deduplicating, capacity-bounded, time-ordered history of sync events.
///
/// Entries are kept sorted newest-first. A sync engine may report the same
/// logical file repeatedly while an upload is in flight; with
/// `deduplicate` on, a new event for an existing (path, member) pair
/// replaces the old entry instead of appending a near-duplicate row.
/// The capacity bound is backpressure at the presentation boundary: the
/// store never grows past `max_items` no matter the event volume.
#[derive(Debug)]
pub struct HistoryStore {
    deduplicate: bool,
    max_items: usize,
    entries: Vec<Slot>,
    next_seq: u64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(true, DEFAULT_MAX_ITEMS)
    }
}

impl HistoryStore {
    pub fn new(deduplicate: bool, max_items: usize) -> Self {
        Self {
            deduplicate,
            max_items,
            entries: Vec::with_capacity(max_items.min(DEFAULT_MAX_ITEMS)),
            next_seq: 0,
        }
    }

    /// Ingests one raw event. Total: never fails, whatever the record
    /// looks like (see [`SyncEvent::from_raw`] for the defaulting rules).
    pub fn ingest(&mut self, raw: RawEvent) {
        // Capacity 0 retains nothing; the insert would be evicted
        // immediately, so skip it outright.
        if self.max_items == 0 {
            return;
        }

        let event = SyncEvent::from_raw(raw);

        if self.deduplicate {
            // Replace-not-append: drop the old entry for this key, then
            // fall through so the event is re-sorted under its new
            // timestamp rather than keeping the stale position.
            if let Some(pos) = self
                .entries
                .iter()
                .position(|s| s.event.key() == event.key())
            {
                self.entries.remove(pos);
            }
        }

        while self.entries.len() >= self.max_items {
            self.evict_oldest();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Slot { event, seq });

        // Newest on top; timestamp ties go to the later insertion.
        self.entries
            .sort_by(|a, b| (b.event.timestamp, b.seq).cmp(&(a.event.timestamp, a.seq)));
    }

    /// Removes the entry with the smallest timestamp, ties broken toward
    /// the least recently inserted.
    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| (s.event.timestamp, s.seq))
            .map(|(i, _)| i);
        if let Some(i) = oldest {
            self.entries.remove(i);
        }
    }

    /// All stored events, newest first. Fresh, independently owned
    /// sequence each call; never mutates the store.
    pub fn snapshot(&self) -> Vec<SyncEvent> {
        self.entries.iter().map(|s| s.event.clone()).collect()
    }

    /// Event at the given rank in the newest-first ordering.
    pub fn lookup_by_position(&self, index: usize) -> Result<&SyncEvent, HistoryError> {
        self.entries
            .get(index)
            .map(|s| &s.event)
            .ok_or(HistoryError::NotFound {
                index,
                count: self.entries.len(),
            })
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn deduplicate(&self) -> bool {
        self.deduplicate
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }
}
