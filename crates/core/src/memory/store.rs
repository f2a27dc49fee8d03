use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::bounded::BoundedMap;
use crate::types::CachedMessage;

/// Label used for direct-message records in per-group population counts.
pub const PRIVATE_GROUP_LABEL: &str = "private";

/// Bounded, thread-safe message cache keyed by message id.
///
/// All operations take the internal lock for their whole duration, so a
/// `take_by_id` can never be observed twice for the same id. The lock is never
/// held across an await point.
pub struct MessageStore {
    inner: Mutex<BoundedMap<CachedMessage>>,
}

impl MessageStore {
    /// Create a store holding at most `max_size` records, evicting oldest-by-timestamp first.
    pub fn new(max_size: usize) -> Self {
        let map = BoundedMap::new(max_size, |a: &CachedMessage, b: &CachedMessage| {
            a.timestamp.cmp(&b.timestamp)
        });
        Self { inner: Mutex::new(map) }
    }

    fn lock(&self) -> MutexGuard<'_, BoundedMap<CachedMessage>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or overwrite a record. Records with blank content are ignored.
    /// Returns the number of records evicted to keep the bound.
    pub fn put(&self, record: CachedMessage) -> usize {
        if record.content.trim().is_empty() {
            tracing::debug!(message_id = %record.id, "skipping message with empty content");
            return 0;
        }
        let id = record.id.clone();
        let mut map = self.lock();
        let evicted = map.insert(id.clone(), record);
        if !evicted.is_empty() {
            tracing::info!(
                evicted = evicted.len(),
                capacity = map.capacity(),
                "cache over capacity, evicted oldest messages"
            );
        }
        tracing::debug!(message_id = %id, cached = map.len(), "message cached");
        evicted.len()
    }

    /// Atomically look up and remove a record.
    pub fn take_by_id(&self, id: &str) -> Option<CachedMessage> {
        self.lock().take(id)
    }

    /// Copies of all live records in `group_id`, oldest insertion first.
    pub fn snapshot_by_group(&self, group_id: &str) -> Vec<CachedMessage> {
        self.lock()
            .values_in_insertion_order()
            .into_iter()
            .filter(|m| m.group_id.as_deref() == Some(group_id))
            .cloned()
            .collect()
    }

    /// Drop every record, returning how many were held.
    pub fn clear(&self) -> usize {
        self.lock().clear()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Number of live records per group; direct messages count under `private`.
    pub fn group_population(&self) -> BTreeMap<String, usize> {
        let map = self.lock();
        let mut counts = BTreeMap::new();
        for record in map.values_in_insertion_order() {
            let key = record.group_id.clone().unwrap_or_else(|| PRIVATE_GROUP_LABEL.to_string());
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    /// Up to `limit` records, newest timestamp first.
    pub fn newest(&self, limit: usize) -> Vec<CachedMessage> {
        let mut records: Vec<CachedMessage> =
            self.lock().values_in_insertion_order().into_iter().cloned().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageKind;
    use std::sync::Arc;

    fn record(id: &str, group: Option<&str>, ts: i64) -> CachedMessage {
        CachedMessage {
            id: id.into(),
            content: format!("msg {id}"),
            sender_id: "100".into(),
            sender_name: "alice".into(),
            group_id: group.map(str::to_owned),
            timestamp: ts,
            kind: MessageKind::Text,
            image: None,
        }
    }

    #[test]
    fn overflow_keeps_most_recent_by_timestamp() {
        let store = MessageStore::new(3);
        // Arrival order deliberately differs from timestamp order.
        for (id, ts) in [("a", 50), ("b", 10), ("c", 40), ("d", 20), ("e", 30)] {
            store.put(record(id, Some("G"), ts));
        }
        assert_eq!(store.len(), 3);
        for id in ["a", "c", "e"] {
            assert!(store.contains(id), "{id} should survive");
        }
        for id in ["b", "d"] {
            assert!(!store.contains(id), "{id} should be evicted");
        }
    }

    #[test]
    fn put_reports_evictions() {
        let store = MessageStore::new(1);
        assert_eq!(store.put(record("a", Some("G"), 1)), 0);
        assert_eq!(store.put(record("b", Some("G"), 2)), 1);
    }

    #[test]
    fn blank_content_is_ignored() {
        let store = MessageStore::new(10);
        let mut blank = record("a", Some("G"), 1);
        blank.content = "  \n".into();
        assert_eq!(store.put(blank), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn second_take_misses() {
        let store = MessageStore::new(10);
        store.put(record("1", Some("G"), 1));
        assert!(store.take_by_id("1").is_some());
        assert!(store.take_by_id("1").is_none());
    }

    #[test]
    fn snapshot_is_scoped_and_non_destructive() {
        let store = MessageStore::new(10);
        store.put(record("1", Some("G"), 1));
        store.put(record("2", Some("H"), 2));
        store.put(record("3", None, 3));
        store.put(record("4", Some("G"), 4));
        let snap: Vec<String> = store.snapshot_by_group("G").into_iter().map(|m| m.id).collect();
        assert_eq!(snap, vec!["1", "4"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn population_and_newest() {
        let store = MessageStore::new(10);
        store.put(record("1", Some("G"), 5));
        store.put(record("2", Some("G"), 9));
        store.put(record("3", None, 7));
        let population = store.group_population();
        assert_eq!(population.get("G"), Some(&2));
        assert_eq!(population.get(PRIVATE_GROUP_LABEL), Some(&1));
        let newest: Vec<String> = store.newest(2).into_iter().map(|m| m.id).collect();
        assert_eq!(newest, vec!["2", "3"]);
        assert_eq!(store.clear(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_takes_hit_once() {
        let store = Arc::new(MessageStore::new(10));
        store.put(record("x", Some("G"), 1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.take_by_id("x").is_some())
            })
            .collect();
        let hits = handles.into_iter().filter_map(|h| h.join().ok()).filter(|hit| *hit).count();
        assert_eq!(hits, 1);
    }
}
