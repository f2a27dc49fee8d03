use std::cmp::Ordering;
use std::collections::HashMap;

/// Ordering used to pick eviction victims: entries that sort first are evicted first.
pub type EvictionOrder<V> = Box<dyn Fn(&V, &V) -> Ordering + Send + Sync>;

struct Slot<V> {
    /// Insertion sequence, breaks ties in the eviction order.
    seq: u64,
    value: V,
}

/// String-keyed map holding at most `capacity` entries.
///
/// An insert that pushes the map over capacity evicts the surplus entries that
/// sort first under the injected ordering, ties going to the older insertion.
/// Re-inserting an existing key replaces the value and counts as a fresh insertion.
pub struct BoundedMap<V> {
    slots: HashMap<String, Slot<V>>,
    capacity: usize,
    next_seq: u64,
    order: EvictionOrder<V>,
}

impl<V> BoundedMap<V> {
    pub fn new(capacity: usize, order: impl Fn(&V, &V) -> Ordering + Send + Sync + 'static) -> Self {
        Self {
            slots: HashMap::new(),
            capacity,
            next_seq: 0,
            order: Box::new(order),
        }
    }

    /// Insert or overwrite `key`. Returns the entries evicted to restore the bound.
    pub fn insert(&mut self, key: String, value: V) -> Vec<(String, V)> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(key, Slot { seq, value });
        self.evict_surplus()
    }

    /// Remove and return the entry for `key`.
    pub fn take(&mut self, key: &str) -> Option<V> {
        self.slots.remove(key).map(|slot| slot.value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry, returning how many were held.
    pub fn clear(&mut self) -> usize {
        let count = self.slots.len();
        self.slots.clear();
        count
    }

    /// Live values, oldest insertion first.
    pub fn values_in_insertion_order(&self) -> Vec<&V> {
        let mut slots: Vec<&Slot<V>> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.value).collect()
    }

    fn evict_surplus(&mut self) -> Vec<(String, V)> {
        let excess = self.slots.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }

        let order = &self.order;
        let rank = |(_, a): &(&String, &Slot<V>), (_, b): &(&String, &Slot<V>)| {
            order(&a.value, &b.value).then(a.seq.cmp(&b.seq))
        };
        let mut ranked: Vec<(&String, &Slot<V>)> = self.slots.iter().collect();
        // Partition around the last victim, then order only the victims.
        if excess < ranked.len() {
            ranked.select_nth_unstable_by(excess - 1, rank);
        }
        let victims = &mut ranked[..excess];
        victims.sort_unstable_by(rank);
        let victims: Vec<String> = victims.iter().map(|(k, _)| (*k).clone()).collect();

        victims
            .into_iter()
            .filter_map(|key| self.slots.remove(&key).map(|slot| (key, slot.value)))
            .collect()
    }
}
