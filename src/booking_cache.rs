// Booking cache: the concurrent layer in front of the booking store.
// The engine reads through it and writes the freshest copy of a booking here.

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::model::{Booking, BookingStatus};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
}

/// Concurrent map of bookings keyed by id.
///
/// Every operation is linearizable: entries live in a sharded [`DashMap`], so
/// readers of a shard proceed together while a writer holds that shard
/// exclusively for the length of a single call. A mutation that has returned is
/// visible to every later `get`/`get_all`.
#[derive(Debug, Default)]
pub struct BookingCache {
    store: DashMap<String, Booking>,
    cache_stats: RwLock<CacheStats>,
}

impl BookingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the booking; last writer wins.
    pub fn save(&self, booking: Booking) {
        self.store.insert(booking.id.clone(), booking);
    }

    /// Replaces only the status. No-op when the id is absent.
    pub fn update_status(&self, id: &str, status: BookingStatus) {
        if let Some(mut entry) = self.store.get_mut(id) {
            entry.status = status;
        }
    }

    /// Moves `id` from `from` to `to` only if it currently holds `from`.
    /// The check and the write happen under the same shard lock.
    pub fn transition(&self, id: &str, from: BookingStatus, to: BookingStatus) -> bool {
        match self.store.get_mut(id) {
            Some(mut entry) if entry.status == from => {
                entry.status = to;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Booking> {
        let found = self.store.get(id).map(|entry| entry.value().clone());

        let mut stats = self.cache_stats.write();
        if found.is_some() {
            stats.hit_count += 1;
        } else {
            stats.miss_count += 1;
        }

        found
    }

    /// Snapshot of the current contents in no particular order.
    pub fn get_all(&self) -> Vec<Booking> {
        self.store.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn delete(&self, id: &str) {
        self.store.remove(id);
    }

    /// Removes the entry only if `predicate` holds for it, deciding under the
    /// shard lock. Returns the removed booking.
    pub fn remove_if<F>(&self, id: &str, predicate: F) -> Option<Booking>
    where
        F: FnOnce(&Booking) -> bool,
    {
        self.store
            .remove_if(id, |_, booking| predicate(booking))
            .map(|(_, booking)| booking)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.cache_stats.read().clone();
        stats.items_count = self.store.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use std::thread;

    fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            user_id: "user1".to_string(),
            service_id: "service1".to_string(),
            price: 40000.0,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_get_delete() {
        let cache = BookingCache::new();
        assert!(cache.get("a").is_none());

        cache.save(booking("a", BookingStatus::Pending));
        assert_eq!(cache.get("a").unwrap().status, BookingStatus::Pending);

        // last writer wins
        cache.save(booking("a", BookingStatus::Rejected));
        assert_eq!(cache.get("a").unwrap().status, BookingStatus::Rejected);
        assert_eq!(cache.len(), 1);

        cache.delete("a");
        assert!(cache.get("a").is_none());
        cache.delete("a");
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.items_count, 0);
    }

    #[test]
    fn test_update_status_touches_status_only() {
        let cache = BookingCache::new();
        let original = booking("a", BookingStatus::Pending);
        cache.save(original.clone());

        cache.update_status("a", BookingStatus::Confirmed);
        let updated = cache.get("a").unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.price, original.price);

        // absent id is a no-op
        cache.update_status("missing", BookingStatus::Canceled);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_transition_requires_expected_status() {
        let cache = BookingCache::new();
        cache.save(booking("a", BookingStatus::Pending));

        assert!(cache.transition("a", BookingStatus::Pending, BookingStatus::Canceled));
        assert!(!cache.transition("a", BookingStatus::Pending, BookingStatus::Confirmed));
        assert_eq!(cache.get("a").unwrap().status, BookingStatus::Canceled);
        assert!(!cache.transition("missing", BookingStatus::Pending, BookingStatus::Canceled));
    }

    #[test]
    fn test_remove_if() {
        let cache = BookingCache::new();
        cache.save(booking("a", BookingStatus::Confirmed));
        cache.save(booking("b", BookingStatus::Pending));

        let keep_confirmed = |b: &Booking| b.status != BookingStatus::Confirmed;
        assert!(cache.remove_if("a", keep_confirmed).is_none());
        assert!(cache.get("a").is_some());

        let removed = cache.remove_if("b", keep_confirmed).unwrap();
        assert_eq!(removed.id, "b");
        assert!(cache.get("b").is_none());
        assert!(cache.remove_if("b", keep_confirmed).is_none());
    }

    #[test]
    fn test_concurrent_access_with_contention() {
        let cache = Arc::new(BookingCache::new());
        let threads_count = 16;
        let operations_per_thread = 1000;

        let popular = ["p1", "p2", "p3"];
        for id in popular {
            cache.save(booking(id, BookingStatus::Pending));
        }

        let mut handles = vec![];
        for i in 0..threads_count {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                for j in 0..operations_per_thread {
                    let id = if rand::random::<f64>() < 0.8 {
                        popular[j % popular.len()].to_string()
                    } else {
                        format!("b{}", i * 1000 + j)
                    };

                    match j % 10 {
                        0..=6 => {
                            let _ = cache.get(&id);
                        }
                        7 => cache.save(booking(&id, BookingStatus::Pending)),
                        8 => cache.update_status(&id, BookingStatus::Rejected),
                        _ => cache.delete(&id),
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(
            stats.hit_count + stats.miss_count,
            threads_count * operations_per_thread * 7 / 10
        );
        assert_eq!(stats.items_count, cache.get_all().len());
    }

    #[test]
    fn test_racing_transitions_apply_once() {
        let cache = Arc::new(BookingCache::new());
        cache.save(booking("a", BookingStatus::Pending));

        let handles: Vec<_> = [BookingStatus::Confirmed, BookingStatus::Canceled]
            .into_iter()
            .cycle()
            .take(8)
            .map(|to| {
                let cache = cache.clone();
                thread::spawn(move || cache.transition("a", BookingStatus::Pending, to))
            })
            .collect();

        let applied = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(applied, 1);
        assert_ne!(cache.get("a").unwrap().status, BookingStatus::Pending);
    }
}
