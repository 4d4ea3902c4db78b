// Booking store: the system of record behind the cache, seeded with sample data

use std::collections::HashMap;

use chrono::{Duration, Utc};
use parking_lot::RwLock;

use crate::model::{Booking, BookingStatus};

const SEED_COUNT: u32 = 10;
const SEED_PRICE_STEP: f64 = 10000.0;

#[derive(Debug, Default)]
pub struct BookingStore {
    bookings: RwLock<HashMap<String, Booking>>,
}

impl BookingStore {
    /// Store holding the ten sample bookings "1".."10": confirmed, priced
    /// 10000..100000 and created an hour apart across the last day.
    pub fn new() -> Self {
        let base_time = Utc::now() - Duration::hours(24);

        let bookings = (1..=SEED_COUNT)
            .map(|i| {
                let id = i.to_string();
                let booking = Booking {
                    id: id.clone(),
                    user_id: format!("user{i}"),
                    service_id: format!("service{i}"),
                    price: f64::from(i) * SEED_PRICE_STEP,
                    status: BookingStatus::Confirmed,
                    created_at: base_time + Duration::hours(i64::from(i)),
                };
                (id, booking)
            })
            .collect();

        Self {
            bookings: RwLock::new(bookings),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Booking> {
        self.bookings.read().get(id).cloned()
    }

    pub fn get_all(&self) -> Vec<Booking> {
        self.bookings.read().values().cloned().collect()
    }

    /// Returns false when no booking has this id.
    pub fn update_status(&self, id: &str, status: BookingStatus) -> bool {
        match self.bookings.write().get_mut(id) {
            Some(booking) => {
                booking.status = status;
                true
            }
            None => false,
        }
    }

    pub fn save(&self, booking: Booking) {
        self.bookings.write().insert(booking.id.clone(), booking);
    }

    pub fn clear(&self) {
        self.bookings.write().clear();
    }

    pub fn len(&self) -> usize {
        self.bookings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_data() {
        let store = BookingStore::new();
        assert_eq!(store.len(), 10);

        let mut previous = None;
        for i in 1..=10u32 {
            let booking = store.get(&i.to_string()).unwrap();
            assert_eq!(booking.user_id, format!("user{i}"));
            assert_eq!(booking.service_id, format!("service{i}"));
            assert_eq!(booking.price, f64::from(i) * 10000.0);
            assert_eq!(booking.status, BookingStatus::Confirmed);
            assert!(booking.created_at < Utc::now());
            if let Some(prev) = previous {
                assert!(booking.created_at > prev);
            }
            previous = Some(booking.created_at);
        }
        assert!(store.get("11").is_none());
    }

    #[test]
    fn test_update_status_reports_existence() {
        let store = BookingStore::new();
        assert!(store.update_status("3", BookingStatus::Canceled));
        assert_eq!(store.get("3").unwrap().status, BookingStatus::Canceled);
        assert!(!store.update_status("missing", BookingStatus::Canceled));
    }

    #[test]
    fn test_save_and_clear() {
        let store = BookingStore::new();
        store.clear();
        assert!(store.is_empty());
        assert!(store.get_all().is_empty());

        let mut booking = BookingStore::new().get("1").unwrap();
        booking.id = "x".to_string();
        store.save(booking.clone());
        assert_eq!(store.get("x"), Some(booking));
    }
}
