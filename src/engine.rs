// Booking engine: creation, lookup, listing, cancellation and expiry of bookings.
// Foreground calls, credit check tasks and the sweep all share the same cache and
// store; there is no engine-wide lock.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::booking_cache::BookingCache;
use crate::booking_store::BookingStore;
use crate::config::EngineConfig;
use crate::credit_check::CreditChecker;
use crate::error::BookingError;
use crate::model::{Booking, BookingRequest, BookingStatus, CreditCheckResult, SortOption};

pub struct BookingEngine {
    cache: Arc<BookingCache>,
    store: Arc<BookingStore>,
    checker: Arc<dyn CreditChecker>,
    config: EngineConfig,
    expire_after: chrono::Duration,
    // Credit checks are spawned here and never awaited
    runtime: Handle,
}

impl BookingEngine {
    pub fn new(
        cache: Arc<BookingCache>,
        store: Arc<BookingStore>,
        checker: Arc<dyn CreditChecker>,
        config: EngineConfig,
        runtime: Handle,
    ) -> Self {
        let expire_after = chrono::Duration::from_std(config.expire_after)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));

        Self {
            cache,
            store,
            checker,
            config,
            expire_after,
            runtime,
        }
    }

    pub fn cache(&self) -> &Arc<BookingCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<BookingStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn requires_credit_check(&self, price: f64) -> bool {
        price > self.config.credit_check_threshold
    }

    /// Creates a pending booking in the cache. High-value bookings get a
    /// background credit check; the booking is returned before it completes.
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, price = request.price)
    )]
    pub fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        request.validate()?;

        let now = Utc::now();
        let booking = Booking {
            id: generate_id(now),
            user_id: request.user_id,
            service_id: request.service_id,
            price: request.price,
            status: BookingStatus::Pending,
            created_at: now,
        };

        self.cache.save(booking.clone());

        let needs_check = self.requires_credit_check(booking.price);
        if needs_check {
            self.spawn_credit_check(booking.id.clone());
        }

        info!(booking_id = %booking.id, credit_check = needs_check, "booking created");
        Ok(booking)
    }

    fn spawn_credit_check(&self, booking_id: String) {
        let cache = Arc::clone(&self.cache);
        let checker = Arc::clone(&self.checker);
        let span = info_span!("credit_check", booking_id = %booking_id);

        self.runtime.spawn(
            async move {
                match checker.evaluate(&booking_id).await {
                    Ok(result) => apply_credit_check(&cache, result),
                    // No caller is left to report to
                    Err(e) => warn!(error = %e, "credit check failed; booking stays pending"),
                }
            }
            .instrument(span),
        );
    }

    /// Cache first; a store hit is written back to the cache.
    #[instrument(skip(self))]
    pub fn get_booking(&self, id: &str) -> Result<Booking, BookingError> {
        if let Some(booking) = self.cache.get(id) {
            return Ok(booking);
        }

        if let Some(booking) = self.store.get(id) {
            debug!("cache miss served from store");
            self.cache.save(booking.clone());
            return Ok(booking);
        }

        Err(BookingError::not_found())
    }

    /// Every booking known to the cache or the store, each id once. When both
    /// hold an id the cache copy is returned.
    #[instrument(skip(self))]
    pub fn list_bookings(
        &self,
        sort: Option<SortOption>,
        high_value_only: Option<bool>,
    ) -> Vec<Booking> {
        let mut unique: HashMap<String, Booking> = self
            .store
            .get_all()
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();
        for booking in self.cache.get_all() {
            unique.insert(booking.id.clone(), booking);
        }

        let mut bookings: Vec<Booking> = unique.into_values().collect();

        if high_value_only.unwrap_or(false) {
            let threshold = self.config.credit_check_threshold;
            bookings.retain(|b| b.price > threshold);
        }

        match sort {
            Some(SortOption::Price) => bookings.sort_by(|a, b| a.price.total_cmp(&b.price)),
            Some(SortOption::Date) => bookings.sort_by_key(|b| b.created_at),
            None => bookings = sort_by_id(bookings),
        }

        bookings
    }

    /// Cancels a booking that is not confirmed. On success the store copy is
    /// `Canceled` and the cache no longer holds the id.
    #[instrument(skip(self))]
    pub fn cancel_booking(&self, id: &str) -> Result<(), BookingError> {
        let cached = self.cache.get(id);

        match &cached {
            Some(booking) => {
                if booking.status == BookingStatus::Confirmed {
                    return Err(BookingError::confirmed_cancel());
                }
                if self.store.get(id).is_none() {
                    return Err(BookingError::not_found_in_repository());
                }
            }
            None => {
                if let Some(stored) = self.store.get(id) {
                    if stored.status == BookingStatus::Confirmed {
                        return Err(BookingError::confirmed_cancel());
                    }
                }
            }
        }

        self.finish_cancel(id, cached.is_some())?;

        info!("booking canceled");
        Ok(())
    }

    // Store is written first; the cache entry is only removed once the store
    // holds `Canceled`. While the store is written the cache entry is held at
    // `Canceled` so a credit check can no longer confirm it.
    fn finish_cancel(&self, id: &str, cached: bool) -> Result<(), BookingError> {
        let held = if cached {
            self.hold_for_cancel(id)?
        } else {
            None
        };

        if !self.store.update_status(id, BookingStatus::Canceled) {
            if let Some(previous) = held {
                self.cache
                    .transition(id, BookingStatus::Canceled, previous);
                warn!(restored = %previous, "store lost the booking during cancel; cache entry restored");
            }
            return Err(BookingError::not_found());
        }

        if cached {
            self.cache.delete(id);
        }
        Ok(())
    }

    // Marks the cache entry `Canceled` and returns the status it held, or
    // `None` once the entry is gone. Confirmed entries are refused.
    fn hold_for_cancel(&self, id: &str) -> Result<Option<BookingStatus>, BookingError> {
        loop {
            let Some(current) = self.cache.get(id) else {
                return Ok(None);
            };
            if current.status == BookingStatus::Confirmed {
                return Err(BookingError::confirmed_cancel());
            }
            if self
                .cache
                .transition(id, current.status, BookingStatus::Canceled)
            {
                return Ok(Some(current.status));
            }
        }
    }

    /// Cancels every cached booking still pending after the expiry window.
    pub fn sweep_expired(&self) {
        self.sweep_expired_at(Utc::now())
    }

    #[instrument(skip(self))]
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.expire_after) else {
            return;
        };

        let mut expired = 0usize;
        for booking in self.cache.get_all() {
            if !booking.is_pending() || booking.created_at >= cutoff {
                continue;
            }

            if !self
                .cache
                .transition(&booking.id, BookingStatus::Pending, BookingStatus::Canceled)
            {
                debug!(booking_id = %booking.id, "booking left pending before the sweep reached it");
                continue;
            }

            if !self.store.update_status(&booking.id, BookingStatus::Canceled) {
                debug!(booking_id = %booking.id, "expired booking has no store copy");
            }
            expired += 1;
        }

        if expired > 0 {
            info!(expired, "expired stale pending bookings");
        } else {
            debug!("no expired bookings");
        }
    }
}

// Timestamp prefix keeps ids readable; the uuid suffix makes them unique.
fn generate_id(now: DateTime<Utc>) -> String {
    format!("{}-{}", now.format("%Y%m%d%H%M%S"), Uuid::new_v4().simple())
}

fn apply_credit_check(cache: &BookingCache, result: CreditCheckResult) {
    if result.status == BookingStatus::Pending {
        warn!("credit check returned pending; ignoring");
        return;
    }

    if cache.transition(&result.booking_id, BookingStatus::Pending, result.status) {
        info!(status = %result.status, "credit check applied");
    } else {
        debug!("booking no longer pending in cache; credit check result dropped");
    }
}

type KeyedBooking = (Option<i64>, Booking);

// Numeric order when both ids parse as integers, string order otherwise. That
// pairwise rule is not a total order on mixed sets, which std's sorts may reject,
// so this is a stable bottom-up merge sort that tolerates it.
fn sort_by_id(bookings: Vec<Booking>) -> Vec<Booking> {
    let mut runs: Vec<Vec<KeyedBooking>> = bookings
        .into_iter()
        .map(|b| vec![(b.id.parse().ok(), b)])
        .collect();

    while runs.len() > 1 {
        let mut merged = Vec::with_capacity(runs.len() / 2 + 1);
        let mut pairs = runs.into_iter();
        while let Some(left) = pairs.next() {
            match pairs.next() {
                Some(right) => merged.push(merge_runs(left, right)),
                None => merged.push(left),
            }
        }
        runs = merged;
    }

    runs.into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|(_, b)| b)
        .collect()
}

// Ties go to the left run, which keeps the sort stable
fn merge_runs(left: Vec<KeyedBooking>, right: Vec<KeyedBooking>) -> Vec<KeyedBooking> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare_ids(l, r) == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        out.extend(if take_right { right.next() } else { left.next() });
    }

    out
}

fn compare_ids(a: &KeyedBooking, b: &KeyedBooking) -> Ordering {
    match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.1.id.cmp(&b.1.id),
    }
}
