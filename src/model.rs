// Booking records and the transient values that flow through the engine

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking record. `id` and `created_at` are fixed at creation; only
/// `status` moves afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub service_id: String,
    pub price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::Pending
    }
}

// Incoming creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub user_id: String,
    pub service_id: String,
    pub price: f64,
}

impl BookingRequest {
    pub fn new(user_id: impl Into<String>, service_id: impl Into<String>, price: f64) -> Self {
        Self {
            user_id: user_id.into(),
            service_id: service_id.into(),
            price,
        }
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        if self.user_id.trim().is_empty() {
            return Err(BookingError::InvalidInput("user_id is required".to_string()));
        }
        if self.service_id.trim().is_empty() {
            return Err(BookingError::InvalidInput(
                "service_id is required".to_string(),
            ));
        }
        // NaN fails this comparison too
        if !(self.price > 0.0) || !self.price.is_finite() {
            return Err(BookingError::InvalidInput(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCheckResult {
    pub booking_id: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    Price,
    Date,
}

impl FromStr for SortOption {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(SortOption::Price),
            "date" => Ok(SortOption::Date),
            other => Err(BookingError::InvalidInput(format!(
                "unknown sort option: {other}"
            ))),
        }
    }
}
