// Concurrent booking state engine: a read-through cache over a seeded store,
// asynchronous credit checks for high-value bookings and a periodic expiry sweep

pub mod booking_cache;
pub mod booking_store;
pub mod config;
pub mod credit_check;
pub mod engine;
pub mod error;
pub mod logger;
pub mod model;
pub mod sweeper;

// Re-export key types for convenience
pub use booking_cache::{BookingCache, CacheStats};
pub use booking_store::BookingStore;
pub use config::{AppConfig, CreditCheckConfig, EngineConfig};
pub use credit_check::{CreditChecker, SimulatedCreditCheck};
pub use engine::BookingEngine;
pub use error::{BookingError, CreditCheckError};
pub use model::{Booking, BookingRequest, BookingStatus, CreditCheckResult, SortOption};
pub use sweeper::Sweeper;
