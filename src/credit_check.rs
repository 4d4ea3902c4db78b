// Credit check: the slow external approval step for high-value bookings.
// Only the simulator lives here; it computes an outcome and never touches state.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::config::CreditCheckConfig;
use crate::error::CreditCheckError;
use crate::model::{BookingStatus, CreditCheckResult};

#[async_trait]
pub trait CreditChecker: Send + Sync + 'static {
    // Decide Confirmed or Rejected for the booking. May take a while.
    async fn evaluate(&self, booking_id: &str) -> Result<CreditCheckResult, CreditCheckError>;
}

/// Stand-in for a real credit service: waits `delay`, then flips a biased coin.
pub struct SimulatedCreditCheck {
    delay: Duration,
    approval_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedCreditCheck {
    pub fn new(config: CreditCheckConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let approval_rate = if config.approval_rate.is_nan() {
            CreditCheckConfig::default().approval_rate
        } else {
            config.approval_rate.clamp(0.0, 1.0)
        };

        Self {
            delay: config.delay,
            approval_rate,
            rng: Mutex::new(rng),
        }
    }

    fn random_status(&self) -> BookingStatus {
        if self.rng.lock().gen_bool(self.approval_rate) {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Rejected
        }
    }
}

impl Default for SimulatedCreditCheck {
    fn default() -> Self {
        Self::new(CreditCheckConfig::default())
    }
}

#[async_trait]
impl CreditChecker for SimulatedCreditCheck {
    async fn evaluate(&self, booking_id: &str) -> Result<CreditCheckResult, CreditCheckError> {
        tokio::time::sleep(self.delay).await;

        let status = self.random_status();
        debug!(booking_id, %status, "credit check finished");

        Ok(CreditCheckResult {
            booking_id: booking_id.to_string(),
            status,
        })
    }
}
