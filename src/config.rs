use std::{str::FromStr, time::Duration};

use tracing::warn;

// Engine configuration options
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bookings priced strictly above this go through the credit check and
    /// count as high value in listings.
    pub credit_check_threshold: f64,
    /// Age after which a still-pending booking is canceled by the sweep.
    pub expire_after: Duration,
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            credit_check_threshold: 50000.0,
            expire_after: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

// Simulated credit check configuration
#[derive(Debug, Clone)]
pub struct CreditCheckConfig {
    pub delay: Duration,
    /// Probability of a `Confirmed` outcome, in 0.0..=1.0.
    pub approval_rate: f64,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for CreditCheckConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            approval_rate: 0.5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub credit_check: CreditCheckConfig,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Absent keys keep their default;
    /// malformed values are logged and also fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine_defaults = EngineConfig::default();
        let check_defaults = CreditCheckConfig::default();

        let engine = EngineConfig {
            credit_check_threshold: parse_or(
                &lookup,
                "BOOKING_CREDIT_CHECK_THRESHOLD",
                engine_defaults.credit_check_threshold,
            ),
            expire_after: Duration::from_secs(parse_or(
                &lookup,
                "BOOKING_EXPIRE_AFTER_SECS",
                engine_defaults.expire_after.as_secs(),
            )),
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "BOOKING_SWEEP_INTERVAL_SECS",
                engine_defaults.sweep_interval.as_secs(),
            ))
            .max(Duration::from_secs(1)),
        };

        let credit_check = CreditCheckConfig {
            delay: Duration::from_millis(parse_or(
                &lookup,
                "BOOKING_CREDIT_CHECK_DELAY_MS",
                check_defaults.delay.as_millis() as u64,
            )),
            approval_rate: parse_or(
                &lookup,
                "BOOKING_APPROVAL_RATE",
                check_defaults.approval_rate,
            )
            .clamp(0.0, 1.0),
            seed: lookup("BOOKING_RNG_SEED").and_then(|raw| parse_value("BOOKING_RNG_SEED", &raw)),
        };

        Self {
            engine,
            credit_check,
            json_logs: lookup("APP_ENV").as_deref() == Some("production"),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|raw| parse_value(key, &raw))
        .unwrap_or(default)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = raw, "ignoring malformed config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(cfg.engine.credit_check_threshold, 50000.0);
        assert_eq!(cfg.engine.expire_after, Duration::from_secs(300));
        assert_eq!(cfg.engine.sweep_interval, Duration::from_secs(60));
        assert_eq!(cfg.credit_check.delay, Duration::from_secs(2));
        assert_eq!(cfg.credit_check.approval_rate, 0.5);
        assert_eq!(cfg.credit_check.seed, None);
        assert!(!cfg.json_logs);
    }

    #[test]
    fn test_overrides_and_malformed_values() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("BOOKING_CREDIT_CHECK_THRESHOLD", "1000"),
            ("BOOKING_EXPIRE_AFTER_SECS", "not-a-number"),
            ("BOOKING_SWEEP_INTERVAL_SECS", "0"),
            ("BOOKING_CREDIT_CHECK_DELAY_MS", "150"),
            ("BOOKING_APPROVAL_RATE", "3.5"),
            ("BOOKING_RNG_SEED", "42"),
            ("APP_ENV", "production"),
        ]));

        assert_eq!(cfg.engine.credit_check_threshold, 1000.0);
        assert_eq!(cfg.engine.expire_after, Duration::from_secs(300));
        assert_eq!(cfg.engine.sweep_interval, Duration::from_secs(1));
        assert_eq!(cfg.credit_check.delay, Duration::from_millis(150));
        assert_eq!(cfg.credit_check.approval_rate, 1.0);
        assert_eq!(cfg.credit_check.seed, Some(42));
        assert!(cfg.json_logs);
    }
}
