//! Reconnect policy: bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay schedule for reconnect attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay (before jitter).
    pub max_delay: Duration,
    /// Attempts allowed before giving up.
    pub max_attempts: u32,
    /// Jitter as a fraction of the delay (0.2 = ±20%).
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            max_attempts: 10,
            jitter_factor: 0.2,
        }
    }
}

impl ReconnectPolicy {
    /// Delay without jitter for the 1-based `attempt`.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay)
    }

    /// Jittered delay for the 1-based `attempt`, or `None` once the
    /// attempt budget is spent.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let nominal = self.nominal_delay(attempt).as_secs_f64();
        let jitter_range = nominal * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        Some(Duration::from_secs_f64((nominal + jitter).max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            max_attempts: 6,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn test_delay_doubles_then_clamps() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_millis(800)));
        assert_eq!(policy.delay_for_attempt(5), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_budget_exhausted() {
        let policy = no_jitter();
        assert!(policy.delay_for_attempt(6).is_some());
        assert!(policy.delay_for_attempt(7).is_none());
        assert!(policy.delay_for_attempt(0).is_none());
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        let policy = ReconnectPolicy {
            max_attempts: u32::MAX,
            ..no_jitter()
        };
        assert_eq!(policy.nominal_delay(200), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let policy = ReconnectPolicy {
            jitter_factor: 0.2,
            ..no_jitter()
        };
        for _ in 0..100 {
            let d = policy.delay_for_attempt(2).unwrap().as_secs_f64();
            assert!((0.159..=0.241).contains(&d), "delay {d} outside band");
        }
    }
}
