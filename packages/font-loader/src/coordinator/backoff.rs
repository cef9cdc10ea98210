use std::time::Duration;

use rand::Rng;

/// Exponential retry delay: `base * 2^(attempt-1)` plus jitter, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: Duration,
    pub max: Duration,
}

impl Backoff {
    /// Delay without jitter, used to decide whether a failed family may be retried
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base
            .saturating_mul(1u32 << exponent)
            .min(self.max)
    }

    /// Delay to sleep before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let millis = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
            Duration::from_millis(rand::rng().random_range(0..=millis))
        };
        (self.base_delay(attempt) + jitter).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff() -> Backoff {
        Backoff {
            base: Duration::from_secs(1),
            jitter: Duration::from_secs(1),
            max: Duration::from_secs(10),
        }
    }

    #[test]
    fn base_delay_doubles_per_attempt() {
        let backoff = backoff();
        assert_eq!(backoff.base_delay(1), Duration::from_secs(1));
        assert_eq!(backoff.base_delay(2), Duration::from_secs(2));
        assert_eq!(backoff.base_delay(3), Duration::from_secs(4));
        assert_eq!(backoff.base_delay(5), Duration::from_secs(10));
        assert_eq!(backoff.base_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let backoff = backoff();
        for attempt in 1..=6 {
            let delay = backoff.delay(attempt);
            let base = backoff.base_delay(attempt);
            assert!(delay >= base);
            assert!(delay <= (base + backoff.jitter).min(backoff.max));
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let backoff = Backoff {
            jitter: Duration::ZERO,
            ..backoff()
        };
        assert_eq!(backoff.delay(2), Duration::from_secs(2));
    }
}
