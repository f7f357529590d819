//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

/// Calculate the delay after failed attempt `attempt` (1-based).
///
/// `base_ms * 2^(attempt-1)`, capped at `max_ms`, plus up to `jitter_ratio`
/// of the capped delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter_ratio: f64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = (capped_delay as f64 * jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub jitter_ratio: f64,
}

impl Backoff {
    /// No cap beyond `u64` millis, no jitter.
    pub fn exponential(base: Duration) -> Self {
        Self {
            base,
            max: Duration::from_millis(u64::MAX),
            jitter_ratio: 0.0,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            duration_ms(self.base),
            duration_ms(self.max),
            self.jitter_ratio,
        )
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
