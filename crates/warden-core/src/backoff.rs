//! Backoff math for the initial-connect loop.
//!
//! Pure functions only: the jitter randomness is an explicit argument so
//! the math is testable, and the session crate supplies real randomness.

use std::time::Duration;

/// Base delay before the first reconnect attempt.
pub const CONNECT_BASE_DELAY_MS: u64 = 5_000;
/// Cap on the reconnect delay.
pub const CONNECT_MAX_DELAY_MS: u64 = 60_000;
/// Jitter factor: each delay varies by ±15% to avoid synchronized retries
/// across instances.
pub const CONNECT_JITTER_FACTOR: f64 = 0.15;

/// Calculate an exponential backoff delay with symmetric jitter.
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (random*2-1) * jitter)`
///
/// # Arguments
///
/// * `attempt` — zero-based attempt index (0 for the first retry)
/// * `base_delay_ms` — base delay in milliseconds
/// * `max_delay_ms` — cap applied before jitter
/// * `jitter_factor` — jitter range (0.0–1.0)
/// * `random` — a value in `[0.0, 1.0)` from a PRNG
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn backoff_delay_ms(
    attempt: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    random: f64,
) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(max_delay_ms);

    // Maps random [0,1) to [-jitter, +jitter]
    let jitter = 1.0 + (random * 2.0 - 1.0) * jitter_factor;
    let with_jitter = (capped as f64) * jitter;

    with_jitter.round().max(0.0) as u64
}

/// Connect-loop delay for the given attempt, using the connect constants.
#[must_use]
pub fn connect_delay(attempt: u32, random: f64) -> Duration {
    Duration::from_millis(backoff_delay_ms(
        attempt,
        CONNECT_BASE_DELAY_MS,
        CONNECT_MAX_DELAY_MS,
        CONNECT_JITTER_FACTOR,
        random,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_attempt_without_jitter() {
        assert_eq!(backoff_delay_ms(0, 5_000, 60_000, 0.0, 0.5), 5_000);
        assert_eq!(backoff_delay_ms(1, 5_000, 60_000, 0.0, 0.5), 10_000);
        assert_eq!(backoff_delay_ms(2, 5_000, 60_000, 0.0, 0.5), 20_000);
        assert_eq!(backoff_delay_ms(3, 5_000, 60_000, 0.0, 0.5), 40_000);
    }

    #[test]
    fn caps_at_max_delay() {
        assert_eq!(backoff_delay_ms(4, 5_000, 60_000, 0.0, 0.5), 60_000);
        assert_eq!(backoff_delay_ms(30, 5_000, 60_000, 0.0, 0.5), 60_000);
    }

    #[test]
    fn jitter_stays_within_fifteen_percent() {
        for attempt in 0..8 {
            let nominal = backoff_delay_ms(attempt, 5_000, 60_000, 0.0, 0.5);
            let low = backoff_delay_ms(attempt, 5_000, 60_000, 0.15, 0.0);
            let high = backoff_delay_ms(attempt, 5_000, 60_000, 0.15, 1.0);
            #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
            let bound = (nominal as f64 * 0.15).round() as u64;
            assert!(nominal - low <= bound + 1);
            assert!(high - nominal <= bound + 1);
        }
    }

    #[test]
    fn random_midpoint_is_nominal() {
        // random = 0.5 → jitter multiplier exactly 1.0
        assert_eq!(backoff_delay_ms(0, 5_000, 60_000, 0.15, 0.5), 5_000);
    }

    #[test]
    fn high_attempt_does_not_overflow() {
        let delay = backoff_delay_ms(1_000, 5_000, 60_000, 0.15, 0.9);
        assert!(delay >= 60_000);
        assert!(delay <= 69_000);
    }

    #[test]
    fn connect_delay_uses_connect_constants() {
        let delay = connect_delay(0, 0.5);
        assert_eq!(delay, Duration::from_millis(5_000));
        let capped = connect_delay(10, 0.5);
        assert_eq!(capped, Duration::from_millis(60_000));
    }
}
