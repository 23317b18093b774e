//! Polling cadence
//!
//! How long the session waits before its first status query and between
//! later ones. Pure values; the session owns the timer.

use std::time::Duration;

/// Wait between two status queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interval {
    /// Same wait every cycle
    Fixed(Duration),
    /// `initial * factor^n`, where `n` stops growing after `max_retries`
    /// cycles, and every wait is clamped to `cap`
    Exponential {
        initial: Duration,
        factor: f64,
        max_retries: u32,
        cap: Duration,
    },
}

/// Timing of a polling session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadencePolicy {
    /// Grace period before the first status query
    pub initial_wait: Duration,
    pub interval: Interval,
}

impl CadencePolicy {
    pub fn fixed(initial_wait: Duration, interval: Duration) -> Self {
        Self {
            initial_wait,
            interval: Interval::Fixed(interval),
        }
    }

    pub fn exponential(
        initial_wait: Duration,
        initial: Duration,
        factor: f64,
        max_retries: u32,
        cap: Duration,
    ) -> Self {
        Self {
            initial_wait,
            interval: Interval::Exponential {
                initial,
                factor,
                max_retries,
                cap,
            },
        }
    }

    /// Wait after the status query of `cycle` (zero-based)
    pub fn delay_for(&self, cycle: u32) -> Duration {
        match self.interval {
            Interval::Fixed(interval) => interval,
            Interval::Exponential {
                initial,
                factor,
                max_retries,
                cap,
            } => {
                let exponent = cycle.min(max_retries).min(i32::MAX as u32) as i32;
                let secs = initial.as_secs_f64() * factor.powi(exponent);
                if !secs.is_finite() || secs >= cap.as_secs_f64() {
                    cap
                } else {
                    Duration::from_secs_f64(secs.max(0.0))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_interval() {
        let cadence = CadencePolicy::fixed(Duration::from_secs(10), Duration::from_secs(15));
        assert_eq!(cadence.delay_for(0), Duration::from_secs(15));
        assert_eq!(cadence.delay_for(42), Duration::from_secs(15));
    }

    #[test]
    fn test_exponential_growth() {
        let cadence = CadencePolicy::exponential(
            Duration::from_secs(10),
            Duration::from_secs(1),
            2.0,
            10,
            Duration::from_secs(60),
        );
        assert_eq!(cadence.delay_for(0), Duration::from_secs(1));
        assert_eq!(cadence.delay_for(1), Duration::from_secs(2));
        assert_eq!(cadence.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_exponential_respects_cap() {
        let cadence = CadencePolicy::exponential(
            Duration::ZERO,
            Duration::from_secs(4),
            3.0,
            20,
            Duration::from_secs(30),
        );
        assert_eq!(cadence.delay_for(1), Duration::from_secs(12));
        assert_eq!(cadence.delay_for(2), Duration::from_secs(30));
        assert_eq!(cadence.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_exponential_stops_growing_after_max_retries() {
        let cadence = CadencePolicy::exponential(
            Duration::ZERO,
            Duration::from_secs(1),
            2.0,
            3,
            Duration::from_secs(600),
        );
        assert_eq!(cadence.delay_for(3), Duration::from_secs(8));
        assert_eq!(cadence.delay_for(4), Duration::from_secs(8));
        assert_eq!(cadence.delay_for(100), Duration::from_secs(8));
    }
}
