//! Reconnect backoff.

use std::time::Duration;

use tradereplay_config::AgentConfig;

/// Exponential reconnect schedule: `delay_k = min(base * growth^k, max)`
/// for attempts `k = 1..=max_attempts`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub growth_factor: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for BackoffPolicy {
    fn from(config: &AgentConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            growth_factor: config.growth_factor,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}

impl BackoffPolicy {
    /// Delay before reconnect attempt `attempt`, or `None` once the attempt
    /// budget is spent.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let delay = self.base_delay.as_millis() as f64 * self.growth_factor.powi(attempt as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(delay as u64))
    }

    /// The full schedule, attempt 1 first.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts)
            .filter_map(|k| self.delay_for_attempt(k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let ms: Vec<u64> = BackoffPolicy::default()
            .schedule()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(
            ms,
            vec![3000, 4500, 6750, 10125, 15187, 22781, 30000, 30000, 30000, 30000]
        );
    }

    #[test]
    fn test_no_delay_outside_budget() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), None);
        assert_eq!(policy.delay_for_attempt(11), None);
        assert!(policy.delay_for_attempt(10).is_some());
    }

    #[test]
    fn test_cap_applies() {
        let policy = BackoffPolicy {
            base_delay: Duration::from_millis(1000),
            growth_factor: 10.0,
            max_delay: Duration::from_millis(5000),
            max_attempts: 3,
        };
        assert_eq!(policy.schedule(), vec![Duration::from_millis(5000); 3]);
    }
}
