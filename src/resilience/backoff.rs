//! Fixed-interval retry policy.

use std::time::Duration;

use crate::config::ManagerConfig;

/// How often, and how many times, a retryable operation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between consecutive attempts.
    pub interval: Duration,
    /// Total attempt bound; `None` retries until success.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn forever(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.retry_interval_ms),
            max_attempts: config.max_attempts,
        }
    }

    /// Delay to sleep after `attempt` (1-based) failed, or `None` when the
    /// bound is reached and the caller must give up.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forever_never_gives_up() {
        let policy = RetryPolicy::forever(Duration::from_millis(100));
        for attempt in [1, 2, 1_000, u32::MAX] {
            assert_eq!(policy.next_delay(attempt), Some(Duration::from_millis(100)));
        }
    }

    #[test]
    fn test_bounded_gives_up_at_limit() {
        let policy = RetryPolicy::bounded(Duration::from_secs(5), 3);
        assert_eq!(policy.next_delay(1), Some(Duration::from_secs(5)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_secs(5)));
        assert_eq!(policy.next_delay(3), None);
    }

    #[test]
    fn test_from_config() {
        let config = ManagerConfig::default();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.interval, Duration::from_millis(5000));
        assert_eq!(policy.max_attempts, None);
    }
}
