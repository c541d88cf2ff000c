//! Login attempt rate limiting.
//!
//! A process-local, concurrency-safe failure counter keyed by an opaque
//! string. State is not persisted and not shared across replicas; a
//! horizontally-replicated deployment accepts N-fold leakage as the cost of
//! simplicity (a cluster needs an external counter store to tighten that).

use crate::AuthError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BLOCK_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Rate limiting parameters. Zero values select safe defaults.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Failed attempts allowed before the key becomes temporarily blocked.
    pub max_attempts: u32,
    /// How long the key stays blocked once the threshold is reached.
    pub block_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            block_window: DEFAULT_BLOCK_WINDOW,
        }
    }
}

#[derive(Debug, Default)]
struct Entry {
    failures: u32,
    blocked_until: Option<DateTime<Utc>>,
}

/// In-memory rate limiter for authentication attempts.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Entry>>,
    cfg: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a limiter with normalized configuration: zero attempts or a
    /// zero window fall back to the defaults (5 attempts, 10 minutes).
    pub fn new(mut cfg: RateLimitConfig) -> Self {
        if cfg.max_attempts == 0 {
            cfg.max_attempts = DEFAULT_MAX_ATTEMPTS;
        }
        if cfg.block_window.is_zero() {
            cfg.block_window = DEFAULT_BLOCK_WINDOW;
        }
        Self {
            entries: Mutex::new(HashMap::new()),
            cfg,
        }
    }

    /// `rate-limited` when the key is currently blocked.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.blocked(key, now) {
            return Err(AuthError::RateLimited);
        }
        Ok(())
    }

    /// Whether the key is blocked at `now`. Once a block window has elapsed,
    /// the key's state is purged.
    pub fn blocked(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get(key) else {
            return false;
        };
        match entry.blocked_until {
            Some(until) if now < until => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Records a failed attempt; at `max_attempts` the key blocks until
    /// `now + block_window`.
    pub fn record_failure(&self, key: &str, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(key.to_string()).or_default();
        entry.failures += 1;
        if entry.failures >= self.cfg.max_attempts {
            entry.blocked_until = Some(now + self.cfg.block_window);
            metrics::counter!("warden_rate_limit_blocks_total").increment(1);
            tracing::warn!(key, "login rate limit engaged");
        }
    }

    /// Clears all state for the key. Called on successful authentication.
    pub fn reset(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Composite rate-limit key for a login attempt:
/// `login:<subject>:<remote_ip>:<ua_hash>` with the subject lowercased and
/// trimmed (omitted when empty).
pub fn login_key(subject: &str, remote_ip: &str, user_agent: &str) -> String {
    let subject = subject.trim().to_lowercase();
    let ip = if remote_ip.is_empty() {
        "unknown"
    } else {
        remote_ip
    };
    let uah = short_hash(user_agent);
    if subject.is_empty() {
        format!("login::{ip}:{uah}")
    } else {
        format!("login:{subject}:{ip}:{uah}")
    }
}

fn short_hash(input: &str) -> String {
    if input.is_empty() {
        return "none".to_string();
    }
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minute() -> Duration {
        Duration::from_secs(60)
    }

    #[test]
    fn zero_config_gets_defaults() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 0,
            block_window: Duration::ZERO,
        });
        assert_eq!(limiter.cfg.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(limiter.cfg.block_window, DEFAULT_BLOCK_WINDOW);
    }

    #[test]
    fn not_blocked_initially() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        assert!(!limiter.blocked("k", Utc::now()));
    }

    #[test]
    fn blocks_at_threshold() {
        let now = Utc::now();
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 3,
            block_window: minute(),
        });

        limiter.record_failure("k", now);
        limiter.record_failure("k", now);
        assert!(!limiter.blocked("k", now));

        limiter.record_failure("k", now);
        assert!(limiter.blocked("k", now));
        assert!(matches!(
            limiter.check("k", now).expect_err("check"),
            AuthError::RateLimited
        ));
    }

    #[test]
    fn block_expires_and_state_is_purged() {
        let start = Utc::now();
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 1,
            block_window: minute(),
        });

        limiter.record_failure("k", start);
        assert!(limiter.blocked("k", start));

        let later = start + chrono::Duration::minutes(2);
        assert!(!limiter.blocked("k", later));
        assert!(!limiter
            .entries
            .lock()
            .expect("lock")
            .contains_key("k"));
    }

    #[test]
    fn reset_clears_the_key() {
        let now = Utc::now();
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 1,
            block_window: minute(),
        });

        limiter.record_failure("k", now);
        assert!(limiter.blocked("k", now));

        limiter.reset("k");
        assert!(!limiter.blocked("k", now));
    }

    #[test]
    fn keys_are_independent() {
        let now = Utc::now();
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 1,
            block_window: minute(),
        });

        limiter.record_failure("k1", now);
        assert!(limiter.blocked("k1", now));
        assert!(!limiter.blocked("k2", now));
    }

    #[test]
    fn failures_accumulate_until_reset() {
        let now = Utc::now();
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 3,
            block_window: minute(),
        });

        limiter.record_failure("k", now);
        limiter.record_failure("k", now);
        limiter.reset("k");
        limiter.record_failure("k", now);
        limiter.record_failure("k", now);
        assert!(!limiter.blocked("k", now));
    }

    #[test]
    fn login_key_normalizes_subject() {
        let key = login_key("  Alice ", "1.2.3.4", "agent/1.0");
        assert!(key.starts_with("login:alice:1.2.3.4:"));
        assert_eq!(key, login_key("alice", "1.2.3.4", "agent/1.0"));
    }

    #[test]
    fn login_key_handles_empty_parts() {
        let key = login_key("", "", "");
        assert_eq!(key, "login::unknown:none");
    }

    #[test]
    fn login_key_separates_user_agents() {
        let a = login_key("alice", "1.2.3.4", "agent/1.0");
        let b = login_key("alice", "1.2.3.4", "agent/2.0");
        assert_ne!(a, b);
    }
}
