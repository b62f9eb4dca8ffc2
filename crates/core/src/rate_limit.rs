//! Fixed-window request rate limiting.
//!
//! Counters are keyed by `(client IP, path)`. The cap and window come from
//! the first [`RateLimitRules`] prefix group that matches the path. Counter
//! storage sits behind [`RateLimitStore`]; the default store is a bounded
//! LRU so keys that stop being hit are eventually evicted.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

/// Length of every rate-limit window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default number of distinct keys the in-memory store retains.
pub const DEFAULT_STORE_CAPACITY: usize = 10_000;

/// Cap and window for one group of paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Path-prefix to policy mapping.
#[derive(Debug, Clone)]
pub struct RateLimitRules {
    /// Checked in order; the first matching prefix wins.
    pub prefixed: Vec<(String, RateLimitPolicy)>,
    /// Applied when no prefix matches.
    pub default: RateLimitPolicy,
}

impl Default for RateLimitRules {
    /// Authentication paths 5/min, payment paths 10/min, everything else
    /// 100/min.
    fn default() -> Self {
        let auth = RateLimitPolicy::per_minute(5);
        let payment = RateLimitPolicy::per_minute(10);
        Self {
            prefixed: vec![
                ("/api/v1/auth".to_string(), auth),
                ("/api/v1/checkout-session".to_string(), payment),
                ("/api/v1/billing".to_string(), payment),
            ],
            default: RateLimitPolicy::per_minute(100),
        }
    }
}

impl RateLimitRules {
    pub fn policy_for(&self, path: &str) -> RateLimitPolicy {
        self.prefixed
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, policy)| *policy)
            .unwrap_or(self.default)
    }
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Counter storage for the limiter.
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` at `now` under `policy`.
    fn hit(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> RateDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-process store holding at most `capacity` keys, evicting the least
/// recently used one when full. Per-instance only: several server replicas
/// each keep their own counts.
pub struct LruRateLimitStore {
    windows: Mutex<LruCache<String, Window>>,
}

impl LruRateLimitStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            windows: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LruRateLimitStore {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_STORE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl RateLimitStore for LruRateLimitStore {
    fn hit(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(window) = windows.get_mut(key) {
            if now.saturating_duration_since(window.started) < policy.window {
                if window.count >= policy.max_requests {
                    return RateDecision::Limited {
                        retry_after: policy.window,
                    };
                }
                window.count += 1;
                return RateDecision::Allowed {
                    remaining: policy.max_requests - window.count,
                };
            }
        }

        windows.put(
            key.to_string(),
            Window {
                started: now,
                count: 1,
            },
        );
        RateDecision::Allowed {
            remaining: policy.max_requests.saturating_sub(1),
        }
    }
}

/// Rules plus an injected store.
pub struct RateLimiter {
    rules: RateLimitRules,
    store: Box<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(rules: RateLimitRules, store: Box<dyn RateLimitStore>) -> Self {
        Self { rules, store }
    }

    /// Default rules over an LRU store of the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self::new(
            RateLimitRules::default(),
            Box::new(LruRateLimitStore::new(capacity)),
        )
    }

    pub fn check(&self, client_ip: &str, path: &str, now: Instant) -> RateDecision {
        let policy = self.rules.policy_for(path);
        let key = format!("{client_ip}|{path}");
        self.store.hit(&key, policy, now)
    }
}
