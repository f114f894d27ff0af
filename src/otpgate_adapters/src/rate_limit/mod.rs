use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Token-bucket parameters for the per-address limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Refill rate: tokens added per minute.
    pub requests_per_minute: u32,
    /// Bucket capacity; a fresh address gets this many requests up front.
    pub burst: u32,
    /// How often the sweeper runs.
    pub sweep_interval: Duration,
    /// Entries untouched for this long are evicted by the sweep.
    pub idle_after: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 5,
            burst: 5,
            sweep_interval: Duration::from_secs(180),
            idle_after: Duration::from_secs(120),
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn full(burst: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(burst),
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, rate_per_sec: f64, burst: f64, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate_per_sec).min(burst);
        self.last_refill = now;
    }

    fn try_take(&mut self, rate_per_sec: f64, burst: f64, now: Instant) -> bool {
        self.refill(rate_per_sec, burst, now);
        self.last_seen = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Read-only variant of [`TokenBucket::try_take`]: computes the refilled
    /// level without mutating anything.
    fn would_allow(&self, rate_per_sec: f64, burst: f64, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * rate_per_sec).min(burst) >= 1.0
    }

    fn idle_since(&self, now: Instant) -> Duration {
        now.duration_since(self.last_seen)
    }
}

/// Per-address token buckets in a sharded registry.
///
/// `DashMap` shards the map so admission checks do not serialize behind one
/// lock, and its entry API closes the lookup-then-create race. The sweeper
/// evicts only entries idle past `idle_after`, so active addresses keep their
/// throttling state across sweeps.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, TokenBucket>>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Takes one token for `address`, lazily creating a full bucket on first
    /// sight. Returns whether the request is admitted.
    pub fn admit(&self, address: &str) -> bool {
        self.admit_at(address, Instant::now())
    }

    /// Read-only admission check: reports whether `address` would currently
    /// be admitted without consuming a token or creating state.
    pub fn would_admit(&self, address: &str) -> bool {
        self.would_admit_at(address, Instant::now())
    }

    /// Evicts idle entries. Normally driven by [`RateLimiter::spawn_sweeper`].
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    /// Number of addresses currently tracked.
    pub fn tracked_addresses(&self) -> usize {
        self.buckets.len()
    }

    /// Runs [`RateLimiter::sweep`] every `sweep_interval` until the returned
    /// handle is dropped or aborted.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.config.sweep_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep();
                tracing::debug!(
                    tracked = limiter.tracked_addresses(),
                    "rate limiter sweep complete"
                );
            }
        })
    }

    fn rate_per_sec(&self) -> f64 {
        f64::from(self.config.requests_per_minute) / 60.0
    }

    fn admit_at(&self, address: &str, now: Instant) -> bool {
        let mut bucket = self
            .buckets
            .entry(address.to_string())
            .or_insert_with(|| TokenBucket::full(self.config.burst, now));
        bucket.try_take(self.rate_per_sec(), f64::from(self.config.burst), now)
    }

    fn would_admit_at(&self, address: &str, now: Instant) -> bool {
        match self.buckets.get(address) {
            Some(bucket) => {
                bucket.would_allow(self.rate_per_sec(), f64::from(self.config.burst), now)
            }
            None => self.config.burst >= 1,
        }
    }

    fn sweep_at(&self, now: Instant) {
        self.buckets
            .retain(|_, bucket| bucket.idle_since(now) < self.config.idle_after);
    }
}
