//! Flood-control policies for the restricted lane.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Restricted-lane policy, built from normalized config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatePolicy {
    None,
    /// Hold the lane this long after every send.
    SimpleDelay(Duration),
    TokenBucket {
        size: usize,
        limit: u32,
        expiration: Duration,
    },
}

impl From<&RateLimitConfig> for RatePolicy {
    fn from(cfg: &RateLimitConfig) -> Self {
        match cfg.kind.as_str() {
            "simple_delay" => RatePolicy::SimpleDelay(Duration::from_millis(cfg.simple_delay)),
            "token_bucket" => RatePolicy::TokenBucket {
                size: cfg.token_bucket.size as usize,
                limit: cfg.token_bucket.limit,
                expiration: Duration::from_secs(cfg.token_bucket.expiration_time),
            },
            _ => RatePolicy::None,
        }
    }
}

/// Recent send timestamps, oldest first, bounded to one window.
#[derive(Debug)]
pub struct RateBucket {
    timestamps: VecDeque<Instant>,
    is_full: bool,
    size: usize,
    limit: u32,
    expiration: Duration,
}

impl RateBucket {
    pub fn new(size: usize, limit: u32, expiration: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(size),
            is_full: false,
            size,
            limit,
            expiration,
        }
    }

    pub fn is_full(&self) -> bool {
        self.is_full
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Expire old stamps and report how long to wait before the next send.
    pub fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) > self.expiration {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        self.is_full = self.timestamps.len() >= self.size;
        if !self.is_full {
            return None;
        }

        let last = self.timestamps.back().copied().unwrap_or(now);
        let wait = self
            .expiration
            .saturating_sub(now.saturating_duration_since(last));
        Some(if self.limit > 0 { wait / self.limit } else { wait })
    }

    /// Stamp a send at `now`. A full bucket refreshes its newest stamp
    /// instead of growing.
    pub fn record(&mut self, now: Instant) {
        if self.is_full {
            if let Some(last) = self.timestamps.back_mut() {
                *last = now;
                return;
            }
        }
        self.timestamps.push_back(now);
    }
}

/// Applies a [`RatePolicy`] around each send.
#[derive(Debug)]
pub struct Throttle {
    policy: RatePolicy,
    bucket: Option<RateBucket>,
}

impl Throttle {
    pub fn new(policy: RatePolicy) -> Self {
        let bucket = match &policy {
            RatePolicy::TokenBucket {
                size,
                limit,
                expiration,
            } => Some(RateBucket::new(*size, *limit, *expiration)),
            _ => None,
        };
        Self { policy, bucket }
    }

    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Wait until the next send is allowed.
    pub async fn before_send(&mut self) {
        if let Some(bucket) = self.bucket.as_mut() {
            if let Some(wait) = bucket.wait_time(Instant::now()) {
                tokio::time::sleep(wait).await;
            }
            bucket.record(Instant::now());
        }
    }

    /// Hold the lane after a send.
    pub async fn after_send(&mut self) {
        if let RatePolicy::SimpleDelay(delay) = self.policy {
            tokio::time::sleep(delay).await;
        }
    }
}
