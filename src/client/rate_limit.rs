//! Outbound call admission control
//!
//! Every remote call acquires one admission first. Two strategies share the
//! [`Throttle`] contract: an exact sliding window (default) and a governor
//! token bucket. Both serialise the admission decision behind a FIFO mutex,
//! so concurrent callers are admitted in arrival order.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{ThrottleConfig, ThrottleStrategy};
use crate::error::{ConfigError, Result};

/// Admission gate for outbound calls.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until one more call may be issued, then record it.
    async fn acquire(&self);
}

/// At most `max_calls` admissions within any rolling `window`.
pub struct SlidingWindow {
    max_calls: usize,
    window: Duration,
    admissions: Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    pub fn new(max_calls: NonZeroU32, window: Duration) -> Self {
        let max_calls = max_calls.get() as usize;
        Self {
            max_calls,
            window,
            admissions: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }
}

#[async_trait]
impl Throttle for SlidingWindow {
    async fn acquire(&self) {
        // Held across the wait: later callers queue behind this one
        let mut admissions = self.admissions.lock().await;

        let now = Instant::now();
        while let Some(&oldest) = admissions.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                admissions.pop_front();
            } else {
                break;
            }
        }

        if admissions.len() < self.max_calls {
            admissions.push_back(now);
            return;
        }

        if let Some(&oldest) = admissions.front() {
            let wait = (oldest + self.window).saturating_duration_since(now);
            debug!("Quota exhausted, waiting {:?} for admission", wait);
            tokio::time::sleep(wait).await;
            admissions.pop_front();
        }
        admissions.push_back(Instant::now());
    }
}

/// Token bucket of capacity `max_calls`, refilled at `max_calls / window`.
pub struct TokenBucket {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    turn: Mutex<()>,
}

impl TokenBucket {
    pub fn new(max_calls: NonZeroU32, window: Duration) -> Result<Self> {
        let quota = Quota::with_period(window / max_calls.get())
            .ok_or_else(|| {
                ConfigError::Invalid("throttle window too short for its call quota".to_string())
            })?
            .allow_burst(max_calls);

        Ok(Self {
            limiter: RateLimiter::direct(quota),
            turn: Mutex::new(()),
        })
    }
}

#[async_trait]
impl Throttle for TokenBucket {
    async fn acquire(&self) {
        let _turn = self.turn.lock().await;
        self.limiter.until_ready().await;
    }
}

/// Build the configured throttle.
pub fn build_throttle(config: &ThrottleConfig) -> Result<Arc<dyn Throttle>> {
    let max_calls = NonZeroU32::new(config.max_calls)
        .ok_or_else(|| ConfigError::Invalid("throttle.max_calls must be at least 1".to_string()))?;
    if config.window_ms == 0 {
        return Err(ConfigError::Invalid("throttle.window_ms must be at least 1".to_string()).into());
    }

    debug!(
        "Throttle: {:?}, {} calls per {:?}",
        config.strategy,
        max_calls,
        config.window()
    );

    let throttle: Arc<dyn Throttle> = match config.strategy {
        ThrottleStrategy::SlidingWindow => Arc::new(SlidingWindow::new(max_calls, config.window())),
        ThrottleStrategy::TokenBucket => Arc::new(TokenBucket::new(max_calls, config.window())?),
    };
    Ok(throttle)
}
