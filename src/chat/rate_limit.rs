//! Fixed-window request limiter for the chat endpoint.
//!
//! Each client gets a window that opens on its first request. Requests are
//! counted until the cap; the window resets once its end time has passed.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::config::ChatConfig;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// When the current window ends.
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-client fixed-window limiter. Safe to share across tasks.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: TimeDelta,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: TimeDelta) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Build a limiter from the `[chat]` config section.
    pub fn from_config(config: &ChatConfig) -> Self {
        let seconds = i64::try_from(config.window_seconds).unwrap_or(i64::MAX);
        let window = TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX);
        Self::new(config.max_requests, window)
    }

    /// Number of clients with a window still held in memory.
    ///
    /// Expired windows are swept whenever a new window is opened.
    pub fn tracked_clients(&self) -> usize {
        match self.windows.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Check and record a request from `client` at the current time.
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Utc::now())
    }

    /// Check and record a request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: DateTime<Utc>) -> RateDecision {
        let key = format!("chat:{client}");
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(window) = windows.get_mut(&key) {
            if now <= window.reset_at {
                if window.count >= self.max_requests {
                    debug!(client, reset_at = %window.reset_at, "chat rate limit exceeded");
                    return RateDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: window.reset_at,
                    };
                }
                window.count = window.count.saturating_add(1);
                return RateDecision {
                    allowed: true,
                    remaining: self.max_requests.saturating_sub(window.count),
                    reset_at: window.reset_at,
                };
            }
        }

        windows.retain(|_, window| now <= window.reset_at);
        let reset_at = now.checked_add_signed(self.window).unwrap_or(now);
        windows.insert(key, Window { count: 1, reset_at });
        RateDecision {
            allowed: true,
            remaining: self.max_requests.saturating_sub(1),
            reset_at,
        }
    }
}
