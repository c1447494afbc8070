//! Screening for the analytics event endpoints.
//!
//! Page views and clicks are recorded without storing raw addresses: each
//! visitor is reduced to a salted [`fingerprint`]. Before an event is kept it
//! passes [`is_likely_bot`] and a per-client [`EventLimiter`].

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use reqwest::header::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::AnalyticsConfig;

/// Address reported when no proxy header names the client.
pub const UNKNOWN_IP: &str = "0.0.0.0";

const BOT_USER_AGENT_PATTERNS: &[&str] = &[
    "bot",
    "spider",
    "crawler",
    "curl/",
    "wget/",
    "headless",
    "pingdom",
    "lighthouse",
    "pagespeed",
];

fn bot_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        BOT_USER_AGENT_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(&format!("(?i){}", regex::escape(pattern))).ok())
            .collect()
    })
}

fn brand_patterns() -> Option<&'static (Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let placeholder = Regex::new(r"(?i)Not.?A.?Brand").ok()?;
            let chromium = Regex::new(r"(?i)Chromium").ok()?;
            Some((placeholder, chromium))
        })
        .as_ref()
}

/// Heuristic bot check on the `User-Agent` and `Sec-CH-UA` headers.
///
/// A missing or empty user agent is not treated as a bot. Besides known
/// crawler and automation names, a client-hints header carrying the
/// placeholder brand without Chromium is flagged.
pub fn is_likely_bot(user_agent: Option<&str>, sec_ch_ua: Option<&str>) -> bool {
    let ua = user_agent.unwrap_or_default();
    if ua.is_empty() {
        return false;
    }
    if bot_patterns().iter().any(|pattern| pattern.is_match(ua)) {
        return true;
    }
    match (sec_ch_ua, brand_patterns()) {
        (Some(hints), Some((placeholder, chromium))) if !hints.is_empty() => {
            placeholder.is_match(hints) && !chromium.is_match(hints)
        }
        _ => false,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Client address from proxy headers.
///
/// Takes the first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// [`UNKNOWN_IP`].
pub fn extract_ip(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());
    if let Some(first) = forwarded {
        return first.to_owned();
    }
    match header_str(headers, "x-real-ip") {
        Some(real_ip) if !real_ip.is_empty() => real_ip.to_owned(),
        _ => UNKNOWN_IP.to_owned(),
    }
}

/// Hex SHA-256 of `ip|user_agent|salt`.
///
/// Rotating the salt daily keeps fingerprints from linking visits across days.
pub fn fingerprint(ip: &str, user_agent: Option<&str>, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.unwrap_or_default().as_bytes());
    hasher.update(b"|");
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Calendar day of `at` as `YYYY-MM-DD`, used to bucket daily counters.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Sliding-window event limiter keyed by client address.
///
/// Every call is recorded, including refused ones, so a client that keeps
/// sending stays limited until it slows down.
#[derive(Debug)]
pub struct EventLimiter {
    max_events: usize,
    window: TimeDelta,
    buckets: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl EventLimiter {
    /// Limiter allowing `max_events` per `window`.
    pub fn new(max_events: u32, window: TimeDelta) -> Self {
        Self {
            max_events: usize::try_from(max_events).unwrap_or(usize::MAX),
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// One-minute limiter from the `[analytics]` config section.
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.max_events_per_minute, TimeDelta::minutes(1))
    }

    /// Record an event from `client` now and report whether it is over the limit.
    pub fn is_rate_limited(&self, client: &str) -> bool {
        self.is_rate_limited_at(client, Utc::now())
    }

    /// Record an event from `client` at `now` and report whether it is over the limit.
    pub fn is_rate_limited_at(&self, client: &str, now: DateTime<Utc>) -> bool {
        let window = self.window;
        let is_recent = |at: &DateTime<Utc>| now.signed_duration_since(*at) < window;

        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !buckets.contains_key(client) {
            buckets.retain(|_, events| events.iter().any(is_recent));
        }

        let events = buckets.entry(client.to_owned()).or_default();
        events.retain(is_recent);
        events.push(now);

        let limited = events.len() > self.max_events;
        if limited {
            debug!(client, events = events.len(), "analytics rate limit exceeded");
        }
        limited
    }

    /// Number of clients with events still held in memory.
    pub fn tracked_clients(&self) -> usize {
        match self.buckets.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
