//! Fixed-window rate limiter tests.

use chrono::{TimeDelta, TimeZone, Utc};

use folio::chat::rate_limit::RateLimiter;
use folio::config::ChatConfig;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[test]
fn allows_up_to_cap_then_refuses() {
    let limiter = RateLimiter::new(20, TimeDelta::minutes(15));
    let now = start();

    let first = limiter.check_at("1.2.3.4", now);
    assert!(first.allowed);
    assert_eq!(first.remaining, 19);
    assert_eq!(first.reset_at, now + TimeDelta::minutes(15));

    for _ in 1..19 {
        assert!(limiter.check_at("1.2.3.4", now).allowed);
    }
    let twentieth = limiter.check_at("1.2.3.4", now);
    assert!(twentieth.allowed);
    assert_eq!(twentieth.remaining, 0);

    let refused = limiter.check_at("1.2.3.4", now + TimeDelta::minutes(5));
    assert!(!refused.allowed);
    assert_eq!(refused.remaining, 0);
    assert_eq!(refused.reset_at, first.reset_at);
}

#[test]
fn clients_are_counted_separately() {
    let limiter = RateLimiter::new(1, TimeDelta::minutes(15));
    let now = start();

    assert!(limiter.check_at("a", now).allowed);
    assert!(!limiter.check_at("a", now).allowed);
    assert!(limiter.check_at("b", now).allowed);
}

#[test]
fn window_resets_after_expiry() {
    let limiter = RateLimiter::new(2, TimeDelta::minutes(15));
    let now = start();

    assert!(limiter.check_at("a", now).allowed);
    assert!(limiter.check_at("a", now).allowed);
    assert!(!limiter.check_at("a", now).allowed);

    let later = now + TimeDelta::minutes(15) + TimeDelta::seconds(1);
    let fresh = limiter.check_at("a", later);
    assert!(fresh.allowed);
    assert_eq!(fresh.remaining, 1);
    assert_eq!(fresh.reset_at, later + TimeDelta::minutes(15));
}

#[test]
fn limit_still_applies_at_reset_instant() {
    let limiter = RateLimiter::new(1, TimeDelta::minutes(15));
    let now = start();

    assert!(limiter.check_at("a", now).allowed);
    assert!(!limiter.check_at("a", now + TimeDelta::minutes(15)).allowed);
}

#[test]
fn from_config_uses_chat_section() {
    let config = ChatConfig {
        max_requests: 3,
        window_seconds: 60,
    };
    let limiter = RateLimiter::from_config(&config);
    let now = start();

    let first = limiter.check_at("a", now);
    assert_eq!(first.remaining, 2);
    assert_eq!(first.reset_at, now + TimeDelta::seconds(60));
}

#[test]
fn check_uses_wall_clock() {
    let limiter = RateLimiter::from_config(&ChatConfig::default());
    let decision = limiter.check("client");
    assert!(decision.allowed);
    assert!(decision.reset_at > Utc::now());
}

#[test]
fn expired_windows_are_swept_when_a_new_window_opens() {
    let limiter = RateLimiter::new(20, TimeDelta::minutes(15));
    let now = start();
    for i in 0..1000 {
        assert!(limiter.check_at(&format!("10.0.{}.{}", i / 256, i % 256), now).allowed);
    }
    assert_eq!(limiter.tracked_clients(), 1000);

    let later = now + TimeDelta::hours(1);
    assert!(limiter.check_at("192.168.0.1", later).allowed);
    assert_eq!(limiter.tracked_clients(), 1);
}

#[test]
fn live_windows_survive_the_sweep() {
    let limiter = RateLimiter::new(2, TimeDelta::minutes(15));
    let now = start();
    limiter.check_at("old", now);
    limiter.check_at("busy", now + TimeDelta::minutes(10));
    limiter.check_at("busy", now + TimeDelta::minutes(10));

    // "old" has expired, "busy" is still inside its window and capped.
    limiter.check_at("new", now + TimeDelta::minutes(20));
    assert_eq!(limiter.tracked_clients(), 2);
    assert!(!limiter.check_at("busy", now + TimeDelta::minutes(21)).allowed);
}
