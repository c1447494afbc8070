//! Sliding-window analytics limiter tests.

use chrono::{TimeDelta, TimeZone, Utc};

use folio::analytics::EventLimiter;
use folio::config::AnalyticsConfig;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[test]
fn default_config_allows_sixty_per_minute() {
    let limiter = EventLimiter::from_config(&AnalyticsConfig::default());
    let now = start();
    for _ in 0..60 {
        assert!(!limiter.is_rate_limited_at("203.0.113.7", now));
    }
    assert!(limiter.is_rate_limited_at("203.0.113.7", now));
    assert!(!limiter.is_rate_limited_at("198.51.100.2", now));
}

#[test]
fn window_slides_rather_than_resetting() {
    let limiter = EventLimiter::new(2, TimeDelta::minutes(1));
    let now = start();

    assert!(!limiter.is_rate_limited_at("ip", now));
    assert!(!limiter.is_rate_limited_at("ip", now + TimeDelta::seconds(30)));
    assert!(limiter.is_rate_limited_at("ip", now + TimeDelta::seconds(45)));

    // The first event has left the window; the other two are still inside it.
    assert!(limiter.is_rate_limited_at("ip", now + TimeDelta::seconds(61)));
    // Only the events at 61s and later remain.
    assert!(!limiter.is_rate_limited_at("ip", now + TimeDelta::seconds(110)));
}

#[test]
fn event_exactly_one_window_old_has_expired() {
    let limiter = EventLimiter::new(1, TimeDelta::minutes(1));
    let now = start();
    assert!(!limiter.is_rate_limited_at("ip", now));
    assert!(!limiter.is_rate_limited_at("ip", now + TimeDelta::minutes(1)));
}

#[test]
fn idle_clients_are_swept() {
    let limiter = EventLimiter::new(60, TimeDelta::minutes(1));
    let now = start();
    for i in 0..500 {
        limiter.is_rate_limited_at(&format!("client-{i}"), now);
    }
    assert_eq!(limiter.tracked_clients(), 500);

    limiter.is_rate_limited_at("late-comer", now + TimeDelta::minutes(5));
    assert_eq!(limiter.tracked_clients(), 1);
}

#[test]
fn wall_clock_entry_point_counts_events() {
    let limiter = EventLimiter::new(1, TimeDelta::minutes(1));
    assert!(!limiter.is_rate_limited("ip"));
    assert!(limiter.is_rate_limited("ip"));
}
