//! Tests for delays, clocks and deadlines

use global_executor::core::{ClockId, Deadline, JobDelay, Timestamp};
use std::time::Duration;

#[test]
fn test_negative_delay_clamps_to_zero() {
    assert!(JobDelay::from_signed_nanos(-1).is_zero());
    assert_eq!(JobDelay::from_signed_nanos(25).as_nanos(), 25);
}

#[test]
fn test_delay_from_duration() {
    let delay = JobDelay::from(Duration::from_millis(3));
    assert_eq!(delay.as_nanos(), 3_000_000);
    assert_eq!(delay.as_duration(), Duration::from_millis(3));
}

#[test]
fn test_clock_id_from_raw() {
    assert_eq!(ClockId::try_from(1), Ok(ClockId::Continuous));
    assert_eq!(ClockId::try_from(2), Ok(ClockId::Suspending));
    assert_eq!(ClockId::try_from(7), Err(7));
}

#[test]
fn test_timestamp_normalizes() {
    let ts = Timestamp::new(1, 1_500_000_000);
    assert_eq!(ts, Timestamp::new(2, 500_000_000));
    assert_eq!(Timestamp::new(1, -1), Timestamp::new(0, 999_999_999));
}

#[test]
fn test_deadline_remaining() {
    let now = Timestamp::new(10, 0);
    let deadline = Deadline::new(now, Timestamp::new(10, 250_000_000), ClockId::Continuous);
    assert_eq!(deadline.remaining(), Duration::from_millis(250));
    assert_eq!(deadline.to_delay(), JobDelay::from(Duration::from_millis(250)));
}

#[test]
fn test_past_deadline_is_immediate() {
    let deadline = Deadline::new(Timestamp::new(10, 0), Timestamp::new(9, 0), ClockId::Suspending);
    assert_eq!(deadline.remaining(), Duration::ZERO);
    assert!(deadline.to_delay().is_zero());
}

#[test]
fn test_clock_is_monotonic() {
    let a = ClockId::Continuous.now();
    let b = ClockId::Continuous.now();
    assert!(b >= a);
}
