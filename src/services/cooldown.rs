use chrono::{DateTime, TimeDelta, Utc};

use crate::models::Course;

/// Minimum interval between two incremental updates of the same course.
pub const UPDATE_COOLDOWN_HOURS: i64 = 18;

pub fn update_cooldown() -> TimeDelta {
    TimeDelta::hours(UPDATE_COOLDOWN_HOURS)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `max(0, 18h - (now - last_synced_at))`
pub fn remaining_cooldown(last_synced_at: DateTime<Utc>, now: DateTime<Utc>) -> TimeDelta {
    let remaining = update_cooldown() - (now - last_synced_at);
    remaining.max(TimeDelta::zero())
}

pub fn course_cooldown(course: &Course, now: DateTime<Utc>) -> TimeDelta {
    remaining_cooldown(course.updated_at, now)
}

/// Hours rounded up to one decimal, as reported to callers. Any wait left
/// reports at least 0.1.
pub fn as_hours(remaining: TimeDelta) -> f64 {
    const TENTH_OF_HOUR_MS: i64 = 360_000;
    let millis = remaining.num_milliseconds().max(0);
    let tenths = (millis + TENTH_OF_HOUR_MS - 1) / TENTH_OF_HOUR_MS;
    tenths as f64 / 10.0
}
