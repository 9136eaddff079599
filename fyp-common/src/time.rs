//! Timestamp utilities
//!
//! The backend stores zone-less local timestamps, so deadline arithmetic is
//! done in `NaiveDateTime` against the local wall clock.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};

/// Get current UTC timestamp (event stamps)
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Source of "now" for deadline checks
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests
#[derive(Debug, Clone)]
pub struct FixedClock {
    at: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            at: Arc::new(Mutex::new(at)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        if let Ok(mut guard) = self.at.lock() {
            *guard = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.at.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.at.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Format a backend timestamp for listings (`2025-03-01 14:05`)
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Human-readable time until (or since) `due`
pub fn describe_until(due: NaiveDateTime, now: NaiveDateTime) -> String {
    let delta = due - now;
    let (past, delta) = if delta < Duration::zero() {
        (true, -delta)
    } else {
        (false, delta)
    };
    let text = if delta.num_days() > 0 {
        format!("{}d {}h", delta.num_days(), delta.num_hours() % 24)
    } else if delta.num_hours() > 0 {
        format!("{}h {}m", delta.num_hours(), delta.num_minutes() % 60)
    } else {
        format!("{}m", delta.num_minutes())
    };
    if past {
        format!("{} ago", text)
    } else {
        format!("in {}", text)
    }
}
