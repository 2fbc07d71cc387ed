//! Time source, deadline arithmetic, and urgency classification.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

use crate::constants::{
    LOG_TIME_FORMAT, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND,
    URGENCY_FULL_HOURS, URGENCY_WARNING_HOURS,
};

/// Injected source of "now".
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Process wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Virtual clock shared between a session and the code driving it.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// An instant paired with its participant-facing `HH:MM` label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moment {
    pub at: DateTime<Utc>,
    pub label: String,
}

impl Moment {
    /// Label the instant in the deployment's local offset.
    #[must_use]
    pub fn new(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            at,
            label: at.with_timezone(&offset).format(LOG_TIME_FORMAT).to_string(),
        }
    }

    /// A moment at the Unix epoch carrying a preset label.
    #[must_use]
    pub fn fixed(label: &str) -> Self {
        Self {
            at: DateTime::<Utc>::UNIX_EPOCH,
            label: label.to_string(),
        }
    }
}

/// Display-only urgency tier; independent of expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Full,
    Warning,
    Critical,
}

/// Remaining time broken into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub expired: bool,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_millis: i64,
}

impl Countdown {
    const EXPIRED: Self = Self {
        expired: true,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        total_millis: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    instant: DateTime<FixedOffset>,
}

impl Deadline {
    #[must_use]
    pub const fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    #[must_use]
    pub const fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        *self.instant.offset()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.instant
    }

    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Countdown {
        let total = (self.instant.with_timezone(&Utc) - now).num_milliseconds();
        if total <= 0 {
            return Countdown::EXPIRED;
        }
        Countdown {
            expired: false,
            days: total / MILLIS_PER_DAY,
            hours: (total % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
            minutes: (total % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            seconds: (total % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            total_millis: total,
        }
    }

    #[must_use]
    pub fn urgency(&self, now: DateTime<Utc>) -> Urgency {
        let remaining = self.remaining(now).total_millis;
        if remaining > URGENCY_FULL_HOURS * MILLIS_PER_HOUR {
            Urgency::Full
        } else if remaining > URGENCY_WARNING_HOURS * MILLIS_PER_HOUR {
            Urgency::Warning
        } else {
            Urgency::Critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn deadline() -> Deadline {
        Deadline::new(DateTime::parse_from_rfc3339("2025-12-27T13:00:00-07:00").unwrap())
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn countdown_breaks_remaining_time_into_units() {
        let now = at("2025-12-25T18:29:30Z");
        let countdown = deadline().remaining(now);
        // 2025-12-27T20:00:00Z minus now = 2d 1h 30m 30s
        assert!(!countdown.expired);
        assert_eq!(
            (countdown.days, countdown.hours, countdown.minutes, countdown.seconds),
            (2, 1, 30, 30)
        );
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline_instant() {
        let d = deadline();
        let exact = d.instant().with_timezone(&Utc);
        assert!(!d.is_expired(exact - Duration::milliseconds(1)));
        assert!(d.is_expired(exact));
        assert_eq!(d.remaining(exact), Countdown::EXPIRED);
    }

    #[test]
    fn urgency_tiers_follow_hour_thresholds() {
        let d = deadline();
        let end = d.instant().with_timezone(&Utc);
        assert_eq!(d.urgency(end - Duration::hours(49)), Urgency::Full);
        assert_eq!(d.urgency(end - Duration::hours(48)), Urgency::Warning);
        assert_eq!(d.urgency(end - Duration::hours(13)), Urgency::Warning);
        assert_eq!(d.urgency(end - Duration::hours(12)), Urgency::Critical);
        assert_eq!(d.urgency(end + Duration::hours(1)), Urgency::Critical);
    }

    #[test]
    fn moment_labels_in_deployment_offset() {
        let offset = deadline().offset();
        let moment = Moment::new(at("2025-12-26T03:05:00Z"), offset);
        assert_eq!(moment.label, "20:05");
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(at("2025-01-01T00:00:00Z"));
        let handle = clock.clone();
        handle.advance(Duration::seconds(90));
        assert_eq!(clock.now(), at("2025-01-01T00:01:30Z"));
    }
}
