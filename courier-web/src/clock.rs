use chrono::{DateTime, Utc};
use courier_engine::Clock;

/// Wall clock read from `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now(&self) -> DateTime<Utc> {
        millis_to_utc(js_sys::Date::now())
    }
}

/// Convert JavaScript epoch milliseconds; non-finite or out-of-range values
/// collapse to the epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn millis_to_utc(millis: f64) -> DateTime<Utc> {
    if !millis.is_finite() {
        return DateTime::<Utc>::UNIX_EPOCH;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_epoch_millis() {
        let now = millis_to_utc(1_766_865_600_000.7);
        assert_eq!(now.to_rfc3339(), "2025-12-27T20:00:00+00:00");
        assert_eq!(millis_to_utc(f64::NAN), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(millis_to_utc(f64::INFINITY), DateTime::<Utc>::UNIX_EPOCH);
    }
}
