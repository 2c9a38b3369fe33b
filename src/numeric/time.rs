use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use rug::Rational;

use crate::error::{CalcError, CalcResult};

/// A point in time or a duration, stored as an exact count of seconds.
///
/// `absolute` distinguishes the two: an absolute time is anchored to the
/// Unix epoch (constructed from an ISO-8601/RFC 3339 string at the parser
/// boundary); a duration is a free-floating span produced by subtracting
/// two absolute times or by parsing a suffixed literal like `90s` or
/// `3h`. Subtracting two absolutes yields a duration; adding a duration
/// to an absolute yields another absolute.
#[derive(Clone, Debug)]
pub struct Time {
    pub value: Rational,
    pub absolute: bool,
}

impl Time {
    pub fn new(value: Rational, absolute: bool) -> Time {
        Time { value, absolute }
    }

    pub fn duration(value: Rational) -> Time {
        Time { value, absolute: false }
    }

    pub fn absolute(value: Rational) -> Time {
        Time { value, absolute: true }
    }

    pub fn now() -> Time {
        // chrono's `Utc::now()` reads the system clock, not the process
        // RNG; safe to call at runtime (never from a deterministic test).
        let ts = Utc::now().timestamp();
        Time::absolute(Rational::from(ts))
    }

    /// Parses an RFC 3339 / ISO-8601 absolute timestamp.
    pub fn parse_absolute(text: &str) -> CalcResult<Time> {
        let dt = DateTime::parse_from_rfc3339(text)
            .map_err(|e| CalcError::Parse { message: format!("invalid ISO-8601 time '{text}': {e}") })?;
        Ok(Time::absolute(Rational::from(dt.timestamp())))
    }

    /// Parses a suffixed duration literal: `<number><unit>` where unit is
    /// one of `ns`, `us`, `ms`, `s`, `m`, `h`, `d` (§6.4's duration
    /// table). `w` (weeks) is accepted too, as a harmless superset.
    pub fn parse_duration(text: &str) -> CalcResult<Time> {
        let text = text.trim();
        let split_at = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
            .ok_or_else(|| CalcError::Parse { message: format!("duration '{text}' is missing a unit suffix") })?;
        let (number, unit) = text.split_at(split_at);
        let magnitude: f64 = number
            .parse()
            .map_err(|_| CalcError::Parse { message: format!("invalid duration magnitude '{number}'") })?;
        let scale: f64 = match unit {
            "ns" => 1e-9,
            "us" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3_600.0,
            "d" => 86_400.0,
            "w" => 604_800.0,
            other => {
                return Err(CalcError::Parse { message: format!("unknown duration unit '{other}'") })
            }
        };
        let seconds = Rational::try_from(magnitude * scale).map_err(|_| CalcError::Parse {
            message: format!("duration magnitude '{number}' is not a finite number"),
        })?;
        Ok(Time::duration(seconds))
    }

    fn to_chrono(&self) -> Option<DateTime<Utc>> {
        let secs = self.value.to_f64().round() as i64;
        Utc.timestamp_opt(secs, 0).single()
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            match self.to_chrono() {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "<time out of range: {}>", self.value),
            }
        } else {
            write!(f, "{}s", self.value)
        }
    }
}
