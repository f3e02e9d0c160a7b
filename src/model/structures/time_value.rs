use std::{
    fmt,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A lap or sector time.
///
/// The total in milliseconds is the only stored quantity; minutes, seconds and
/// milliseconds are derived from it so the seconds component is always in `[0, 60)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeValue {
    millis: i64
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("no digits found in time '{0}'")]
    Empty(String),
    #[error("too many components in time '{0}'")]
    TooManyComponents(String),
    #[error("time '{0}' is out of range")]
    OutOfRange(String)
}

impl TimeValue {
    pub const ZERO: TimeValue = TimeValue { millis: 0 };

    pub fn from_millis(millis: i64) -> TimeValue {
        TimeValue { millis }
    }

    pub fn from_parts(minutes: i64, seconds: i64, millis: i64) -> TimeValue {
        TimeValue {
            millis: minutes * 60_000 + seconds * 1000 + millis
        }
    }

    /// Like [`TimeValue::from_parts`], `None` when the total does not fit.
    pub fn checked_from_parts(minutes: i64, seconds: i64, millis: i64) -> Option<TimeValue> {
        let millis = minutes
            .checked_mul(60_000)?
            .checked_add(seconds.checked_mul(1000)?)?
            .checked_add(millis)?;
        Some(TimeValue { millis })
    }

    /// Converts fractional seconds, truncating toward zero at the millisecond.
    pub fn from_secs_f64(secs: f64) -> TimeValue {
        TimeValue {
            millis: (secs * 1000.0) as i64
        }
    }

    pub fn total_millis(&self) -> i64 {
        self.millis
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub fn minutes(&self) -> i64 {
        self.millis.abs() / 60_000
    }

    pub fn seconds(&self) -> i64 {
        (self.millis.abs() % 60_000) / 1000
    }

    pub fn millis_part(&self) -> i64 {
        self.millis.abs() % 1000
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }

    /// Integer mean with half-up rounding, `None` for an empty set.
    pub fn rounded_mean<I>(times: I) -> Option<TimeValue>
    where
        I: IntoIterator<Item = TimeValue>
    {
        let (sum, count) = times
            .into_iter()
            .fold((0i64, 0i64), |(sum, count), t| (sum + t.millis, count + 1));

        match count {
            0 => None,
            n => Some(TimeValue::from_millis((sum + n / 2) / n))
        }
    }
}

impl Add for TimeValue {
    type Output = TimeValue;

    fn add(self, rhs: TimeValue) -> TimeValue {
        TimeValue::from_millis(self.millis + rhs.millis)
    }
}

impl Sub for TimeValue {
    type Output = TimeValue;

    fn sub(self, rhs: TimeValue) -> TimeValue {
        TimeValue::from_millis(self.millis - rhs.millis)
    }
}

impl Sum for TimeValue {
    fn sum<I: Iterator<Item = TimeValue>>(iter: I) -> TimeValue {
        iter.fold(TimeValue::ZERO, |acc, t| acc + t)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.millis < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}'{:02}.{:03}",
            sign,
            self.minutes(),
            self.seconds(),
            self.millis_part()
        )
    }
}

/// Accepts `m'ss.mmm`, `m:ss.mmm`, `ss.mmm` and bare seconds. The fractional part is
/// read as a decimal fraction, so `1'02.5` is 62.500 seconds.
impl FromStr for TimeValue {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('"');
        let fraction_start = trimmed.rfind(['.', ',']);

        let (whole, fraction) = match fraction_start {
            Some(idx) => (&trimmed[..idx], Some(&trimmed[idx + 1..])),
            None => (trimmed, None)
        };

        let groups = whole
            .split(|c: char| !c.is_ascii_digit())
            .filter(|g| !g.is_empty())
            .map(|g| g.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| TimeParseError::OutOfRange(s.to_string()))?;

        let millis = fraction
            .map(|f| f.chars().take_while(|c| c.is_ascii_digit()).take(3).collect::<String>())
            .filter(|f| !f.is_empty())
            .map(|f| {
                let scale = 10i64.pow(3 - f.len() as u32);
                f.parse::<i64>().unwrap_or(0) * scale
            });

        let (minutes, seconds) = match groups.as_slice() {
            [] if millis.is_some() => (0, 0),
            [] => return Err(TimeParseError::Empty(s.to_string())),
            [seconds] => (0, *seconds),
            [minutes, seconds] => (*minutes, *seconds),
            _ => return Err(TimeParseError::TooManyComponents(s.to_string()))
        };

        TimeValue::checked_from_parts(minutes, seconds, millis.unwrap_or(0))
            .ok_or_else(|| TimeParseError::OutOfRange(s.to_string()))
    }
}
