//! The `datetime` and `duration` extension types.
//!
//! Both are millisecond counts: a datetime is milliseconds since the Unix
//! epoch in UTC, a duration is a signed span. Accepted literals:
//!
//! ```text
//! datetime("2024-10-15")
//! datetime("2024-10-15T11:38:02Z")
//! datetime("2024-10-15T11:38:02.123Z")
//! datetime("2024-10-15T11:38:02+0200")
//! datetime("2024-10-15T11:38:02.123-0130")
//! duration("1d2h3m4s5ms")
//! duration("-30m")
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]{4})-([0-9]{2})-([0-9]{2})(?:T([0-9]{2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]{3}))?(?:Z|([+-])([0-9]{2})([0-9]{2})))?$",
    )
    .expect("datetime pattern is valid")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?(?:([0-9]+)d)?(?:([0-9]+)h)?(?:([0-9]+)m)?(?:([0-9]+)s)?(?:([0-9]+)ms)?$")
        .expect("duration pattern is valid")
});

/// A point in time, milliseconds since 1970-01-01T00:00:00Z.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Datetime(i64);

/// A signed span of time in milliseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Duration(i64);

impl Datetime {
    pub fn from_millis(ms: i64) -> Self {
        Datetime(ms)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn offset(&self, by: Duration) -> Option<Datetime> {
        self.0.checked_add(by.0).map(Datetime)
    }

    pub fn duration_since(&self, earlier: Datetime) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration)
    }

    /// Midnight of the same UTC day, `None` if that lies before `i64::MIN` ms.
    pub fn to_date(&self) -> Option<Datetime> {
        self.0
            .div_euclid(MS_PER_DAY)
            .checked_mul(MS_PER_DAY)
            .map(Datetime)
    }

    /// Time elapsed since midnight of the same UTC day.
    pub fn to_time(&self) -> Duration {
        Duration(self.0.rem_euclid(MS_PER_DAY))
    }
}

impl Duration {
    pub fn from_millis(ms: i64) -> Self {
        Duration(ms)
    }

    pub fn to_milliseconds(&self) -> i64 {
        self.0
    }

    pub fn to_seconds(&self) -> i64 {
        self.0 / MS_PER_SECOND
    }

    pub fn to_minutes(&self) -> i64 {
        self.0 / MS_PER_MINUTE
    }

    pub fn to_hours(&self) -> i64 {
        self.0 / MS_PER_HOUR
    }

    pub fn to_days(&self) -> i64 {
        self.0 / MS_PER_DAY
    }
}

fn group(caps: &Captures<'_>, idx: usize) -> i64 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

// Days since the epoch for a proleptic Gregorian date, after Howard Hinnant.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

impl FromStr for Datetime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DATETIME_RE
            .captures(s)
            .ok_or_else(|| format!("`{s}` is not a valid datetime literal"))?;

        let (year, month, day) = (group(&caps, 1), group(&caps, 2), group(&caps, 3));
        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
            return Err(format!("`{s}` is not a valid calendar date"));
        }

        let (hour, minute, second) = (group(&caps, 4), group(&caps, 5), group(&caps, 6));
        if hour > 23 || minute > 59 || second > 59 {
            return Err(format!("`{s}` has an invalid time of day"));
        }

        let (offset_hours, offset_minutes) = (group(&caps, 9), group(&caps, 10));
        if offset_hours > 23 || offset_minutes > 59 {
            return Err(format!("`{s}` has an invalid UTC offset"));
        }
        let mut offset = offset_hours * MS_PER_HOUR + offset_minutes * MS_PER_MINUTE;
        if caps.get(8).is_some_and(|m| m.as_str() == "-") {
            offset = -offset;
        }

        let local = days_from_civil(year, month, day) * MS_PER_DAY
            + hour * MS_PER_HOUR
            + minute * MS_PER_MINUTE
            + second * MS_PER_SECOND
            + group(&caps, 7);

        Ok(Datetime(local - offset))
    }
}

impl Display for Datetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let (year, month, day) = civil_from_days(self.0.div_euclid(MS_PER_DAY));
        let time = self.0.rem_euclid(MS_PER_DAY);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            time / MS_PER_HOUR,
            time % MS_PER_HOUR / MS_PER_MINUTE,
            time % MS_PER_MINUTE / MS_PER_SECOND,
            time % MS_PER_SECOND
        )
    }
}

impl FromStr for Duration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_RE
            .captures(s)
            .ok_or_else(|| format!("`{s}` is not a valid duration literal"))?;

        let units = [
            (2, MS_PER_DAY),
            (3, MS_PER_HOUR),
            (4, MS_PER_MINUTE),
            (5, MS_PER_SECOND),
            (6, 1),
        ];
        if units.iter().all(|(idx, _)| caps.get(*idx).is_none()) {
            return Err(format!("`{s}` has no duration units"));
        }

        let overflow = || format!("`{s}` is out of range for a duration");
        let mut total: i64 = 0;
        for (idx, unit) in units {
            let Some(m) = caps.get(idx) else {
                continue;
            };
            let amount: i64 = m.as_str().parse().map_err(|_| overflow())?;
            total = amount
                .checked_mul(unit)
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(overflow)?;
        }

        if caps.get(1).is_some() {
            total = -total;
        }
        Ok(Duration(total))
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.0 == 0 {
            return f.write_str("0ms");
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let mut rest = self.0.unsigned_abs();
        for (unit, suffix) in [
            (MS_PER_DAY as u64, "d"),
            (MS_PER_HOUR as u64, "h"),
            (MS_PER_MINUTE as u64, "m"),
            (MS_PER_SECOND as u64, "s"),
            (1, "ms"),
        ] {
            let amount = rest / unit;
            rest %= unit;
            if amount > 0 {
                write!(f, "{amount}{suffix}")?;
            }
        }
        Ok(())
    }
}
