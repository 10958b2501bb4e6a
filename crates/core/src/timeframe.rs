//! Candle boundary resolution.
//!
//! Maps a timestamp to the start of the candle that contains it and a candle
//! start to the start of the following candle. Identifiers follow the usual
//! exchange convention: `<count><unit>` with units `s`, `m`, `h`, `d`, `w`, `M`.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resolves candle boundaries for a timestamp.
pub trait IntervalResolver {
    /// Returns the start of the candle containing `timestamp`.
    ///
    /// # Errors
    /// Returns an error if the boundary is not representable.
    fn interval_start(&self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>, TimeframeError>;

    /// Returns the start of the candle that follows the one starting at `start`.
    ///
    /// # Errors
    /// Returns an error if the boundary is not representable.
    fn next_interval_start(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, TimeframeError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("invalid timeframe '{0}', expected format like 1m, 5m, 1h, 1d, 1w, 1M")]
    Invalid(String),

    #[error("timestamp {0} is outside the representable range for timeframe {1}")]
    OutOfRange(DateTime<Utc>, Timeframe),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeframeUnit {
    const fn suffix(self) -> char {
        match self {
            Self::Second => 's',
            Self::Minute => 'm',
            Self::Hour => 'h',
            Self::Day => 'd',
            Self::Week => 'w',
            Self::Month => 'M',
        }
    }

    const fn seconds(self) -> Option<i64> {
        match self {
            Self::Second => Some(1),
            Self::Minute => Some(60),
            Self::Hour => Some(3_600),
            Self::Day => Some(86_400),
            Self::Week => Some(604_800),
            Self::Month => None,
        }
    }
}

/// A candle timeframe such as `5m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    count: u32,
    unit: TimeframeUnit,
}

// 1970-01-01 was a Thursday; weekly candles open on Monday.
const WEEK_ANCHOR_OFFSET_SECS: i64 = 4 * 86_400;

impl Timeframe {
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    /// Bucket width used to floor raw timestamps, `None` for calendar months.
    #[must_use]
    pub fn resample_width(&self) -> Option<Duration> {
        self.unit
            .seconds()
            .map(|secs| Duration::seconds(secs * i64::from(self.count)))
    }

    fn out_of_range(&self, timestamp: DateTime<Utc>) -> TimeframeError {
        TimeframeError::OutOfRange(timestamp, *self)
    }

    fn floor_fixed(&self, timestamp: DateTime<Utc>, width_secs: i64) -> Option<DateTime<Utc>> {
        let anchor = if self.unit == TimeframeUnit::Week {
            WEEK_ANCHOR_OFFSET_SECS
        } else {
            0
        };
        let millis = timestamp.timestamp_millis();
        let width_ms = width_secs.checked_mul(1_000)?;
        let shifted = millis.checked_sub(anchor * 1_000)?;
        let floored = shifted.div_euclid(width_ms) * width_ms + anchor * 1_000;
        DateTime::from_timestamp_millis(floored)
    }

    fn floor_month(&self, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months_since_epoch =
            i64::from(timestamp.year() - 1970) * 12 + i64::from(timestamp.month0());
        let step = i64::from(self.count);
        let floored = months_since_epoch.div_euclid(step) * step;
        let year = 1970 + i32::try_from(floored.div_euclid(12)).ok()?;
        let month = u32::try_from(floored.rem_euclid(12)).ok()? + 1;
        let date = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
    }
}

impl IntervalResolver for Timeframe {
    fn interval_start(&self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>, TimeframeError> {
        let start = match self.unit.seconds() {
            Some(secs) => self.floor_fixed(timestamp, secs * i64::from(self.count)),
            None => self.floor_month(timestamp),
        };
        start.ok_or_else(|| self.out_of_range(timestamp))
    }

    fn next_interval_start(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, TimeframeError> {
        let floored = self.interval_start(start)?;
        let next = match self.resample_width() {
            Some(width) => floored.checked_add_signed(width),
            None => floored.checked_add_months(Months::new(self.count)),
        };
        next.ok_or_else(|| self.out_of_range(start))
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeframeError::Invalid(s.to_string());
        let unit = match s.chars().last().ok_or_else(invalid)? {
            's' => TimeframeUnit::Second,
            'm' => TimeframeUnit::Minute,
            'h' => TimeframeUnit::Hour,
            'd' => TimeframeUnit::Day,
            'w' => TimeframeUnit::Week,
            'M' => TimeframeUnit::Month,
            _ => return Err(invalid()),
        };
        let count: u32 = s[..s.len() - 1].parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        Ok(Self { count, unit })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}
