use std::fmt;
use std::str::FromStr;

use jiff::tz::TimeZone;
use jiff::{Span, Timestamp};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// A calendar delta of years, months and days.
///
/// All scheduling math goes through this type. Offsets are applied in UTC with
/// calendar semantics: years first, then months, then days, with the day of
/// month clamped to the last valid day (Jan 31 + 1 month = Feb 28/29).
/// Components may be negative to express "before" an anchor.
///
/// The textual encoding is a JSON object such as `{"months": 3, "days": -14}`.
/// Missing keys default to zero; unknown keys and non-integer values are
/// rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export)]
pub struct RelativeOffset {
    #[serde(skip_serializing_if = "is_zero_component")]
    pub years: i32,
    #[serde(skip_serializing_if = "is_zero_component")]
    pub months: i32,
    #[serde(skip_serializing_if = "is_zero_component")]
    pub days: i32,
}

fn is_zero_component(value: &i32) -> bool {
    *value == 0
}

impl RelativeOffset {
    /// The zero offset: "immediately at the anchor".
    pub const ZERO: RelativeOffset = RelativeOffset {
        years: 0,
        months: 0,
        days: 0,
    };

    pub const fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub const fn of_years(years: i32) -> Self {
        Self::new(years, 0, 0)
    }

    pub const fn of_months(months: i32) -> Self {
        Self::new(0, months, 0)
    }

    pub const fn of_days(days: i32) -> Self {
        Self::new(0, 0, days)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Parse the structured textual encoding.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::MalformedOffset(format!("{text}: {e}")))
    }

    /// Apply this offset to `base`.
    pub fn apply(&self, base: Timestamp) -> Result<Timestamp, CoreError> {
        let mut zoned = base.to_zoned(TimeZone::UTC);
        if self.years != 0 {
            zoned = zoned.checked_add(Span::new().try_years(self.years)?)?;
        }
        if self.months != 0 {
            zoned = zoned.checked_add(Span::new().try_months(self.months)?)?;
        }
        if self.days != 0 {
            zoned = zoned.checked_add(Span::new().try_days(self.days)?)?;
        }
        Ok(zoned.timestamp())
    }

    /// Whether applying this offset moves time forward.
    ///
    /// Mixed-sign offsets (e.g. one month less ten days) are judged by their
    /// effect on a fixed reference instant.
    pub fn is_positive_duration(&self) -> bool {
        self.apply(Timestamp::UNIX_EPOCH)
            .map(|moved| moved > Timestamp::UNIX_EPOCH)
            .unwrap_or(false)
    }

    /// Component-wise multiple of this offset.
    pub fn times(&self, n: u32) -> Result<Self, CoreError> {
        let overflow = || CoreError::OffsetOverflow(format!("{self} x {n}"));
        let factor = i32::try_from(n).map_err(|_| overflow())?;
        Ok(Self {
            years: self.years.checked_mul(factor).ok_or_else(overflow)?,
            months: self.months.checked_mul(factor).ok_or_else(overflow)?,
            days: self.days.checked_mul(factor).ok_or_else(overflow)?,
        })
    }
}

impl FromStr for RelativeOffset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RelativeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
