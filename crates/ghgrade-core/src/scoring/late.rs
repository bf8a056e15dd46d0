//! Due dates and the late-penalty policy

use crate::error::{Error, Result};
use crate::scoring::delta::RelativeDelta;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Resolve a timezone name.
///
/// IANA names are looked up in the bundled database. `CST` is not an IANA
/// zone and is taken to mean `America/Chicago`; `Z` and `GMT` mean UTC.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    let name = name.trim();
    if let Ok(tz) = name.parse::<Tz>() {
        return Ok(tz);
    }
    match name.to_ascii_uppercase().as_str() {
        "CST" => Ok(chrono_tz::America::Chicago),
        "UTC" | "Z" | "GMT" => Ok(chrono_tz::UTC),
        _ => Err(Error::Format(format!("Unknown time zone '{}'", name))),
    }
}

/// Parse a commit timestamp as GitHub reports it (RFC 3339)
pub fn parse_commit_timestamp(timestamp: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .map_err(|e| Error::Format(format!("Invalid commit timestamp '{}': {}", timestamp, e)))
}

/// When an assignment is due, and the multiplier the late rule applies
#[derive(Debug, Clone, PartialEq)]
pub struct DueDateConfig {
    /// Due date
    pub date: NaiveDate,
    /// Due time of day
    pub time: NaiveTime,
    /// Zone the date and time are expressed in
    pub timezone: Tz,
    /// Score multiplier, at least 0
    pub multiplier: f64,
}

impl DueDateConfig {
    /// Parse `YYYY-MM-DD`, `HH:MM[:SS]`, a zone name and a multiplier
    pub fn parse(date: &str, time: &str, timezone: &str, multiplier: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| Error::Format(format!("Invalid due date '{}': {}", date, e)))?;

        let time_str = time.trim();
        let time = NaiveTime::parse_from_str(time_str, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M"))
            .map_err(|e| Error::Format(format!("Invalid due time '{}': {}", time, e)))?;

        let timezone = parse_timezone(timezone)?;

        let multiplier: f64 = multiplier
            .trim()
            .parse()
            .map_err(|_| Error::Format(format!("Invalid multiplier '{}'", multiplier)))?;
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(Error::Format(format!(
                "Multiplier must be a non-negative number, got {}",
                multiplier
            )));
        }

        Ok(Self {
            date,
            time,
            timezone,
            multiplier,
        })
    }

    /// The due instant. An ambiguous local time (DST fall-back) resolves to
    /// the earlier instant.
    pub fn due_at(&self) -> Result<DateTime<Tz>> {
        self.timezone
            .from_local_datetime(&self.date.and_time(self.time))
            .earliest()
            .ok_or_else(|| {
                Error::Format(format!(
                    "{} {} does not exist in {}",
                    self.date,
                    self.time,
                    self.timezone.name()
                ))
            })
    }
}

/// Comparison applied to each clock component of (commit - due) against zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparator {
    /// `component <= 0`
    #[default]
    LessOrEqual,
    /// `component < 0`
    Less,
    /// `component >= 0`
    GreaterOrEqual,
    /// `component > 0`
    Greater,
}

impl Comparator {
    /// Apply the comparison
    #[inline]
    pub const fn holds(&self, a: i64, b: i64) -> bool {
        match self {
            Self::LessOrEqual => a <= b,
            Self::Less => a < b,
            Self::GreaterOrEqual => a >= b,
            Self::Greater => a > b,
        }
    }

    /// Get string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LessOrEqual => "le",
            Self::Less => "lt",
            Self::GreaterOrEqual => "ge",
            Self::Greater => "gt",
        }
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "le" | "<=" => Ok(Self::LessOrEqual),
            "lt" | "<" => Ok(Self::Less),
            "ge" | ">=" => Ok(Self::GreaterOrEqual),
            "gt" | ">" => Ok(Self::Greater),
            other => Err(Error::Config(format!(
                "Unknown comparator '{}' (expected le, lt, ge or gt)",
                other
            ))),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Late-penalty rule.
///
/// The comparator is applied to the hours, minutes and seconds of
/// `commit - due` (days and months are not consulted). When it holds for all
/// three the configured multiplier is returned, otherwise 1.0. With the
/// default `<=` this gives the multiplier to commits at or before the due
/// time and 1.0 to commits after it.
#[derive(Debug, Clone, PartialEq)]
pub struct LatePolicy {
    /// Due date and multiplier
    pub due: DueDateConfig,
    /// Component comparison
    pub comparator: Comparator,
}

impl LatePolicy {
    /// Policy with the default comparator
    pub fn new(due: DueDateConfig) -> Self {
        Self {
            due,
            comparator: Comparator::default(),
        }
    }

    /// Replace the comparator
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Difference between a commit and the due time
    pub fn delta(&self, commit_timestamp: &str) -> Result<RelativeDelta> {
        let commit = parse_commit_timestamp(commit_timestamp)?;
        let due = self.due.due_at()?;
        RelativeDelta::between(&commit, &due)
    }

    /// Multiplier for a commit
    pub fn multiplier(&self, commit_timestamp: &str) -> Result<f64> {
        let delta = self.delta(commit_timestamp)?;
        let cmp = self.comparator;
        if cmp.holds(delta.hours, 0) && cmp.holds(delta.minutes, 0) && cmp.holds(delta.seconds, 0) {
            Ok(self.due.multiplier)
        } else {
            Ok(1.0)
        }
    }
}
