//! Calendar-relative difference between two instants
//!
//! Whole months are taken first, on the wall clock of the reference instant,
//! and adjusted until the remainder has the same sign as the overall
//! difference. The remainder (floored to whole seconds) is then split into
//! days, hours, minutes and seconds, each carrying that sign:
//! `|hours| <= 23`, `|minutes| <= 59`, `|seconds| <= 59`. Days are not folded
//! into months.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Months, Offset, TimeZone, Utc};

/// Component-wise difference `later - reference`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelativeDelta {
    /// Whole months
    pub months: i64,
    /// Remaining days
    pub days: i64,
    /// Hours, `-23..=23`
    pub hours: i64,
    /// Minutes, `-59..=59`
    pub minutes: i64,
    /// Seconds, `-59..=59`
    pub seconds: i64,
}

/// Shift `dt` by whole months on its local wall clock.
///
/// An ambiguous local result takes the earlier instant. A local time inside
/// a DST gap keeps the offset `dt` itself had.
fn shift_months<Tz: TimeZone>(dt: &DateTime<Tz>, months: i64) -> Result<DateTime<Utc>> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map_err(|_| Error::Format(format!("Month offset {} out of range", months)))?;
    let local = dt.naive_local();
    let shifted = if months >= 0 {
        local.checked_add_months(Months::new(magnitude))
    } else {
        local.checked_sub_months(Months::new(magnitude))
    }
    .ok_or_else(|| Error::Format(format!("Month offset {} out of range", months)))?;

    match dt.timezone().from_local_datetime(&shifted).earliest() {
        Some(resolved) => Ok(resolved.with_timezone(&Utc)),
        None => {
            let offset = i64::from(dt.offset().fix().local_minus_utc());
            Ok(Utc.from_utc_datetime(&(shifted - Duration::seconds(offset))))
        }
    }
}

/// Move the overflow of `value` beyond `limit` into `next`, keeping signs
#[inline]
fn carry(value: &mut i64, next: &mut i64, limit: i64) {
    if value.abs() > limit {
        let sign = value.signum();
        let base = limit + 1;
        let magnitude = value.abs();
        *value = (magnitude % base) * sign;
        *next += (magnitude / base) * sign;
    }
}

impl RelativeDelta {
    /// Difference between `later` and `reference`
    pub fn between<A, B>(later: &DateTime<A>, reference: &DateTime<B>) -> Result<Self>
    where
        A: TimeZone,
        B: TimeZone,
    {
        let mut months = i64::from(later.year() - reference.year()) * 12
            + i64::from(later.month()) - i64::from(reference.month());

        let target = later.with_timezone(&Utc);
        let mut anchor = shift_months(reference, months)?;

        // Step back toward the reference until the anchor does not overshoot
        let step: i64 = if target < reference.with_timezone(&Utc) { 1 } else { -1 };
        while (step == 1 && target > anchor) || (step == -1 && target < anchor) {
            months += step;
            anchor = shift_months(reference, months)?;
        }

        let remainder = target - anchor;
        let mut seconds = remainder.num_seconds();
        if remainder < Duration::seconds(seconds) {
            seconds -= 1;
        }

        let mut delta = RelativeDelta {
            months,
            seconds,
            ..Default::default()
        };
        carry(&mut delta.seconds, &mut delta.minutes, 59);
        carry(&mut delta.minutes, &mut delta.hours, 59);
        carry(&mut delta.hours, &mut delta.days, 23);
        Ok(delta)
    }
}
