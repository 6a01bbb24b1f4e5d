//! Date values accepted by `creation_time:` and `modified_time:` clauses.
//!
//! Absolute values resolve to the calendar period they name, in UTC:
//!
//! ```text
//! 2024               the whole year
//! 2024-03            the whole month
//! 2024-03-15         the whole day
//! 2024-03-15T10:30   that minute
//! today, yesterday   the whole day
//! now                that second
//! ```
//!
//! Relative values are offsets from now: `-7d`, `+2w`, `-1y6mo`. Units are `y`, `mo`,
//! `w`, `d`, `h`, `min` and `s`. A bare relative value used as a clause means "between
//! now and then", so `modified_time:-7d` finds pages modified during the last week.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Half-open interval `[start, end)` of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: i64,
    pub end: i64,
}

impl DateSpan {
    fn instant(t: i64) -> Self {
        Self { start: t, end: t + 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    /// A calendar period or a single second.
    Period(DateSpan),
    /// `now` shifted by a relative offset. `at` is the resulting instant.
    Offset { at: i64, now: i64 },
}

impl DateValue {
    /// The interval used as a range bound.
    pub fn span(&self) -> DateSpan {
        match *self {
            DateValue::Period(span) => span,
            DateValue::Offset { at, .. } => DateSpan::instant(at),
        }
    }

    /// The interval matched when the value stands alone in a clause.
    pub fn matching(&self) -> DateSpan {
        match *self {
            DateValue::Period(span) => span,
            DateValue::Offset { at, now } if at <= now => DateSpan {
                start: at,
                end: now + 1,
            },
            DateValue::Offset { at, now } => DateSpan {
                start: now,
                end: at + 1,
            },
        }
    }
}

pub fn parse(value: &str, now: DateTime<Utc>) -> Option<DateValue> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "now" => return Some(DateValue::Period(DateSpan::instant(now.timestamp()))),
        "today" => return day_span(now.date_naive()).map(DateValue::Period),
        "yesterday" => {
            return now
                .date_naive()
                .pred_opt()
                .and_then(day_span)
                .map(DateValue::Period)
        }
        _ => {}
    }

    if value.starts_with('+') || value.starts_with('-') {
        let at = parse_offset(value, now)?;
        return Some(DateValue::Offset {
            at: at.timestamp(),
            now: now.timestamp(),
        });
    }

    parse_absolute(value).map(DateValue::Period)
}

fn parse_absolute(value: &str) -> Option<DateSpan> {
    if let Some((date, time)) = value.split_once('T') {
        let date = parse_day(date)?;
        let (hour, minute) = time.split_once(':')?;
        let start = date.and_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)?;
        return Some(DateSpan {
            start: epoch(start),
            end: epoch(start) + 60,
        });
    }

    let parts: Vec<&str> = value.split('-').collect();
    match parts.as_slice() {
        [year] if year.len() == 4 => {
            let year: i32 = year.parse().ok()?;
            let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
            Some(DateSpan {
                start: midnight(start)?,
                end: midnight(end)?,
            })
        }
        [year, month] if year.len() == 4 => {
            let start = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
            let end = start.checked_add_months(Months::new(1))?;
            Some(DateSpan {
                start: midnight(start)?,
                end: midnight(end)?,
            })
        }
        [_, _, _] => day_span(parse_day(value)?),
        _ => None,
    }
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn day_span(day: NaiveDate) -> Option<DateSpan> {
    Some(DateSpan {
        start: midnight(day)?,
        end: midnight(day.succ_opt()?)?,
    })
}

fn midnight(day: NaiveDate) -> Option<i64> {
    day.and_hms_opt(0, 0, 0).map(epoch)
}

fn epoch(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp()
}

/// `-1y6mo` -> now minus one year and six months.
fn parse_offset(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (negative, rest) = match value.split_at(1) {
        ("-", rest) => (true, rest),
        ("+", rest) => (false, rest),
        _ => return None,
    };
    if rest.is_empty() {
        return None;
    }

    let mut at = now;
    let mut chars = rest.chars().peekable();
    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            chars.next();
        }
        let mut unit = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
            unit.push(c.to_ascii_lowercase());
            chars.next();
        }
        if digits.is_empty() || unit.is_empty() {
            return None;
        }
        let n: u32 = digits.parse().ok()?;
        at = shift(at, n, &unit, negative)?;
    }
    Some(at)
}

fn shift(at: DateTime<Utc>, n: u32, unit: &str, negative: bool) -> Option<DateTime<Utc>> {
    let months = match unit {
        "y" => Some(n.checked_mul(12)?),
        "mo" => Some(n),
        _ => None,
    };
    if let Some(months) = months {
        return if negative {
            at.checked_sub_months(Months::new(months))
        } else {
            at.checked_add_months(Months::new(months))
        };
    }

    let n = i64::from(n);
    let delta = match unit {
        "w" => TimeDelta::try_weeks(n)?,
        "d" => TimeDelta::try_days(n)?,
        "h" => TimeDelta::try_hours(n)?,
        "min" => TimeDelta::try_minutes(n)?,
        "s" => TimeDelta::try_seconds(n)?,
        _ => return None,
    };
    if negative {
        at.checked_sub_signed(delta)
    } else {
        at.checked_add_signed(delta)
    }
}
