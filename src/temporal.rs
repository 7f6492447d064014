//! Dates, times, date-times and durations.
//!
//! Calendar values are thin wrappers over `chrono` naive types plus an optional
//! [`Zone`]. A [`Duration`] is either a year-month duration or a day-time duration,
//! never both. Year-month arithmetic shifts whole months (the day is clamped to the
//! end of a shorter month); day-time arithmetic adds wall-clock seconds.
//!
//! Temporal literals (`@"..."`) are tried as a date-time, then a time, then a date,
//! then a duration:
//!
//! | form      | example                        |
//! |-----------|--------------------------------|
//! | date-time | `2021-03-04T10:30:00+01:00`    |
//! | time      | `10:30:00Z`, `10:30:00@Europe/Paris` |
//! | date      | `2021-03-04`                   |
//! | duration  | `P1Y2M`, `-P3DT4H`, `PT90S`    |

use std::fmt;

use chrono::{Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use num_bigint::BigInt;

use crate::number::Number;
use crate::{EvalError, Value};

const SECONDS_PER_DAY: i64 = 86_400;

/// A time zone attached to a time or date-time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Zone {
    Offset(FixedOffset),
    /// A zone given by name. Names are not resolved, so they behave as UTC.
    Named(String),
}

impl Zone {
    pub fn offset_seconds(&self) -> i32 {
        match self {
            Zone::Offset(offset) => offset.local_minus_utc(),
            Zone::Named(_) => 0,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Named(name) => write!(f, "@{name}"),
            Zone::Offset(offset) => {
                let seconds = offset.local_minus_utc();
                if seconds == 0 {
                    return write!(f, "Z");
                }
                let sign = if seconds < 0 { '-' } else { '+' };
                let minutes = seconds.abs() / 60;
                write!(f, "{sign}{:02}:{:02}", minutes / 60, minutes % 60)
            }
        }
    }
}

fn zone_suffix(zone: &Option<Zone>) -> String {
    zone.as_ref().map(Zone::to_string).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Time {
    pub time: NaiveTime,
    pub zone: Option<Zone>,
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.time.format("%H:%M:%S%.f"), zone_suffix(&self.zone))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateTime {
    pub datetime: NaiveDateTime,
    pub zone: Option<Zone>,
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.datetime.format("%Y-%m-%dT%H:%M:%S%.f"),
            zone_suffix(&self.zone)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationKind {
    YearMonth,
    DayTime,
}

/// A signed duration. Components are kept as written, so `P1DT25H` reports
/// 25 hours; arithmetic and comparison go through the totals.
#[derive(Debug, Clone)]
pub struct Duration {
    pub negative: bool,
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub kind: DurationKind,
}

impl Duration {
    fn empty(kind: DurationKind) -> Self {
        Duration {
            negative: false,
            years: 0,
            months: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            kind,
        }
    }

    /// A day-time duration spanning `total` seconds.
    pub fn from_seconds(total: i64) -> Self {
        let magnitude = total.unsigned_abs();
        let as_i64 = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
        let day = SECONDS_PER_DAY.unsigned_abs();
        Duration {
            negative: total < 0,
            days: as_i64(magnitude / day),
            hours: as_i64(magnitude % day / 3600),
            minutes: as_i64(magnitude % 3600 / 60),
            seconds: as_i64(magnitude % 60),
            ..Duration::empty(DurationKind::DayTime)
        }
    }

    /// A year-month duration spanning `total` months.
    pub fn from_months(total: i64) -> Self {
        let magnitude = i64::try_from(total.unsigned_abs()).unwrap_or(i64::MAX);
        Duration {
            negative: total < 0,
            years: magnitude / 12,
            months: magnitude % 12,
            ..Duration::empty(DurationKind::YearMonth)
        }
    }

    fn signed(&self, magnitude: i64) -> i64 {
        if self.negative { -magnitude } else { magnitude }
    }

    /// Totals are computed in `i128`, where no combination of `i64` components
    /// can overflow.
    fn exact_months(&self) -> i128 {
        let magnitude = i128::from(self.years) * 12 + i128::from(self.months);
        if self.negative { -magnitude } else { magnitude }
    }

    fn exact_seconds(&self) -> i128 {
        let magnitude = i128::from(self.days) * i128::from(SECONDS_PER_DAY)
            + i128::from(self.hours) * 3600
            + i128::from(self.minutes) * 60
            + i128::from(self.seconds);
        if self.negative { -magnitude } else { magnitude }
    }

    fn exact_total(&self) -> i128 {
        match self.kind {
            DurationKind::YearMonth => self.exact_months(),
            DurationKind::DayTime => self.exact_seconds(),
        }
    }

    pub fn total_months(&self) -> Result<i64, EvalError> {
        i64::try_from(self.exact_months()).map_err(|_| duration_out_of_range())
    }

    pub fn total_seconds(&self) -> Result<i64, EvalError> {
        i64::try_from(self.exact_seconds()).map_err(|_| duration_out_of_range())
    }

    fn rebuild(kind: DurationKind, total: i128) -> Result<Self, EvalError> {
        let total = i64::try_from(total).map_err(|_| duration_out_of_range())?;
        Ok(match kind {
            DurationKind::YearMonth => Duration::from_months(total),
            DurationKind::DayTime => Duration::from_seconds(total),
        })
    }

    pub fn negated(&self) -> Self {
        Duration {
            negative: !self.negative,
            ..self.clone()
        }
    }

    /// Sum of two durations of the same kind; `None` when the kinds differ.
    pub fn checked_add(&self, other: &Duration) -> Result<Option<Duration>, EvalError> {
        if self.kind != other.kind {
            return Ok(None);
        }
        Duration::rebuild(self.kind, self.exact_total() + other.exact_total()).map(Some)
    }

    /// The duration scaled by `factor`, truncated to whole months or seconds.
    pub fn scaled(&self, factor: &Number) -> Result<Duration, EvalError> {
        let total = Number::from(BigInt::from(self.exact_total()));
        let product = total.mul(factor).int_div(&Number::one())?;
        let product = product.to_i64().ok_or_else(duration_out_of_range)?;
        Duration::rebuild(self.kind, i128::from(product))
    }

    /// Comparison key: the total months or seconds, when the kinds match.
    pub fn cmp_key(&self, other: &Duration) -> Option<(i128, i128)> {
        (self.kind == other.kind).then(|| (self.exact_total(), other.exact_total()))
    }

    pub fn attr(&self, name: &str) -> Option<Value> {
        let component = match name {
            "years" | "year" => self.years,
            "months" | "month" => self.months,
            "days" | "day" => self.days,
            "hours" | "hour" => self.hours,
            "minutes" | "minute" => self.minutes,
            "seconds" | "second" => self.seconds,
            _ => return None,
        };
        Some(Value::from(self.signed(component)))
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.exact_total() == other.exact_total()
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        match self.kind {
            DurationKind::YearMonth => {
                if self.years != 0 {
                    write!(f, "{}Y", self.years)?;
                }
                if self.months != 0 || self.years == 0 {
                    write!(f, "{}M", self.months)?;
                }
            }
            DurationKind::DayTime => {
                if self.days != 0 {
                    write!(f, "{}D", self.days)?;
                }
                let has_time = self.hours != 0 || self.minutes != 0 || self.seconds != 0;
                if has_time || self.days == 0 {
                    write!(f, "T")?;
                }
                if self.hours != 0 {
                    write!(f, "{}H", self.hours)?;
                }
                if self.minutes != 0 {
                    write!(f, "{}M", self.minutes)?;
                }
                if self.seconds != 0 || (!has_time && self.days == 0) {
                    write!(f, "{}S", self.seconds)?;
                }
            }
        }
        Ok(())
    }
}

fn out_of_range() -> EvalError {
    EvalError::value("datetime out of range")
}

fn duration_out_of_range() -> EvalError {
    EvalError::value("duration out of range")
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
    FixedOffset::east_opt(sign * seconds)
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S%.f"))
        .ok()
}

/// `hh:mm:ss[.fff]` followed by an optional `Z`, `±hh:mm` or `@Name`.
pub fn parse_time(text: &str) -> Option<Time> {
    if let Some((clock, name)) = text.split_once('@') {
        if name.is_empty() {
            return None;
        }
        return Some(Time {
            time: parse_clock(clock)?,
            zone: Some(Zone::Named(name.to_string())),
        });
    }
    if let Some(clock) = text.strip_suffix('Z') {
        return Some(Time {
            time: parse_clock(clock)?,
            zone: Some(Zone::Offset(FixedOffset::east_opt(0)?)),
        });
    }
    match text.find(['+', '-']) {
        Some(at) => Some(Time {
            time: parse_clock(&text[..at])?,
            zone: Some(Zone::Offset(parse_offset(&text[at..])?)),
        }),
        None => Some(Time {
            time: parse_clock(text)?,
            zone: None,
        }),
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// A date and a time joined by `T` (or a single space).
pub fn parse_datetime(text: &str) -> Option<DateTime> {
    let (date, time) = text.split_once(['T', ' '])?;
    let time = parse_time(time)?;
    Some(DateTime {
        datetime: parse_date(date)?.and_time(time.time),
        zone: time.zone,
    })
}

/// Splits `12Y3M` into `[(12, 'Y'), (3, 'M')]`, requiring units in the order given
/// by `allowed`, each at most once.
fn duration_parts(text: &str, allowed: &[char]) -> Option<Vec<(i64, char)>> {
    let mut parts = Vec::new();
    let mut remaining = allowed;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let value = rest[..digits].parse::<i64>().ok()?;
        let unit = rest[digits..].chars().next()?;
        let at = remaining.iter().position(|&u| u == unit)?;
        remaining = &remaining[at + 1..];
        parts.push((value, unit));
        rest = &rest[digits + unit.len_utf8()..];
    }
    Some(parts)
}

/// `[-]PnYnM` or `[-]PnDTnHnMnS`, with at least one component.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = text.strip_prefix('P')?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let year_month = duration_parts(date_part, &['Y', 'M']);
    let mut duration = match (year_month, time_part) {
        (Some(parts), None) if !parts.is_empty() => {
            let mut duration = Duration::empty(DurationKind::YearMonth);
            for (value, unit) in parts {
                match unit {
                    'Y' => duration.years = value,
                    _ => duration.months = value,
                }
            }
            duration
        }
        _ => {
            let days = duration_parts(date_part, &['D'])?;
            let clock = match time_part {
                Some(time) => duration_parts(time, &['H', 'M', 'S'])?,
                None => Vec::new(),
            };
            if days.is_empty() && clock.is_empty() {
                return None;
            }
            let mut duration = Duration::empty(DurationKind::DayTime);
            for (value, unit) in days.into_iter().chain(clock) {
                match unit {
                    'D' => duration.days = value,
                    'H' => duration.hours = value,
                    'M' => duration.minutes = value,
                    _ => duration.seconds = value,
                }
            }
            duration
        }
    };
    duration.negative = negative;
    i64::try_from(duration.exact_total()).ok()?;
    Some(duration)
}

/// Parses the body of an `@"..."` literal.
pub fn parse_literal(text: &str) -> Result<Value, EvalError> {
    if let Some(datetime) = parse_datetime(text) {
        return Ok(Value::DateTime(datetime));
    }
    if let Some(time) = parse_time(text) {
        return Ok(Value::Time(time));
    }
    if let Some(date) = parse_date(text) {
        return Ok(Value::Date(date));
    }
    parse_duration(text)
        .map(Value::Duration)
        .ok_or_else(|| EvalError::value(format!("invalid temporal literal {text:?}")))
}

fn midnight(date: NaiveDate) -> Result<NaiveDateTime, EvalError> {
    date.and_hms_opt(0, 0, 0).ok_or_else(out_of_range)
}

/// `datetime + duration`, or `datetime - duration` when `subtract` is set.
pub fn shift(datetime: NaiveDateTime, duration: &Duration, subtract: bool) -> Result<NaiveDateTime, EvalError> {
    let duration = if subtract { duration.negated() } else { duration.clone() };
    let shifted = match duration.kind {
        DurationKind::YearMonth => {
            let months = duration.total_months()?;
            let step = Months::new(u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?);
            if months < 0 {
                datetime.checked_sub_months(step)
            } else {
                datetime.checked_add_months(step)
            }
        }
        DurationKind::DayTime => TimeDelta::try_seconds(duration.total_seconds()?)
            .and_then(|delta| datetime.checked_add_signed(delta)),
    };
    shifted.ok_or_else(out_of_range)
}

/// `date + duration`; a day-time duration is applied from midnight and the result
/// keeps only its date.
pub fn shift_date(date: NaiveDate, duration: &Duration, subtract: bool) -> Result<NaiveDate, EvalError> {
    Ok(shift(midnight(date)?, duration, subtract)?.date())
}

/// The UTC instant of a date (its midnight), time (on 0000-01-01) or date-time.
pub fn instant(value: &Value) -> Option<NaiveDateTime> {
    let (local, zone) = match value {
        Value::Date(date) => return date.and_hms_opt(0, 0, 0),
        Value::Time(time) => (NaiveDate::from_ymd_opt(0, 1, 1)?.and_time(time.time), &time.zone),
        Value::DateTime(datetime) => (datetime.datetime, &datetime.zone),
        _ => return None,
    };
    let offset = zone.as_ref().map_or(0, Zone::offset_seconds);
    local.checked_sub_signed(TimeDelta::try_seconds(i64::from(offset))?)
}

/// `left - right` for two dates or date-times, as a day-time duration.
pub fn between(left: &Value, right: &Value) -> Option<Duration> {
    let elapsed = instant(left)?.signed_duration_since(instant(right)?);
    Some(Duration::from_seconds(elapsed.num_seconds()))
}

fn date_attr(date: NaiveDate, name: &str) -> Option<Value> {
    match name {
        "year" => Some(Value::from(i64::from(date.year()))),
        "month" => Some(Value::from(i64::from(date.month()))),
        "day" => Some(Value::from(i64::from(date.day()))),
        "weekday" => Some(Value::from(i64::from(date.weekday().number_from_monday()))),
        _ => None,
    }
}

fn clock_attr(time: NaiveTime, zone: &Option<Zone>, name: &str) -> Option<Value> {
    match name {
        "hour" => Some(Value::from(i64::from(time.hour()))),
        "minute" => Some(Value::from(i64::from(time.minute()))),
        "second" => Some(Value::from(i64::from(time.second()))),
        "time offset" | "timezone offset" => Some(match zone {
            Some(zone) => Value::Duration(Duration::from_seconds(i64::from(zone.offset_seconds()))),
            None => Value::Null,
        }),
        "timezone" => Some(match zone {
            Some(Zone::Named(name)) => Value::from(name.as_str()),
            _ => Value::Null,
        }),
        _ => None,
    }
}

/// The named attribute of a temporal value, if it has one.
pub fn attr(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Date(date) => date_attr(*date, name),
        Value::Time(time) => clock_attr(time.time, &time.zone, name),
        Value::DateTime(datetime) => date_attr(datetime.datetime.date(), name)
            .or_else(|| clock_attr(datetime.datetime.time(), &datetime.zone, name)),
        Value::Duration(duration) => duration.attr(name),
        _ => None,
    }
}
