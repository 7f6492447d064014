//! Temporal constructors and calendar helpers.

use chrono::{Datelike, FixedOffset, Local, Months, NaiveDate, NaiveTime};

use super::{Prelude, integer_arg, optional_integer_arg};
use crate::callable::{NativeArgs, NativeFunction};
use crate::environment::Environment;
use crate::temporal::{self, DateTime, DurationKind, Time, Zone};
use crate::{EvalError, Value};

pub(super) fn install(prelude: &mut Prelude) {
    prelude
        .bind(
            "date",
            NativeFunction::new(builtin_date)
                .required(["from"])
                .optional(["month", "day"])
                .help("date(\"2021-03-04\"), date(date and time) or date(year, month, day)"),
        )
        .bind(
            "time",
            NativeFunction::new(builtin_time)
                .required(["from"])
                .optional(["minute", "second", "offset"])
                .help("time(\"10:30:00\"), time(date and time) or time(hour, minute, second, offset)"),
        )
        .bind(
            "date and time",
            NativeFunction::new(builtin_date_and_time)
                .required(["from"])
                .optional(["time"])
                .help("date and time(\"2021-03-04T10:30:00\") or date and time(date, time)"),
        )
        .bind(
            "duration",
            NativeFunction::new(builtin_duration)
                .required(["from"])
                .help("parse an ISO 8601 duration such as \"P1Y2M\" or \"PT4H\""),
        )
        .bind(
            "now",
            NativeFunction::new(builtin_now).help("the current local date and time"),
        )
        .bind("today", NativeFunction::new(builtin_today).help("the current local date"))
        .bind(
            "day of week",
            NativeFunction::new(builtin_day_of_week)
                .required(["date"])
                .help("English name of the weekday"),
        )
        .bind(
            "day of year",
            NativeFunction::new(builtin_day_of_year).required(["date"]),
        )
        .bind(
            "week of year",
            NativeFunction::new(builtin_week_of_year)
                .required(["date"])
                .help("ISO 8601 week number"),
        )
        .bind(
            "month of year",
            NativeFunction::new(builtin_month_of_year)
                .required(["date"])
                .help("English name of the month"),
        )
        .bind(
            "last day of month",
            NativeFunction::new(builtin_last_day_of_month)
                .required(["date"])
                .help("the date of the last day in the same month"),
        );
}

fn invalid(kind: &str, text: &str) -> EvalError {
    EvalError::value(format!("invalid {kind} {text:?}"))
}

/// The calendar date of a date or date-time argument.
fn calendar_date(args: &NativeArgs, name: &str) -> Result<NaiveDate, EvalError> {
    match args.required(name)? {
        Value::Date(date) => Ok(*date),
        Value::DateTime(dt) => Ok(dt.datetime.date()),
        _ => Err(EvalError::type_mismatch("date")),
    }
}

fn component(value: i64) -> Result<u32, EvalError> {
    u32::try_from(value).map_err(|_| EvalError::value(format!("component out of range: {value}")))
}

fn utc() -> Result<Zone, EvalError> {
    FixedOffset::east_opt(0)
        .map(Zone::Offset)
        .ok_or_else(|| EvalError::value("invalid offset"))
}

fn builtin_date(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    if args.get("month").is_some() {
        let year = i32::try_from(integer_arg(args, "from")?).map_err(|_| EvalError::value("year out of range"))?;
        let month = component(integer_arg(args, "month")?)?;
        let day = component(optional_integer_arg(args, "day")?.unwrap_or(1))?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .map(Value::Date)
            .ok_or_else(|| EvalError::value(format!("invalid date {year}-{month}-{day}")));
    }
    match args.required("from")? {
        Value::String(s) => temporal::parse_date(s)
            .or_else(|| temporal::parse_datetime(s).map(|dt| dt.datetime.date()))
            .map(Value::Date)
            .ok_or_else(|| invalid("date", s)),
        _ => Ok(Value::Date(calendar_date(args, "from")?)),
    }
}

fn builtin_time(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    match args.required("from")? {
        Value::String(s) => temporal::parse_time(s)
            .or_else(|| {
                temporal::parse_datetime(s).map(|dt| Time {
                    time: dt.datetime.time(),
                    zone: dt.zone,
                })
            })
            .map(Value::Time)
            .ok_or_else(|| invalid("time", s)),
        Value::DateTime(dt) => Ok(Value::Time(Time {
            time: dt.datetime.time(),
            zone: dt.zone.clone(),
        })),
        Value::Date(_) => Ok(Value::Time(Time {
            time: NaiveTime::MIN,
            zone: Some(utc()?),
        })),
        Value::Number(_) => {
            let hour = component(integer_arg(args, "from")?)?;
            let minute = component(optional_integer_arg(args, "minute")?.unwrap_or(0))?;
            let second = component(optional_integer_arg(args, "second")?.unwrap_or(0))?;
            let time = NaiveTime::from_hms_opt(hour, minute, second)
                .ok_or_else(|| EvalError::value(format!("invalid time {hour}:{minute}:{second}")))?;
            let zone = match args.get("offset") {
                None | Some(Value::Null) => None,
                Some(Value::Duration(offset)) if offset.kind == DurationKind::DayTime => {
                    let seconds = offset.total_seconds().ok().and_then(|s| i32::try_from(s).ok());
                    let offset = seconds
                        .and_then(FixedOffset::east_opt)
                        .ok_or_else(|| EvalError::value("invalid offset"))?;
                    Some(Zone::Offset(offset))
                }
                Some(_) => return Err(EvalError::type_mismatch("duration")),
            };
            Ok(Value::Time(Time { time, zone }))
        }
        _ => Err(EvalError::type_mismatch("string")),
    }
}

fn builtin_date_and_time(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    if let Some(time) = args.get("time") {
        let date = calendar_date(args, "from")?;
        return match time {
            Value::Time(time) => Ok(Value::DateTime(DateTime {
                datetime: date.and_time(time.time),
                zone: time.zone.clone(),
            })),
            _ => Err(EvalError::type_mismatch("time")),
        };
    }
    match args.required("from")? {
        Value::String(s) => temporal::parse_datetime(s)
            .or_else(|| {
                temporal::parse_date(s).map(|date| DateTime {
                    datetime: date.and_time(NaiveTime::MIN),
                    zone: None,
                })
            })
            .map(Value::DateTime)
            .ok_or_else(|| invalid("date and time", s)),
        Value::DateTime(dt) => Ok(Value::DateTime(dt.clone())),
        Value::Date(date) => Ok(Value::DateTime(DateTime {
            datetime: date.and_time(NaiveTime::MIN),
            zone: None,
        })),
        _ => Err(EvalError::type_mismatch("string")),
    }
}

fn builtin_duration(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    match args.required("from")? {
        Value::String(s) => temporal::parse_duration(s)
            .map(Value::Duration)
            .ok_or_else(|| invalid("duration", s)),
        Value::Duration(d) => Ok(Value::Duration(d.clone())),
        _ => Err(EvalError::type_mismatch("string")),
    }
}

fn builtin_now(_args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let now = Local::now();
    Ok(Value::DateTime(DateTime {
        datetime: now.naive_local(),
        zone: Some(Zone::Offset(*now.offset())),
    }))
}

fn builtin_today(_args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Date(Local::now().date_naive()))
}

const WEEKDAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn builtin_day_of_week(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let date = calendar_date(args, "date")?;
    Ok(Value::from(WEEKDAYS[date.weekday().num_days_from_monday() as usize]))
}

fn builtin_day_of_year(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::from(calendar_date(args, "date")?.ordinal()))
}

fn builtin_week_of_year(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::from(calendar_date(args, "date")?.iso_week().week()))
}

fn builtin_month_of_year(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::from(MONTHS[calendar_date(args, "date")?.month0() as usize]))
}

fn builtin_last_day_of_month(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let date = calendar_date(args, "date")?;
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map(Value::Date)
        .ok_or_else(|| EvalError::value("datetime out of range"))
}
