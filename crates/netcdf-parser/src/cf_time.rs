//! CF-convention time axis decoding.
//!
//! Supports `<unit> since <reference>` with seconds, minutes, hours or days,
//! and the `standard`/`gregorian`/`proleptic_gregorian` and
//! `noleap`/`365_day` calendars. Model output on other calendars
//! (`360_day`, `julian`, `all_leap`) is rejected rather than guessed.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{NetCdfError, NetCdfResult};

const SECONDS_PER_DAY: i64 = 86_400;

/// Cumulative day count before each month in a 365-day year.
const NOLEAP_MONTH_START: [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];

/// Calendar of a CF time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfCalendar {
    /// Proleptic Gregorian (also used for `standard` and `gregorian`).
    Standard,
    /// Every year has 365 days.
    NoLeap,
}

impl CfCalendar {
    /// Parse a `calendar` attribute; a missing attribute means `standard`.
    pub fn parse(name: Option<&str>) -> NetCdfResult<Self> {
        let Some(name) = name else {
            return Ok(CfCalendar::Standard);
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "standard" | "gregorian" | "proleptic_gregorian" => Ok(CfCalendar::Standard),
            "noleap" | "no_leap" | "365_day" => Ok(CfCalendar::NoLeap),
            _ => Err(NetCdfError::UnsupportedCalendar(name.to_string())),
        }
    }
}

/// Parsed `units` attribute of a time variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    /// Length of one unit in seconds.
    pub unit_seconds: i64,
    /// Reference instant.
    pub reference: NaiveDateTime,
}

impl CfTimeUnits {
    /// Parse e.g. `days since 1850-01-01` or `hours since 2015-01-01 00:00:00`.
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let invalid = || NetCdfError::InvalidTimeUnits(units.to_string());
        let (unit, reference) = units.trim().split_once(" since ").ok_or_else(invalid)?;

        let unit_seconds = match unit.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1,
            "minutes" | "minute" | "mins" | "min" => 60,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600,
            "days" | "day" | "d" => SECONDS_PER_DAY,
            _ => return Err(invalid()),
        };

        Ok(Self {
            unit_seconds,
            reference: parse_reference(reference).ok_or_else(invalid)?,
        })
    }
}

/// Parse a reference date such as `1850-1-1`, `2015-01-01 00:00:00`,
/// `2015-01-01T06:00:00Z` or `2015-01-01 00:00:00.0 UTC`.
fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim()
        .replace('T', " ");
    let mut parts = cleaned.split_whitespace();

    let mut ymd = parts.next()?.splitn(3, '-');
    let year: i32 = ymd.next()?.parse().ok()?;
    let month: u32 = ymd.next()?.parse().ok()?;
    let day: u32 = ymd.next()?.parse().ok()?;

    let time = match parts.next() {
        None => NaiveTime::MIN,
        Some(hms) => {
            let mut fields = hms.splitn(3, ':');
            let hour: u32 = fields.next()?.parse().ok()?;
            let minute: u32 = fields.next().unwrap_or("0").parse().ok()?;
            let second: f64 = fields.next().unwrap_or("0").parse().ok()?;
            NaiveTime::from_hms_opt(hour, minute, second.floor() as u32)?
        }
    };

    Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(time))
}

/// Decode raw time values into timestamps.
pub fn decode_times(
    values: &[f64],
    units: &CfTimeUnits,
    calendar: CfCalendar,
) -> NetCdfResult<Vec<NaiveDateTime>> {
    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return Err(NetCdfError::InvalidFormat(format!("time value {}", v)));
            }
            let offset = (v * units.unit_seconds as f64).round() as i64;
            match calendar {
                CfCalendar::Standard => Duration::try_seconds(offset)
                    .and_then(|d| units.reference.checked_add_signed(d))
                    .ok_or_else(|| offset_out_of_range(offset)),
                CfCalendar::NoLeap => noleap_add(units.reference, offset),
            }
        })
        .collect()
}

/// `reference + seconds` counted on a 365-day calendar.
fn noleap_add(reference: NaiveDateTime, seconds: i64) -> NetCdfResult<NaiveDateTime> {
    use chrono::{Datelike, Timelike};

    let date = reference.date();
    if date.month() == 2 && date.day() == 29 {
        return Err(NetCdfError::InvalidTimeUnits(format!(
            "{} does not exist in a 365-day calendar",
            date
        )));
    }

    let day_number = date.year() as i64 * 365
        + NOLEAP_MONTH_START[date.month0() as usize]
        + date.day0() as i64;
    let total = (day_number * SECONDS_PER_DAY
        + reference.time().num_seconds_from_midnight() as i64)
        .checked_add(seconds)
        .ok_or_else(|| offset_out_of_range(seconds))?;

    let day = total.div_euclid(SECONDS_PER_DAY);
    let second_of_day = total.rem_euclid(SECONDS_PER_DAY);
    let year = day.div_euclid(365);
    let day_of_year = day.rem_euclid(365);
    let month0 = NOLEAP_MONTH_START
        .iter()
        .rposition(|start| *start <= day_of_year)
        .unwrap_or(0);
    let day_of_month = day_of_year - NOLEAP_MONTH_START[month0];

    let out_of_range = || offset_out_of_range(seconds);
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).map_err(|_| out_of_range())?,
        month0 as u32 + 1,
        day_of_month as u32 + 1,
    )
    .ok_or_else(out_of_range)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(second_of_day as u32, 0)
        .ok_or_else(out_of_range)?;
    Ok(date.and_time(time))
}

fn offset_out_of_range(seconds: i64) -> NetCdfError {
    NetCdfError::InvalidFormat(format!("time offset {}s out of range", seconds))
}
