//! Time handling for model runs, forecast leads and CF-style time axes.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Model run cycles published four times a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunHour {
    /// 00Z run
    Z00,
    /// 06Z run
    Z06,
    /// 12Z run
    Z12,
    /// 18Z run
    Z18,
}

impl RunHour {
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0 => Some(RunHour::Z00),
            6 => Some(RunHour::Z06),
            12 => Some(RunHour::Z12),
            18 => Some(RunHour::Z18),
            _ => None,
        }
    }

    pub fn hour(&self) -> u32 {
        match self {
            RunHour::Z00 => 0,
            RunHour::Z06 => 6,
            RunHour::Z12 => 12,
            RunHour::Z18 => 18,
        }
    }

    /// Two-digit form used in dataset paths ("00", "06", "12", "18").
    pub fn as_str(&self) -> &'static str {
        match self {
            RunHour::Z00 => "00",
            RunHour::Z06 => "06",
            RunHour::Z12 => "12",
            RunHour::Z18 => "18",
        }
    }

    pub fn all() -> &'static [RunHour] {
        &[RunHour::Z00, RunHour::Z06, RunHour::Z12, RunHour::Z18]
    }
}

impl FromStr for RunHour {
    type Err = TimeParseError;

    /// Accepts "00", "6", "12z", "18Z".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['z', 'Z']);
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(RunHour::from_hour)
            .ok_or_else(|| TimeParseError::InvalidRunHour(s.to_string()))
    }
}

impl std::fmt::Display for RunHour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one forecast cycle: run date plus run hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId {
    pub date: NaiveDate,
    pub hour: RunHour,
}

impl RunId {
    pub fn new(date: NaiveDate, hour: RunHour) -> Self {
        Self { date, hour }
    }

    /// Date in the `YYYYMMDD` form used by the dataset service.
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Model initialization time.
    pub fn reference_time(&self) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(self.hour.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
        Utc.from_utc_datetime(&self.date.and_time(time))
    }

    /// Parse a run date in either `YYYY-MM-DD` or `YYYYMMDD` form.
    pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
            .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}z", self.date_stamp(), self.hour)
    }
}

/// Represents a valid time for meteorological data.
///
/// Combines reference time (model run time) and forecast offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidTime {
    /// Model run/reference time
    pub reference_time: DateTime<Utc>,
    /// Forecast hour offset from reference time
    pub forecast_hour: u32,
}

impl ValidTime {
    pub fn new(reference_time: DateTime<Utc>, forecast_hour: u32) -> Self {
        Self {
            reference_time,
            forecast_hour,
        }
    }

    /// Calculate the nominal valid time (reference + forecast offset)
    pub fn valid_datetime(&self) -> DateTime<Utc> {
        self.reference_time + Duration::hours(self.forecast_hour as i64)
    }

    /// Lead label in the `t+NNN` form.
    pub fn lead_label(&self) -> String {
        format!("t+{:03}", self.forecast_hour)
    }

    /// Display form of a validity timestamp, e.g. "12UTC Mon 15 Jan 2024".
    pub fn display(dt: &DateTime<Utc>) -> String {
        dt.format("%HUTC %a %d %b %Y").to_string()
    }
}

/// Unit of a CF `<unit> since <epoch>` time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn millis(&self) -> f64 {
        match self {
            TimeUnit::Days => 86_400_000.0,
            TimeUnit::Hours => 3_600_000.0,
            TimeUnit::Minutes => 60_000.0,
            TimeUnit::Seconds => 1_000.0,
        }
    }
}

/// Decoder for numeric time axes described by CF `units` and `calendar`.
///
/// GrADS-backed services publish `days since 1-1-1 00:00:0.0` in the
/// standard (mixed Julian/Gregorian) calendar, so an epoch before the 1582
/// reform is read as a Julian calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    pub fn parse(units: &str, calendar: Option<&str>) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::InvalidUnits(units.to_string());
        let (unit, epoch) = units.trim().split_once(" since ").ok_or_else(invalid)?;

        let unit = match unit.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => TimeUnit::Days,
            "hours" | "hour" | "hr" | "h" => TimeUnit::Hours,
            "minutes" | "minute" | "min" => TimeUnit::Minutes,
            "seconds" | "second" | "sec" | "s" => TimeUnit::Seconds,
            _ => return Err(invalid()),
        };

        let epoch = epoch.trim().trim_end_matches(['Z', 'z']);
        let (date_part, time_part) = match epoch.split_once(['T', ' ']) {
            Some((d, t)) => (d, Some(t.trim())),
            None => (epoch, None),
        };

        let mut ymd = date_part.split('-').map(|p| p.parse::<i32>());
        let (year, month, day) = match (ymd.next(), ymd.next(), ymd.next()) {
            (Some(Ok(y)), Some(Ok(m)), Some(Ok(d))) => (y, m as u32, d as u32),
            _ => return Err(invalid()),
        };

        let proleptic = calendar.map_or(false, |c| c.eq_ignore_ascii_case("proleptic_gregorian"));
        let date = if year < 1582 && !proleptic {
            julian_to_gregorian(year, month, day)
        } else {
            NaiveDate::from_ymd_opt(year, month, day)
        }
        .ok_or_else(invalid)?;

        let seconds_of_day = match time_part {
            Some(t) if !t.is_empty() => parse_clock(t).ok_or_else(invalid)?,
            _ => 0.0,
        };

        let midnight = NaiveDateTime::new(date, NaiveTime::MIN);
        let epoch = Utc.from_utc_datetime(&midnight)
            + Duration::milliseconds((seconds_of_day * 1000.0).round() as i64);

        Ok(Self { unit, epoch })
    }

    /// Convert an axis value to an absolute time.
    pub fn decode(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.unit.millis()).round();
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        self.epoch.checked_add_signed(Duration::milliseconds(millis as i64))
    }
}

/// "HH:MM:SS(.fff)" with optional minutes/seconds, returning seconds of day.
fn parse_clock(t: &str) -> Option<f64> {
    let mut parts = t.split(':');
    let hours: f64 = parts.next()?.trim().parse().ok()?;
    let minutes = parts.next().map(|p| p.trim().parse::<f64>()).transpose().ok()?.unwrap_or(0.0);
    let seconds = parts.next().map(|p| p.trim().parse::<f64>()).transpose().ok()?.unwrap_or(0.0);
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Convert a Julian calendar date to the equivalent proleptic Gregorian date
/// via its Julian Day Number.
fn julian_to_gregorian(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    let a = (14 - month as i64) / 12;
    let y = year as i64 + 4800 - a;
    let m = month as i64 + 12 * a - 3;
    let jdn = day as i64 + (153 * m + 2) / 5 + 365 * y + y / 4 - 32083;
    // JDN 1721426 is 0001-01-01 in the proleptic Gregorian calendar.
    NaiveDate::from_num_days_from_ce_opt((jdn - 1_721_425) as i32)
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid run hour '{0}': expected one of 00, 06, 12, 18")]
    InvalidRunHour(String),

    #[error("Unsupported time units: {0}")]
    InvalidUnits(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_run_hour_parse() {
        assert_eq!("00".parse::<RunHour>().unwrap(), RunHour::Z00);
        assert_eq!("6".parse::<RunHour>().unwrap(), RunHour::Z06);
        assert_eq!("18z".parse::<RunHour>().unwrap(), RunHour::Z18);
        assert!("03".parse::<RunHour>().is_err());
        assert!("noon".parse::<RunHour>().is_err());
    }

    #[test]
    fn test_run_id_stamp() {
        let run = RunId::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), RunHour::Z06);
        assert_eq!(run.date_stamp(), "20240105");
        assert_eq!(run.reference_time().hour(), 6);
        assert_eq!(run.to_string(), "20240105/06z");
    }

    #[test]
    fn test_parse_date_forms() {
        let a = RunId::parse_date("2024-01-15").unwrap();
        let b = RunId::parse_date("20240115").unwrap();
        assert_eq!(a, b);
        assert!(RunId::parse_date("15/01/2024").is_err());
    }

    #[test]
    fn test_lead_label_and_display() {
        let vt = ValidTime::new(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(), 12);
        assert_eq!(vt.lead_label(), "t+012");
        assert_eq!(ValidTime::display(&vt.valid_datetime()), "12UTC Mon 15 Jan 2024");
    }

    #[test]
    fn test_julian_epoch_is_two_days_before_gregorian() {
        let units = CfTimeUnits::parse("days since 1-1-1 00:00:0.0", None).unwrap();
        assert_eq!(units.epoch.year(), 0);
        assert_eq!(units.epoch.month(), 12);
        assert_eq!(units.epoch.day(), 30);
    }

    #[test]
    fn test_decode_grads_days() {
        let units = CfTimeUnits::parse("days since 1-1-1 00:00:0.0", None).unwrap();
        // 2024-01-15 is 738899 days after proleptic 0001-01-01; the Julian
        // epoch sits two days earlier.
        let dt = units.decode(738901.5).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2024, 1, 15, 12));
    }

    #[test]
    fn test_decode_hours_since_iso_epoch() {
        let units = CfTimeUnits::parse("hours since 2024-01-15T00:00:00Z", None).unwrap();
        let dt = units.decode(30.0).unwrap();
        assert_eq!((dt.day(), dt.hour()), (16, 6));
    }

    #[test]
    fn test_invalid_units() {
        assert!(CfTimeUnits::parse("fortnights since 2000-01-01", None).is_err());
        assert!(CfTimeUnits::parse("days", None).is_err());
    }
}
