use anyhow::{Result, anyhow};
use std::fmt;
use time::Time;
use time::macros::{format_description, time};

const DEFAULT_START: Time = time!(0:00);
const DEFAULT_END: Time = time!(23:59);

/// Time-of-day range in which batch ticks are allowed to do work.
///
/// Bounds are inclusive and compared at minute resolution. A window whose
/// start is later than its end wraps past midnight (`22:00`-`02:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    start: Time,
    end: Time,
}

impl ActiveWindow {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    /// Builds a window from optional `HH:MM` settings. Both missing means no
    /// window; a single missing bound falls back to `00:00` or `23:59`.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        let start = non_blank(start);
        let end = non_blank(end);
        if start.is_none() && end.is_none() {
            return Ok(None);
        }
        let start = start.map(parse_hhmm).transpose()?.unwrap_or(DEFAULT_START);
        let end = end.map(parse_hhmm).transpose()?.unwrap_or(DEFAULT_END);
        Ok(Some(Self::new(start, end)))
    }

    pub fn contains(&self, now: Time) -> bool {
        let now = minute_of_day(now);
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);
        if start <= end {
            now >= start && now <= end
        } else {
            now >= start || now <= end
        }
    }
}

impl fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start.hour(),
            self.start.minute(),
            self.end.hour(),
            self.end.minute()
        )
    }
}

pub fn parse_hhmm(value: &str) -> Result<Time> {
    let format = format_description!("[hour]:[minute]");
    Time::parse(value.trim(), &format)
        .map_err(|err| anyhow!("invalid time of day '{}' (expected HH:MM): {}", value, err))
}

fn minute_of_day(value: Time) -> u16 {
    u16::from(value.hour()) * 60 + u16::from(value.minute())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
