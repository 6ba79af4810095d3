// src/window.rs
//! Reporting-window arithmetic: business-day rollback in KST.
//!
//! The digest covers everything published since the previous business day's
//! send time. When the previous business day is separated from today by a
//! weekend or holiday gap, the window widens to the start of that day so the
//! whole gap is covered in one digest.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, TimeZone, Weekday};
use serde::Deserialize;
use tracing::warn;

const ENV_HOLIDAY_CONFIG_PATH: &str = "HOLIDAY_CONFIG_PATH";
const DEFAULT_HOLIDAY_CONFIG_PATH: &str = "config/holidays_kr.toml";

/// Digest cutoff: the window closes at 09:59:59 and the next one opens at 10:00:00.
const SEND_HOUR: u32 = 10;

/// Korea Standard Time. No DST, so a fixed offset is exact year-round.
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("KST offset is in range")
}

fn at(date: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
    let naive = date.and_hms_opt(h, m, s).expect("valid wall-clock time");
    kst()
        .from_local_datetime(&naive)
        .single()
        .expect("fixed offset is unambiguous")
}

/// The collection window for one run. Computed once, immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Today's date in `YYYY-MM-DD`, used as the digest headline date.
    pub label: String,
}

impl ReportingWindow {
    pub fn contains(&self, ts: DateTime<FixedOffset>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Anything older than this is a malformed or epoch-like timestamp,
    /// rejected regardless of the window check.
    pub fn hard_floor(&self) -> DateTime<FixedOffset> {
        self.start - chrono::Duration::days(1)
    }
}

/// Holiday lookups are an optional collaborator; the calendar degrades to
/// weekend-only logic when no table is available.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Weekend-only fallback calendar.
pub struct WeekendOnly;

impl HolidayCalendar for WeekendOnly {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Fixed holiday table loaded from TOML (`holidays = ["YYYY-MM-DD", ...]`).
pub struct StaticHolidayTable {
    dates: HashSet<NaiveDate>,
}

#[derive(Deserialize)]
struct HolidayFile {
    holidays: Vec<NaiveDate>,
}

impl StaticHolidayTable {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: HolidayFile = toml::from_str(s).context("parsing holiday table")?;
        Ok(Self {
            dates: file.holidays.into_iter().collect(),
        })
    }
}

impl HolidayCalendar for StaticHolidayTable {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Load the holiday table using env var + fallback path. A missing or broken
/// table is non-fatal: the run proceeds with weekend-only business days.
pub fn load_holiday_calendar() -> Box<dyn HolidayCalendar + Send + Sync> {
    let path = std::env::var(ENV_HOLIDAY_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_HOLIDAY_CONFIG_PATH));

    match std::fs::read_to_string(&path) {
        Ok(content) => match StaticHolidayTable::from_toml_str(&content) {
            Ok(table) => Box::new(table),
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "holiday table unreadable; using weekend-only business days");
                Box::new(WeekendOnly)
            }
        },
        Err(_) => {
            warn!(path = %path.display(), "no holiday table found; using weekend-only business days");
            Box::new(WeekendOnly)
        }
    }
}

fn is_business_day(date: NaiveDate, holidays: &dyn HolidayCalendar) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.is_holiday(date)
}

/// Compute the reporting window for a run started at `now` (KST).
///
/// `end` is today at 09:59:59. `start` is the previous business day at
/// 10:00:00, widened to 00:00:00 when that day is separated from today by
/// more than one calendar day (weekend or holiday gap).
pub fn compute_window(
    now: DateTime<FixedOffset>,
    holidays: &dyn HolidayCalendar,
) -> ReportingWindow {
    let today = now.date_naive();

    let mut prev_business = today - Days::new(1);
    while !is_business_day(prev_business, holidays) {
        prev_business = prev_business - Days::new(1);
    }

    let gap_days = (today - prev_business).num_days();
    let start = if gap_days > 1 {
        at(prev_business, 0, 0, 0)
    } else {
        at(prev_business, SEND_HOUR, 0, 0)
    };

    ReportingWindow {
        start,
        end: at(today, SEND_HOUR - 1, 59, 59),
        label: today.format("%Y-%m-%d").to_string(),
    }
}
