use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "season")]
    Season,
    #[serde(rename = "all")]
    All,
}

/// Inclusive calendar-date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl DateRange {
    pub fn code(&self) -> &'static str {
        match self {
            DateRange::Last7Days => "7d",
            DateRange::Last30Days => "30d",
            DateRange::Season => "season",
            DateRange::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateRange::Last7Days => "Last 7 days",
            DateRange::Last30Days => "Last 30 days",
            DateRange::Season => "Season",
            DateRange::All => "All time",
        }
    }

    /// Resolve to a concrete window relative to `today`
    /// `All` applies no date filter
    pub fn resolve(&self, today: NaiveDate) -> Option<DateWindow> {
        match self {
            DateRange::Last7Days => Some(trailing_days(today, 7)),
            DateRange::Last30Days => Some(trailing_days(today, 30)),
            DateRange::Season => Some(season_window(today)),
            DateRange::All => None,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(DateRange::Last7Days),
            "30d" => Ok(DateRange::Last30Days),
            "season" => Ok(DateRange::Season),
            "all" => Ok(DateRange::All),
            other => Err(format!("unknown date range: {}", other)),
        }
    }
}

/// The last `days` calendar days including today
fn trailing_days(today: NaiveDate, days: u64) -> DateWindow {
    let start = today
        .checked_sub_days(Days::new(days - 1))
        .unwrap_or(NaiveDate::MIN);
    DateWindow { start, end: today }
}

/// A common October-to-June season window, clipped at today
fn season_window(today: NaiveDate) -> DateWindow {
    let start_year = if today.month() >= 10 {
        today.year()
    } else {
        today.year() - 1
    };

    let start = NaiveDate::from_ymd_opt(start_year, 10, 1).unwrap_or(today);
    let season_end = NaiveDate::from_ymd_opt(start_year + 1, 6, 30).unwrap_or(today);

    DateWindow {
        start,
        end: season_end.min(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_trailing_windows_include_today() {
        let today = date(2024, 3, 10);
        let week = DateRange::Last7Days.resolve(today).unwrap();
        assert_eq!(week.start, date(2024, 3, 4));
        assert_eq!(week.end, today);

        let month = DateRange::Last30Days.resolve(today).unwrap();
        assert_eq!(month.start, date(2024, 2, 10));
        assert!(month.contains(today));
        assert!(!month.contains(date(2024, 2, 9)));
    }

    #[test]
    fn test_season_started_last_year() {
        let window = DateRange::Season.resolve(date(2024, 3, 10)).unwrap();
        assert_eq!(window.start, date(2023, 10, 1));
        assert_eq!(window.end, date(2024, 3, 10));
    }

    #[test]
    fn test_season_started_this_october() {
        let window = DateRange::Season.resolve(date(2024, 11, 2)).unwrap();
        assert_eq!(window.start, date(2024, 10, 1));
        assert_eq!(window.end, date(2024, 11, 2));
    }

    #[test]
    fn test_season_is_clipped_to_june_30() {
        let window = DateRange::Season.resolve(date(2024, 8, 15)).unwrap();
        assert_eq!(window.start, date(2023, 10, 1));
        assert_eq!(window.end, date(2024, 6, 30));
    }

    #[test]
    fn test_all_time_has_no_window() {
        assert_eq!(DateRange::All.resolve(date(2024, 1, 1)), None);
    }

    #[test]
    fn test_codes() {
        assert_eq!("season".parse::<DateRange>().unwrap(), DateRange::Season);
        assert_eq!(DateRange::Last7Days.to_string(), "7d");
        assert!("90d".parse::<DateRange>().is_err());
    }
}
