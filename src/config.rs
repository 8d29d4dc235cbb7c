use crate::models::{OddsFormat, UserProfile};
use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Local, Offset};
use std::path::PathBuf;

pub const DEFAULT_BETS_FILE: &str = "data/bets.json";
pub const DEFAULT_USER: &str = "local";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Settings read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bets_file: PathBuf,
    pub user_id: String,
    pub nickname: Option<String>,
    pub odds_format: OddsFormat,
    /// Calendar days for date filters and daily profit are read in this zone
    pub timezone: FixedOffset,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bets_file: PathBuf::from(DEFAULT_BETS_FILE),
            user_id: DEFAULT_USER.to_string(),
            nickname: None,
            odds_format: OddsFormat::default(),
            timezone: Local::now().offset().fix(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// Build the config from environment variables
    /// Call `dotenv::dotenv().ok()` first to pick up a `.env` file
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let odds_format = match non_empty("ODDS_FORMAT") {
            Some(value) => value
                .parse::<OddsFormat>()
                .map_err(|e: String| anyhow!(e))
                .context("Invalid ODDS_FORMAT")?,
            None => defaults.odds_format,
        };

        let timezone = match non_empty("BETTRACK_UTC_OFFSET") {
            Some(value) => parse_utc_offset(&value)
                .ok_or_else(|| anyhow!("expected an offset like -05:00, got {}", value))
                .context("Invalid BETTRACK_UTC_OFFSET")?,
            None => defaults.timezone,
        };

        Ok(Self {
            bets_file: non_empty("BETS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.bets_file),
            user_id: non_empty("BETTRACK_USER").unwrap_or(defaults.user_id),
            nickname: non_empty("BETTRACK_NICKNAME"),
            odds_format,
            timezone,
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }

    /// Display preferences threaded into formatting
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id.clone(),
            nickname: self.nickname.clone(),
            odds_format: self.odds_format,
            utc_offset_minutes: self.timezone.local_minus_utc() / 60,
        }
    }
}

/// Parse "Z", "+05:30", "-0500" or "-5" into a fixed UTC offset
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return None;
    }

    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
