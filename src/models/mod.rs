pub mod market;

pub use market::{Market, MarketConfig, MarketKind, MarketSubject};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sports leagues the tracker knows markets for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum League {
    Nba,
    Nfl,
    Mlb,
    Nhl,
}

impl League {
    pub const ALL: [League; 4] = [League::Nba, League::Nfl, League::Mlb, League::Nhl];

    pub fn label(&self) -> &'static str {
        match self {
            League::Nba => "NBA",
            League::Nfl => "NFL",
            League::Mlb => "MLB",
            League::Nhl => "NHL",
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for League {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        League::ALL
            .into_iter()
            .find(|league| league.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown league: {}", s))
    }
}

/// Closed set of supported sportsbooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sportsbook {
    Fanduel,
    Draftkings,
    Bet365,
    Caesars,
    Mgm,
    Pointsbet,
    Betmgm,
    Unibet,
}

impl Sportsbook {
    pub const ALL: [Sportsbook; 8] = [
        Sportsbook::Fanduel,
        Sportsbook::Draftkings,
        Sportsbook::Bet365,
        Sportsbook::Caesars,
        Sportsbook::Mgm,
        Sportsbook::Pointsbet,
        Sportsbook::Betmgm,
        Sportsbook::Unibet,
    ];

    /// Stored identifier, e.g. "fanduel"
    pub fn code(&self) -> &'static str {
        match self {
            Sportsbook::Fanduel => "fanduel",
            Sportsbook::Draftkings => "draftkings",
            Sportsbook::Bet365 => "bet365",
            Sportsbook::Caesars => "caesars",
            Sportsbook::Mgm => "mgm",
            Sportsbook::Pointsbet => "pointsbet",
            Sportsbook::Betmgm => "betmgm",
            Sportsbook::Unibet => "unibet",
        }
    }

    /// Display label, e.g. "FanDuel"
    pub fn label(&self) -> &'static str {
        match self {
            Sportsbook::Fanduel => "FanDuel",
            Sportsbook::Draftkings => "DraftKings",
            Sportsbook::Bet365 => "Bet365",
            Sportsbook::Caesars => "Caesars",
            Sportsbook::Mgm => "MGM",
            Sportsbook::Pointsbet => "PointsBet",
            Sportsbook::Betmgm => "BetMGM",
            Sportsbook::Unibet => "Unibet",
        }
    }
}

impl fmt::Display for Sportsbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sportsbook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sportsbook::ALL
            .into_iter()
            .find(|book| book.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sportsbook: {}", s))
    }
}

/// Outcome vocabulary shared by legs and bets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    #[default]
    Pending,
    Win,
    Loss,
    Void,
}

impl BetResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetResult::Pending => "pending",
            BetResult::Win => "win",
            BetResult::Loss => "loss",
            BetResult::Void => "void",
        }
    }

    /// Win or loss
    pub fn is_decided(&self) -> bool {
        matches!(self, BetResult::Win | BetResult::Loss)
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BetResult::Pending),
            "win" => Ok(BetResult::Win),
            "loss" => Ok(BetResult::Loss),
            "void" => Ok(BetResult::Void),
            other => Err(format!("unknown result: {}", other)),
        }
    }
}

/// Derived bet classification, never set by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Straight,
    SameGameParlay,
    SameGameParlayPlus,
    Parlay,
}

impl BetType {
    pub fn label(&self) -> &'static str {
        match self {
            BetType::Straight => "Straight",
            BetType::SameGameParlay => "Same Game Parlay",
            BetType::SameGameParlayPlus => "Same Game Parlay+",
            BetType::Parlay => "Parlay",
        }
    }

    /// Parlay, SGP and SGP+ all multiply several legs together
    pub fn is_parlay_family(&self) -> bool {
        !matches!(self, BetType::Straight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketQualifier {
    Over,
    Under,
}

impl MarketQualifier {
    pub fn label(&self) -> &'static str {
        match self {
            MarketQualifier::Over => "Over",
            MarketQualifier::Under => "Under",
        }
    }
}

/// How odds are shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OddsFormat {
    #[default]
    Decimal,
    American,
}

impl FromStr for OddsFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decimal" => Ok(OddsFormat::Decimal),
            "american" => Ok(OddsFormat::American),
            other => Err(format!("unknown odds format: {}", other)),
        }
    }
}

/// Display preferences of the user the tracker is acting for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub nickname: Option<String>,
    pub odds_format: OddsFormat,
    /// Offset of the user's timezone from UTC, east positive
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl UserProfile {
    /// The user's timezone; out-of-range offsets fall back to UTC
    pub fn timezone(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub league: League,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub full_name: String,
    pub position: Option<String>,
    pub team_id: String,
}

/// A scheduled sporting event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub league: League,
    pub home_team_id: String,
    pub away_team_id: String,
    pub start_time: DateTime<Utc>,
    pub external_event_id: Option<String>,
}

/// One proposition within a bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub result: BetResult,
    pub league: League,
    pub market: Market,
    pub player_id: Option<String>,
    pub team_id: Option<String>,
    pub qualifier: Option<MarketQualifier>,
    pub threshold: Option<f64>,
    pub game_id: String,
    pub description: String,
    pub event_name: String,
    /// Per-leg decimal odds, only present on older records
    #[serde(default)]
    pub odds: Option<f64>,
}

/// Legs from one event, priced together by a single odds figure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegGroup {
    pub order_index: u32,
    pub odds: f64,
    pub game_id: String,
    pub event_date: DateTime<Utc>,
    pub legs: Vec<Leg>,
}

/// Top-level wager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub user_id: String,
    pub wager: f64,
    pub payout: f64,
    pub odds: f64,
    pub result: BetResult,
    pub bet_type: BetType,
    pub date: DateTime<Utc>,
    pub is_bonus_bet: bool,
    pub boost_percentage: Option<u8>,
    pub is_no_sweat: bool,
    pub sportsbook: Option<Sportsbook>,
    pub leg_groups: Vec<LegGroup>,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// All legs across groups, in group order
    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.leg_groups.iter().flat_map(|group| group.legs.iter())
    }

    pub fn leg_count(&self) -> usize {
        self.leg_groups.iter().map(|group| group.legs.len()).sum()
    }

    /// League of the first leg of the first group
    pub fn primary_league(&self) -> Option<League> {
        self.legs().next().map(|leg| leg.league)
    }

    /// Profit realised by a settled bet: payout minus stake on a win,
    /// the lost stake otherwise
    pub fn profit(&self) -> f64 {
        if self.result == BetResult::Win {
            self.payout - self.wager
        } else {
            -self.wager
        }
    }

    /// Title shown on bet cards
    pub fn title(&self) -> String {
        let leg_count = self.leg_count();
        if leg_count == 1 {
            "Straight".to_string()
        } else if self.bet_type == BetType::SameGameParlay {
            format!("{} leg same game parlay", leg_count)
        } else {
            format!("{} leg parlay", leg_count)
        }
    }
}
