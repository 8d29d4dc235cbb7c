//! Closed market table.
//!
//! Each market code maps to its classification, the leagues offering it and
//! a display label. Adding a market is one line in `market_table!` below.

use super::League;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a market is graded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    /// Yes/no proposition (moneyline, anytime TD)
    Binary,
    /// Needs an over/under qualifier and a positive threshold
    OverUnder,
    /// Signed handicap, no qualifier (spread, puck line, run line)
    Spread,
}

/// What a market is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSubject {
    Player,
    Team,
    Game,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    pub kind: MarketKind,
    pub subject: MarketSubject,
    pub leagues: &'static [League],
    pub label: &'static str,
}

macro_rules! market_table {
    ($($variant:ident => $code:literal, $kind:ident, $subject:ident, [$($league:ident),*], $label:literal;)*) => {
        /// Market codes as stored on legs
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Market {
            $(#[serde(rename = $code)] $variant,)*
        }

        impl Market {
            pub const ALL: &'static [Market] = &[$(Market::$variant),*];

            /// Stored code, e.g. "PLAYER_REBOUNDS"
            pub fn code(&self) -> &'static str {
                match self {
                    $(Market::$variant => $code,)*
                }
            }

            pub fn config(&self) -> &'static MarketConfig {
                match self {
                    $(Market::$variant => &MarketConfig {
                        kind: MarketKind::$kind,
                        subject: MarketSubject::$subject,
                        leagues: &[$(League::$league),*],
                        label: $label,
                    },)*
                }
            }
        }
    };
}

market_table! {
    // Universal
    Moneyline => "MONEYLINE", Binary, Team, [Nba, Nfl, Mlb, Nhl], "Moneyline";
    Spread => "SPREAD", Spread, Team, [Nba, Nfl], "Spread";
    TotalPoints => "TOTAL_POINTS", OverUnder, Game, [Nba, Nfl], "Total Points";
    TeamTotalPoints => "TEAM_TOTAL_POINTS", OverUnder, Team, [Nba, Nfl], "Team Total Points";
    TeamFirstHalfPoints => "TEAM_FIRST_HALF_POINTS", OverUnder, Team, [Nba, Nfl], "Team First Half Points";
    TeamFirstQuarterPoints => "TEAM_FIRST_QUARTER_POINTS", OverUnder, Team, [Nba, Nfl], "Team First Quarter Points";
    TeamFirstPeriodGoals => "TEAM_FIRST_PERIOD_GOALS", OverUnder, Team, [Nhl], "Team First Period Goals";
    TeamFirstInningScore => "TEAM_FIRST_INNING_SCORE", OverUnder, Team, [Mlb], "Team First Inning Score";
    TeamFirstFiveRuns => "TEAM_FIRST_FIVE_RUNS", OverUnder, Team, [Mlb], "Team First Five Runs";
    WinningMargin => "WINNING_MARGIN", OverUnder, Game, [Nba, Nfl], "Winning Margin";
    OvertimeYesNo => "OVERTIME_YES_NO", Binary, Game, [Nba, Nfl, Nhl], "Overtime";
    TeamToScoreFirst => "TEAM_TO_SCORE_FIRST", Binary, Team, [Nba, Nfl, Nhl], "Team to Score First";
    TeamToScoreLast => "TEAM_TO_SCORE_LAST", Binary, Team, [Nba, Nfl, Nhl], "Team to Score Last";
    BothTeamsToScore => "BOTH_TEAMS_TO_SCORE", Binary, Game, [Nba, Nfl, Nhl], "Both Teams to Score";
    FirstToScoreXPoints => "FIRST_TO_SCORE_X_POINTS", OverUnder, Game, [Nba, Nfl], "First to Score X Points";

    // Basketball
    PlayerPoints => "PLAYER_POINTS", OverUnder, Player, [Nba], "Points";
    PlayerRebounds => "PLAYER_REBOUNDS", OverUnder, Player, [Nba], "Rebounds";
    PlayerAssists => "PLAYER_ASSISTS", OverUnder, Player, [Nba], "Assists";
    PlayerSteals => "PLAYER_STEALS", OverUnder, Player, [Nba], "Steals";
    PlayerBlocks => "PLAYER_BLOCKS", OverUnder, Player, [Nba], "Blocks";
    PlayerThrees => "PLAYER_THREES", OverUnder, Player, [Nba], "Three-Pointers Made";
    PlayerPra => "PLAYER_PRA", OverUnder, Player, [Nba], "Points + Rebounds + Assists";
    PlayerPr => "PLAYER_PR", OverUnder, Player, [Nba], "Points + Rebounds";
    PlayerPa => "PLAYER_PA", OverUnder, Player, [Nba], "Points + Assists";
    PlayerRa => "PLAYER_RA", OverUnder, Player, [Nba], "Rebounds + Assists";
    DoubleDouble => "DOUBLE_DOUBLE", Binary, Player, [Nba], "Double-Double";
    TripleDouble => "TRIPLE_DOUBLE", Binary, Player, [Nba], "Triple-Double";
    PlayerTurnovers => "PLAYER_TURNOVERS", OverUnder, Player, [Nba], "Turnovers";
    PlayerFantasyPoints => "PLAYER_FANTASY_POINTS", OverUnder, Player, [Nba], "Fantasy Points";
    TeamTotalPointsNba => "TEAM_TOTAL_POINTS_NBA", OverUnder, Team, [Nba], "Team Total Points";
    TeamFirstHalfPointsNba => "TEAM_FIRST_HALF_POINTS_NBA", OverUnder, Team, [Nba], "Team First Half Points";
    TeamFirstQuarterPointsNba => "TEAM_FIRST_QUARTER_POINTS_NBA", OverUnder, Team, [Nba], "Team First Quarter Points";

    // Football
    PlayerPassingYards => "PLAYER_PASSING_YARDS", OverUnder, Player, [Nfl], "Passing Yards";
    PlayerRushingYards => "PLAYER_RUSHING_YARDS", OverUnder, Player, [Nfl], "Rushing Yards";
    PlayerReceivingYards => "PLAYER_RECEIVING_YARDS", OverUnder, Player, [Nfl], "Receiving Yards";
    PlayerReceptions => "PLAYER_RECEPTIONS", OverUnder, Player, [Nfl], "Receptions";
    PlayerPassingTds => "PLAYER_PASSING_TDS", OverUnder, Player, [Nfl], "Passing TDs";
    PlayerRushingTds => "PLAYER_RUSHING_TDS", OverUnder, Player, [Nfl], "Rushing TDs";
    PlayerReceivingTds => "PLAYER_RECEIVING_TDS", OverUnder, Player, [Nfl], "Receiving TDs";
    PlayerAnytimeTd => "PLAYER_ANYTIME_TD", Binary, Player, [Nfl], "Anytime TD";
    PlayerFirstTd => "PLAYER_FIRST_TD", Binary, Player, [Nfl], "First TD";
    PlayerLongestReception => "PLAYER_LONGEST_RECEPTION", OverUnder, Player, [Nfl], "Longest Reception";
    PlayerLongestRush => "PLAYER_LONGEST_RUSH", OverUnder, Player, [Nfl], "Longest Rush";
    PlayerInterceptions => "PLAYER_INTERCEPTIONS", OverUnder, Player, [Nfl], "Interceptions";
    PlayerCompletions => "PLAYER_COMPLETIONS", OverUnder, Player, [Nfl], "Completions";
    PlayerAttempts => "PLAYER_ATTEMPTS", OverUnder, Player, [Nfl], "Attempts";
    PlayerPassAttempts => "PLAYER_PASS_ATTEMPTS", OverUnder, Player, [Nfl], "Pass Attempts";
    PlayerPassCompletions => "PLAYER_PASS_COMPLETIONS", OverUnder, Player, [Nfl], "Pass Completions";
    PlayerFieldGoalsMade => "PLAYER_FIELD_GOALS_MADE", OverUnder, Player, [Nfl], "Field Goals Made";
    PlayerFieldGoalsAttempted => "PLAYER_FIELD_GOALS_ATTEMPTED", OverUnder, Player, [Nfl], "Field Goals Attempted";
    PlayerExtraPointsMade => "PLAYER_EXTRA_POINTS_MADE", OverUnder, Player, [Nfl], "Extra Points Made";
    PlayerPunts => "PLAYER_PUNTS", OverUnder, Player, [Nfl], "Punts";
    TeamTotalPointsNfl => "TEAM_TOTAL_POINTS_NFL", OverUnder, Team, [Nfl], "Team Total Points";
    TeamFirstHalfPointsNfl => "TEAM_FIRST_HALF_POINTS_NFL", OverUnder, Team, [Nfl], "Team First Half Points";
    TeamFirstQuarterPointsNfl => "TEAM_FIRST_QUARTER_POINTS_NFL", OverUnder, Team, [Nfl], "Team First Quarter Points";

    // Baseball
    RunLine => "RUN_LINE", Spread, Team, [Mlb], "Run Line";
    TotalRuns => "TOTAL_RUNS", OverUnder, Game, [Mlb], "Total Runs";
    PlayerHits => "PLAYER_HITS", OverUnder, Player, [Mlb], "Hits";
    PlayerHomeRuns => "PLAYER_HOME_RUNS", OverUnder, Player, [Mlb], "Home Runs";
    PlayerRbis => "PLAYER_RBIS", OverUnder, Player, [Mlb], "RBIs";
    PlayerRuns => "PLAYER_RUNS", OverUnder, Player, [Mlb], "Runs";
    PlayerTotalBases => "PLAYER_TOTAL_BASES", OverUnder, Player, [Mlb], "Total Bases";
    PlayerStolenBases => "PLAYER_STOLEN_BASES", OverUnder, Player, [Mlb], "Stolen Bases";
    PlayerWalks => "PLAYER_WALKS", OverUnder, Player, [Mlb], "Walks";
    PitcherStrikeouts => "PITCHER_STRIKEOUTS", OverUnder, Player, [Mlb], "Strikeouts";
    PitcherOutsRecorded => "PITCHER_OUTS_RECORDED", OverUnder, Player, [Mlb], "Outs Recorded";
    PitcherEarnedRuns => "PITCHER_EARNED_RUNS", OverUnder, Player, [Mlb], "Earned Runs";
    PitcherHitsAllowed => "PITCHER_HITS_ALLOWED", OverUnder, Player, [Mlb], "Hits Allowed";
    PitcherWalksAllowed => "PITCHER_WALKS_ALLOWED", OverUnder, Player, [Mlb], "Walks Allowed";
    TeamTotalRuns => "TEAM_TOTAL_RUNS", OverUnder, Team, [Mlb], "Team Total Runs";
    TeamFirstFiveRunsMlb => "TEAM_FIRST_FIVE_RUNS_MLB", OverUnder, Team, [Mlb], "Team First Five Runs";
    TeamFirstInningScoreMlb => "TEAM_FIRST_INNING_SCORE_MLB", OverUnder, Team, [Mlb], "Team First Inning Score";

    // Hockey
    PuckLine => "PUCK_LINE", Spread, Team, [Nhl], "Puck Line";
    TotalGoals => "TOTAL_GOALS", OverUnder, Game, [Nhl], "Total Goals";
    PlayerGoals => "PLAYER_GOALS", OverUnder, Player, [Nhl], "Goals";
    PlayerAssistsNhl => "PLAYER_ASSISTS_NHL", OverUnder, Player, [Nhl], "Assists";
    PlayerPointsNhl => "PLAYER_POINTS_NHL", OverUnder, Player, [Nhl], "Points";
    PlayerShots => "PLAYER_SHOTS", OverUnder, Player, [Nhl], "Shots";
    PlayerBlocksNhl => "PLAYER_BLOCKS_NHL", OverUnder, Player, [Nhl], "Blocks";
    PlayerPim => "PLAYER_PIM", OverUnder, Player, [Nhl], "Penalty Minutes";
    PlayerPowerPlayPoints => "PLAYER_POWER_PLAY_POINTS", OverUnder, Player, [Nhl], "Power Play Points";
    GoalieSaves => "GOALIE_SAVES", OverUnder, Player, [Nhl], "Saves";
    GoalieShotsAgainst => "GOALIE_SHOTS_AGAINST", OverUnder, Player, [Nhl], "Shots Against";
    TeamTotalGoals => "TEAM_TOTAL_GOALS", OverUnder, Team, [Nhl], "Team Total Goals";
}

impl Market {
    pub fn label(&self) -> &'static str {
        self.config().label
    }

    pub fn is_player_market(&self) -> bool {
        self.config().subject == MarketSubject::Player
    }

    /// Needs a team selection; spread-type markets are team markets
    pub fn is_team_market(&self) -> bool {
        self.config().subject == MarketSubject::Team
    }

    pub fn is_spread_market(&self) -> bool {
        self.config().kind == MarketKind::Spread
    }

    pub fn requires_qualifier(&self) -> bool {
        self.config().kind == MarketKind::OverUnder
    }

    pub fn is_offered_in(&self, league: League) -> bool {
        self.config().leagues.contains(&league)
    }

    /// Markets offered in a league, in table order
    pub fn for_league(league: League) -> Vec<Market> {
        Market::ALL
            .iter()
            .copied()
            .filter(|market| market.is_offered_in(league))
            .collect()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Market::ALL
            .iter()
            .copied()
            .find(|market| market.code() == s)
            .ok_or_else(|| format!("unknown market code: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = Market::ALL.iter().map(|m| m.code()).collect();
        let total = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), total);
        assert!(total > 75);
    }

    #[test]
    fn test_every_market_has_a_league_and_label() {
        for market in Market::ALL {
            let config = market.config();
            assert!(!config.leagues.is_empty(), "{} has no leagues", market);
            assert!(!config.label.is_empty(), "{} has no label", market);
        }
    }

    #[test]
    fn test_spread_markets_are_team_markets_without_qualifier() {
        for market in [Market::Spread, Market::RunLine, Market::PuckLine] {
            assert!(market.is_spread_market());
            assert!(market.is_team_market());
            assert!(!market.requires_qualifier());
        }
    }

    #[test]
    fn test_classification_flags() {
        assert!(Market::PlayerRebounds.is_player_market());
        assert!(Market::PlayerRebounds.requires_qualifier());
        assert!(Market::PlayerAnytimeTd.is_player_market());
        assert!(!Market::PlayerAnytimeTd.requires_qualifier());
        assert!(Market::Moneyline.is_team_market());
        assert!(!Market::TotalPoints.is_team_market());
        assert!(!Market::TotalPoints.is_player_market());
    }

    #[test]
    fn test_code_parsing_and_serde_agree() {
        let market: Market = "PLAYER_ASSISTS_NHL".parse().unwrap();
        assert_eq!(market, Market::PlayerAssistsNhl);
        assert_eq!(serde_json::to_string(&market).unwrap(), "\"PLAYER_ASSISTS_NHL\"");
        assert!("PLAYER_DUNKS".parse::<Market>().is_err());
    }

    #[test]
    fn test_markets_for_league() {
        let mlb = Market::for_league(League::Mlb);
        assert!(mlb.contains(&Market::RunLine));
        assert!(mlb.contains(&Market::Moneyline));
        assert!(!mlb.contains(&Market::PlayerRebounds));
    }
}
