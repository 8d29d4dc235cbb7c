//! Bet form handling in two stages.
//!
//! `validate_draft` rejects malformed input without touching any data source.
//! `derive_bet` then computes legs, result, odds, payout, bet type and date
//! from the validated draft and the games/teams/players it references.

use crate::error::ValidationError;
use crate::models::{
    Bet, BetResult, BetType, Game, Leg, LegGroup, Market, MarketQualifier, OddsFormat, Player,
    Sportsbook, Team,
};
use crate::utils::market_display::format_market_display;
use crate::utils::odds::{calculate_bet_odds_from_groups, calculate_bet_result, parse_odds};
use crate::utils::payout::{calculate_payout, PayoutModifiers};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One leg as entered on the form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegDraft {
    pub market: Market,
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub qualifier: Option<MarketQualifier>,
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Free-text description; generated from the market when blank
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub result: BetResult,
}

/// One event on the form: a game, its combined odds and its legs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegGroupDraft {
    pub game_id: String,
    /// Combined odds for the whole group, typed in the draft's odds format
    pub odds: String,
    pub legs: Vec<LegDraft>,
}

/// A submitted bet form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetDraft {
    pub wager: f64,
    #[serde(default)]
    pub odds_format: OddsFormat,
    #[serde(default)]
    pub is_bonus_bet: bool,
    #[serde(default)]
    pub boost_percentage: Option<u8>,
    #[serde(default)]
    pub is_no_sweat: bool,
    #[serde(default)]
    pub sportsbook: Option<Sportsbook>,
    pub groups: Vec<LegGroupDraft>,
}

#[derive(Debug, Clone)]
pub struct ValidatedGroup {
    game_id: String,
    odds: f64,
    legs: Vec<LegDraft>,
}

/// A draft that passed validation; only `validate_draft` and
/// `ValidatedBet::for_existing` build one
#[derive(Debug, Clone)]
pub struct ValidatedBet {
    wager: f64,
    modifiers: PayoutModifiers,
    sportsbook: Option<Sportsbook>,
    groups: Vec<ValidatedGroup>,
}

impl ValidatedBet {
    /// Validate replacement groups for an existing bet, keeping its stake
    /// and modifiers
    pub fn for_existing(
        bet: &Bet,
        groups: &[LegGroupDraft],
        odds_format: OddsFormat,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            wager: bet.wager,
            modifiers: PayoutModifiers {
                is_bonus_bet: bet.is_bonus_bet,
                boost_percentage: bet.boost_percentage,
                is_no_sweat: bet.is_no_sweat,
            },
            sportsbook: bet.sportsbook,
            groups: validate_groups(groups, odds_format)?,
        })
    }

    pub fn game_ids(&self) -> BTreeSet<&str> {
        self.groups.iter().map(|g| g.game_id.as_str()).collect()
    }

    pub fn player_ids(&self) -> BTreeSet<&str> {
        self.legs().filter_map(|leg| leg.player_id.as_deref()).collect()
    }

    pub fn team_ids(&self) -> BTreeSet<&str> {
        self.legs().filter_map(|leg| leg.team_id.as_deref()).collect()
    }

    fn legs(&self) -> impl Iterator<Item = &LegDraft> {
        self.groups.iter().flat_map(|g| g.legs.iter())
    }
}

/// Games, teams and players a draft refers to
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    games: HashMap<String, Game>,
    teams: HashMap<String, Team>,
    players: HashMap<String, Player>,
}

impl ReferenceData {
    pub fn add_game(&mut self, game: Game) {
        self.games.insert(game.id.clone(), game);
    }

    pub fn add_team(&mut self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    fn team_name(&self, id: &str) -> Option<&str> {
        self.teams.get(id).map(|team| team.name.as_str())
    }
}

/// Identity fields kept across re-derivation
#[derive(Debug, Clone)]
pub struct BetIdentity {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Validation stage: reject malformed input
pub fn validate_draft(draft: &BetDraft) -> Result<ValidatedBet, ValidationError> {
    if !draft.wager.is_finite() || draft.wager <= 0.0 {
        return Err(ValidationError::InvalidWager(draft.wager));
    }

    if let Some(boost) = draft.boost_percentage {
        if boost > 100 {
            return Err(ValidationError::InvalidBoost(boost));
        }
    }

    Ok(ValidatedBet {
        wager: draft.wager,
        modifiers: PayoutModifiers {
            is_bonus_bet: draft.is_bonus_bet,
            boost_percentage: draft.boost_percentage,
            is_no_sweat: draft.is_no_sweat,
        },
        sportsbook: draft.sportsbook,
        groups: validate_groups(&draft.groups, draft.odds_format)?,
    })
}

fn validate_groups(
    groups: &[LegGroupDraft],
    odds_format: OddsFormat,
) -> Result<Vec<ValidatedGroup>, ValidationError> {
    if groups.is_empty() {
        return Err(ValidationError::NoLegGroups);
    }

    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let number = index + 1;
            if group.legs.is_empty() {
                return Err(ValidationError::EmptyLegGroup { group: number });
            }

            let odds = parse_odds(&group.odds, odds_format).map_err(|source| {
                ValidationError::GroupOdds {
                    group: number,
                    source,
                }
            })?;

            for (leg_index, leg) in group.legs.iter().enumerate() {
                validate_leg(leg, number, leg_index + 1)?;
            }

            Ok(ValidatedGroup {
                game_id: group.game_id.clone(),
                odds,
                legs: group.legs.clone(),
            })
        })
        .collect()
}

fn validate_leg(leg: &LegDraft, group: usize, index: usize) -> Result<(), ValidationError> {
    let market = leg.market;
    let has = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

    if market.is_player_market() && !has(&leg.player_id) {
        return Err(ValidationError::MissingPlayer { group, leg: index, market });
    }

    if market.is_team_market() && !has(&leg.team_id) {
        return Err(ValidationError::MissingTeam { group, leg: index, market });
    }

    if market.requires_qualifier() {
        let line_ok = leg.threshold.is_some_and(|t| t.is_finite() && t > 0.0);
        if leg.qualifier.is_none() || !line_ok {
            return Err(ValidationError::MissingQualifier { group, leg: index, market });
        }
    }

    if market.is_spread_market() {
        let line_ok = leg.threshold.is_some_and(f64::is_finite);
        if leg.qualifier.is_some() || !line_ok {
            return Err(ValidationError::InvalidSpread { group, leg: index, market });
        }
    }

    Ok(())
}

/// Derivation stage: build the stored bet from validated input
pub fn derive_bet(
    validated: &ValidatedBet,
    identity: BetIdentity,
    refs: &ReferenceData,
) -> Result<Bet, ValidationError> {
    let leg_groups = validated
        .groups
        .iter()
        .enumerate()
        .map(|(index, group)| derive_group(index, group, refs))
        .collect::<Result<Vec<_>, _>>()?;

    let mut bet = Bet {
        id: identity.id,
        user_id: identity.user_id,
        wager: validated.wager,
        payout: 0.0,
        odds: 1.0,
        result: BetResult::Pending,
        bet_type: BetType::Straight,
        date: identity.created_at,
        is_bonus_bet: validated.modifiers.is_bonus_bet,
        boost_percentage: validated.modifiers.boost_percentage,
        is_no_sweat: validated.modifiers.is_no_sweat,
        sportsbook: validated.sportsbook,
        leg_groups,
        created_at: identity.created_at,
    };
    refresh_derived_fields(&mut bet);

    Ok(bet)
}

fn derive_group(
    index: usize,
    group: &ValidatedGroup,
    refs: &ReferenceData,
) -> Result<LegGroup, ValidationError> {
    let game = refs
        .games
        .get(&group.game_id)
        .ok_or_else(|| ValidationError::UnknownGame(group.game_id.clone()))?;

    let away = refs.team_name(&game.away_team_id).unwrap_or(&game.away_team_id);
    let home = refs.team_name(&game.home_team_id).unwrap_or(&game.home_team_id);
    let event_name = format!("{} @ {}", away, home);

    let legs = group
        .legs
        .iter()
        .enumerate()
        .map(|(leg_index, draft)| {
            if !draft.market.is_offered_in(game.league) {
                return Err(ValidationError::MarketNotInLeague {
                    group: index + 1,
                    leg: leg_index + 1,
                    market: draft.market,
                    league: game.league,
                });
            }

            let player_name = match draft.player_id.as_deref() {
                Some(id) => Some(
                    refs.players
                        .get(id)
                        .map(|p| p.full_name.as_str())
                        .ok_or_else(|| ValidationError::UnknownPlayer(id.to_string()))?,
                ),
                None => None,
            };
            let team_name = match draft.team_id.as_deref() {
                Some(id) => Some(
                    refs.team_name(id)
                        .ok_or_else(|| ValidationError::UnknownTeam(id.to_string()))?,
                ),
                None => None,
            };

            let description = match draft.description.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => format_market_display(
                    draft.market,
                    player_name,
                    team_name,
                    draft.qualifier,
                    draft.threshold,
                ),
            };

            Ok(Leg {
                result: draft.result,
                league: game.league,
                market: draft.market,
                player_id: draft.player_id.clone(),
                team_id: draft.team_id.clone(),
                qualifier: draft.qualifier,
                threshold: draft.threshold,
                game_id: game.id.clone(),
                description,
                event_name: event_name.clone(),
                odds: None,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LegGroup {
        order_index: index as u32,
        odds: group.odds,
        game_id: game.id.clone(),
        event_date: game.start_time,
        legs,
    })
}

/// Classify a bet from the shape of its leg groups
pub fn classify_bet_type(groups: &[LegGroup]) -> BetType {
    match groups {
        [] => BetType::Straight,
        [only] if only.legs.len() <= 1 => BetType::Straight,
        [_] => BetType::SameGameParlay,
        [first, rest @ ..] if rest.iter().all(|g| g.game_id == first.game_id) => {
            BetType::SameGameParlayPlus
        }
        _ => BetType::Parlay,
    }
}

/// Recompute result, odds, payout, bet type and date from the leg groups
pub fn refresh_derived_fields(bet: &mut Bet) {
    bet.result = calculate_bet_result(bet.legs().map(|leg| leg.result));
    bet.odds = calculate_bet_odds_from_groups(&bet.leg_groups);
    bet.payout = calculate_payout(
        bet.wager,
        bet.odds,
        &PayoutModifiers {
            is_bonus_bet: bet.is_bonus_bet,
            boost_percentage: bet.boost_percentage,
            is_no_sweat: bet.is_no_sweat,
        },
    );
    bet.bet_type = classify_bet_type(&bet.leg_groups);
    if let Some(latest) = bet.leg_groups.iter().map(|g| g.event_date).max() {
        bet.date = latest;
    }
}

/// Record a single leg's result and re-derive the bet
/// `group` and `leg` are 1-based, as shown to the user
pub fn settle_leg(
    bet: &mut Bet,
    group: usize,
    leg: usize,
    result: BetResult,
) -> Result<(), ValidationError> {
    let target = group
        .checked_sub(1)
        .and_then(|g| bet.leg_groups.get_mut(g))
        .and_then(|g| leg.checked_sub(1).and_then(|l| g.legs.get_mut(l)))
        .ok_or(ValidationError::UnknownLeg { group, leg })?;

    target.result = result;
    refresh_derived_fields(bet);
    Ok(())
}
