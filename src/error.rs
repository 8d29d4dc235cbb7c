use crate::models::{League, Market};
use thiserror::Error;

/// Odds parsing and conversion failures
#[derive(Debug, Error, PartialEq)]
pub enum OddsError {
    #[error("invalid American odds: {0:?}")]
    InvalidAmerican(String),

    #[error("American odds cannot be zero")]
    ZeroAmerican,

    #[error("invalid decimal odds: {0:?}")]
    InvalidDecimal(String),

    #[error("decimal odds {0} have no American equivalent")]
    NoAmericanEquivalent(f64),
}

/// Reasons a bet form is rejected before derivation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("wager must be a positive amount, got {0}")]
    InvalidWager(f64),

    #[error("boost percentage must be between 0 and 100, got {0}")]
    InvalidBoost(u8),

    #[error("a bet needs at least one event")]
    NoLegGroups,

    #[error("event {group} has no legs")]
    EmptyLegGroup { group: usize },

    #[error("event {group} odds: {source}")]
    GroupOdds {
        group: usize,
        #[source]
        source: OddsError,
    },

    #[error("event {group} leg {leg}: {market} needs a player")]
    MissingPlayer { group: usize, leg: usize, market: Market },

    #[error("event {group} leg {leg}: {market} needs a team")]
    MissingTeam { group: usize, leg: usize, market: Market },

    #[error("event {group} leg {leg}: {market} needs over/under and a positive line")]
    MissingQualifier { group: usize, leg: usize, market: Market },

    #[error("event {group} leg {leg}: {market} takes a signed line and no over/under")]
    InvalidSpread { group: usize, leg: usize, market: Market },

    #[error("event {group} leg {leg}: {market} is not offered for {league}")]
    MarketNotInLeague {
        group: usize,
        leg: usize,
        market: Market,
        league: League,
    },

    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("event {group} leg {leg} does not exist")]
    UnknownLeg { group: usize, leg: usize },
}

/// Lookups that found nothing for the acting user
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("bet {0} not found")]
    BetNotFound(String),
}
