pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::store::{BetQuery, BetStore, JsonFileStore};
pub use config::AppConfig;
pub use error::{OddsError, StoreError, ValidationError};
pub use models::*;
pub use utils::*;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utils::analytics::{compute_analytics, AnalyticsSnapshot};
use utils::bet_form::{
    derive_bet, validate_draft, BetDraft, BetIdentity, LegGroupDraft, ReferenceData, ValidatedBet,
};
use utils::coach::{generate_insights, Insight};
use utils::date_range::DateRange;

/// Filter selection on the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardFilters {
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub league: Option<League>,
    #[serde(default)]
    pub sportsbook: Option<Sportsbook>,
}

impl DashboardFilters {
    /// Resolve the date range against the calendar day of `now` in
    /// `timezone` into a store query
    pub fn to_query(&self, now: DateTime<Utc>, timezone: FixedOffset) -> BetQuery {
        let today = now.with_timezone(&timezone).date_naive();
        BetQuery {
            window: self.date_range.resolve(today),
            timezone,
            league: self.league,
            sportsbook: self.sportsbook,
        }
    }
}

/// All the data the dashboard displays
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub filters: DashboardFilters,
    pub analytics: AnalyticsSnapshot,
    pub insights: Vec<Insight>,
}

/// Load a user's bets for the filters and aggregate them
/// Date windows and daily profit use calendar days in `timezone`
pub async fn load_dashboard<S>(
    store: &S,
    user_id: &str,
    filters: DashboardFilters,
    now: DateTime<Utc>,
    timezone: FixedOffset,
) -> Result<Dashboard>
where
    S: BetStore + ?Sized,
{
    let bets = store
        .find_bets_for_user(user_id, &filters.to_query(now, timezone))
        .await
        .context("Failed to load bets")?;

    info!(
        user_id,
        bets = bets.len(),
        range = %filters.date_range,
        "Computing dashboard analytics"
    );

    let analytics = compute_analytics(&bets, timezone);
    let insights = generate_insights(&analytics);

    Ok(Dashboard {
        filters,
        analytics,
        insights,
    })
}

/// Fetch every game, team and player a validated draft refers to
async fn resolve_references<S>(store: &S, validated: &ValidatedBet) -> Result<ReferenceData>
where
    S: BetStore + ?Sized,
{
    let mut refs = ReferenceData::default();
    let mut team_ids: Vec<String> = validated.team_ids().into_iter().map(String::from).collect();

    for game_id in validated.game_ids() {
        let game = store
            .find_game_by_id(game_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownGame(game_id.to_string()))?;
        team_ids.push(game.home_team_id.clone());
        team_ids.push(game.away_team_id.clone());
        refs.add_game(game);
    }

    for player_id in validated.player_ids() {
        let player = store
            .find_player_by_id(player_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownPlayer(player_id.to_string()))?;
        refs.add_player(player);
    }

    team_ids.sort();
    team_ids.dedup();
    for team_id in team_ids {
        // Game teams without a record fall back to their id in event names
        if let Some(team) = store.find_team_by_id(&team_id).await? {
            refs.add_team(team);
        }
    }

    Ok(refs)
}

/// Validate a draft, derive the bet and store it
pub async fn create_bet<S>(
    store: &S,
    user_id: &str,
    draft: &BetDraft,
    now: DateTime<Utc>,
) -> Result<Bet>
where
    S: BetStore + ?Sized,
{
    let validated = validate_draft(draft).map_err(|e| {
        warn!(user_id, error = %e, "Rejected bet draft");
        e
    })?;

    let refs = resolve_references(store, &validated).await?;
    let identity = BetIdentity {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        created_at: now,
    };
    let bet = derive_bet(&validated, identity, &refs)?;

    store.insert_bet(bet.clone()).await.context("Failed to save bet")?;
    info!(
        user_id,
        bet_id = %bet.id,
        bet_type = bet.bet_type.label(),
        odds = bet.odds,
        "Created bet"
    );

    Ok(bet)
}

async fn find_owned_bet<S>(store: &S, user_id: &str, bet_id: &str) -> Result<Bet>
where
    S: BetStore + ?Sized,
{
    store
        .find_bet(user_id, bet_id)
        .await?
        .ok_or_else(|| StoreError::BetNotFound(bet_id.to_string()).into())
}

/// Replace all leg groups of a bet and re-derive everything from them
/// Id, owner, creation time, stake and modifiers are kept
pub async fn replace_leg_groups<S>(
    store: &S,
    user_id: &str,
    bet_id: &str,
    groups: &[LegGroupDraft],
    odds_format: OddsFormat,
) -> Result<Bet>
where
    S: BetStore + ?Sized,
{
    let existing = find_owned_bet(store, user_id, bet_id).await?;
    let validated = ValidatedBet::for_existing(&existing, groups, odds_format)?;
    let refs = resolve_references(store, &validated).await?;

    let bet = derive_bet(
        &validated,
        BetIdentity {
            id: existing.id,
            user_id: existing.user_id,
            created_at: existing.created_at,
        },
        &refs,
    )?;

    store.update_bet(bet.clone()).await?;
    info!(user_id, bet_id, groups = bet.leg_groups.len(), "Replaced leg groups");
    Ok(bet)
}

/// Set a bet's overall result directly; legs and payout are left as they are
pub async fn override_bet_result<S>(
    store: &S,
    user_id: &str,
    bet_id: &str,
    result: BetResult,
) -> Result<Bet>
where
    S: BetStore + ?Sized,
{
    let mut bet = find_owned_bet(store, user_id, bet_id).await?;
    debug!(bet_id, from = %bet.result, to = %result, "Overriding bet result");
    bet.result = result;

    store.update_bet(bet.clone()).await?;
    info!(user_id, bet_id, result = %result, "Overrode bet result");
    Ok(bet)
}

/// Record one leg's result (1-based group and leg) and re-derive the bet
pub async fn settle_leg<S>(
    store: &S,
    user_id: &str,
    bet_id: &str,
    group: usize,
    leg: usize,
    result: BetResult,
) -> Result<Bet>
where
    S: BetStore + ?Sized,
{
    let mut bet = find_owned_bet(store, user_id, bet_id).await?;
    utils::bet_form::settle_leg(&mut bet, group, leg, result)?;

    store.update_bet(bet.clone()).await?;
    info!(user_id, bet_id, group, leg, bet_result = %bet.result, "Settled leg");
    Ok(bet)
}

pub async fn delete_bet<S>(store: &S, user_id: &str, bet_id: &str) -> Result<()>
where
    S: BetStore + ?Sized,
{
    if !store.delete_bet(user_id, bet_id).await? {
        return Err(StoreError::BetNotFound(bet_id.to_string()).into());
    }
    info!(user_id, bet_id, "Deleted bet");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::bet_form::LegDraft;
    use crate::utils::data::Dataset;
    use chrono::{Offset, TimeZone};

    /// Two NBA games with their teams and one player
    pub(crate) fn reference_dataset() -> Dataset {
        let team = |id: &str, name: &str| Team {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: Some(id.to_uppercase()),
            league: League::Nba,
        };
        let game = |id: &str, home: &str, away: &str, day: u32| Game {
            id: id.to_string(),
            league: League::Nba,
            home_team_id: home.to_string(),
            away_team_id: away.to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 3, day, 0, 30, 0).unwrap(),
            external_event_id: None,
        };

        Dataset {
            bets: Vec::new(),
            games: vec![game("g1", "lal", "bos", 8), game("g2", "mia", "den", 9)],
            teams: vec![
                team("lal", "Lakers"),
                team("bos", "Celtics"),
                team("mia", "Heat"),
                team("den", "Nuggets"),
            ],
            players: vec![Player {
                id: "reaves".to_string(),
                full_name: "Austin Reaves".to_string(),
                position: Some("G".to_string()),
                team_id: "lal".to_string(),
            }],
        }
    }

    pub(crate) fn moneyline_draft(game_id: &str, team_id: &str, odds: &str) -> BetDraft {
        BetDraft {
            wager: 10.0,
            odds_format: OddsFormat::Decimal,
            is_bonus_bet: false,
            boost_percentage: None,
            is_no_sweat: false,
            sportsbook: Some(Sportsbook::Fanduel),
            groups: vec![LegGroupDraft {
                game_id: game_id.to_string(),
                odds: odds.to_string(),
                legs: vec![LegDraft {
                    market: Market::Moneyline,
                    player_id: None,
                    team_id: Some(team_id.to_string()),
                    qualifier: None,
                    threshold: None,
                    description: None,
                    result: BetResult::Pending,
                }],
            }],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_bet_derives_and_stores() {
        let store = JsonFileStore::in_memory(reference_dataset());
        let bet = create_bet(&store, "local", &moneyline_draft("g1", "lal", "2.5"), now())
            .await
            .unwrap();

        assert_eq!(bet.user_id, "local");
        assert_eq!(bet.leg_groups[0].legs[0].event_name, "Celtics @ Lakers");
        assert!((bet.payout - 25.0).abs() < 1e-9);

        let stored = store.find_bet("local", &bet.id).await.unwrap().unwrap();
        assert_eq!(stored.leg_groups[0].legs[0].description, "Lakers Moneyline");
    }

    #[tokio::test]
    async fn test_create_bet_rejects_unknown_game() {
        let store = JsonFileStore::in_memory(reference_dataset());
        let err = create_bet(&store, "local", &moneyline_draft("g9", "lal", "2.5"), now())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownGame("g9".to_string()))
        );
        assert!(store.snapshot().await.bets.is_empty());
    }

    #[tokio::test]
    async fn test_settle_then_override_then_delete() {
        let store = JsonFileStore::in_memory(reference_dataset());
        let bet = create_bet(&store, "local", &moneyline_draft("g1", "lal", "1.8"), now())
            .await
            .unwrap();

        let settled = settle_leg(&store, "local", &bet.id, 1, 1, BetResult::Win)
            .await
            .unwrap();
        assert_eq!(settled.result, BetResult::Win);

        let overridden = override_bet_result(&store, "local", &bet.id, BetResult::Void)
            .await
            .unwrap();
        assert_eq!(overridden.result, BetResult::Void);
        assert_eq!(overridden.leg_groups[0].legs[0].result, BetResult::Win);
        assert!((overridden.payout - 18.0).abs() < 1e-9);

        // Another user cannot touch it
        let err = delete_bet(&store, "someone-else", &bet.id).await.unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());

        delete_bet(&store, "local", &bet.id).await.unwrap();
        assert!(store.find_bet("local", &bet.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_leg_groups_rederives() {
        let store = JsonFileStore::in_memory(reference_dataset());
        let bet = create_bet(&store, "local", &moneyline_draft("g1", "lal", "2.0"), now())
            .await
            .unwrap();

        let mut groups = moneyline_draft("g1", "lal", "2.0").groups;
        groups.extend(moneyline_draft("g2", "mia", "1.5").groups);
        let updated = replace_leg_groups(&store, "local", &bet.id, &groups, OddsFormat::Decimal)
            .await
            .unwrap();

        assert_eq!(updated.id, bet.id);
        assert_eq!(updated.created_at, bet.created_at);
        assert_eq!(updated.bet_type, BetType::Parlay);
        assert!((updated.odds - 3.0).abs() < 1e-9);
        assert_eq!(updated.leg_groups[1].legs[0].event_name, "Nuggets @ Heat");
    }

    #[tokio::test]
    async fn test_load_dashboard_applies_filters() {
        let store = JsonFileStore::in_memory(reference_dataset());
        let first = create_bet(&store, "local", &moneyline_draft("g1", "lal", "2.0"), now())
            .await
            .unwrap();
        create_bet(&store, "local", &moneyline_draft("g2", "mia", "2.0"), now())
            .await
            .unwrap();
        settle_leg(&store, "local", &first.id, 1, 1, BetResult::Win)
            .await
            .unwrap();

        let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let dashboard =
            load_dashboard(&store, "local", DashboardFilters::default(), as_of, Utc.fix())
                .await
                .unwrap();
        assert_eq!(dashboard.analytics.summary.total_bets, 2);
        assert_eq!(dashboard.analytics.summary.wins, 1);
        assert!((dashboard.analytics.summary.net_profit - 10.0).abs() < 1e-9);
        assert!(!dashboard.insights.is_empty());

        let filters = DashboardFilters {
            sportsbook: Some(Sportsbook::Draftkings),
            ..Default::default()
        };
        let dashboard = load_dashboard(&store, "local", filters, as_of, Utc.fix())
            .await
            .unwrap();
        assert_eq!(dashboard.analytics.summary.total_bets, 0);
    }

    #[tokio::test]
    async fn test_load_dashboard_uses_user_calendar_days() {
        let store = JsonFileStore::in_memory(reference_dataset());
        // g2 tips off at 7:30pm Eastern on March 8th
        let bet = create_bet(&store, "local", &moneyline_draft("g2", "mia", "2.0"), now())
            .await
            .unwrap();
        settle_leg(&store, "local", &bet.id, 1, 1, BetResult::Win)
            .await
            .unwrap();
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();

        let all_time = DashboardFilters {
            date_range: DateRange::All,
            ..Default::default()
        };
        let dashboard = load_dashboard(&store, "local", all_time, now(), eastern)
            .await
            .unwrap();
        assert_eq!(
            dashboard.analytics.profit_by_date[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        );

        // Same evening, a few hours later: still game day for the user
        let later = Utc.with_ymd_and_hms(2024, 3, 9, 3, 0, 0).unwrap();
        let week = DashboardFilters {
            date_range: DateRange::Last7Days,
            ..Default::default()
        };
        let dashboard = load_dashboard(&store, "local", week.clone(), later, eastern)
            .await
            .unwrap();
        assert_eq!(dashboard.analytics.summary.total_bets, 1);

        // Seven local days on, March 8th has dropped out of the window
        let next_week = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let dashboard = load_dashboard(&store, "local", week, next_week, eastern)
            .await
            .unwrap();
        assert_eq!(dashboard.analytics.summary.total_bets, 0);
    }
}
