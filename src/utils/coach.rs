use crate::models::{BetType, League};
use crate::utils::analytics::AnalyticsSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;

pub const MAX_INSIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    ColdLeague,
    HotMarket,
    ParlayDrag,
    LowWinRate,
    BookDisparity,
    PositiveReinforcement,
    KeepTracking,
    Tip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, message: String) -> Self {
        Self { kind, message }
    }
}

const KEEP_TRACKING: &str =
    "Keep tracking your bets to unlock personalized insights about your strengths and weaknesses.";

const STATIC_TIPS: [&str; 2] = [
    "Set a fixed bankroll and only wager a small percentage of it (1-5%) per bet.",
    "Shop for the best odds across sportsbooks before placing a bet. The same market often pays more elsewhere.",
];

type Rule = fn(&AnalyticsSnapshot) -> Option<Insight>;

/// Evaluated in priority order
const RULES: [Rule; 6] = [
    cold_league,
    hot_market,
    parlay_drag,
    low_win_rate,
    book_disparity,
    positive_reinforcement,
];

/// Stake-weighted totals for a slice of the bet history
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    profit: f64,
    staked: f64,
    bets: usize,
}

impl Totals {
    fn add(&mut self, profit: f64, staked: f64, bets: usize) {
        self.profit += profit;
        self.staked += staked;
        self.bets += bets;
    }

    fn roi(&self) -> f64 {
        if self.staked > 0.0 {
            self.profit / self.staked * 100.0
        } else {
            0.0
        }
    }
}

fn league_totals(snapshot: &AnalyticsSnapshot) -> BTreeMap<League, Totals> {
    let mut leagues: BTreeMap<League, Totals> = BTreeMap::new();
    for row in &snapshot.by_sport_bet_type {
        leagues
            .entry(row.league)
            .or_default()
            .add(row.profit, row.staked, row.bet_count);
    }
    leagues
}

fn cold_league(snapshot: &AnalyticsSnapshot) -> Option<Insight> {
    let leagues = league_totals(snapshot);

    let (cold, totals) = leagues
        .iter()
        .find(|(_, totals)| totals.roi() < -20.0 && totals.bets >= 20)?;

    let alternative = leagues
        .iter()
        .filter(|(_, totals)| totals.roi() > 0.0)
        .max_by(|a, b| {
            a.1.roi()
                .partial_cmp(&b.1.roi())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(league, _)| format!(" or focusing on {}", league))
        .unwrap_or_default();

    Some(Insight::new(
        InsightKind::ColdLeague,
        format!(
            "You're cold on {} lately ({:.1}% ROI over {} bets). Consider lowering your stakes{}.",
            cold,
            totals.roi(),
            totals.bets,
            alternative
        ),
    ))
}

fn hot_market(snapshot: &AnalyticsSnapshot) -> Option<Insight> {
    let market = snapshot
        .best_markets
        .iter()
        .find(|m| m.roi > 20.0 && m.bet_count >= 10)?;

    Some(Insight::new(
        InsightKind::HotMarket,
        format!(
            "You're dialed in on {} {} ({:.1}% ROI, {}). Maybe prioritize those while you're hot.",
            market.league,
            market.market.label(),
            market.roi,
            market.record()
        ),
    ))
}

fn parlay_drag(snapshot: &AnalyticsSnapshot) -> Option<Insight> {
    let mut parlays = Totals::default();
    let mut straights = Totals::default();

    for row in &snapshot.by_sport_bet_type {
        if row.bet_type == BetType::Straight {
            straights.add(row.profit, row.staked, row.bet_count);
        } else {
            parlays.add(row.profit, row.staked, row.bet_count);
        }
    }

    if parlays.bets < 10 || parlays.roi() >= -30.0 || straights.roi() <= 0.0 {
        return None;
    }

    Some(Insight::new(
        InsightKind::ParlayDrag,
        format!(
            "Your parlays are dragging you down ({:.1}% ROI vs {:.1}% on straights). Try limiting parlays or keeping them to small stakes.",
            parlays.roi(),
            straights.roi()
        ),
    ))
}

fn low_win_rate(snapshot: &AnalyticsSnapshot) -> Option<Insight> {
    let summary = &snapshot.summary;
    if summary.wins + summary.losses < 30 || summary.win_rate >= 45.0 {
        return None;
    }

    Some(Insight::new(
        InsightKind::LowWinRate,
        format!(
            "Your win rate is {:.1}%, below break-even for most odds. Consider focusing on your strongest markets.",
            summary.win_rate
        ),
    ))
}

fn book_disparity(snapshot: &AnalyticsSnapshot) -> Option<Insight> {
    // by_book is sorted by ROI, best first
    let (best, worst) = match snapshot.by_book.as_slice() {
        [best, .., worst] => (best, worst),
        _ => return None,
    };

    if best.roi - worst.roi < 15.0 || best.bet_count < 5 || worst.bet_count < 5 {
        return None;
    }

    Some(Insight::new(
        InsightKind::BookDisparity,
        format!(
            "You perform better at {} ({:.1}% ROI) than at {} ({:.1}% ROI).",
            best.sportsbook.label(),
            best.roi,
            worst.sportsbook.label(),
            worst.roi
        ),
    ))
}

fn positive_reinforcement(snapshot: &AnalyticsSnapshot) -> Option<Insight> {
    let summary = &snapshot.summary;
    if summary.total_bets < 20 || summary.roi <= 10.0 {
        return None;
    }

    Some(Insight::new(
        InsightKind::PositiveReinforcement,
        format!(
            "Great work! You're up {:.1}% overall. Keep doing what you're doing.",
            summary.roi
        ),
    ))
}

/// Coaching notes for a snapshot, at most four
/// Rule hits come first in priority order, then static tips fill any room left
pub fn generate_insights(snapshot: &AnalyticsSnapshot) -> Vec<Insight> {
    let mut insights: Vec<Insight> = Vec::with_capacity(MAX_INSIGHTS);

    for rule in RULES {
        if insights.len() >= MAX_INSIGHTS {
            break;
        }
        if let Some(insight) = rule(snapshot) {
            insights.push(insight);
        }
    }

    if insights.is_empty() {
        insights.push(Insight::new(InsightKind::KeepTracking, KEEP_TRACKING.to_string()));
    }

    for tip in STATIC_TIPS {
        if insights.len() >= MAX_INSIGHTS {
            break;
        }
        insights.push(Insight::new(InsightKind::Tip, tip.to_string()));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetResult, Market, Sportsbook};
    use crate::utils::analytics::tests::{utc, BetBuilder};
    use crate::utils::analytics::{
        compute_analytics, BookPerformance, MarketPerformance, SportBetTypeBreakdown,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn kinds(insights: &[Insight]) -> Vec<InsightKind> {
        insights.iter().map(|i| i.kind).collect()
    }

    fn row(league: League, bet_type: BetType, profit: f64, staked: f64, bet_count: usize) -> SportBetTypeBreakdown {
        SportBetTypeBreakdown {
            league,
            bet_type,
            profit,
            staked,
            roi: profit / staked * 100.0,
            bet_count,
        }
    }

    fn book(sportsbook: Sportsbook, roi: f64, bet_count: usize) -> BookPerformance {
        BookPerformance {
            sportsbook,
            profit: roi,
            staked: 100.0,
            roi,
            bet_count,
        }
    }

    #[test]
    fn test_small_losing_history_gets_generic_notes() {
        // 25 straight bets, 15 losses, 5% down, one sportsbook
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap();
        let bets: Vec<_> = (0..25)
            .map(|i| {
                let date = start + Duration::days(i);
                if i < 10 {
                    BetBuilder::new(&i.to_string(), 10.0, BetResult::Win, date)
                        .payout(23.75)
                        .build()
                } else {
                    BetBuilder::new(&i.to_string(), 10.0, BetResult::Loss, date).build()
                }
            })
            .collect();

        let snapshot = compute_analytics(&bets, utc());
        assert!((snapshot.summary.roi - -5.0).abs() < 1e-9);

        let insights = generate_insights(&snapshot);
        assert_eq!(
            kinds(&insights),
            vec![InsightKind::KeepTracking, InsightKind::Tip, InsightKind::Tip]
        );
        assert!(insights[1].message.contains("bankroll"));
        assert!(insights[2].message.contains("best odds"));
    }

    #[test]
    fn test_rules_fire_in_priority_order_and_cap_at_four() {
        let mut snapshot = compute_analytics(&[], utc());
        snapshot.by_sport_bet_type = vec![
            row(League::Nfl, BetType::Straight, 50.0, 200.0, 20),
            row(League::Nba, BetType::Parlay, -150.0, 300.0, 30),
        ];
        snapshot.best_markets = vec![MarketPerformance {
            league: League::Nfl,
            market: Market::PlayerReceivingYards,
            profit: 36.0,
            roi: 30.0,
            wins: 8,
            losses: 4,
            bet_count: 12,
        }];
        snapshot.summary.wins = 12;
        snapshot.summary.losses = 18;
        snapshot.summary.win_rate = 40.0;
        snapshot.by_book = vec![
            book(Sportsbook::Fanduel, 20.0, 6),
            book(Sportsbook::Draftkings, -10.0, 6),
        ];

        let insights = generate_insights(&snapshot);
        assert_eq!(
            kinds(&insights),
            vec![
                InsightKind::ColdLeague,
                InsightKind::HotMarket,
                InsightKind::ParlayDrag,
                InsightKind::LowWinRate,
            ]
        );
        assert!(insights[0].message.contains("cold on NBA"));
        assert!(insights[0].message.contains("focusing on NFL"));
        assert!(insights[2].message.contains("-50.0% ROI vs 25.0%"));
    }

    #[test]
    fn test_cold_league_uses_stake_weighted_roi() {
        let mut snapshot = compute_analytics(&[], utc());
        // Big losing parlay stakes outweigh many small straight wins
        snapshot.by_sport_bet_type = vec![
            row(League::Nba, BetType::Straight, 15.0, 150.0, 15),
            row(League::Nba, BetType::Parlay, -300.0, 500.0, 5),
        ];

        let insights = generate_insights(&snapshot);
        assert_eq!(insights[0].kind, InsightKind::ColdLeague);
        assert!(insights[0].message.contains("(-43.8% ROI over 20 bets)"));
        assert!(!insights[0].message.contains("focusing on"));
    }

    #[test]
    fn test_book_disparity_needs_samples_on_both_books() {
        let mut snapshot = compute_analytics(&[], utc());
        snapshot.by_book = vec![
            book(Sportsbook::Fanduel, 20.0, 6),
            book(Sportsbook::Caesars, 0.0, 9),
            book(Sportsbook::Draftkings, -10.0, 4),
        ];
        assert_eq!(generate_insights(&snapshot)[0].kind, InsightKind::KeepTracking);

        snapshot.by_book[2].bet_count = 5;
        let insights = generate_insights(&snapshot);
        assert_eq!(insights[0].kind, InsightKind::BookDisparity);
        assert_eq!(
            insights[0].message,
            "You perform better at FanDuel (20.0% ROI) than at DraftKings (-10.0% ROI)."
        );
    }

    #[test]
    fn test_positive_reinforcement_pads_with_tips() {
        let mut snapshot = compute_analytics(&[], utc());
        snapshot.summary.total_bets = 20;
        snapshot.summary.roi = 12.5;

        let insights = generate_insights(&snapshot);
        assert_eq!(
            kinds(&insights),
            vec![
                InsightKind::PositiveReinforcement,
                InsightKind::Tip,
                InsightKind::Tip
            ]
        );
        assert!(insights[0].message.contains("12.5%"));
    }

    #[test]
    fn test_empty_snapshot_never_exceeds_cap() {
        let insights = generate_insights(&compute_analytics(&[], utc()));
        assert!(insights.len() <= MAX_INSIGHTS);
        assert_eq!(insights[0].kind, InsightKind::KeepTracking);
    }
}
