use crate::models::{Bet, BetResult, BetType, League, Market, Sportsbook};
use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Markets need this many attributed legs to appear in best/worst lists
pub const MIN_MARKET_LEGS: usize = 3;
const MARKET_LIST_LEN: usize = 5;
const RECENT_BETS_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookProfit {
    pub sportsbook: Sportsbook,
    pub profit: f64,
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_wagered: f64,
    pub total_payout: f64,
    pub net_profit: f64,
    pub roi: f64,
    pub win_rate: f64,
    pub avg_odds: f64,
    pub avg_stake: f64,
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub pending: usize,
    pub voids: usize,
    pub best_book: Option<BookProfit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitByDate {
    pub date: NaiveDate,
    pub daily_profit: f64,
    pub cumulative_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportBetTypeBreakdown {
    pub league: League,
    pub bet_type: BetType,
    pub profit: f64,
    pub staked: f64,
    pub roi: f64,
    pub bet_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPerformance {
    pub league: League,
    pub market: Market,
    pub profit: f64,
    /// Profit per decided leg, as a percentage
    pub roi: f64,
    pub wins: usize,
    pub losses: usize,
    /// Legs attributed, voids included
    pub bet_count: usize,
}

impl MarketPerformance {
    /// "W-L"
    pub fn record(&self) -> String {
        format!("{}-{}", self.wins, self.losses)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookPerformance {
    pub sportsbook: Sportsbook,
    pub profit: f64,
    pub staked: f64,
    pub roi: f64,
    pub bet_count: usize,
}

/// Everything the dashboard shows for one filter selection
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub summary: SummaryStats,
    pub profit_by_date: Vec<ProfitByDate>,
    pub by_sport_bet_type: Vec<SportBetTypeBreakdown>,
    pub best_markets: Vec<MarketPerformance>,
    pub worst_markets: Vec<MarketPerformance>,
    pub by_book: Vec<BookPerformance>,
    pub recent_bets: Vec<Bet>,
}

/// Single-item callouts shown above the charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlights {
    pub best_market: Option<MarketPerformance>,
    pub worst_market: Option<MarketPerformance>,
    pub best_book: Option<BookPerformance>,
}

impl AnalyticsSnapshot {
    /// Best market over at least 5 legs, worst market over at least 3 legs,
    /// top book over at least 5 bets
    pub fn highlights(&self) -> Highlights {
        Highlights {
            best_market: self.best_markets.first().filter(|m| m.bet_count >= 5).cloned(),
            worst_market: self
                .worst_markets
                .first()
                .filter(|m| m.bet_count >= MIN_MARKET_LEGS)
                .cloned(),
            best_book: self.by_book.first().filter(|b| b.bet_count >= 5).cloned(),
        }
    }
}

fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Aggregate a user's bets (newest first) into the dashboard snapshot
/// Pending and void bets are counted but stay out of profit, ROI and win rate
/// Daily profit is bucketed by calendar date in `timezone`
pub fn compute_analytics(bets: &[Bet], timezone: FixedOffset) -> AnalyticsSnapshot {
    let settled: Vec<&Bet> = bets.iter().filter(|bet| bet.result.is_decided()).collect();

    let by_book = book_performance(&settled);

    AnalyticsSnapshot {
        summary: summarize(bets, &settled),
        profit_by_date: profit_by_date(&settled, timezone),
        by_sport_bet_type: by_sport_bet_type(&settled),
        best_markets: best_markets(&settled),
        worst_markets: worst_markets(&settled),
        by_book,
        recent_bets: bets.iter().take(RECENT_BETS_LEN).cloned().collect(),
    }
}

fn summarize(bets: &[Bet], settled: &[&Bet]) -> SummaryStats {
    let count_of = |result: BetResult| bets.iter().filter(|bet| bet.result == result).count();

    let total_wagered: f64 = settled.iter().map(|bet| bet.wager).sum();
    let total_payout: f64 = settled
        .iter()
        .filter(|bet| bet.result == BetResult::Win)
        .map(|bet| bet.payout)
        .sum();
    let net_profit = total_payout - total_wagered;

    let wins = count_of(BetResult::Win);
    let losses = count_of(BetResult::Loss);

    let (avg_odds, avg_stake) = if settled.is_empty() {
        (0.0, 0.0)
    } else {
        let n = settled.len() as f64;
        let total_odds: f64 = settled.iter().map(|bet| bet.odds).sum();
        (total_odds / n, total_wagered / n)
    };

    SummaryStats {
        total_wagered,
        total_payout,
        net_profit,
        roi: percent(net_profit, total_wagered),
        win_rate: percent(wins as f64, (wins + losses) as f64),
        avg_odds,
        avg_stake,
        total_bets: bets.len(),
        wins,
        losses,
        pending: count_of(BetResult::Pending),
        voids: count_of(BetResult::Void),
        best_book: best_book(settled),
    }
}

/// Book with the highest net profit; on a tie the first book in table order
fn best_book(settled: &[&Bet]) -> Option<BookProfit> {
    let mut profits: BTreeMap<Sportsbook, f64> = BTreeMap::new();
    for bet in settled {
        if let Some(book) = bet.sportsbook {
            *profits.entry(book).or_default() += bet.profit();
        }
    }

    profits
        .into_iter()
        .fold(None, |best: Option<BookProfit>, (sportsbook, profit)| match best {
            Some(current) if current.profit >= profit => Some(current),
            _ => Some(BookProfit { sportsbook, profit }),
        })
}

fn profit_by_date(settled: &[&Bet], timezone: FixedOffset) -> Vec<ProfitByDate> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for bet in settled {
        let date = bet.date.with_timezone(&timezone).date_naive();
        *daily.entry(date).or_default() += bet.profit();
    }

    let mut cumulative = 0.0;
    daily
        .into_iter()
        .map(|(date, daily_profit)| {
            cumulative += daily_profit;
            ProfitByDate {
                date,
                daily_profit,
                cumulative_profit: cumulative,
            }
        })
        .collect()
}

fn by_sport_bet_type(settled: &[&Bet]) -> Vec<SportBetTypeBreakdown> {
    let mut groups: BTreeMap<(League, BetType), (f64, f64, usize)> = BTreeMap::new();

    for bet in settled {
        let Some(league) = bet.primary_league() else {
            continue;
        };
        let entry = groups.entry((league, bet.bet_type)).or_default();
        entry.0 += bet.profit();
        entry.1 += bet.wager;
        entry.2 += 1;
    }

    let mut breakdown: Vec<SportBetTypeBreakdown> = groups
        .into_iter()
        .map(|((league, bet_type), (profit, staked, bet_count))| SportBetTypeBreakdown {
            league,
            bet_type,
            profit,
            staked,
            roi: percent(profit, staked),
            bet_count,
        })
        .collect();

    breakdown.sort_by(|a, b| descending(a.profit, b.profit));
    breakdown
}

/// Per-market performance over every leg of every settled bet
/// Each leg gets an even share of its bet's profit; a pending leg is graded
/// by the bet's overall result
pub fn market_performance(settled: &[&Bet]) -> Vec<MarketPerformance> {
    let mut markets: BTreeMap<(League, Market), MarketPerformance> = BTreeMap::new();

    for bet in settled {
        let leg_count = bet.leg_count();
        if leg_count == 0 {
            continue;
        }
        let share = bet.profit() / leg_count as f64;

        for leg in bet.legs() {
            let entry = markets
                .entry((leg.league, leg.market))
                .or_insert_with(|| MarketPerformance {
                    league: leg.league,
                    market: leg.market,
                    profit: 0.0,
                    roi: 0.0,
                    wins: 0,
                    losses: 0,
                    bet_count: 0,
                });

            let graded = if leg.result == BetResult::Pending {
                bet.result
            } else {
                leg.result
            };
            match graded {
                BetResult::Win => {
                    entry.wins += 1;
                    entry.profit += share;
                }
                BetResult::Loss => {
                    entry.losses += 1;
                    entry.profit += share;
                }
                _ => {}
            }
            entry.bet_count += 1;
        }
    }

    markets
        .into_values()
        .map(|mut market| {
            market.roi = percent(market.profit, (market.wins + market.losses) as f64);
            market
        })
        .collect()
}

fn eligible_markets(settled: &[&Bet]) -> impl Iterator<Item = MarketPerformance> {
    market_performance(settled)
        .into_iter()
        .filter(|market| market.bet_count >= MIN_MARKET_LEGS)
}

fn best_markets(settled: &[&Bet]) -> Vec<MarketPerformance> {
    let mut best: Vec<_> = eligible_markets(settled).filter(|m| m.roi > 0.0).collect();
    best.sort_by(|a, b| descending(a.roi, b.roi));
    best.truncate(MARKET_LIST_LEN);
    best
}

fn worst_markets(settled: &[&Bet]) -> Vec<MarketPerformance> {
    let mut worst: Vec<_> = eligible_markets(settled).filter(|m| m.roi < 0.0).collect();
    worst.sort_by(|a, b| descending(b.roi, a.roi));
    worst.truncate(MARKET_LIST_LEN);
    worst
}

fn book_performance(settled: &[&Bet]) -> Vec<BookPerformance> {
    let mut books: BTreeMap<Sportsbook, (f64, f64, usize)> = BTreeMap::new();
    for bet in settled {
        if let Some(book) = bet.sportsbook {
            let entry = books.entry(book).or_default();
            entry.0 += bet.profit();
            entry.1 += bet.wager;
            entry.2 += 1;
        }
    }

    let mut by_book: Vec<BookPerformance> = books
        .into_iter()
        .map(|(sportsbook, (profit, staked, bet_count))| BookPerformance {
            sportsbook,
            profit,
            staked,
            roi: percent(profit, staked),
            bet_count,
        })
        .collect();

    by_book.sort_by(|a, b| descending(a.roi, b.roi));
    by_book
}

impl SummaryStats {
    /// One-line console summary
    pub fn format(&self) -> String {
        format!(
            "Bets: {} ({}W-{}L, {} pending, {} void) | Wagered: ${:.2} | Net: {:+.2} | ROI: {:.1}% | Win rate: {:.1}%",
            self.total_bets,
            self.wins,
            self.losses,
            self.pending,
            self.voids,
            self.total_wagered,
            self.net_profit,
            self.roi,
            self.win_rate
        )
    }
}
