use anyhow::{Context, Result};
use bet_tracker::analytics::market_performance;
use bet_tracker::bet_form::BetDraft;
use bet_tracker::data::{save_bets_to_csv, save_markets_to_csv};
use bet_tracker::date_range::DateRange;
use bet_tracker::odds::{decimal_to_american, format_odds, parse_odds};
use bet_tracker::{
    AppConfig, Bet, BetQuery, BetResult, BetStore, DashboardFilters, JsonFileStore, League,
    OddsFormat, Sportsbook,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bet-tracker")]
#[command(about = "Track sports bets and review your betting performance", long_about = None)]
struct Cli {
    /// Bets file (overrides BETS_FILE)
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    /// User to act as (overrides BETTRACK_USER)
    #[arg(long, global = true)]
    user: Option<String>,
    /// Odds display format (overrides ODDS_FORMAT)
    #[arg(long, global = true)]
    odds_format: Option<OddsFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show KPIs, breakdowns and coach notes
    Dashboard {
        /// 7d, 30d, season or all
        #[arg(short, long, default_value = "30d")]
        range: DateRange,
        #[arg(short, long)]
        league: Option<League>,
        #[arg(short, long)]
        book: Option<Sportsbook>,
    },
    /// List bets, newest first
    Bets {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Add a bet from a JSON draft file
    Add { draft: PathBuf },
    /// Record one leg's result (group and leg are 1-based)
    Settle {
        bet: String,
        group: usize,
        leg: usize,
        result: BetResult,
    },
    /// Set a bet's overall result directly
    Override { bet: String, result: BetResult },
    /// Delete a bet
    Delete { bet: String },
    /// Convert odds between decimal and American
    Odds {
        value: String,
        #[arg(long, default_value = "decimal")]
        from: OddsFormat,
    },
    /// Export all bets (and optionally market performance) to CSV
    Export {
        output: PathBuf,
        #[arg(long)]
        markets: Option<PathBuf>,
    },
}

fn print_bet(index: usize, bet: &Bet, odds_format: OddsFormat) {
    let odds = format_odds(bet.odds, bet.result, odds_format)
        .unwrap_or_else(|_| format!("{:.2}", bet.odds));
    println!(
        "{}. [{}] {} | {} | ${:.2} @ {} -> ${:.2} | {} | id {}",
        index,
        bet.date.format("%Y-%m-%d"),
        bet.title(),
        bet.sportsbook.map(|b| b.label()).unwrap_or("-"),
        bet.wager,
        odds,
        bet.payout,
        bet.result,
        bet.id
    );
    for (g, group) in bet.leg_groups.iter().enumerate() {
        for (l, leg) in group.legs.iter().enumerate() {
            println!(
                "     {}.{} {} ({}) [{}]",
                g + 1,
                l + 1,
                leg.description,
                leg.event_name,
                leg.result
            );
        }
    }
}

async fn show_dashboard(
    store: &JsonFileStore,
    config: &AppConfig,
    filters: DashboardFilters,
) -> Result<()> {
    let dashboard = bet_tracker::load_dashboard(
        store,
        &config.user_id,
        filters,
        Utc::now(),
        config.timezone,
    )
    .await?;
    let analytics = &dashboard.analytics;

    println!("DASHBOARD ({})\n", dashboard.filters.date_range.label());
    println!("{}", analytics.summary.format());
    println!(
        "Avg odds: {:.2} | Avg stake: ${:.2}",
        analytics.summary.avg_odds, analytics.summary.avg_stake
    );
    if let Some(best) = &analytics.summary.best_book {
        println!("Best book: {} ({:+.2})", best.sportsbook.label(), best.profit);
    }

    println!("\nBY SPORT AND BET TYPE\n");
    if analytics.by_sport_bet_type.is_empty() {
        println!("No settled bets in this range.");
    }
    for row in &analytics.by_sport_bet_type {
        println!(
            "{} {}: {} bets, staked ${:.2}, profit {:+.2}, ROI {:.1}%",
            row.league,
            row.bet_type.label(),
            row.bet_count,
            row.staked,
            row.profit,
            row.roi
        );
    }

    for (title, markets) in [
        ("BEST MARKETS", &analytics.best_markets),
        ("WORST MARKETS", &analytics.worst_markets),
    ] {
        println!("\n{}\n", title);
        if markets.is_empty() {
            println!("Not enough data yet.");
        }
        for (i, m) in markets.iter().enumerate() {
            println!(
                "{}. {} {} ({}): profit {:+.2}, ROI {:.1}%",
                i + 1,
                m.league,
                m.market.label(),
                m.record(),
                m.profit,
                m.roi
            );
        }
    }

    println!("\nBY SPORTSBOOK\n");
    for book in &analytics.by_book {
        println!(
            "{}: {} bets, profit {:+.2}, ROI {:.1}%",
            book.sportsbook.label(),
            book.bet_count,
            book.profit,
            book.roi
        );
    }

    println!("\nCOACH'S NOTES\n");
    for insight in &dashboard.insights {
        println!("- {}", insight.message);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(file) = cli.file {
        config.bets_file = file;
    }
    if let Some(user) = cli.user {
        config.user_id = user;
    }
    if let Some(odds_format) = cli.odds_format {
        config.odds_format = odds_format;
    }

    let store = JsonFileStore::open(&config.bets_file)?;

    match cli.command {
        Commands::Dashboard {
            range,
            league,
            book,
        } => {
            let filters = DashboardFilters {
                date_range: range,
                league,
                sportsbook: book,
            };
            show_dashboard(&store, &config, filters).await?;
        }
        Commands::Bets { limit } => {
            let bets = store
                .find_bets_for_user(&config.user_id, &BetQuery::default())
                .await?;
            if bets.is_empty() {
                println!("No bets recorded in {}", config.bets_file.display());
            }
            for (i, bet) in bets.iter().take(limit).enumerate() {
                print_bet(i + 1, bet, config.odds_format);
            }
            let pending = bets
                .iter()
                .filter(|bet| bet.result == BetResult::Pending)
                .count();
            println!("\n{} bets, {} pending", bets.len(), pending);
        }
        Commands::Add { draft } => {
            let json = std::fs::read_to_string(&draft)
                .with_context(|| format!("Failed to read draft {}", draft.display()))?;
            let draft: BetDraft =
                serde_json::from_str(&json).context("Failed to parse bet draft")?;
            let bet = bet_tracker::create_bet(&store, &config.user_id, &draft, Utc::now()).await?;
            println!("Added bet {}\n", bet.id);
            print_bet(1, &bet, config.odds_format);
        }
        Commands::Settle {
            bet,
            group,
            leg,
            result,
        } => {
            let bet =
                bet_tracker::settle_leg(&store, &config.user_id, &bet, group, leg, result).await?;
            print_bet(1, &bet, config.odds_format);
        }
        Commands::Override { bet, result } => {
            let bet = bet_tracker::override_bet_result(&store, &config.user_id, &bet, result).await?;
            print_bet(1, &bet, config.odds_format);
        }
        Commands::Delete { bet } => {
            bet_tracker::delete_bet(&store, &config.user_id, &bet).await?;
            println!("Deleted bet {}", bet);
        }
        Commands::Odds { value, from } => {
            let decimal = parse_odds(&value, from)?;
            println!("Decimal:  {:.2}", decimal);
            println!("American: {}", decimal_to_american(decimal)?);
        }
        Commands::Export { output, markets } => {
            let bets = store
                .find_bets_for_user(&config.user_id, &BetQuery::default())
                .await?;
            save_bets_to_csv(&bets, config.odds_format, &output)?;
            println!("Saved {} bets to {}", bets.len(), output.display());

            if let Some(path) = markets {
                let settled: Vec<&Bet> = bets
                    .iter()
                    .filter(|bet| bet.result.is_decided())
                    .collect();
                save_markets_to_csv(&market_performance(&settled), &path)?;
                println!("Saved market performance to {}", path.display());
            }
        }
    }

    Ok(())
}
