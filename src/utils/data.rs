use crate::models::{Bet, Game, OddsFormat, Player, Team};
use crate::utils::analytics::MarketPerformance;
use crate::utils::odds::format_odds;
use anyhow::{Context, Result};
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Everything persisted in the bets file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub bets: Vec<Bet>,
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub players: Vec<Player>,
}

/// Save the dataset to a JSON file, creating parent directories as needed
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(dataset).context("Failed to serialize dataset")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write data file {}", path.display()))?;
    Ok(())
}

/// Load the dataset from JSON; a missing file is an empty dataset
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Ok(Dataset::default());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    let dataset: Dataset =
        serde_json::from_str(&json).context("Failed to deserialize dataset")?;
    Ok(dataset)
}

/// Save bets to CSV with odds in the user's format
pub fn save_bets_to_csv(bets: &[Bet], odds_format: OddsFormat, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "Date", "Bet", "Type", "Sportsbook", "Legs", "Wager", "Odds", "Payout", "Result",
        "Profit",
    ])?;

    for bet in bets {
        let odds = format_odds(bet.odds, bet.result, odds_format)
            .unwrap_or_else(|_| format!("{:.2}", bet.odds));
        let profit = if bet.result.is_decided() {
            format!("{:.2}", bet.profit())
        } else {
            String::new()
        };
        let legs: Vec<&str> = bet.legs().map(|leg| leg.description.as_str()).collect();

        writer.write_record(&[
            bet.date.format("%Y-%m-%d").to_string(),
            bet.title(),
            bet.bet_type.label().to_string(),
            bet.sportsbook.map(|b| b.label().to_string()).unwrap_or_default(),
            legs.join(" | "),
            format!("{:.2}", bet.wager),
            odds,
            format!("{:.2}", bet.payout),
            bet.result.to_string(),
            profit,
        ])?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

/// Save market performance rows to CSV
pub fn save_markets_to_csv(markets: &[MarketPerformance], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["League", "Market", "Record", "Legs", "Profit", "ROI (%)"])?;
    for market in markets {
        writer.write_record(&[
            market.league.to_string(),
            market.market.label().to_string(),
            market.record(),
            market.bet_count.to_string(),
            format!("{:.2}", market.profit),
            format!("{:.1}", market.roi),
        ])?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BetResult;
    use crate::utils::analytics::tests::BetBuilder;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("bet_tracker_{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_missing_file_loads_empty_dataset() {
        let dataset = load_dataset(&temp_path("absent.json")).unwrap();
        assert!(dataset.bets.is_empty());
        assert!(dataset.games.is_empty());
    }

    #[test]
    fn test_save_then_load_dataset() {
        let path = temp_path("bets.json");
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let dataset = Dataset {
            bets: vec![
                BetBuilder::new("a", 10.0, BetResult::Win, date).payout(25.0).build(),
                BetBuilder::new("b", 5.0, BetResult::Pending, date).build(),
            ],
            ..Default::default()
        };

        save_dataset(&dataset, &path).unwrap();
        let loaded = load_dataset(&path).unwrap();

        assert_eq!(loaded.bets.len(), 2);
        assert_eq!(loaded.bets[0].id, "a");
        assert_eq!(loaded.bets[1].result, BetResult::Pending);
    }

    #[test]
    fn test_bets_csv_uses_odds_format() {
        let path = temp_path("bets.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let bets = vec![
            BetBuilder::new("a", 10.0, BetResult::Win, date)
                .odds(2.5)
                .payout(25.0)
                .build(),
            BetBuilder::new("v", 10.0, BetResult::Void, date).build(),
        ];

        save_bets_to_csv(&bets, OddsFormat::American, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Date,Bet,Type"));
        assert_eq!(
            lines[1],
            "2024-03-01,Straight,Straight,FanDuel,Moneyline,10.00,+150,25.00,win,15.00"
        );
        assert!(lines[2].contains(",Void,"));
    }
}
