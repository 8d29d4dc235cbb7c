use crate::error::StoreError;
use crate::models::{Bet, Game, League, Player, Sportsbook, Team};
use crate::utils::data::{load_dataset, save_dataset, Dataset};
use crate::utils::date_range::DateWindow;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Filters for a user's bet history
#[derive(Debug, Clone)]
pub struct BetQuery {
    /// Inclusive calendar-date window on the bet's own date
    pub window: Option<DateWindow>,
    /// Zone the window's calendar dates are read in
    pub timezone: FixedOffset,
    /// Matches when any leg is in this league
    pub league: Option<League>,
    pub sportsbook: Option<Sportsbook>,
}

impl Default for BetQuery {
    fn default() -> Self {
        Self {
            window: None,
            timezone: Utc.fix(),
            league: None,
            sportsbook: None,
        }
    }
}

impl BetQuery {
    pub fn matches(&self, bet: &Bet) -> bool {
        if let Some(window) = &self.window {
            if !window.contains(bet.date.with_timezone(&self.timezone).date_naive()) {
                return false;
            }
        }

        if let Some(league) = self.league {
            if !bet.legs().any(|leg| leg.league == league) {
                return false;
            }
        }

        match self.sportsbook {
            Some(book) => bet.sportsbook == Some(book),
            None => true,
        }
    }
}

/// Newest first: bet date, then creation time
fn newest_first(a: &Bet, b: &Bet) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Data access for bets and the reference records they point at
#[async_trait]
pub trait BetStore: Send + Sync {
    /// A user's bets matching `query`, newest first
    async fn find_bets_for_user(&self, user_id: &str, query: &BetQuery) -> Result<Vec<Bet>>;

    async fn find_bet(&self, user_id: &str, bet_id: &str) -> Result<Option<Bet>>;

    async fn insert_bet(&self, bet: Bet) -> Result<()>;

    /// Replace a stored bet owned by the same user
    async fn update_bet(&self, bet: Bet) -> Result<()>;

    /// Returns false when the user has no such bet
    async fn delete_bet(&self, user_id: &str, bet_id: &str) -> Result<bool>;

    async fn find_game_by_id(&self, id: &str) -> Result<Option<Game>>;

    async fn find_player_by_id(&self, id: &str) -> Result<Option<Player>>;

    async fn find_team_by_id(&self, id: &str) -> Result<Option<Team>>;
}

/// Bet store backed by one JSON file, held in memory and rewritten on
/// every change
pub struct JsonFileStore {
    path: Option<PathBuf>,
    data: RwLock<Dataset>,
}

impl JsonFileStore {
    /// Load the store from `path`; the file is created on the first write
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dataset = load_dataset(&path)
            .with_context(|| format!("Failed to open bet store at {}", path.display()))?;

        info!(
            path = %path.display(),
            bets = dataset.bets.len(),
            games = dataset.games.len(),
            "Loaded bet store"
        );

        Ok(Self {
            path: Some(path),
            data: RwLock::new(dataset),
        })
    }

    /// A store that never touches disk
    pub fn in_memory(dataset: Dataset) -> Self {
        Self {
            path: None,
            data: RwLock::new(dataset),
        }
    }

    /// Clone of the full dataset
    pub async fn snapshot(&self) -> Dataset {
        self.data.read().await.clone()
    }

    /// Write `staged` to disk, then make it the live dataset
    /// Memory is left untouched when the write fails
    async fn commit(&self, live: &mut Dataset, staged: Dataset) -> Result<()> {
        let staged = match &self.path {
            Some(path) => {
                let path = path.clone();
                let staged = tokio::task::spawn_blocking(move || {
                    save_dataset(&staged, &path).map(|()| staged)
                })
                .await
                .context("Bet store write task failed")??;
                debug!(bets = staged.bets.len(), "Saved bet store");
                staged
            }
            None => staged,
        };

        *live = staged;
        Ok(())
    }
}

#[async_trait]
impl BetStore for JsonFileStore {
    async fn find_bets_for_user(&self, user_id: &str, query: &BetQuery) -> Result<Vec<Bet>> {
        let data = self.data.read().await;
        let mut bets: Vec<Bet> = data
            .bets
            .iter()
            .filter(|bet| bet.user_id == user_id && query.matches(bet))
            .cloned()
            .collect();
        bets.sort_by(newest_first);
        Ok(bets)
    }

    async fn find_bet(&self, user_id: &str, bet_id: &str) -> Result<Option<Bet>> {
        let data = self.data.read().await;
        Ok(data
            .bets
            .iter()
            .find(|bet| bet.id == bet_id && bet.user_id == user_id)
            .cloned())
    }

    async fn insert_bet(&self, bet: Bet) -> Result<()> {
        let mut data = self.data.write().await;
        if data.bets.iter().any(|existing| existing.id == bet.id) {
            anyhow::bail!("bet {} already exists", bet.id);
        }

        let mut staged = data.clone();
        staged.bets.push(bet);
        self.commit(&mut data, staged).await
    }

    async fn update_bet(&self, bet: Bet) -> Result<()> {
        let mut data = self.data.write().await;
        let index = data
            .bets
            .iter()
            .position(|existing| existing.id == bet.id && existing.user_id == bet.user_id)
            .ok_or_else(|| StoreError::BetNotFound(bet.id.clone()))?;

        let mut staged = data.clone();
        staged.bets[index] = bet;
        self.commit(&mut data, staged).await
    }

    async fn delete_bet(&self, user_id: &str, bet_id: &str) -> Result<bool> {
        let mut data = self.data.write().await;
        let Some(index) = data
            .bets
            .iter()
            .position(|bet| bet.id == bet_id && bet.user_id == user_id)
        else {
            return Ok(false);
        };

        let mut staged = data.clone();
        staged.bets.remove(index);
        self.commit(&mut data, staged).await?;
        Ok(true)
    }

    async fn find_game_by_id(&self, id: &str) -> Result<Option<Game>> {
        let data = self.data.read().await;
        Ok(data.games.iter().find(|game| game.id == id).cloned())
    }

    async fn find_player_by_id(&self, id: &str) -> Result<Option<Player>> {
        let data = self.data.read().await;
        Ok(data.players.iter().find(|player| player.id == id).cloned())
    }

    async fn find_team_by_id(&self, id: &str) -> Result<Option<Team>> {
        let data = self.data.read().await;
        Ok(data.teams.iter().find(|team| team.id == id).cloned())
    }
}
