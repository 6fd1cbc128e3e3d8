//! Game backlog use-case service.
//!
//! # Responsibility
//! - CRUD over the stored game library.
//! - Filtered list with status counters and CSV export.
//! - Turn a catalog lookup result into a prefilled entry.

use crate::csv_text;
use crate::model::game::{
    detect_platform, validate_fields, Game, GameId, GameMetadata, GameStatus, GameValidationError,
};
use crate::store::keys;
use crate::store::{JsonStore, KeyValueStore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const GAMES_EXPORT_HEADER: &str = "Título,Plataforma,Status,Avaliação,Data Adicionado";

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug)]
pub enum GameError {
    Validation(GameValidationError),
    NotFound(GameId),
    Store(StoreError),
}

impl Display for GameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "game not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<StoreError> for GameError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<GameValidationError> for GameError {
    fn from(value: GameValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Editable game fields.
#[derive(Debug, Clone, PartialEq)]
pub struct GameInput {
    pub title: String,
    pub platform: String,
    pub status: GameStatus,
    pub rating: Option<u8>,
    pub metadata: Option<GameMetadata>,
}

impl GameInput {
    pub fn new(title: impl Into<String>, platform: impl Into<String>, status: GameStatus) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            status,
            rating: None,
            metadata: None,
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Prefills title and platform from a catalog entry, status `Backlog`.
    pub fn from_metadata(metadata: GameMetadata) -> Self {
        let platform = detect_platform(&metadata.platforms);
        Self {
            title: metadata.name.clone(),
            platform: platform.to_string(),
            status: GameStatus::Backlog,
            rating: None,
            metadata: Some(metadata),
        }
    }
}

/// List filter; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameFilter {
    pub platform: Option<String>,
    pub status: Option<GameStatus>,
    /// Case-insensitive title substring.
    pub search: String,
}

impl GameFilter {
    pub fn matches(&self, game: &Game) -> bool {
        if let Some(platform) = &self.platform {
            if game.platform != *platform {
                return false;
            }
        }
        if let Some(status) = self.status {
            if game.status != status {
                return false;
            }
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || game.title.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub total: usize,
    pub playing: usize,
    pub finished: usize,
    pub backlog: usize,
}

impl GameStats {
    pub fn of<'a>(games: impl IntoIterator<Item = &'a Game>) -> Self {
        games.into_iter().fold(Self::default(), |mut stats, game| {
            stats.total += 1;
            match game.status {
                GameStatus::Playing => stats.playing += 1,
                GameStatus::Finished => stats.finished += 1,
                GameStatus::Backlog => stats.backlog += 1,
                GameStatus::Paused | GameStatus::Dropped => {}
            }
            stats
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameView {
    /// Newest first.
    pub items: Vec<Game>,
    /// Counters over the filtered items.
    pub stats: GameStats,
}

pub struct GameService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> GameService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn games(&self) -> GameResult<Vec<Game>> {
        Ok(self.store.load_json(keys::GAME_LIBRARY, Vec::new())?)
    }

    fn save(&self, games: &[Game]) -> GameResult<()> {
        self.store.save_json(keys::GAME_LIBRARY, games)?;
        Ok(())
    }

    pub fn add_game(&self, input: GameInput, now: DateTime<Utc>) -> GameResult<Game> {
        validate_fields(&input.title, &input.platform, input.rating)?;
        let game = Game {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            platform: input.platform.trim().to_string(),
            status: input.status,
            rating: input.rating,
            date_added: now,
            metadata: input.metadata,
        };
        let mut games = self.games()?;
        games.push(game.clone());
        self.save(&games)?;
        info!(
            "event=game_create module=games status=ok with_metadata={}",
            game.metadata.is_some()
        );
        Ok(game)
    }

    /// Replaces editable fields; metadata is kept when the input carries none.
    pub fn update_game(&self, id: GameId, input: GameInput) -> GameResult<Game> {
        validate_fields(&input.title, &input.platform, input.rating)?;
        let mut games = self.games()?;
        let game = games
            .iter_mut()
            .find(|game| game.id == id)
            .ok_or(GameError::NotFound(id))?;
        game.title = input.title.trim().to_string();
        game.platform = input.platform.trim().to_string();
        game.status = input.status;
        game.rating = input.rating;
        if input.metadata.is_some() {
            game.metadata = input.metadata;
        }
        let updated = game.clone();
        self.save(&games)?;
        info!("event=game_update module=games status=ok");
        Ok(updated)
    }

    pub fn delete_game(&self, id: GameId) -> GameResult<Game> {
        let mut games = self.games()?;
        let index = games
            .iter()
            .position(|game| game.id == id)
            .ok_or(GameError::NotFound(id))?;
        let removed = games.remove(index);
        self.save(&games)?;
        info!("event=game_delete module=games status=ok");
        Ok(removed)
    }

    pub fn view(&self, filter: &GameFilter) -> GameResult<GameView> {
        let mut items = self
            .games()?
            .into_iter()
            .filter(|game| filter.matches(game))
            .collect::<Vec<_>>();
        items.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        let stats = GameStats::of(&items);
        Ok(GameView { items, stats })
    }

    pub fn export_csv(&self) -> GameResult<String> {
        Ok(export_games_csv(&self.games()?))
    }
}

/// `biblioteca_jogos_YYYY-MM-DD.csv`
pub fn games_export_file_name(today: NaiveDate) -> String {
    format!("biblioteca_jogos_{}.csv", today.format("%Y-%m-%d"))
}

/// Every field quoted; dates rendered as `DD/MM/YYYY`, missing rating empty.
pub fn export_games_csv(games: &[Game]) -> String {
    let mut out = String::from(GAMES_EXPORT_HEADER);
    out.push('\n');
    for game in games {
        let rating = game.rating.map(|value| value.to_string()).unwrap_or_default();
        let added = game.date_added.format("%d/%m/%Y").to_string();
        let row = [
            game.title.as_str(),
            game.platform.as_str(),
            game.status.label(),
            rating.as_str(),
            added.as_str(),
        ]
        .map(csv_text::quote)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}
