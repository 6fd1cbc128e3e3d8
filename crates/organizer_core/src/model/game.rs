//! Game backlog model.
//!
//! # Invariants
//! - `title` and `platform` are non-empty after trimming.
//! - `rating`, when set, is a star count in `1..=5`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type GameId = Uuid;

pub const PLATFORM_OTHER: &str = "Outra";

/// Platforms offered by the entry form; anything else is stored verbatim.
pub const KNOWN_PLATFORMS: &[&str] = &[
    "PC",
    "PlayStation 5",
    "Xbox Series X",
    "Nintendo Switch",
    PLATFORM_OTHER,
];

pub const MAX_RATING: u8 = 5;

/// Progress of a game in the backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Backlog,
    #[serde(rename = "Jogando")]
    Playing,
    #[serde(rename = "Finalizado")]
    Finished,
    #[serde(rename = "Pausado")]
    Paused,
    #[serde(rename = "Desistido")]
    Dropped,
}

impl GameStatus {
    pub const ALL: [GameStatus; 5] = [
        Self::Backlog,
        Self::Playing,
        Self::Finished,
        Self::Paused,
        Self::Dropped,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Playing => "Jogando",
            Self::Finished => "Finalizado",
            Self::Paused => "Pausado",
            Self::Dropped => "Desistido",
        }
    }

    /// Parses stored labels and English names, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "backlog" => Some(Self::Backlog),
            "jogando" | "playing" => Some(Self::Playing),
            "finalizado" | "finished" => Some(Self::Finished),
            "pausado" | "paused" => Some(Self::Paused),
            "desistido" | "dropped" => Some(Self::Dropped),
            _ => None,
        }
    }
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Details captured from the third-party catalog when a game is added from
/// a lookup result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_top: Option<u32>,
    #[serde(default)]
    pub ratings_count: Option<u32>,
    #[serde(default)]
    pub metacritic: Option<u32>,
    #[serde(default)]
    pub playtime: Option<u32>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub stores: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub reddit_url: Option<String>,
    #[serde(default)]
    pub metacritic_url: Option<String>,
}

/// One backlog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub platform: String,
    pub status: GameStatus,
    #[serde(default)]
    pub rating: Option<u8>,
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GameMetadata>,
}

impl Game {
    pub fn validate(&self) -> Result<(), GameValidationError> {
        validate_fields(&self.title, &self.platform, self.rating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameValidationError {
    MissingTitle,
    MissingPlatform,
    RatingOutOfRange(u8),
}

impl Display for GameValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "game title is required"),
            Self::MissingPlatform => write!(f, "game platform is required"),
            Self::RatingOutOfRange(value) => {
                write!(f, "rating must be between 1 and {MAX_RATING}, got {value}")
            }
        }
    }
}

impl Error for GameValidationError {}

pub(crate) fn validate_fields(
    title: &str,
    platform: &str,
    rating: Option<u8>,
) -> Result<(), GameValidationError> {
    if title.trim().is_empty() {
        return Err(GameValidationError::MissingTitle);
    }
    if platform.trim().is_empty() {
        return Err(GameValidationError::MissingPlatform);
    }
    if let Some(value) = rating {
        if value == 0 || value > MAX_RATING {
            return Err(GameValidationError::RatingOutOfRange(value));
        }
    }
    Ok(())
}

/// Picks the first known form platform among catalog platform names.
pub fn detect_platform(platforms: &[String]) -> &'static str {
    platforms
        .iter()
        .find_map(|name| {
            KNOWN_PLATFORMS
                .iter()
                .copied()
                .find(|known| *known != PLATFORM_OTHER && *known == name.as_str())
        })
        .unwrap_or(PLATFORM_OTHER)
}

#[cfg(test)]
mod tests {
    use super::{detect_platform, validate_fields, GameStatus, GameValidationError};

    #[test]
    fn status_round_trips_through_stored_labels() {
        let json = serde_json::to_string(&GameStatus::Playing).unwrap();
        assert_eq!(json, "\"Jogando\"");
        assert_eq!(GameStatus::parse("finished"), Some(GameStatus::Finished));
        assert_eq!(GameStatus::parse("Desistido"), Some(GameStatus::Dropped));
    }

    #[test]
    fn detect_platform_falls_back_to_other() {
        let names = vec!["Xbox One".to_string(), "PC".to_string()];
        assert_eq!(detect_platform(&names), "PC");
        assert_eq!(detect_platform(&["Atari 2600".to_string()]), "Outra");
    }

    #[test]
    fn validate_fields_checks_rating_range() {
        assert_eq!(
            validate_fields("Hades", "PC", Some(6)),
            Err(GameValidationError::RatingOutOfRange(6))
        );
        assert_eq!(validate_fields(" ", "PC", None), Err(GameValidationError::MissingTitle));
        assert!(validate_fields("Hades", "PC", Some(5)).is_ok());
    }
}
