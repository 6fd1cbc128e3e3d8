//! Toy-car collection model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ToyCarId = Uuid;

/// One die-cast car in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToyCar {
    pub id: ToyCarId,
    pub name: String,
    /// Collector number printed on the card, e.g. `123/250`.
    pub number: String,
    pub year: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl ToyCar {
    /// Case-insensitive collector-number comparison.
    pub fn has_number(&self, number: &str) -> bool {
        self.number.trim().to_lowercase() == number.trim().to_lowercase()
    }

    pub fn validate(&self) -> Result<(), ToyCarValidationError> {
        validate_fields(&self.name, &self.number, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToyCarValidationError {
    MissingName,
    MissingNumber,
    MissingYear,
}

impl Display for ToyCarValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "car name is required"),
            Self::MissingNumber => write!(f, "collector number is required"),
            Self::MissingYear => write!(f, "release year is required"),
        }
    }
}

impl Error for ToyCarValidationError {}

pub(crate) fn validate_fields(
    name: &str,
    number: &str,
    year: u16,
) -> Result<(), ToyCarValidationError> {
    if name.trim().is_empty() {
        return Err(ToyCarValidationError::MissingName);
    }
    if number.trim().is_empty() {
        return Err(ToyCarValidationError::MissingNumber);
    }
    if year == 0 {
        return Err(ToyCarValidationError::MissingYear);
    }
    Ok(())
}
