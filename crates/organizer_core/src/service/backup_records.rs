//! Record-level conversion of restored backup sections.
//!
//! Exports written by older versions of the app carry numeric ids, years
//! and ratings stored as strings, and empty series names. Every record is
//! rebuilt into its typed form before anything is written; records that
//! still fail validation are dropped and counted.

use crate::finance::csv_io::transaction_from_json;
use crate::model::game::{Game, GameMetadata, GameStatus, MAX_RATING};
use crate::model::money::parse_amount;
use crate::model::toy_car::ToyCar;
use crate::model::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Typed records of one list section plus the number of dropped entries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Converted<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

fn convert_all<T>(items: &[Value], convert: impl Fn(&Value) -> Option<T>) -> Converted<T> {
    let records = items.iter().filter_map(convert).collect::<Vec<_>>();
    let skipped = items.len() - records.len();
    Converted { records, skipped }
}

pub(crate) fn transactions(items: &[Value]) -> Converted<Transaction> {
    convert_all(items, transaction_from_json)
}

/// `fallback` stamps records without a readable `dateAdded`.
pub(crate) fn games(items: &[Value], fallback: DateTime<Utc>) -> Converted<Game> {
    convert_all(items, |item| game_record(item, fallback))
}

pub(crate) fn toy_cars(items: &[Value], fallback: DateTime<Utc>) -> Converted<ToyCar> {
    convert_all(items, |item| toy_car_record(item, fallback))
}

fn game_record(item: &Value, fallback: DateTime<Utc>) -> Option<Game> {
    let game = Game {
        id: record_id(item),
        title: text_field(item, "title")?,
        platform: text_field(item, "platform")?,
        status: text_field(item, "status")
            .and_then(|label| GameStatus::parse(&label))
            .unwrap_or(GameStatus::Backlog),
        rating: rating(item.get("rating")),
        date_added: date_added(item, fallback),
        metadata: item
            .get("metadata")
            .filter(|value| value.is_object())
            .and_then(|value| serde_json::from_value::<GameMetadata>(value.clone()).ok()),
    };
    game.validate().ok()?;
    Some(game)
}

fn toy_car_record(item: &Value, fallback: DateTime<Utc>) -> Option<ToyCar> {
    let year = number_field(item, "year")
        .filter(|year| year.fract() == 0.0 && *year >= 1.0 && *year <= f64::from(u16::MAX))?;
    let car = ToyCar {
        id: record_id(item),
        name: text_field(item, "name")?,
        number: text_field(item, "number")?,
        year: year as u16,
        series: text_field(item, "series").filter(|series| !series.is_empty()),
        date_added: date_added(item, fallback),
    };
    car.validate().ok()?;
    Some(car)
}

/// Stored UUID, or a fresh one for numeric and malformed ids.
fn record_id(item: &Value) -> Uuid {
    item.get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn text_field(item: &Value, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn number_field(item: &Value, field: &str) -> Option<f64> {
    match item.get(field)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_amount(text),
        _ => None,
    }
}

fn date_added(item: &Value, fallback: DateTime<Utc>) -> DateTime<Utc> {
    item.get("dateAdded")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map_or(fallback, |date| date.with_timezone(&Utc))
}

/// Star count from a number, a digit string or a run of star glyphs.
/// Anything else, including `Sem nota`, means unrated.
fn rating(value: Option<&Value>) -> Option<u8> {
    let stars = match value? {
        Value::Number(number) => number.as_u64()?,
        Value::String(text) => {
            let text = text.trim();
            match text.parse::<u64>() {
                Ok(stars) => stars,
                Err(_) => text.chars().filter(|ch| matches!(ch, '⭐' | '★')).count() as u64,
            }
        }
        _ => return None,
    };
    u8::try_from(stars)
        .ok()
        .filter(|stars| (1..=MAX_RATING).contains(stars))
}
