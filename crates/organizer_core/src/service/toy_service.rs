//! Toy-car collection use-case service.
//!
//! # Invariants
//! - Collector numbers are unique case-insensitively across the collection,
//!   on create and on update.

use crate::csv_text;
use crate::model::toy_car::{validate_fields, ToyCar, ToyCarId, ToyCarValidationError};
use crate::store::keys;
use crate::store::{JsonStore, KeyValueStore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const TOYS_EXPORT_HEADER: &str = "Nome,Número,Ano,Série,Data Adicionado";

pub type ToyResult<T> = Result<T, ToyError>;

#[derive(Debug)]
pub enum ToyError {
    Validation(ToyCarValidationError),
    /// Another car already uses this collector number.
    DuplicateNumber(String),
    NotFound(ToyCarId),
    Store(StoreError),
}

impl Display for ToyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateNumber(number) => {
                write!(f, "a car with number `{number}` is already in the collection")
            }
            Self::NotFound(id) => write!(f, "car not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ToyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ToyError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ToyCarValidationError> for ToyError {
    fn from(value: ToyCarValidationError) -> Self {
        Self::Validation(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyCarInput {
    pub name: String,
    pub number: String,
    pub year: u16,
    pub series: Option<String>,
}

impl ToyCarInput {
    pub fn new(name: impl Into<String>, number: impl Into<String>, year: u16) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            year,
            series: None,
        }
    }

    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    fn normalized_series(&self) -> Option<String> {
        self.series
            .as_deref()
            .map(str::trim)
            .filter(|series| !series.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToyCarFilter {
    /// Exact series; `None` means all.
    pub series: Option<String>,
    /// Case-insensitive substring of name or collector number.
    pub search: String,
}

impl ToyCarFilter {
    pub fn matches(&self, car: &ToyCar) -> bool {
        if let Some(series) = &self.series {
            if car.series.as_deref() != Some(series.as_str()) {
                return false;
            }
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || car.name.to_lowercase().contains(&needle)
            || car.number.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToyCarStats {
    pub total: usize,
    pub distinct_series: usize,
    /// Ties go to the later year.
    pub most_common_year: Option<u16>,
}

impl ToyCarStats {
    pub fn of<'a>(cars: impl IntoIterator<Item = &'a ToyCar>) -> Self {
        let mut total = 0;
        let mut series = BTreeSet::new();
        let mut years = BTreeMap::<u16, usize>::new();
        for car in cars {
            total += 1;
            if let Some(name) = &car.series {
                series.insert(name.as_str());
            }
            *years.entry(car.year).or_insert(0) += 1;
        }
        let most_common_year = years
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(year, _)| year);
        Self {
            total,
            distinct_series: series.len(),
            most_common_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToyCarView {
    /// Newest first.
    pub items: Vec<ToyCar>,
    pub stats: ToyCarStats,
}

pub struct ToyService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ToyService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn cars(&self) -> ToyResult<Vec<ToyCar>> {
        Ok(self.store.load_json(keys::TOY_CAR_COLLECTION, Vec::new())?)
    }

    fn save(&self, cars: &[ToyCar]) -> ToyResult<()> {
        self.store.save_json(keys::TOY_CAR_COLLECTION, cars)?;
        Ok(())
    }

    pub fn add_car(&self, input: ToyCarInput, now: DateTime<Utc>) -> ToyResult<ToyCar> {
        validate_fields(&input.name, &input.number, input.year)?;
        let mut cars = self.cars()?;
        ensure_unique_number(&cars, &input.number, None)?;

        let car = ToyCar {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            number: input.number.trim().to_string(),
            year: input.year,
            series: input.normalized_series(),
            date_added: now,
        };
        cars.push(car.clone());
        self.save(&cars)?;
        info!("event=toy_create module=toys status=ok");
        Ok(car)
    }

    pub fn update_car(&self, id: ToyCarId, input: ToyCarInput) -> ToyResult<ToyCar> {
        validate_fields(&input.name, &input.number, input.year)?;
        let mut cars = self.cars()?;
        ensure_unique_number(&cars, &input.number, Some(id))?;

        let car = cars
            .iter_mut()
            .find(|car| car.id == id)
            .ok_or(ToyError::NotFound(id))?;
        car.name = input.name.trim().to_string();
        car.number = input.number.trim().to_string();
        car.year = input.year;
        car.series = input.normalized_series();
        let updated = car.clone();
        self.save(&cars)?;
        info!("event=toy_update module=toys status=ok");
        Ok(updated)
    }

    pub fn delete_car(&self, id: ToyCarId) -> ToyResult<ToyCar> {
        let mut cars = self.cars()?;
        let index = cars
            .iter()
            .position(|car| car.id == id)
            .ok_or(ToyError::NotFound(id))?;
        let removed = cars.remove(index);
        self.save(&cars)?;
        info!("event=toy_delete module=toys status=ok");
        Ok(removed)
    }

    pub fn view(&self, filter: &ToyCarFilter) -> ToyResult<ToyCarView> {
        let mut items = self
            .cars()?
            .into_iter()
            .filter(|car| filter.matches(car))
            .collect::<Vec<_>>();
        items.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        let stats = ToyCarStats::of(&items);
        Ok(ToyCarView { items, stats })
    }

    /// Distinct series names, sorted, for the filter dropdown.
    pub fn series(&self) -> ToyResult<Vec<String>> {
        let names = self
            .cars()?
            .into_iter()
            .filter_map(|car| car.series)
            .collect::<BTreeSet<_>>();
        Ok(names.into_iter().collect())
    }

    pub fn export_csv(&self) -> ToyResult<String> {
        Ok(export_toys_csv(&self.cars()?))
    }
}

fn ensure_unique_number(cars: &[ToyCar], number: &str, except: Option<ToyCarId>) -> ToyResult<()> {
    let taken = cars
        .iter()
        .filter(|car| Some(car.id) != except)
        .any(|car| car.has_number(number));
    if taken {
        return Err(ToyError::DuplicateNumber(number.trim().to_string()));
    }
    Ok(())
}

/// `colecao_carrinhos_YYYY-MM-DD.csv`
pub fn toys_export_file_name(today: NaiveDate) -> String {
    format!("colecao_carrinhos_{}.csv", today.format("%Y-%m-%d"))
}

pub fn export_toys_csv(cars: &[ToyCar]) -> String {
    let mut out = String::from(TOYS_EXPORT_HEADER);
    out.push('\n');
    for car in cars {
        let year = car.year.to_string();
        let added = car.date_added.format("%d/%m/%Y").to_string();
        let row = [
            car.name.as_str(),
            car.number.as_str(),
            year.as_str(),
            car.series.as_deref().unwrap_or(""),
            added.as_str(),
        ]
        .map(csv_text::quote)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}
