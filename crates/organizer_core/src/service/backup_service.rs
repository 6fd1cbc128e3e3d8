//! Whole-application backup, restore and wipe.
//!
//! # Responsibility
//! - Serialize every data key into one `{timestamp, version, data}` document.
//! - Restore a document section by section after rebuilding every section
//!   into its typed form.
//! - Track backup history and the auto-backup schedule.
//!
//! # Invariants
//! - Restore converts the whole document before writing any key.
//! - A non-empty list section with no convertible record rejects the document.
//! - Sections absent from the document are left untouched.
//! - History keeps at most [`MAX_BACKUP_HISTORY`] records.

use crate::model::account::Account;
use crate::model::budget::BudgetBook;
use crate::model::category::Category;
use crate::model::goals::Goals;
use crate::model::money::parse_amount;
use crate::model::period::MonthKey;
use crate::model::settings::AppSettings;
use crate::model::template::TransactionTemplate;
use crate::service::backup_records::{self, Converted};
use crate::store::keys;
use crate::store::stamps::{is_due, write_timestamp};
use crate::store::{JsonStore, KeyValueStore, StoreError};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const BACKUP_VERSION: &str = "1.0";
pub const MAX_BACKUP_HISTORY: usize = 10;
pub const AUTO_BACKUP_INTERVAL_MINUTES: i64 = 30;

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug)]
pub enum BackupError {
    /// Document is not valid JSON.
    Parse(String),
    /// Document parsed but does not have the backup shape.
    Invalid(String),
    Store(StoreError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "backup file is not valid JSON: {message}"),
            Self::Invalid(message) => write!(f, "invalid backup file: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for BackupError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// One entry of the backup history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub date: DateTime<Utc>,
    /// Serialized document length in bytes.
    pub size: usize,
}

/// A rendered backup ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupStats {
    pub transactions: usize,
    pub budget_periods: usize,
    pub games: usize,
    pub toy_cars: usize,
    /// Sum of stored blob lengths over all data keys.
    pub total_size: usize,
}

impl BackupStats {
    /// Records counted by the dashboard backup card.
    pub fn total_items(&self) -> usize {
        self.transactions + self.games + self.toy_cars
    }

    pub fn size_kb(&self) -> usize {
        (self.total_size + 512) / 1024
    }
}

/// Sections under `data.finances`, with their store keys.
const FINANCE_SECTIONS: &[(&str, &str, Section)] = &[
    ("transactions", keys::FINANCE_TRANSACTIONS, Section::Transactions),
    ("budgets", keys::FINANCE_BUDGETS, Section::Budgets),
    ("savingsGoal", keys::FINANCE_SAVINGS_GOAL, Section::SavingsGoal),
    ("categories", keys::FINANCE_CATEGORIES, Section::Categories),
    ("templates", keys::FINANCE_TEMPLATES, Section::Templates),
    ("accounts", keys::FINANCE_ACCOUNTS, Section::Accounts),
];

const TOP_SECTIONS: &[(&str, &str, Section)] = &[
    ("games", keys::GAME_LIBRARY, Section::Games),
    ("toyCars", keys::TOY_CAR_COLLECTION, Section::ToyCars),
    ("settings", keys::APP_SETTINGS, Section::Settings),
    ("goals", keys::APP_GOALS, Section::Goals),
];

/// Older documents name the car collection after the brand.
const TOY_CARS_LEGACY_SECTION: &str = "hotwheels";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Transactions,
    Budgets,
    SavingsGoal,
    Categories,
    Templates,
    Accounts,
    Games,
    ToyCars,
    Settings,
    Goals,
}

impl Section {
    /// Value exported when the key holds nothing.
    fn empty(self) -> Value {
        match self {
            Self::Budgets | Self::Settings | Self::Goals => Value::Object(Map::new()),
            Self::SavingsGoal => Value::from(0),
            _ => Value::Array(Vec::new()),
        }
    }
}

/// Result of a successful restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Sections written, in document order.
    pub sections: Vec<&'static str>,
    /// List records dropped because they could not be converted.
    pub skipped: usize,
}

pub struct BackupService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> BackupService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load_value(&self, key: &str, default: Value) -> BackupResult<Value> {
        Ok(self.store.load_json(key, default)?)
    }

    /// Builds the full backup document and appends it to the history.
    pub fn create_backup(&self, now: DateTime<Utc>) -> BackupResult<BackupFile> {
        let mut finances = Map::new();
        for (name, key, section) in FINANCE_SECTIONS {
            finances.insert(name.to_string(), self.load_value(key, section.empty())?);
        }
        let mut data = Map::new();
        data.insert("finances".to_string(), Value::Object(finances));
        for (name, key, section) in TOP_SECTIONS {
            data.insert(name.to_string(), self.load_value(key, section.empty())?);
        }

        let document = serde_json::json!({
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            "version": BACKUP_VERSION,
            "data": Value::Object(data),
        });
        let contents = serde_json::to_string_pretty(&document).map_err(|err| {
            BackupError::Store(StoreError::Serialize {
                key: "backup".to_string(),
                message: err.to_string(),
            })
        })?;

        let mut history = self.history()?;
        history.push(BackupRecord {
            date: now,
            size: contents.len(),
        });
        if history.len() > MAX_BACKUP_HISTORY {
            let excess = history.len() - MAX_BACKUP_HISTORY;
            history.drain(..excess);
        }
        self.store.save_json(keys::FINANCE_BACKUPS, &history)?;

        info!(
            "event=backup_create module=backup status=ok size_bytes={}",
            contents.len()
        );
        Ok(BackupFile {
            file_name: backup_file_name(now),
            contents,
        })
    }

    /// Restores a backup document.
    ///
    /// Accepts the full `{timestamp, version, data}` layout and the
    /// finance-only layout with `transactions`, `budgets`, ... at top level.
    /// Every section is rebuilt into its typed form first; list records
    /// that cannot be converted are skipped and counted. `now` stamps
    /// records without an added date and places legacy flat budgets.
    pub fn restore(&self, text: &str, now: DateTime<Utc>) -> BackupResult<RestoreReport> {
        let document: Value =
            serde_json::from_str(text).map_err(|err| BackupError::Parse(err.to_string()))?;
        let plan = plan_restore(&document, now)?;

        for (section, key, value) in &plan.writes {
            self.store.save_json(key, value)?;
            info!("event=backup_restore_section module=backup status=ok section={section}");
        }
        let report = RestoreReport {
            sections: plan.writes.iter().map(|(section, _, _)| *section).collect(),
            skipped: plan.skipped,
        };
        info!(
            "event=backup_restore module=backup status=ok sections={} skipped={}",
            report.sections.len(),
            report.skipped
        );
        Ok(report)
    }

    /// Removes every data key; returns how many keys held data.
    pub fn clear_all(&self) -> BackupResult<usize> {
        let mut removed = 0;
        for key in keys::DATA_KEYS {
            if self.store.remove(key)? {
                removed += 1;
            }
        }
        warn!("event=data_clear module=backup status=ok keys_removed={removed}");
        Ok(removed)
    }

    pub fn stats(&self) -> BackupResult<BackupStats> {
        let count = |key: &str| -> BackupResult<usize> {
            Ok(match self.load_value(key, Value::Null)? {
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                _ => 0,
            })
        };
        let mut total_size = 0;
        for key in keys::DATA_KEYS {
            total_size += self.store.get_raw(key)?.map_or(0, |raw| raw.len());
        }
        Ok(BackupStats {
            transactions: count(keys::FINANCE_TRANSACTIONS)?,
            budget_periods: count(keys::FINANCE_BUDGETS)?,
            games: count(keys::GAME_LIBRARY)?,
            toy_cars: count(keys::TOY_CAR_COLLECTION)?,
            total_size,
        })
    }

    /// Most recent backups, oldest first.
    pub fn history(&self) -> BackupResult<Vec<BackupRecord>> {
        Ok(self.store.load_json(keys::FINANCE_BACKUPS, Vec::new())?)
    }

    pub fn auto_backup_due(&self, now: DateTime<Utc>) -> BackupResult<bool> {
        Ok(is_due(
            &self.store,
            keys::LAST_AUTO_BACKUP,
            Duration::minutes(AUTO_BACKUP_INTERVAL_MINUTES),
            now,
        )?)
    }

    /// Creates a backup when the last one is older than the auto-backup interval.
    pub fn run_auto_backup(&self, now: DateTime<Utc>) -> BackupResult<Option<BackupFile>> {
        if !self.auto_backup_due(now)? {
            return Ok(None);
        }
        let file = self.create_backup(now)?;
        write_timestamp(&self.store, keys::LAST_AUTO_BACKUP, now)?;
        Ok(Some(file))
    }
}

/// `backup_painel_YYYY-MM-DD.json`
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("backup_painel_{}.json", now.format("%Y-%m-%d"))
}

type PlannedWrite = (&'static str, &'static str, Value);

#[derive(Debug, Default)]
struct RestorePlan {
    writes: Vec<PlannedWrite>,
    skipped: usize,
}

fn plan_restore(document: &Value, now: DateTime<Utc>) -> BackupResult<RestorePlan> {
    let Some(root) = document.as_object() else {
        return Err(BackupError::Invalid("expected a JSON object".to_string()));
    };

    let mut plan = RestorePlan::default();
    if let Some(data) = root.get("data") {
        if !root.get("timestamp").is_some_and(Value::is_string) {
            return Err(BackupError::Invalid("missing `timestamp`".to_string()));
        }
        let Some(data) = data.as_object() else {
            return Err(BackupError::Invalid("`data` must be an object".to_string()));
        };
        if let Some(finances) = data.get("finances") {
            let Some(finances) = finances.as_object() else {
                return Err(BackupError::Invalid("`finances` must be an object".to_string()));
            };
            plan.collect(finances, FINANCE_SECTIONS, now)?;
        }
        plan.collect(data, TOP_SECTIONS, now)?;
        if !data.contains_key("toyCars") {
            if let Some(value) = data.get(TOY_CARS_LEGACY_SECTION) {
                let value = plan.convert("toyCars", Section::ToyCars, value, now)?;
                plan.writes.push(("toyCars", keys::TOY_CAR_COLLECTION, value));
            }
        }
    } else if root.contains_key("transactions") {
        plan.collect(root, FINANCE_SECTIONS, now)?;
    } else {
        return Err(BackupError::Invalid("missing `data`".to_string()));
    }

    if plan.writes.is_empty() {
        return Err(BackupError::Invalid("no sections to restore".to_string()));
    }
    Ok(plan)
}

impl RestorePlan {
    fn collect(
        &mut self,
        source: &Map<String, Value>,
        sections: &[(&'static str, &'static str, Section)],
        now: DateTime<Utc>,
    ) -> BackupResult<()> {
        for (name, key, section) in sections {
            let Some(value) = source.get(*name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let value = self.convert(name, *section, value, now)?;
            self.writes.push((*name, *key, value));
        }
        Ok(())
    }

    /// Typed rebuild of one section, serialized back to its stored shape.
    fn convert(
        &mut self,
        name: &str,
        section: Section,
        value: &Value,
        now: DateTime<Utc>,
    ) -> BackupResult<Value> {
        let invalid = |expected: &str| BackupError::Invalid(format!("`{name}` must be {expected}"));
        match section {
            Section::Transactions => {
                let items = value.as_array().ok_or_else(|| invalid("a list"))?;
                let converted = backup_records::transactions(items);
                self.keep(name, items.len(), converted)
            }
            Section::Games => {
                let items = value.as_array().ok_or_else(|| invalid("a list"))?;
                let converted = backup_records::games(items, now);
                self.keep(name, items.len(), converted)
            }
            Section::ToyCars => {
                let items = value.as_array().ok_or_else(|| invalid("a list"))?;
                let converted = backup_records::toy_cars(items, now);
                self.keep(name, items.len(), converted)
            }
            Section::Budgets => {
                if !value.is_object() {
                    return Err(invalid("an object"));
                }
                let book = BudgetBook::from_stored(value, MonthKey::of(now.date_naive()));
                to_value(name, &book)
            }
            Section::SavingsGoal => {
                let goal = match value {
                    Value::Number(number) => number.as_f64(),
                    Value::String(text) => parse_amount(text),
                    _ => None,
                }
                .filter(|goal| *goal >= 0.0)
                .ok_or_else(|| invalid("a non-negative number"))?;
                Ok(Value::from(goal))
            }
            Section::Categories => strict::<Vec<Category>>(name, value),
            Section::Templates => strict::<Vec<TransactionTemplate>>(name, value),
            Section::Accounts => strict::<Vec<Account>>(name, value),
            Section::Settings => strict::<AppSettings>(name, value),
            Section::Goals => strict::<Goals>(name, value),
        }
    }

    /// Refuses a non-empty list where no record survived conversion, so a
    /// foreign document never replaces stored data with nothing.
    fn keep<T: Serialize>(
        &mut self,
        name: &str,
        total: usize,
        converted: Converted<T>,
    ) -> BackupResult<Value> {
        if total > 0 && converted.records.is_empty() {
            return Err(BackupError::Invalid(format!(
                "`{name}` has no usable records"
            )));
        }
        if converted.skipped > 0 {
            warn!(
                "event=backup_restore_skip module=backup status=partial section={name} skipped={}",
                converted.skipped
            );
        }
        self.skipped += converted.skipped;
        to_value(name, &converted.records)
    }
}

fn strict<T: DeserializeOwned + Serialize>(name: &str, value: &Value) -> BackupResult<Value> {
    let typed: T = serde_json::from_value(value.clone())
        .map_err(|err| BackupError::Invalid(format!("`{name}`: {err}")))?;
    to_value(name, &typed)
}

fn to_value<T: Serialize>(name: &str, typed: &T) -> BackupResult<Value> {
    serde_json::to_value(typed).map_err(|err| {
        BackupError::Store(StoreError::Serialize {
            key: name.to_string(),
            message: err.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, plan_restore, BackupError};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn file_name_uses_utc_date() {
        let now = Utc.with_ymd_and_hms(2024, 7, 3, 23, 59, 0).unwrap();
        assert_eq!(backup_file_name(now), "backup_painel_2024-07-03.json");
    }

    fn sections_of(document: &serde_json::Value) -> Vec<&'static str> {
        plan_restore(document, now())
            .unwrap()
            .writes
            .into_iter()
            .map(|(section, _, _)| section)
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn restore_plan_requires_timestamp_and_valid_shapes() {
        let missing_timestamp = json!({"data": {"games": []}});
        assert!(matches!(
            plan_restore(&missing_timestamp, now()),
            Err(BackupError::Invalid(_))
        ));

        let bad_shape = json!({"timestamp": "x", "data": {"games": {}}});
        assert!(matches!(plan_restore(&bad_shape, now()), Err(BackupError::Invalid(_))));

        let bad_settings = json!({"timestamp": "x", "data": {"settings": {"theme": "neon"}}});
        assert!(matches!(plan_restore(&bad_settings, now()), Err(BackupError::Invalid(_))));

        let nothing_usable = json!({"timestamp": "x", "data": {"games": [{"id": 1}]}});
        assert!(matches!(plan_restore(&nothing_usable, now()), Err(BackupError::Invalid(_))));

        let legacy = json!({"timestamp": "x", "data": {"hotwheels": [], "finances": {"transactions": []}}});
        assert_eq!(sections_of(&legacy), vec!["transactions", "toyCars"]);
    }

    #[test]
    fn restore_plan_accepts_finance_only_layout() {
        let finance_only = json!({"transactions": [], "savingsGoal": "500", "version": "2.0"});
        assert_eq!(sections_of(&finance_only), vec!["transactions", "savingsGoal"]);

        let plan = plan_restore(&finance_only, now()).unwrap();
        assert_eq!(plan.writes[1].2, json!(500.0));
    }

    #[test]
    fn flat_budgets_land_in_the_restore_month() {
        let document = json!({"timestamp": "x", "data": {"finances": {"budgets": {"Lazer": 300}}}});
        let plan = plan_restore(&document, now()).unwrap();
        assert_eq!(plan.writes[0].2, json!({"2024-06": {"Lazer": 300.0}}));
    }
}
