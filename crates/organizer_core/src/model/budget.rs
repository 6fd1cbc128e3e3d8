//! Per-month category budgets.
//!
//! # Invariants
//! - Every stored limit is finite and strictly positive.
//! - Saving a month replaces that month only.

use crate::model::period::MonthKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Category limits keyed by `YYYY-MM`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetBook {
    periods: BTreeMap<String, BTreeMap<String, f64>>,
}

impl BudgetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a book from a stored JSON blob.
    ///
    /// A flat `{category: amount}` object without an entry for `current` is
    /// the legacy single-month shape and is migrated into `current`.
    /// Malformed entries are dropped.
    pub fn from_stored(value: &Value, current: MonthKey) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let is_legacy = !object.is_empty()
            && !object.contains_key(&current.to_string())
            && object.values().all(Value::is_number);
        if is_legacy {
            let mut book = Self::default();
            book.set_month(
                current,
                object
                    .iter()
                    .filter_map(|(category, amount)| Some((category.clone(), amount.as_f64()?))),
            );
            return book;
        }

        let mut book = Self::default();
        for (period, limits) in object {
            let (Ok(month), Some(limits)) = (period.parse::<MonthKey>(), limits.as_object()) else {
                continue;
            };
            book.set_month(
                month,
                limits
                    .iter()
                    .filter_map(|(category, amount)| Some((category.clone(), amount.as_f64()?))),
            );
        }
        book
    }

    /// Replaces the limits of `month`, keeping only positive amounts.
    pub fn set_month(&mut self, month: MonthKey, limits: impl IntoIterator<Item = (String, f64)>) {
        let cleaned = limits
            .into_iter()
            .filter_map(|(category, amount)| {
                let category = category.trim().to_string();
                (!category.is_empty() && amount.is_finite() && amount > 0.0)
                    .then_some((category, amount))
            })
            .collect::<BTreeMap<_, _>>();
        let key = month.to_string();
        if cleaned.is_empty() {
            self.periods.remove(&key);
        } else {
            self.periods.insert(key, cleaned);
        }
    }

    /// Limits for `month`; empty when none were saved.
    pub fn month(&self, month: MonthKey) -> BTreeMap<String, f64> {
        self.periods
            .get(&month.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn limit(&self, month: MonthKey, category: &str) -> Option<f64> {
        self.periods
            .get(&month.to_string())
            .and_then(|limits| limits.get(category))
            .copied()
    }

    pub fn category_count(&self, month: MonthKey) -> usize {
        self.periods
            .get(&month.to_string())
            .map_or(0, BTreeMap::len)
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}
