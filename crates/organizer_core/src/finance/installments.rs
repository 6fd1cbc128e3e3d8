//! Installment and recurring transaction expansion.
//!
//! # Invariants
//! - Month arithmetic clamps to the last valid day (Jan 31 + 1 month is Feb 28/29).
//! - Every generated record gets a fresh id.

use crate::model::money::round_cents;
use crate::model::transaction::{
    validate_amount, Transaction, TransactionKind, TransactionValidationError, MAX_INSTALLMENTS,
    MIN_INSTALLMENTS,
};
use chrono::{Days, Months, NaiveDate};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Adds `months` to `date`, clamping to the end of the target month.
///
/// Returns `None` only when the result leaves chrono's supported range.
pub fn add_months_clamped(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Splits a purchase of `total` into `count` monthly expense records.
///
/// Each record carries `round(total / count, 2)`, is dated `start + i`
/// months and is described `"<description> (i/count)"`. A split that
/// rounds below one cent per record is rejected.
pub fn expand_installments(
    description: &str,
    total: f64,
    count: u32,
    start: NaiveDate,
    category: &str,
) -> Result<Vec<Transaction>, TransactionValidationError> {
    if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
        return Err(TransactionValidationError::InstallmentCountOutOfRange(count));
    }
    let amount = round_cents(total / f64::from(count));
    validate_amount(amount)?;
    let mut records = Vec::with_capacity(count as usize);
    for index in 0..count {
        let date = add_months_clamped(start, index)
            .ok_or(TransactionValidationError::DateTooFarInFuture(start))?;
        let mut tx = Transaction::new(
            format!("{} ({}/{})", description.trim(), index + 1, count),
            amount,
            TransactionKind::Expense,
            date,
            category,
        );
        tx.mark_installment(index + 1, count);
        records.push(tx);
    }
    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceFrequency {
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    /// Number of future occurrences generated after the base record.
    pub fn occurrences(self) -> u32 {
        match self {
            Self::Weekly | Self::Monthly => 12,
            Self::Yearly => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    fn step(self, base: NaiveDate, index: u32) -> Option<NaiveDate> {
        match self {
            Self::Weekly => base.checked_add_days(Days::new(u64::from(index) * 7)),
            Self::Monthly => add_months_clamped(base, index),
            Self::Yearly => add_months_clamped(base, index.checked_mul(12)?),
        }
    }
}

impl Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceFrequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "semanal" => Ok(Self::Weekly),
            "monthly" | "mensal" => Ok(Self::Monthly),
            "yearly" | "anual" => Ok(Self::Yearly),
            other => Err(format!("unknown recurrence frequency `{other}`")),
        }
    }
}

/// Future copies of `base` following `frequency`; `base` itself is not included.
pub fn expand_recurring(base: &Transaction, frequency: RecurrenceFrequency) -> Vec<Transaction> {
    (1..=frequency.occurrences())
        .filter_map(|index| frequency.step(base.date, index))
        .map(|date| Transaction {
            id: Uuid::new_v4(),
            date,
            ..base.clone()
        })
        .collect()
}
