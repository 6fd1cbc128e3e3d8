//! Finance transaction model.
//!
//! # Responsibility
//! - Define the canonical income/expense record.
//! - Validate user-facing invariants before persistence.
//!
//! # Invariants
//! - `id` is stable for the record lifetime.
//! - `amount` is always positive; `kind` carries the sign.
//! - Installment markers are either all absent or all present.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TransactionId = Uuid;

/// Minimum description length in characters after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 2;
/// Inclusive installment count bounds for split purchases.
pub const MIN_INSTALLMENTS: u32 = 2;
pub const MAX_INSTALLMENTS: u32 = 120;

/// Income or expense.
///
/// Serialized with the Portuguese labels used by stored data and CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "Receita")]
    Income,
    #[serde(rename = "Despesa")]
    Expense,
}

impl TransactionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Receita",
            Self::Expense => "Despesa",
        }
    }

    /// Parses stored labels and their English equivalents, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "receita" | "income" => Some(Self::Income),
            "despesa" | "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of one record inside a split purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentInfo {
    pub number: u32,
    pub total: u32,
}

/// One income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_installment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_installments: Option<u32>,
}

impl Transaction {
    /// Creates a plain (non-installment) transaction with a fresh id.
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            kind,
            date,
            category: category.into(),
            account_id: None,
            is_installment: false,
            installment_number: None,
            total_installments: None,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Returns installment position when this record belongs to a split purchase.
    pub fn installment(&self) -> Option<InstallmentInfo> {
        if !self.is_installment {
            return None;
        }
        Some(InstallmentInfo {
            number: self.installment_number?,
            total: self.total_installments?,
        })
    }

    pub fn mark_installment(&mut self, number: u32, total: u32) {
        self.is_installment = true;
        self.installment_number = Some(number);
        self.total_installments = Some(total);
    }

    pub fn clear_installment(&mut self) {
        self.is_installment = false;
        self.installment_number = None;
        self.total_installments = None;
    }

    /// Validates field-level invariants that do not depend on the clock.
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        validate_description(&self.description)?;
        validate_amount(self.amount)?;
        validate_category(&self.category)?;
        if self.is_installment {
            match (self.installment_number, self.total_installments) {
                (Some(number), Some(total)) if number >= 1 && number <= total => {}
                _ => return Err(TransactionValidationError::InvalidInstallmentMarker),
            }
        }
        Ok(())
    }
}

/// Validation errors for transaction input.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionValidationError {
    DescriptionTooShort,
    NonPositiveAmount(f64),
    MissingCategory,
    InstallmentCountOutOfRange(u32),
    DateTooFarInFuture(NaiveDate),
    InvalidInstallmentMarker,
}

impl Display for TransactionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DescriptionTooShort => write!(
                f,
                "description must have at least {MIN_DESCRIPTION_CHARS} characters"
            ),
            Self::NonPositiveAmount(value) => {
                write!(f, "amount must be a positive number, got {value}")
            }
            Self::MissingCategory => write!(f, "category is required"),
            Self::InstallmentCountOutOfRange(value) => write!(
                f,
                "installment count must be between {MIN_INSTALLMENTS} and {MAX_INSTALLMENTS}, got {value}"
            ),
            Self::DateTooFarInFuture(date) => {
                write!(f, "date {date} is more than one year in the future")
            }
            Self::InvalidInstallmentMarker => write!(f, "installment markers are inconsistent"),
        }
    }
}

impl Error for TransactionValidationError {}

pub(crate) fn validate_description(value: &str) -> Result<(), TransactionValidationError> {
    if value.trim().chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(TransactionValidationError::DescriptionTooShort);
    }
    Ok(())
}

pub(crate) fn validate_amount(value: f64) -> Result<(), TransactionValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TransactionValidationError::NonPositiveAmount(value));
    }
    Ok(())
}

pub(crate) fn validate_category(value: &str) -> Result<(), TransactionValidationError> {
    if value.trim().is_empty() {
        return Err(TransactionValidationError::MissingCategory);
    }
    Ok(())
}

fn is_false(value: &bool) -> bool {
    !*value
}
