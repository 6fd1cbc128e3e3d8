//! Finance use-case service.
//!
//! # Responsibility
//! - Create, edit, delete and bulk-edit transactions in the store.
//! - Own budgets, savings goal, categories, templates and accounts.
//! - Assemble month/today views and insights from the pure finance engine.
//!
//! # Invariants
//! - Every persisted transaction passed `Transaction::validate`.
//! - Installment records are never edited individually.
//! - The seven default categories cannot be deleted.
//! - At least one account always exists.

use crate::finance::alerts::{budget_alerts, savings_alert, Alert};
use crate::finance::csv_io::{
    export_transactions_csv, import_transactions_csv, import_transactions_json,
    monthly_report_csv, ImportError,
};
use crate::finance::filter::{filter_transactions, SortMode, TransactionFilter};
use crate::finance::insights::{
    analyze_patterns, expense_change, frequent_categories, month_projection, yearly_trend, Growth,
    MonthProjection, MonthTotals, SpendingPatterns,
};
use crate::finance::installments::{expand_installments, expand_recurring, RecurrenceFrequency};
use crate::finance::summary::{day_summary, savings_progress, DaySummary, MonthSummary, SavingsProgress};
use crate::model::account::{Account, DEFAULT_ACCOUNT_ID};
use crate::model::budget::BudgetBook;
use crate::model::category::{default_categories, is_default_category, Category};
use crate::model::period::MonthKey;
use crate::model::template::{TemplateId, TransactionTemplate};
use crate::model::transaction::{
    validate_amount, validate_category, validate_description, Transaction, TransactionId,
    TransactionKind, TransactionValidationError,
};
use crate::store::keys;
use crate::store::{JsonStore, KeyValueStore, StoreError};
use chrono::{DateTime, Months, NaiveDate, Utc};
use log::info;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type FinanceResult<T> = Result<T, FinanceError>;

/// Service error for finance use-cases.
#[derive(Debug)]
pub enum FinanceError {
    Validation(TransactionValidationError),
    Import(ImportError),
    TransactionNotFound(TransactionId),
    /// Installment records are part of a split purchase.
    InstallmentNotEditable(TransactionId),
    InvalidCategoryName,
    CategoryExists(String),
    CategoryProtected(String),
    TemplateNotFound(TemplateId),
    InvalidAccountName,
    AccountNotFound(String),
    /// Deleting would leave no account.
    LastAccount,
    InvalidSavingsGoal(f64),
    Store(StoreError),
}

impl Display for FinanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::TransactionNotFound(id) => write!(f, "transaction not found: {id}"),
            Self::InstallmentNotEditable(id) => {
                write!(f, "installment {id} cannot be edited individually")
            }
            Self::InvalidCategoryName => write!(f, "category name is required"),
            Self::CategoryExists(name) => write!(f, "category already exists: `{name}`"),
            Self::CategoryProtected(name) => {
                write!(f, "default category `{name}` cannot be deleted")
            }
            Self::TemplateNotFound(id) => write!(f, "template not found: {id}"),
            Self::InvalidAccountName => write!(f, "account name is required"),
            Self::AccountNotFound(id) => write!(f, "account not found: {id}"),
            Self::LastAccount => write!(f, "at least one account must remain"),
            Self::InvalidSavingsGoal(value) => {
                write!(f, "savings goal must be zero or positive, got {value}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FinanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FinanceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TransactionValidationError> for FinanceError {
    fn from(value: TransactionValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ImportError> for FinanceError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

/// Input for creating one or more transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub category: String,
    pub account_id: Option<String>,
    /// Split into this many monthly expense records.
    pub installments: Option<u32>,
    /// Also create future copies on this schedule.
    pub recurrence: Option<RecurrenceFrequency>,
}

impl NewTransaction {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            kind,
            date,
            category: category.into(),
            account_id: None,
            installments: None,
            recurrence: None,
        }
    }

    pub fn with_installments(mut self, count: u32) -> Self {
        self.installments = Some(count);
        self
    }

    pub fn with_recurrence(mut self, frequency: RecurrenceFrequency) -> Self {
        self.recurrence = Some(frequency);
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

/// Full replacement of the editable fields of one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpdate {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub category: String,
    pub account_id: Option<String>,
}

/// Filtered, sorted transactions for one month plus their aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthView {
    pub items: Vec<Transaction>,
    pub summary: MonthSummary,
    pub savings: Option<SavingsProgress>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub account: Account,
    /// Opening balance plus attributed income minus attributed expenses.
    pub balance: f64,
}

/// Cross-cutting analysis for the insights screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceInsights {
    pub yearly: Vec<MonthTotals>,
    pub projection: MonthProjection,
    pub patterns: SpendingPatterns,
    pub expense_change: Growth,
}

/// Finance service facade over any key-value store.
pub struct FinanceService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> FinanceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads all transactions in stored order; corrupt data reads as empty.
    pub fn transactions(&self) -> FinanceResult<Vec<Transaction>> {
        Ok(self.store.load_json(keys::FINANCE_TRANSACTIONS, Vec::new())?)
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> FinanceResult<()> {
        self.store
            .save_json(keys::FINANCE_TRANSACTIONS, transactions)?;
        Ok(())
    }

    /// Validates and stores a new entry, expanding installments or recurrence.
    ///
    /// Returns every record created, in date order.
    pub fn add_transaction(
        &self,
        input: NewTransaction,
        today: NaiveDate,
    ) -> FinanceResult<Vec<Transaction>> {
        validate_description(&input.description)?;
        validate_amount(input.amount)?;
        validate_category(&input.category)?;
        ensure_not_far_future(input.date, today)?;

        let mut created = match (input.installments, input.recurrence) {
            (Some(count), _) => expand_installments(
                &input.description,
                input.amount,
                count,
                input.date,
                input.category.trim(),
            )?,
            (None, recurrence) => {
                let base = Transaction::new(
                    input.description.trim(),
                    input.amount,
                    input.kind,
                    input.date,
                    input.category.trim(),
                );
                let mut records = match recurrence {
                    Some(frequency) => expand_recurring(&base, frequency),
                    None => Vec::new(),
                };
                records.insert(0, base);
                records
            }
        };
        for tx in &mut created {
            tx.account_id = input.account_id.clone();
            tx.validate()?;
        }

        let mut all = self.transactions()?;
        all.extend(created.iter().cloned());
        self.save_transactions(&all)?;

        info!(
            "event=transaction_create module=finance status=ok count={} installments={} recurrence={}",
            created.len(),
            input.installments.unwrap_or(0),
            input.recurrence.map_or("none", RecurrenceFrequency::as_str)
        );
        Ok(created)
    }

    /// Replaces the editable fields of a non-installment transaction.
    pub fn update_transaction(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
        today: NaiveDate,
    ) -> FinanceResult<Transaction> {
        let mut all = self.transactions()?;
        let tx = all
            .iter_mut()
            .find(|tx| tx.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;
        if tx.is_installment {
            return Err(FinanceError::InstallmentNotEditable(id));
        }
        ensure_not_far_future(update.date, today)?;

        let mut edited = tx.clone();
        edited.description = update.description.trim().to_string();
        edited.amount = update.amount;
        edited.kind = update.kind;
        edited.date = update.date;
        edited.category = update.category.trim().to_string();
        edited.account_id = update.account_id;
        edited.validate()?;
        *tx = edited.clone();

        self.save_transactions(&all)?;
        info!("event=transaction_update module=finance status=ok");
        Ok(edited)
    }

    /// Removes one transaction and returns it so the caller can undo.
    pub fn delete_transaction(&self, id: TransactionId) -> FinanceResult<Transaction> {
        let mut all = self.transactions()?;
        let index = all
            .iter()
            .position(|tx| tx.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;
        let removed = all.remove(index);
        self.save_transactions(&all)?;
        info!("event=transaction_delete module=finance status=ok count=1");
        Ok(removed)
    }

    /// Re-inserts a previously deleted transaction.
    ///
    /// Returns `false` when a record with the same id already exists.
    pub fn restore_transaction(&self, tx: Transaction) -> FinanceResult<bool> {
        tx.validate()?;
        let mut all = self.transactions()?;
        if all.iter().any(|existing| existing.id == tx.id) {
            return Ok(false);
        }
        all.push(tx);
        self.save_transactions(&all)?;
        info!("event=transaction_restore module=finance status=ok");
        Ok(true)
    }

    /// Removes every listed transaction; unknown ids are ignored.
    pub fn delete_many(&self, ids: &[TransactionId]) -> FinanceResult<Vec<Transaction>> {
        let targets = ids.iter().copied().collect::<HashSet<_>>();
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .transactions()?
            .into_iter()
            .partition(|tx| targets.contains(&tx.id));
        if !removed.is_empty() {
            self.save_transactions(&kept)?;
        }
        info!(
            "event=transaction_delete module=finance status=ok count={}",
            removed.len()
        );
        Ok(removed)
    }

    /// Moves every listed transaction to `category`; returns how many changed.
    pub fn set_category_many(
        &self,
        ids: &[TransactionId],
        category: &str,
    ) -> FinanceResult<usize> {
        validate_category(category)?;
        let category = category.trim();
        let targets = ids.iter().copied().collect::<HashSet<_>>();
        let mut all = self.transactions()?;
        let mut changed = 0;
        for tx in all.iter_mut().filter(|tx| targets.contains(&tx.id)) {
            if tx.category != category {
                tx.category = category.to_string();
                changed += 1;
            }
        }
        if changed > 0 {
            self.save_transactions(&all)?;
        }
        info!("event=transaction_bulk_category module=finance status=ok count={changed}");
        Ok(changed)
    }

    pub fn month_view(
        &self,
        filter: &TransactionFilter,
        sort: SortMode,
        today: NaiveDate,
    ) -> FinanceResult<MonthView> {
        let all = self.transactions()?;
        let budgets = self.budgets(today)?;
        let items = filter_transactions(&all, filter, sort)
            .into_iter()
            .cloned()
            .collect();
        let summary = MonthSummary::compute(&all, filter, &budgets, today);
        let savings = savings_progress(self.savings_goal()?, summary.balance);
        Ok(MonthView {
            items,
            summary,
            savings,
        })
    }

    pub fn today_view(&self, today: NaiveDate) -> FinanceResult<DaySummary> {
        Ok(day_summary(&self.transactions()?, today))
    }

    /// Loads budgets, migrating and persisting the legacy flat layout.
    pub fn budgets(&self, today: NaiveDate) -> FinanceResult<BudgetBook> {
        let raw: Value = self
            .store
            .load_json(keys::FINANCE_BUDGETS, Value::Object(Default::default()))?;
        let book = BudgetBook::from_stored(&raw, MonthKey::of(today));
        let normalized = serde_json::to_value(&book).unwrap_or(Value::Null);
        if raw != normalized && raw.as_object().is_some_and(|map| !map.is_empty()) {
            self.store.save_json(keys::FINANCE_BUDGETS, &book)?;
            info!(
                "event=budget_migrate module=finance status=ok periods={}",
                book.period_count()
            );
        }
        Ok(book)
    }

    /// Replaces the limits of one month; non-positive limits are dropped.
    pub fn set_month_budgets(
        &self,
        month: MonthKey,
        limits: Vec<(String, f64)>,
        today: NaiveDate,
    ) -> FinanceResult<BudgetBook> {
        let mut book = self.budgets(today)?;
        book.set_month(
            month,
            limits
                .into_iter()
                .map(|(category, amount)| (category.trim().to_string(), amount))
                .filter(|(category, _)| !category.is_empty()),
        );
        self.store.save_json(keys::FINANCE_BUDGETS, &book)?;
        info!(
            "event=budget_save module=finance status=ok categories={}",
            book.category_count(month)
        );
        Ok(book)
    }

    pub fn savings_goal(&self) -> FinanceResult<f64> {
        let goal: f64 = self.store.load_json(keys::FINANCE_SAVINGS_GOAL, 0.0)?;
        Ok(if goal.is_finite() { goal.max(0.0) } else { 0.0 })
    }

    /// Sets the monthly savings goal; zero clears it.
    pub fn set_savings_goal(&self, goal: f64) -> FinanceResult<()> {
        if !goal.is_finite() || goal < 0.0 {
            return Err(FinanceError::InvalidSavingsGoal(goal));
        }
        self.store.save_json(keys::FINANCE_SAVINGS_GOAL, &goal)?;
        Ok(())
    }

    /// Stored categories, or the defaults when none are stored.
    pub fn categories(&self) -> FinanceResult<Vec<Category>> {
        let stored: Vec<Category> = self.store.load_json(keys::FINANCE_CATEGORIES, Vec::new())?;
        Ok(if stored.is_empty() {
            default_categories()
        } else {
            stored
        })
    }

    /// Display metadata for `name`, falling back to a generic tag.
    pub fn category_info(&self, name: &str) -> FinanceResult<Category> {
        let found = self
            .categories()?
            .into_iter()
            .chain(default_categories())
            .find(|category| category.name == name);
        Ok(found.unwrap_or_else(|| Category::fallback(name)))
    }

    pub fn add_category(&self, name: &str, icon: &str, color: &str) -> FinanceResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FinanceError::InvalidCategoryName);
        }
        let mut categories = self.categories()?;
        let lowered = name.to_lowercase();
        if categories
            .iter()
            .any(|category| category.name.to_lowercase() == lowered)
        {
            return Err(FinanceError::CategoryExists(name.to_string()));
        }
        let category = Category::new(name, icon, color);
        categories.push(category.clone());
        self.store.save_json(keys::FINANCE_CATEGORIES, &categories)?;
        info!("event=category_create module=finance status=ok");
        Ok(category)
    }

    /// Deletes a custom category; returns whether it existed.
    pub fn delete_category(&self, name: &str) -> FinanceResult<bool> {
        if is_default_category(name) {
            return Err(FinanceError::CategoryProtected(name.to_string()));
        }
        let mut categories = self.categories()?;
        let before = categories.len();
        categories.retain(|category| category.name != name);
        let removed = categories.len() != before;
        if removed {
            self.store.save_json(keys::FINANCE_CATEGORIES, &categories)?;
        }
        Ok(removed)
    }

    pub fn templates(&self) -> FinanceResult<Vec<TransactionTemplate>> {
        Ok(self.store.load_json(keys::FINANCE_TEMPLATES, Vec::new())?)
    }

    /// Saves entry values as a template named after the description.
    pub fn create_template(
        &self,
        description: &str,
        amount: f64,
        category: &str,
        kind: TransactionKind,
        now: DateTime<Utc>,
    ) -> FinanceResult<TransactionTemplate> {
        validate_description(description)?;
        validate_amount(amount)?;
        validate_category(category)?;
        let template = TransactionTemplate {
            id: Uuid::new_v4(),
            name: description.trim().to_string(),
            description: description.trim().to_string(),
            amount,
            category: category.trim().to_string(),
            kind,
            created_at: now,
        };
        let mut templates = self.templates()?;
        templates.push(template.clone());
        self.store.save_json(keys::FINANCE_TEMPLATES, &templates)?;
        info!("event=template_create module=finance status=ok");
        Ok(template)
    }

    /// Prefills a new entry from a template, dated `today`.
    pub fn apply_template(&self, id: TemplateId, today: NaiveDate) -> FinanceResult<NewTransaction> {
        let template = self
            .templates()?
            .into_iter()
            .find(|template| template.id == id)
            .ok_or(FinanceError::TemplateNotFound(id))?;
        Ok(NewTransaction::new(
            template.description,
            template.amount,
            template.kind,
            today,
            template.category,
        ))
    }

    pub fn delete_template(&self, id: TemplateId) -> FinanceResult<bool> {
        let mut templates = self.templates()?;
        let before = templates.len();
        templates.retain(|template| template.id != id);
        let removed = templates.len() != before;
        if removed {
            self.store.save_json(keys::FINANCE_TEMPLATES, &templates)?;
        }
        Ok(removed)
    }

    /// Stored accounts; seeds and persists the default account when empty.
    pub fn accounts(&self) -> FinanceResult<Vec<Account>> {
        let accounts: Vec<Account> = self.store.load_json(keys::FINANCE_ACCOUNTS, Vec::new())?;
        if !accounts.is_empty() {
            return Ok(accounts);
        }
        let seeded = vec![Account::default_account()];
        self.store.save_json(keys::FINANCE_ACCOUNTS, &seeded)?;
        Ok(seeded)
    }

    pub fn add_account(&self, name: &str) -> FinanceResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FinanceError::InvalidAccountName);
        }
        let mut accounts = self.accounts()?;
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            balance: 0.0,
        };
        accounts.push(account.clone());
        self.store.save_json(keys::FINANCE_ACCOUNTS, &accounts)?;
        info!("event=account_create module=finance status=ok");
        Ok(account)
    }

    pub fn delete_account(&self, id: &str) -> FinanceResult<()> {
        let mut accounts = self.accounts()?;
        if !accounts.iter().any(|account| account.id == id) {
            return Err(FinanceError::AccountNotFound(id.to_string()));
        }
        if accounts.len() <= 1 {
            return Err(FinanceError::LastAccount);
        }
        accounts.retain(|account| account.id != id);
        self.store.save_json(keys::FINANCE_ACCOUNTS, &accounts)?;
        Ok(())
    }

    /// Balances per account; unattributed transactions count toward the default account.
    pub fn account_balances(&self) -> FinanceResult<Vec<AccountBalance>> {
        let transactions = self.transactions()?;
        let accounts = self.accounts()?;
        Ok(accounts
            .into_iter()
            .map(|account| {
                let balance = transactions
                    .iter()
                    .filter(|tx| {
                        tx.account_id.as_deref().unwrap_or(DEFAULT_ACCOUNT_ID) == account.id
                    })
                    .fold(account.balance, |sum, tx| {
                        if tx.is_income() {
                            sum + tx.amount
                        } else {
                            sum - tx.amount
                        }
                    });
                AccountBalance { account, balance }
            })
            .collect())
    }

    pub fn export_csv(&self) -> FinanceResult<String> {
        Ok(export_transactions_csv(&self.transactions()?))
    }

    pub fn monthly_report(&self, month: MonthKey) -> FinanceResult<String> {
        Ok(monthly_report_csv(&self.transactions()?, month))
    }

    pub fn export_json(&self) -> FinanceResult<String> {
        serde_json::to_string_pretty(&self.transactions()?).map_err(|err| {
            FinanceError::Store(StoreError::Serialize {
                key: keys::FINANCE_TRANSACTIONS.to_string(),
                message: err.to_string(),
            })
        })
    }

    /// Imports a CSV export and appends the parsed rows.
    ///
    /// Returns `(imported, skipped)`.
    pub fn import_csv(&self, text: &str) -> FinanceResult<(usize, usize)> {
        let outcome = import_transactions_csv(text)?;
        self.append_imported(outcome.transactions, outcome.skipped, "csv")
    }

    /// Imports a JSON array; records whose id already exists get a fresh id.
    pub fn import_json(&self, text: &str) -> FinanceResult<(usize, usize)> {
        let outcome = import_transactions_json(text)?;
        self.append_imported(outcome.transactions, outcome.skipped, "json")
    }

    fn append_imported(
        &self,
        mut imported: Vec<Transaction>,
        skipped: usize,
        format: &'static str,
    ) -> FinanceResult<(usize, usize)> {
        let mut all = self.transactions()?;
        let mut seen = all.iter().map(|tx| tx.id).collect::<HashSet<_>>();
        for tx in &mut imported {
            if !seen.insert(tx.id) {
                tx.id = Uuid::new_v4();
                seen.insert(tx.id);
            }
        }
        let count = imported.len();
        if count > 0 {
            all.extend(imported);
            self.save_transactions(&all)?;
        }
        info!(
            "event=transaction_import module=finance status=ok format={format} imported={count} skipped={skipped}"
        );
        Ok((count, skipped))
    }

    pub fn insights(&self, today: NaiveDate) -> FinanceResult<FinanceInsights> {
        let all = self.transactions()?;
        Ok(FinanceInsights {
            yearly: yearly_trend(&all, MonthKey::of(today).year()),
            projection: month_projection(&all, today),
            patterns: analyze_patterns(&all),
            expense_change: expense_change(&all, today),
        })
    }

    /// Quick-pick categories for the entry form.
    pub fn frequent_categories(&self, kind: TransactionKind) -> FinanceResult<Vec<String>> {
        Ok(frequent_categories(&self.transactions()?, kind))
    }

    /// Budget and savings notifications for the current month.
    pub fn alerts(&self, today: NaiveDate) -> FinanceResult<Vec<Alert>> {
        let all = self.transactions()?;
        let mut alerts = budget_alerts(&all, &self.budgets(today)?, today);
        alerts.extend(savings_alert(&all, self.savings_goal()?, today));
        Ok(alerts)
    }
}

fn ensure_not_far_future(date: NaiveDate, today: NaiveDate) -> Result<(), TransactionValidationError> {
    let limit = today.checked_add_months(Months::new(12)).unwrap_or(NaiveDate::MAX);
    if date > limit {
        return Err(TransactionValidationError::DateTooFarInFuture(date));
    }
    Ok(())
}
