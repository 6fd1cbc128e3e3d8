//! Month and day aggregates: totals, category budgets, health, savings.
//!
//! # Invariants
//! - Budget percentage is capped at 100 and remaining never goes negative.
//! - Category rows always include every category budgeted for the month.
//! - Previous-month expenses ignore search/category filters.

use crate::finance::filter::TransactionFilter;
use crate::model::budget::BudgetBook;
use crate::model::period::MonthKey;
use crate::model::transaction::Transaction;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Differences below this are shown as "no change".
pub const TREND_EPSILON: f64 = 0.01;
/// Budget usage above this percentage turns the bar to warning.
pub const BUDGET_WARNING_PERCENT: f64 = 75.0;
/// Savings balance at or above this share of the goal counts as "close".
pub const SAVINGS_CLOSE_RATIO: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Up => "▲",
            Self::Down => "▼",
            Self::Flat => "=",
        }
    }

    fn of(difference: f64) -> Self {
        if difference > TREND_EPSILON {
            Self::Up
        } else if difference < -TREND_EPSILON {
            Self::Down
        } else {
            Self::Flat
        }
    }
}

/// Month-over-month expense change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseTrend {
    pub direction: TrendDirection,
    /// Absolute difference between the two months.
    pub difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLevel {
    Ok,
    Warning,
    Exceeded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetProgress {
    pub limit: f64,
    /// Spent share of the limit, capped at 100.
    pub percentage: f64,
    pub level: BudgetLevel,
    pub remaining: f64,
    /// Month-end spend extrapolated from the daily average so far.
    pub projected: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category: String,
    pub spent: f64,
    pub budget: Option<BudgetProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialHealth {
    NoData,
    Excellent,
    Good,
    Attention,
    Critical,
    Negative,
}

impl FinancialHealth {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoData => "Sem dados",
            Self::Excellent => "Excelente",
            Self::Good => "Bom",
            Self::Attention => "Atenção",
            Self::Critical => "Crítico",
            Self::Negative => "Negativo",
        }
    }

    pub fn message(self, income: f64) -> &'static str {
        match self {
            Self::NoData => "Adicione transações para análise",
            Self::Excellent => "Gastos controlados",
            Self::Good => "Gastos dentro do esperado",
            Self::Attention => "Gastos elevados",
            Self::Critical if income <= 0.0 => "Sem receitas registradas",
            Self::Critical => "Gastos muito altos",
            Self::Negative => "Saldo negativo este mês",
        }
    }
}

/// Classifies a month by its expense/income ratio.
pub fn assess_health(income: f64, expenses: f64) -> FinancialHealth {
    if income <= 0.0 && expenses <= 0.0 {
        return FinancialHealth::NoData;
    }
    if income <= 0.0 {
        return FinancialHealth::Critical;
    }
    if income - expenses < 0.0 {
        return FinancialHealth::Negative;
    }
    let ratio = expenses / income * 100.0;
    if ratio <= 50.0 {
        FinancialHealth::Excellent
    } else if ratio <= 70.0 {
        FinancialHealth::Good
    } else if ratio <= 90.0 {
        FinancialHealth::Attention
    } else {
        FinancialHealth::Critical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsStatus {
    Reached,
    Close,
    Far,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsProgress {
    pub goal: f64,
    /// Clamped to `0..=100`.
    pub percentage: f64,
    pub status: SavingsStatus,
    pub remaining: f64,
}

/// Returns `None` when no goal is set.
pub fn savings_progress(goal: f64, balance: f64) -> Option<SavingsProgress> {
    if !goal.is_finite() || goal <= 0.0 {
        return None;
    }
    let percentage = (balance / goal * 100.0).clamp(0.0, 100.0);
    let status = if balance >= goal {
        SavingsStatus::Reached
    } else if balance >= goal * SAVINGS_CLOSE_RATIO {
        SavingsStatus::Close
    } else {
        SavingsStatus::Far
    };
    Some(SavingsProgress {
        goal,
        percentage,
        status,
        remaining: (goal - balance).max(0.0),
    })
}

/// Days of `month` counted as elapsed relative to `today`.
///
/// The current month counts up to today; any other month counts in full.
pub fn elapsed_days(month: MonthKey, today: NaiveDate) -> u32 {
    if month.contains(today) {
        today.day()
    } else {
        month.days_in_month()
    }
}

/// Aggregates for one filtered month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub previous_month_expenses: f64,
    /// Absent when both months have no expenses.
    pub trend: Option<ExpenseTrend>,
    pub categories: Vec<CategoryRow>,
    pub health: FinancialHealth,
}

impl MonthSummary {
    pub fn compute(
        transactions: &[Transaction],
        filter: &TransactionFilter,
        budgets: &BudgetBook,
        today: NaiveDate,
    ) -> Self {
        let month = filter.month;
        let previous = month.previous();

        let mut income = 0.0;
        let mut expenses = 0.0;
        let mut previous_month_expenses = 0.0;
        let mut category_totals = BTreeMap::<String, f64>::new();

        for tx in transactions {
            if tx.is_expense() && previous.contains(tx.date) {
                previous_month_expenses += tx.amount;
            }
            if !filter.matches(tx) {
                continue;
            }
            if tx.is_income() {
                income += tx.amount;
            } else {
                expenses += tx.amount;
                *category_totals.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
            }
        }

        let trend = (expenses > 0.0 || previous_month_expenses > 0.0).then(|| {
            let difference = expenses - previous_month_expenses;
            ExpenseTrend {
                direction: TrendDirection::of(difference),
                difference: difference.abs(),
            }
        });

        let limits = budgets.month(month);
        for category in limits.keys() {
            category_totals.entry(category.clone()).or_insert(0.0);
        }

        let days_in_month = month.days_in_month();
        let elapsed = elapsed_days(month, today);
        let days_left = days_in_month.saturating_sub(elapsed);

        let mut categories = category_totals
            .into_iter()
            .map(|(category, spent)| {
                let budget = limits
                    .get(&category)
                    .map(|limit| budget_progress(spent, *limit, elapsed, days_left));
                CategoryRow {
                    category,
                    spent,
                    budget,
                }
            })
            .collect::<Vec<_>>();
        // BTreeMap order breaks ties by name.
        categories.sort_by(|a, b| b.spent.total_cmp(&a.spent));

        Self {
            month,
            income,
            expenses,
            balance: income - expenses,
            previous_month_expenses,
            trend,
            categories,
            health: assess_health(income, expenses),
        }
    }
}

fn budget_progress(spent: f64, limit: f64, elapsed: u32, days_left: u32) -> BudgetProgress {
    let raw = spent / limit * 100.0;
    let level = if raw >= 100.0 {
        BudgetLevel::Exceeded
    } else if raw > BUDGET_WARNING_PERCENT {
        BudgetLevel::Warning
    } else {
        BudgetLevel::Ok
    };
    let per_day = if elapsed > 0 {
        spent / f64::from(elapsed)
    } else {
        0.0
    };
    BudgetProgress {
        limit,
        percentage: raw.min(100.0),
        level,
        remaining: (limit - spent).max(0.0),
        projected: spent + per_day * f64::from(days_left),
    }
}

/// Percent change of today's expenses against yesterday's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTrend {
    pub direction: TrendDirection,
    /// Absolute change, one decimal place.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub count: usize,
    /// Absent when yesterday had no expenses.
    pub trend: Option<DayTrend>,
}

pub fn day_summary(transactions: &[Transaction], today: NaiveDate) -> DaySummary {
    let mut income = 0.0;
    let mut expenses = 0.0;
    let mut count = 0;
    let mut yesterday_expenses = 0.0;
    let yesterday = today.pred_opt();

    for tx in transactions {
        if tx.date == today {
            count += 1;
            if tx.is_income() {
                income += tx.amount;
            } else {
                expenses += tx.amount;
            }
        } else if Some(tx.date) == yesterday && tx.is_expense() {
            yesterday_expenses += tx.amount;
        }
    }

    let trend = (yesterday_expenses > 0.0).then(|| {
        let diff = expenses - yesterday_expenses;
        let direction = if diff > 0.0 {
            TrendDirection::Up
        } else if diff < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        };
        DayTrend {
            direction,
            percent: ((diff / yesterday_expenses * 100.0).abs() * 10.0).round() / 10.0,
        }
    });

    DaySummary {
        date: today,
        income,
        expenses,
        balance: income - expenses,
        count,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        assess_health, day_summary, savings_progress, BudgetLevel, FinancialHealth, MonthSummary,
        SavingsStatus, TrendDirection,
    };
    use crate::finance::filter::TransactionFilter;
    use crate::model::budget::BudgetBook;
    use crate::model::period::MonthKey;
    use crate::model::transaction::{Transaction, TransactionKind};
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn expense(desc: &str, amount: f64, on: NaiveDate, category: &str) -> Transaction {
        Transaction::new(desc, amount, TransactionKind::Expense, on, category)
    }

    #[test]
    fn month_summary_projects_budget_from_daily_average() {
        let month = MonthKey::new(2024, 4).unwrap();
        let txs = vec![
            Transaction::new("Salário", 3000.0, TransactionKind::Income, date(4, 1), "Trabalho"),
            expense("Mercado", 300.0, date(4, 3), "Alimentação"),
            expense("Feira", 100.0, date(4, 9), "Alimentação"),
            expense("Março", 250.0, date(3, 20), "Lazer"),
        ];
        let mut budgets = BudgetBook::new();
        budgets.set_month(
            month,
            [("Alimentação".to_string(), 500.0), ("Saúde".to_string(), 200.0)],
        );

        let summary = MonthSummary::compute(
            &txs,
            &TransactionFilter::for_month(month),
            &budgets,
            date(4, 10),
        );

        assert_eq!(summary.income, 3000.0);
        assert_eq!(summary.expenses, 400.0);
        assert_eq!(summary.balance, 2600.0);
        assert_eq!(summary.previous_month_expenses, 250.0);
        let trend = summary.trend.unwrap();
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.difference, 150.0);

        assert_eq!(summary.categories.len(), 2);
        let food = &summary.categories[0];
        assert_eq!(food.category, "Alimentação");
        let progress = food.budget.unwrap();
        assert_eq!(progress.percentage, 80.0);
        assert_eq!(progress.level, BudgetLevel::Warning);
        assert_eq!(progress.remaining, 100.0);
        // 400 over 10 days, 20 days left -> 400 + 40 * 20
        assert_eq!(progress.projected, 1200.0);

        let health = &summary.categories[1];
        assert_eq!(health.category, "Saúde");
        assert_eq!(health.spent, 0.0);
        assert_eq!(health.budget.unwrap().level, BudgetLevel::Ok);
    }

    #[test]
    fn past_month_projection_uses_full_month() {
        let month = MonthKey::new(2024, 2).unwrap();
        let txs = vec![expense("Aluguel", 1000.0, date(2, 1), "Moradia")];
        let mut budgets = BudgetBook::new();
        budgets.set_month(month, [("Moradia".to_string(), 800.0)]);

        let summary = MonthSummary::compute(
            &txs,
            &TransactionFilter::for_month(month),
            &budgets,
            date(5, 1),
        );
        let progress = summary.categories[0].budget.unwrap();
        assert_eq!(progress.percentage, 100.0);
        assert_eq!(progress.level, BudgetLevel::Exceeded);
        assert_eq!(progress.remaining, 0.0);
        assert_eq!(progress.projected, 1000.0);
    }

    #[test]
    fn trend_is_absent_without_expenses_in_either_month() {
        let month = MonthKey::new(2024, 4).unwrap();
        let summary = MonthSummary::compute(
            &[],
            &TransactionFilter::for_month(month),
            &BudgetBook::new(),
            date(4, 1),
        );
        assert!(summary.trend.is_none());
        assert!(summary.categories.is_empty());
        assert_eq!(summary.health, FinancialHealth::NoData);
    }

    #[test]
    fn health_thresholds_follow_expense_ratio() {
        assert_eq!(assess_health(1000.0, 500.0), FinancialHealth::Excellent);
        assert_eq!(assess_health(1000.0, 700.0), FinancialHealth::Good);
        assert_eq!(assess_health(1000.0, 900.0), FinancialHealth::Attention);
        assert_eq!(assess_health(1000.0, 950.0), FinancialHealth::Critical);
        assert_eq!(assess_health(1000.0, 1200.0), FinancialHealth::Negative);
        assert_eq!(assess_health(0.0, 10.0), FinancialHealth::Critical);
        assert_eq!(FinancialHealth::Critical.message(0.0), "Sem receitas registradas");
        assert_eq!(FinancialHealth::Critical.message(1000.0), "Gastos muito altos");
    }

    #[test]
    fn savings_progress_classifies_distance_to_goal() {
        assert!(savings_progress(0.0, 100.0).is_none());

        let reached = savings_progress(500.0, 600.0).unwrap();
        assert_eq!(reached.status, SavingsStatus::Reached);
        assert_eq!(reached.percentage, 100.0);

        let close = savings_progress(1000.0, 800.0).unwrap();
        assert_eq!(close.status, SavingsStatus::Close);
        assert_eq!(close.remaining, 200.0);

        let far = savings_progress(1000.0, -50.0).unwrap();
        assert_eq!(far.status, SavingsStatus::Far);
        assert_eq!(far.percentage, 0.0);
    }

    #[test]
    fn day_summary_compares_with_yesterday_expenses() {
        let today = date(4, 10);
        let txs = vec![
            expense("Almoço", 60.0, today, "Alimentação"),
            Transaction::new("Pix", 100.0, TransactionKind::Income, today, "Outros"),
            expense("Jantar", 40.0, date(4, 9), "Alimentação"),
        ];
        let summary = day_summary(&txs, today);

        assert_eq!(summary.count, 2);
        assert_eq!(summary.balance, 40.0);
        let trend = summary.trend.unwrap();
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.percent, 50.0);
    }
}
