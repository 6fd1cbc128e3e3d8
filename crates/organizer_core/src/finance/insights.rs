//! Longer-range finance insights: yearly trend, month-end projection,
//! spending patterns and frequent categories.

use crate::model::period::MonthKey;
use crate::model::transaction::{Transaction, TransactionKind};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Minimum occurrences of the same description/category to count as recurring.
pub const RECURRING_MIN_OCCURRENCES: usize = 3;
/// Quick-pick categories offered per transaction type.
pub const FREQUENT_CATEGORY_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthTotals {
    pub month: MonthKey,
    pub income: f64,
    pub expenses: f64,
}

impl MonthTotals {
    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }
}

/// Income and expense totals for one month.
pub fn month_totals(transactions: &[Transaction], month: MonthKey) -> MonthTotals {
    let mut totals = MonthTotals {
        month,
        income: 0.0,
        expenses: 0.0,
    };
    for tx in transactions.iter().filter(|tx| month.contains(tx.date)) {
        match tx.kind {
            TransactionKind::Income => totals.income += tx.amount,
            TransactionKind::Expense => totals.expenses += tx.amount,
        }
    }
    totals
}

/// January..December totals for `year`; always twelve entries.
pub fn yearly_trend(transactions: &[Transaction], year: i32) -> Vec<MonthTotals> {
    (1..=12)
        .filter_map(|month| MonthKey::new(year, month))
        .map(|month| month_totals(transactions, month))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthProjection {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

/// Extrapolates the current month to its end from daily averages so far.
pub fn month_projection(transactions: &[Transaction], today: NaiveDate) -> MonthProjection {
    let month = MonthKey::of(today);
    let totals = month_totals(transactions, month);
    let elapsed = f64::from(today.day());
    let days_left = f64::from(month.days_in_month().saturating_sub(today.day()));

    let income = totals.income + totals.income / elapsed * days_left;
    let expenses = totals.expenses + totals.expenses / elapsed * days_left;
    MonthProjection {
        income,
        expenses,
        balance: income - expenses,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringExpense {
    /// Description as first seen.
    pub description: String,
    pub category: String,
    pub occurrences: usize,
    pub average_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySuggestion {
    pub category: String,
    pub total: f64,
}

impl CategorySuggestion {
    pub fn message(&self) -> String {
        format!(
            "Você gasta mais em {}. Considere revisar esses gastos.",
            self.category
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingPatterns {
    pub recurring: Vec<RecurringExpense>,
    /// Category with the highest total spend across all transactions.
    pub highest_category: Option<CategorySuggestion>,
}

/// Detects repeated expenses and the dominant spending category.
pub fn analyze_patterns(transactions: &[Transaction]) -> SpendingPatterns {
    let mut groups: Vec<RecurringExpense> = Vec::new();
    let mut index_by_key = HashMap::<(String, String), usize>::new();
    let mut category_totals: Vec<(String, f64)> = Vec::new();

    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        let key = (tx.description.to_lowercase(), tx.category.clone());
        match index_by_key.get(&key) {
            Some(&index) => {
                let group = &mut groups[index];
                group.occurrences += 1;
                group.average_amount += tx.amount;
            }
            None => {
                index_by_key.insert(key, groups.len());
                groups.push(RecurringExpense {
                    description: tx.description.clone(),
                    category: tx.category.clone(),
                    occurrences: 1,
                    average_amount: tx.amount,
                });
            }
        }

        match category_totals.iter_mut().find(|(name, _)| *name == tx.category) {
            Some((_, total)) => *total += tx.amount,
            None => category_totals.push((tx.category.clone(), tx.amount)),
        }
    }

    let recurring = groups
        .into_iter()
        .filter(|group| group.occurrences >= RECURRING_MIN_OCCURRENCES)
        .map(|mut group| {
            group.average_amount /= group.occurrences as f64;
            group
        })
        .collect();

    // First-seen category wins ties.
    let highest_category = category_totals
        .into_iter()
        .fold(None::<(String, f64)>, |best, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        })
        .map(|(category, total)| CategorySuggestion { category, total });

    SpendingPatterns {
        recurring,
        highest_category,
    }
}

/// Most used categories for `kind`, by transaction count.
pub fn frequent_categories(transactions: &[Transaction], kind: TransactionKind) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for tx in transactions.iter().filter(|tx| tx.kind == kind) {
        match counts.iter_mut().find(|(name, _)| *name == tx.category) {
            Some((_, count)) => *count += 1,
            None => counts.push((tx.category.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(FREQUENT_CATEGORY_LIMIT)
        .map(|(name, _)| name)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthTrend {
    Up,
    Down,
    Stable,
}

impl GrowthTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

/// Whole-percent change of `current` over `previous`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Growth {
    pub current: f64,
    pub previous: f64,
    /// Rounded; 0 when `previous` is zero.
    pub percent: i64,
    pub trend: GrowthTrend,
}

pub fn growth(current: f64, previous: f64) -> Growth {
    let change = if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    };
    let trend = if change > 0.0 {
        GrowthTrend::Up
    } else if change < 0.0 {
        GrowthTrend::Down
    } else {
        GrowthTrend::Stable
    };
    Growth {
        current,
        previous,
        percent: change.round() as i64,
        trend,
    }
}

/// Month-over-month expense change for the month containing `today`.
pub fn expense_change(transactions: &[Transaction], today: NaiveDate) -> Growth {
    let month = MonthKey::of(today);
    let current = month_totals(transactions, month).expenses;
    let previous = month_totals(transactions, month.previous()).expenses;
    growth(current, previous)
}

#[cfg(test)]
mod tests {
    use super::{
        analyze_patterns, expense_change, frequent_categories, growth, month_projection,
        yearly_trend, GrowthTrend,
    };
    use crate::model::transaction::{Transaction, TransactionKind};
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn expense(desc: &str, amount: f64, on: NaiveDate, category: &str) -> Transaction {
        Transaction::new(desc, amount, TransactionKind::Expense, on, category)
    }

    #[test]
    fn yearly_trend_has_twelve_months() {
        let txs = vec![
            expense("Luz", 100.0, date(2, 3), "Moradia"),
            Transaction::new("Salário", 2000.0, TransactionKind::Income, date(2, 5), "Trabalho"),
            expense("Outro ano", 50.0, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(), "Outros"),
        ];
        let trend = yearly_trend(&txs, 2024);
        assert_eq!(trend.len(), 12);
        assert_eq!(trend[1].expenses, 100.0);
        assert_eq!(trend[1].balance(), 1900.0);
        assert_eq!(trend[0].income, 0.0);
    }

    #[test]
    fn projection_extrapolates_daily_average() {
        // April has 30 days; day 10 leaves 20.
        let txs = vec![
            expense("Mercado", 100.0, date(4, 2), "Alimentação"),
            Transaction::new("Freela", 500.0, TransactionKind::Income, date(4, 8), "Trabalho"),
        ];
        let projection = month_projection(&txs, date(4, 10));
        assert_eq!(projection.expenses, 300.0);
        assert_eq!(projection.income, 1500.0);
        assert_eq!(projection.balance, 1200.0);
    }

    #[test]
    fn patterns_group_by_lowercase_description_and_category() {
        let txs = vec![
            expense("Uber", 20.0, date(1, 1), "Transporte"),
            expense("uber", 30.0, date(1, 2), "Transporte"),
            expense("UBER", 40.0, date(1, 3), "Transporte"),
            expense("Uber", 100.0, date(1, 4), "Lazer"),
            expense("Aluguel", 1500.0, date(1, 5), "Moradia"),
        ];
        let patterns = analyze_patterns(&txs);

        assert_eq!(patterns.recurring.len(), 1);
        let recurring = &patterns.recurring[0];
        assert_eq!(recurring.description, "Uber");
        assert_eq!(recurring.occurrences, 3);
        assert_eq!(recurring.average_amount, 30.0);

        let highest = patterns.highest_category.unwrap();
        assert_eq!(highest.category, "Moradia");
        assert_eq!(highest.total, 1500.0);
    }

    #[test]
    fn frequent_categories_keep_top_four_for_type() {
        let mut txs = Vec::new();
        for (category, count) in [("A", 1), ("B", 5), ("C", 3), ("D", 2), ("E", 4)] {
            for _ in 0..count {
                txs.push(expense("gasto", 1.0, date(1, 1), category));
            }
        }
        txs.push(Transaction::new("pix", 1.0, TransactionKind::Income, date(1, 1), "Z"));

        assert_eq!(
            frequent_categories(&txs, TransactionKind::Expense),
            vec!["B", "E", "C", "D"]
        );
        assert_eq!(frequent_categories(&txs, TransactionKind::Income), vec!["Z"]);
    }

    #[test]
    fn growth_is_zero_without_previous_value() {
        assert_eq!(growth(10.0, 0.0).trend, GrowthTrend::Stable);
        assert_eq!(growth(150.0, 100.0).percent, 50);
        assert_eq!(growth(2.0, 3.0).percent, -33);

        let txs = vec![
            expense("Março", 200.0, date(3, 10), "Outros"),
            expense("Abril", 100.0, date(4, 1), "Outros"),
        ];
        let change = expense_change(&txs, date(4, 15));
        assert_eq!(change.percent, -50);
        assert_eq!(change.trend, GrowthTrend::Down);
    }
}
