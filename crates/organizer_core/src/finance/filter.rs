//! Transaction list filtering, sorting and date grouping.

use crate::model::period::MonthKey;
use crate::model::transaction::{Transaction, TransactionKind};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::str::FromStr;

/// List ordering; ties keep insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateDesc => "date_desc",
            Self::DateAsc => "date_asc",
            Self::AmountDesc => "amount_desc",
            Self::AmountAsc => "amount_asc",
        }
    }

    fn compare(self, a: &Transaction, b: &Transaction) -> Ordering {
        match self {
            Self::DateDesc => b.date.cmp(&a.date),
            Self::DateAsc => a.date.cmp(&b.date),
            Self::AmountDesc => b.amount.total_cmp(&a.amount),
            Self::AmountAsc => a.amount.total_cmp(&b.amount),
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "date_desc" => Ok(Self::DateDesc),
            "date_asc" => Ok(Self::DateAsc),
            "amount_desc" => Ok(Self::AmountDesc),
            "amount_asc" => Ok(Self::AmountAsc),
            other => Err(format!(
                "unsupported sort mode `{other}`; expected date_desc|date_asc|amount_desc|amount_asc"
            )),
        }
    }
}

/// Optional range/type constraints layered on top of the month view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvancedFilters {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Empty means any category.
    pub categories: Vec<String>,
    pub kind: Option<TransactionKind>,
}

impl AdvancedFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn matches(&self, tx: &Transaction) -> bool {
        self.min_amount.map_or(true, |min| tx.amount >= min)
            && self.max_amount.map_or(true, |max| tx.amount <= max)
            && self.start_date.map_or(true, |start| tx.date >= start)
            && self.end_date.map_or(true, |end| tx.date <= end)
            && (self.categories.is_empty() || self.categories.iter().any(|c| *c == tx.category))
            && self.kind.map_or(true, |kind| tx.kind == kind)
    }
}

/// Month view filter: selected month plus search/category/advanced criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub month: MonthKey,
    pub search: String,
    pub category: Option<String>,
    pub advanced: AdvancedFilters,
}

impl TransactionFilter {
    pub fn for_month(month: MonthKey) -> Self {
        Self {
            month,
            search: String::new(),
            category: None,
            advanced: AdvancedFilters::default(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = (!category.trim().is_empty()).then_some(category);
        self
    }

    pub fn with_advanced(mut self, advanced: AdvancedFilters) -> Self {
        self.advanced = advanced;
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.month.contains(tx.date)
            && matches_search(tx, &self.search)
            && self
                .category
                .as_deref()
                .map_or(true, |category| tx.category == category)
            && self.advanced.matches(tx)
    }
}

/// Case-insensitive substring match over description, category and type label.
pub fn matches_search(tx: &Transaction, search: &str) -> bool {
    let term = search.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    tx.description.to_lowercase().contains(&term)
        || tx.category.to_lowercase().contains(&term)
        || tx.kind.label().to_lowercase().contains(&term)
}

/// Sorts references in place; stable for equal keys.
pub fn sort_transactions(items: &mut [&Transaction], mode: SortMode) {
    items.sort_by(|a, b| mode.compare(a, b));
}

/// Filters then sorts.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    filter: &TransactionFilter,
    mode: SortMode,
) -> Vec<&'a Transaction> {
    let mut items = transactions
        .iter()
        .filter(|tx| filter.matches(tx))
        .collect::<Vec<_>>();
    sort_transactions(&mut items, mode);
    items
}

/// Consecutive run of items sharing one date, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub items: Vec<&'a Transaction>,
}

/// Inserts a header whenever the date changes between neighbours.
pub fn group_by_date<'a>(items: &[&'a Transaction]) -> Vec<DateGroup<'a>> {
    let mut groups: Vec<DateGroup<'a>> = Vec::new();
    for tx in items {
        match groups.last_mut() {
            Some(group) if group.date == tx.date => group.items.push(tx),
            _ => groups.push(DateGroup {
                date: tx.date,
                items: vec![tx],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::{filter_transactions, group_by_date, AdvancedFilters, SortMode, TransactionFilter};
    use crate::model::period::MonthKey;
    use crate::model::transaction::{Transaction, TransactionKind};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new("Aluguel", 1500.0, TransactionKind::Expense, day(5), "Moradia"),
            Transaction::new("Salário", 5000.0, TransactionKind::Income, day(5), "Trabalho"),
            Transaction::new("Cinema", 40.0, TransactionKind::Expense, day(12), "Lazer"),
            Transaction::new(
                "Março",
                10.0,
                TransactionKind::Expense,
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                "Lazer",
            ),
        ]
    }

    #[test]
    fn month_filter_excludes_other_months_and_sorts_by_date_desc() {
        let txs = sample();
        let filter = TransactionFilter::for_month(MonthKey::new(2024, 4).unwrap());
        let items = filter_transactions(&txs, &filter, SortMode::default());

        let names = items.iter().map(|tx| tx.description.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Cinema", "Aluguel", "Salário"]);
    }

    #[test]
    fn search_matches_type_label_and_category() {
        let txs = sample();
        let month = MonthKey::new(2024, 4).unwrap();

        let receita = filter_transactions(
            &txs,
            &TransactionFilter::for_month(month).with_search("RECEITA"),
            SortMode::AmountAsc,
        );
        assert_eq!(receita.len(), 1);
        assert_eq!(receita[0].description, "Salário");

        let lazer = filter_transactions(
            &txs,
            &TransactionFilter::for_month(month).with_category("Lazer"),
            SortMode::AmountAsc,
        );
        assert_eq!(lazer.len(), 1);
    }

    #[test]
    fn advanced_filters_apply_amount_range_and_kind() {
        let txs = sample();
        let filter = TransactionFilter::for_month(MonthKey::new(2024, 4).unwrap()).with_advanced(
            AdvancedFilters {
                min_amount: Some(100.0),
                kind: Some(TransactionKind::Expense),
                ..AdvancedFilters::default()
            },
        );
        let items = filter_transactions(&txs, &filter, SortMode::AmountDesc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Aluguel");
    }

    #[test]
    fn group_by_date_starts_new_group_on_date_change() {
        let txs = sample();
        let filter = TransactionFilter::for_month(MonthKey::new(2024, 4).unwrap());
        let items = filter_transactions(&txs, &filter, SortMode::DateAsc);
        let groups = group_by_date(&items);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, day(5));
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].items[0].description, "Cinema");
    }
}
