//! Budget and savings notifications for the current month.

use crate::model::budget::BudgetBook;
use crate::model::period::MonthKey;
use crate::model::transaction::Transaction;
use chrono::NaiveDate;
use serde::Serialize;

/// Budget usage at which a warning is raised.
pub const BUDGET_ALERT_PERCENT: f64 = 80.0;
/// Savings progress at which an encouragement is raised.
pub const SAVINGS_ALERT_PERCENT: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// One alert per budgeted category at or above 80 % of its limit.
pub fn budget_alerts(
    transactions: &[Transaction],
    budgets: &BudgetBook,
    today: NaiveDate,
) -> Vec<Alert> {
    let month = MonthKey::of(today);
    budgets
        .month(month)
        .into_iter()
        .filter_map(|(category, limit)| {
            let spent: f64 = transactions
                .iter()
                .filter(|tx| tx.is_expense() && tx.category == category && month.contains(tx.date))
                .map(|tx| tx.amount)
                .sum();
            let percentage = spent / limit * 100.0;
            if percentage >= 100.0 {
                Some(Alert::new(
                    AlertLevel::Danger,
                    format!("Orçamento de {category} ultrapassado"),
                ))
            } else if percentage >= BUDGET_ALERT_PERCENT {
                Some(Alert::new(
                    AlertLevel::Warning,
                    format!("Orçamento de {category} está em {percentage:.0}%"),
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Progress toward the monthly savings goal, measured by this month's balance.
pub fn savings_alert(transactions: &[Transaction], goal: f64, today: NaiveDate) -> Option<Alert> {
    if !goal.is_finite() || goal <= 0.0 {
        return None;
    }
    let month = MonthKey::of(today);
    let balance: f64 = transactions
        .iter()
        .filter(|tx| month.contains(tx.date))
        .map(|tx| if tx.is_income() { tx.amount } else { -tx.amount })
        .sum();
    let progress = balance / goal * 100.0;
    if progress >= 100.0 {
        Some(Alert::new(AlertLevel::Success, "Parabéns! Você atingiu sua meta de economia"))
    } else if progress >= SAVINGS_ALERT_PERCENT {
        Some(Alert::new(
            AlertLevel::Info,
            format!("Você está a {:.0}% da sua meta de economia", 100.0 - progress),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{budget_alerts, savings_alert, AlertLevel};
    use crate::model::budget::BudgetBook;
    use crate::model::period::MonthKey;
    use crate::model::transaction::{Transaction, TransactionKind};
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn budget_alerts_warn_at_eighty_and_flag_exceeded() {
        let month = MonthKey::new(2024, 6).unwrap();
        let mut budgets = BudgetBook::new();
        budgets.set_month(
            month,
            [
                ("Lazer".to_string(), 100.0),
                ("Moradia".to_string(), 1000.0),
                ("Saúde".to_string(), 200.0),
            ],
        );
        let txs = vec![
            Transaction::new("Cinema", 85.0, TransactionKind::Expense, date(6, 2), "Lazer"),
            Transaction::new("Aluguel", 1000.0, TransactionKind::Expense, date(6, 1), "Moradia"),
            Transaction::new("Farmácia", 10.0, TransactionKind::Expense, date(6, 1), "Saúde"),
            Transaction::new("Antigo", 500.0, TransactionKind::Expense, date(5, 1), "Saúde"),
        ];

        let alerts = budget_alerts(&txs, &budgets, date(6, 15));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert_eq!(alerts[0].message, "Orçamento de Lazer está em 85%");
        assert_eq!(alerts[1].level, AlertLevel::Danger);
    }

    #[test]
    fn savings_alert_levels() {
        let txs = vec![
            Transaction::new("Salário", 1000.0, TransactionKind::Income, date(6, 1), "Trabalho"),
            Transaction::new("Mercado", 200.0, TransactionKind::Expense, date(6, 3), "Alimentação"),
        ];
        assert_eq!(savings_alert(&txs, 1000.0, date(6, 10)).unwrap().level, AlertLevel::Info);
        assert_eq!(savings_alert(&txs, 800.0, date(6, 10)).unwrap().level, AlertLevel::Success);
        assert!(savings_alert(&txs, 2000.0, date(6, 10)).is_none());
        assert!(savings_alert(&txs, 0.0, date(6, 10)).is_none());
    }
}
