//! Transaction CSV/JSON export and import.
//!
//! # Invariants
//! - Exported CSV re-imports to the same description, amount, type, date and
//!   category for every row, including values with line breaks.
//! - Import never fails on a single bad row; such rows are counted as skipped.

use crate::csv_text;
use crate::model::money::{format_brl, parse_amount, round_cents};
use crate::model::period::MonthKey;
use crate::model::transaction::{Transaction, TransactionKind};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const EXPORT_HEADER: &str = "Data,Descrição,Valor,ValorFormatado,Tipo,Categoria";
const REPORT_FALLBACK_CATEGORY: &str = "Outros";

static DMY_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid day/month/year regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    Empty,
    /// Required column not found in the CSV header.
    MissingColumn(&'static str),
    InvalidJson(String),
    NotAnArray,
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "file has no data rows"),
            Self::MissingColumn(column) => write!(f, "CSV header is missing the `{column}` column"),
            Self::InvalidJson(message) => write!(f, "invalid JSON: {message}"),
            Self::NotAnArray => write!(f, "JSON import expects a list of transactions"),
        }
    }
}

impl Error for ImportError {}

/// Parsed records plus the number of rejected rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub transactions: Vec<Transaction>,
    pub skipped: usize,
}

impl ImportOutcome {
    pub fn imported(&self) -> usize {
        self.transactions.len()
    }
}

/// `financas_YYYY-MM-DD.csv`
pub fn export_file_name(today: NaiveDate) -> String {
    format!("financas_{}.csv", today.format("%Y-%m-%d"))
}

/// `relatorio_YYYY-MM.csv`
pub fn report_file_name(month: MonthKey) -> String {
    format!("relatorio_{month}.csv")
}

/// Full transaction list as CSV, raw and pt-BR formatted amounts side by side.
pub fn export_transactions_csv(transactions: &[Transaction]) -> String {
    let mut out = String::with_capacity(64 * (transactions.len() + 1));
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    for tx in transactions {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            tx.date.format("%Y-%m-%d"),
            csv_text::quote(&tx.description),
            tx.amount,
            csv_text::quote(&format_brl(tx.amount)),
            tx.kind.label(),
            csv_text::quote(&tx.category),
        ));
    }
    out
}

/// `;`-separated month report: totals, then expenses per category descending.
pub fn monthly_report_csv(transactions: &[Transaction], month: MonthKey) -> String {
    let mut income = 0.0;
    let mut expenses = 0.0;
    let mut by_category = BTreeMap::<String, f64>::new();
    for tx in transactions.iter().filter(|tx| month.contains(tx.date)) {
        if tx.is_income() {
            income += tx.amount;
            continue;
        }
        expenses += tx.amount;
        let category = if tx.category.trim().is_empty() {
            REPORT_FALLBACK_CATEGORY.to_string()
        } else {
            tx.category.clone()
        };
        *by_category.entry(category).or_insert(0.0) += tx.amount;
    }

    let mut rows = by_category.into_iter().collect::<Vec<_>>();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut out = format!(
        "Relatório;{month}\nReceitas;{}\nDespesas;{}\nSaldo;{}\n\nCategoria;TotalDespesa\n",
        round_cents(income),
        round_cents(expenses),
        round_cents(income - expenses),
    );
    for (category, total) in rows {
        out.push_str(&format!("{category};{}\n", round_cents(total)));
    }
    out
}

/// Accepts `YYYY-MM-DD` and `D/M/YYYY`.
pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    let caps = DMY_DATE_RE.captures(value)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

struct CsvColumns {
    date: usize,
    description: usize,
    amount: usize,
    kind: usize,
    category: usize,
    width: usize,
}

impl CsvColumns {
    fn from_header(line: &str) -> Result<Self, ImportError> {
        let header = csv_text::parse_line(line)
            .into_iter()
            .map(|name| name.to_lowercase())
            .collect::<Vec<_>>();
        let find = |names: &[&str], column: &'static str| {
            names
                .iter()
                .find_map(|name| header.iter().position(|h| h == name))
                .ok_or(ImportError::MissingColumn(column))
        };
        Ok(Self {
            date: find(&["data", "date"], "data")?,
            description: find(&["descrição", "descricao", "description"], "descrição")?,
            amount: find(&["valor", "amount", "value"], "valor")?,
            kind: find(&["tipo", "type"], "tipo")?,
            category: find(&["categoria", "category"], "categoria")?,
            width: header.len(),
        })
    }

    fn parse_row(&self, record: &str) -> Option<Transaction> {
        let cols = csv_text::parse_line(record);
        if cols.len() < self.width {
            return None;
        }
        let date = normalize_date(&cols[self.date])?;
        let amount = parse_amount(&cols[self.amount])?;
        let kind = TransactionKind::parse(&cols[self.kind])?;
        let tx = Transaction::new(
            cols[self.description].trim(),
            amount,
            kind,
            date,
            cols[self.category].trim(),
        );
        tx.validate().ok()?;
        Some(tx)
    }
}

/// Parses a CSV export (Portuguese or English header) into new transactions.
pub fn import_transactions_csv(text: &str) -> Result<ImportOutcome, ImportError> {
    let mut records = csv_text::records(text);
    let header = records.next().ok_or(ImportError::Empty)?;
    let columns = CsvColumns::from_header(header)?;

    let mut outcome = ImportOutcome::default();
    for record in records {
        match columns.parse_row(record) {
            Some(tx) => outcome.transactions.push(tx),
            None => outcome.skipped += 1,
        }
    }
    if outcome.transactions.is_empty() && outcome.skipped == 0 {
        return Err(ImportError::Empty);
    }
    Ok(outcome)
}

/// Parses a JSON array of stored-shape transactions, validating each record.
pub fn import_transactions_json(text: &str) -> Result<ImportOutcome, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ImportError::InvalidJson(err.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    let mut outcome = ImportOutcome::default();
    for item in &items {
        match transaction_from_json(item) {
            Some(tx) => outcome.transactions.push(tx),
            None => outcome.skipped += 1,
        }
    }
    Ok(outcome)
}

/// One stored-shape record; ids that are not UUIDs get a fresh one.
pub(crate) fn transaction_from_json(item: &Value) -> Option<Transaction> {
    let description = item.get("description")?.as_str()?.trim();
    let amount = match item.get("amount")? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => parse_amount(text)?,
        _ => return None,
    };
    let category = item.get("category")?.as_str()?.trim();
    let kind = match item.get("type")?.as_str()? {
        "Receita" => TransactionKind::Income,
        "Despesa" => TransactionKind::Expense,
        _ => return None,
    };
    let date = normalize_date(item.get("date")?.as_str()?)?;

    let mut tx = Transaction::new(description, amount, kind, date, category);
    if let Some(id) = item
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
    {
        tx.id = id;
    }
    tx.account_id = item
        .get("accountId")
        .and_then(Value::as_str)
        .map(str::to_string);

    let number = item.get("installmentNumber").and_then(Value::as_u64);
    let total = item.get("totalInstallments").and_then(Value::as_u64);
    if item.get("isInstallment").and_then(Value::as_bool) == Some(true) {
        if let (Some(number), Some(total)) = (number, total) {
            if let (Ok(number), Ok(total)) = (u32::try_from(number), u32::try_from(total)) {
                tx.mark_installment(number, total);
            }
        }
    }
    if tx.validate().is_err() {
        tx.clear_installment();
    }
    tx.validate().ok()?;
    Some(tx)
}

#[cfg(test)]
mod tests {
    use super::{
        export_transactions_csv, import_transactions_csv, import_transactions_json,
        monthly_report_csv, normalize_date, ImportError, EXPORT_HEADER,
    };
    use crate::model::period::MonthKey;
    use crate::model::transaction::{Transaction, TransactionKind};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn export_then_import_preserves_rows() {
        let txs = vec![
            Transaction::new("Pão, \"francês\"", 1234.5, TransactionKind::Expense, date(2024, 3, 2), "Alimentação"),
            Transaction::new("Salário", 5000.0, TransactionKind::Income, date(2024, 3, 5), "Trabalho"),
        ];
        let csv = export_transactions_csv(&txs);
        assert!(csv.starts_with(EXPORT_HEADER));
        assert!(csv.contains("\"R$ 1.234,50\""));
        assert!(csv.contains(",5000,"));

        let outcome = import_transactions_csv(&csv).unwrap();
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.imported(), 2);
        let first = &outcome.transactions[0];
        assert_eq!(first.description, "Pão, \"francês\"");
        assert_eq!(first.amount, 1234.5);
        assert_eq!(first.kind, TransactionKind::Expense);
        assert_eq!(first.date, date(2024, 3, 2));
        assert_ne!(first.id, txs[0].id);
    }

    #[test]
    fn multi_line_descriptions_survive_export_and_import() {
        let txs = vec![
            Transaction::new("Linha\nDois", 10.0, TransactionKind::Expense, date(2024, 3, 2), "Outros"),
            Transaction::new("Feira", 20.0, TransactionKind::Expense, date(2024, 3, 3), "Alimentação"),
        ];
        let outcome = import_transactions_csv(&export_transactions_csv(&txs)).unwrap();
        assert_eq!((outcome.imported(), outcome.skipped), (2, 0));
        assert_eq!(outcome.transactions[0].description, "Linha\nDois");
        assert_eq!(outcome.transactions[1].description, "Feira");
    }

    #[test]
    fn csv_import_accepts_english_header_and_brazilian_formats() {
        let text = "date,description,amount,type,category\r\n\
                    05/04/2024,Farmácia,\"1.020,30\",expense,Saúde\r\n\
                    2024-04-06,x,10,Despesa,Saúde\r\n\
                    2024-04-07,Bônus,abc,Receita,Trabalho\r\n";
        let outcome = import_transactions_csv(text).unwrap();
        assert_eq!(outcome.imported(), 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.transactions[0].amount, 1020.3);
        assert_eq!(outcome.transactions[0].date, date(2024, 4, 5));
    }

    #[test]
    fn csv_import_rejects_unknown_header() {
        assert_eq!(
            import_transactions_csv("when,what\n2024-01-01,x\n").unwrap_err(),
            ImportError::MissingColumn("data")
        );
        assert_eq!(import_transactions_csv("").unwrap_err(), ImportError::Empty);
    }

    #[test]
    fn json_import_validates_each_record() {
        let text = r#"[
            {"id": "8f6d1c1e-8a55-4a5e-9a53-1f0a2b3c4d5e", "description": "Aluguel", "amount": 1500, "type": "Despesa", "date": "2024-02-01", "category": "Moradia"},
            {"description": "Luz", "amount": -10, "type": "Despesa", "date": "2024-02-01", "category": "Moradia"},
            {"description": "Pix", "amount": 10, "type": "Transfer", "date": "2024-02-01", "category": "Outros"},
            {"description": "Parcela", "amount": 50, "type": "Despesa", "date": "2024-02-10", "category": "Lazer",
             "isInstallment": true, "installmentNumber": 2, "totalInstallments": 3}
        ]"#;
        let outcome = import_transactions_json(text).unwrap();
        assert_eq!(outcome.imported(), 2);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(
            outcome.transactions[0].id.to_string(),
            "8f6d1c1e-8a55-4a5e-9a53-1f0a2b3c4d5e"
        );
        let info = outcome.transactions[1].installment().unwrap();
        assert_eq!((info.number, info.total), (2, 3));

        assert_eq!(import_transactions_json("{}").unwrap_err(), ImportError::NotAnArray);
        assert!(matches!(import_transactions_json("[").unwrap_err(), ImportError::InvalidJson(_)));
    }

    #[test]
    fn monthly_report_sorts_categories_by_total() {
        let txs = vec![
            Transaction::new("Salário", 3000.0, TransactionKind::Income, date(2024, 5, 5), "Trabalho"),
            Transaction::new("Cinema", 50.0, TransactionKind::Expense, date(2024, 5, 6), "Lazer"),
            Transaction::new("Aluguel", 1200.0, TransactionKind::Expense, date(2024, 5, 1), "Moradia"),
            Transaction::new("Junho", 99.0, TransactionKind::Expense, date(2024, 6, 1), "Lazer"),
        ];
        let report = monthly_report_csv(&txs, MonthKey::new(2024, 5).unwrap());
        assert_eq!(
            report,
            "Relatório;2024-05\nReceitas;3000\nDespesas;1250\nSaldo;1750\n\n\
             Categoria;TotalDespesa\nMoradia;1200\nLazer;50\n"
        );
    }

    #[test]
    fn normalize_date_accepts_both_layouts() {
        assert_eq!(normalize_date("1/2/2024"), Some(date(2024, 2, 1)));
        assert_eq!(normalize_date("2024-02-30"), None);
        assert_eq!(normalize_date("31/02/2024"), None);
    }
}
