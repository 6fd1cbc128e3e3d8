use chrono::NaiveDate;
use organizer_core::db::open_db_in_memory;
use organizer_core::model::period::MonthKey;
use organizer_core::service::finance_service::FinanceError;
use organizer_core::{FinanceService, NewTransaction, SqliteKvStore, TransactionKind};
use std::collections::HashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed(service: &FinanceService<SqliteKvStore<'_>>) {
    let today = date(2024, 8, 20);
    let entries = [
        ("Salário", 4200.0, TransactionKind::Income, date(2024, 8, 5), "Trabalho"),
        ("Feira, frutas", 1234.56, TransactionKind::Expense, date(2024, 8, 6), "Alimentação"),
        ("Ônibus \"linha 5\"", 4.4, TransactionKind::Expense, date(2024, 8, 7), "Transporte"),
    ];
    for (description, amount, kind, when, category) in entries {
        service
            .add_transaction(NewTransaction::new(description, amount, kind, when, category), today)
            .unwrap();
    }
}

#[test]
fn exported_csv_imports_into_an_empty_store() {
    let source_conn = open_db_in_memory().unwrap();
    let source = FinanceService::new(SqliteKvStore::new(&source_conn));
    seed(&source);
    let csv = source.export_csv().unwrap();
    assert!(csv.starts_with("Data,Descrição,Valor,ValorFormatado,Tipo,Categoria\n"));

    let target_conn = open_db_in_memory().unwrap();
    let target = FinanceService::new(SqliteKvStore::new(&target_conn));
    assert_eq!(target.import_csv(&csv).unwrap(), (3, 0));

    let imported = target.transactions().unwrap();
    let feira = imported
        .iter()
        .find(|tx| tx.description == "Feira, frutas")
        .unwrap();
    assert_eq!(feira.amount, 1234.56);
    assert_eq!(feira.kind, TransactionKind::Expense);
    assert!(imported
        .iter()
        .any(|tx| tx.description == "Ônibus \"linha 5\""));
}

#[test]
fn csv_import_skips_bad_rows_and_accepts_english_header() {
    let conn = open_db_in_memory().unwrap();
    let service = FinanceService::new(SqliteKvStore::new(&conn));
    let csv = "date,description,amount,type,category\n\
               05/03/2024,Padaria,\"12,50\",Despesa,Alimentação\n\
               2024-03-06,Freela,800,Receita,Trabalho\n\
               not-a-date,Broken,10,Despesa,Outros\n\
               2024-03-07,Sem tipo,10,Transferência,Outros\n";

    assert_eq!(service.import_csv(csv).unwrap(), (2, 2));
    let padaria = service
        .transactions()
        .unwrap()
        .into_iter()
        .find(|tx| tx.description == "Padaria")
        .unwrap();
    assert_eq!(padaria.date, date(2024, 3, 5));
    assert_eq!(padaria.amount, 12.5);
}

#[test]
fn csv_without_required_columns_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = FinanceService::new(SqliteKvStore::new(&conn));

    let err = service.import_csv("Data,Valor\n2024-01-01,10\n").unwrap_err();
    assert!(matches!(err, FinanceError::Import(_)));
    assert!(service.transactions().unwrap().is_empty());
}

#[test]
fn json_reimport_reassigns_colliding_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = FinanceService::new(SqliteKvStore::new(&conn));
    seed(&service);
    let json = service.export_json().unwrap();

    assert_eq!(service.import_json(&json).unwrap(), (3, 0));
    let all = service.transactions().unwrap();
    assert_eq!(all.len(), 6);
    let ids = all.iter().map(|tx| tx.id).collect::<HashSet<_>>();
    assert_eq!(ids.len(), 6);

    assert!(matches!(
        service.import_json("{\"transactions\": []}"),
        Err(FinanceError::Import(_))
    ));
}

#[test]
fn monthly_report_lists_categories_by_spend() {
    let conn = open_db_in_memory().unwrap();
    let service = FinanceService::new(SqliteKvStore::new(&conn));
    seed(&service);

    let report = service
        .monthly_report(MonthKey::new(2024, 8).unwrap())
        .unwrap();
    let lines = report.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "Relatório;2024-08");
    assert_eq!(lines[1], "Receitas;4200");
    assert_eq!(lines[2], "Despesas;1238.96");
    assert_eq!(lines[5], "Categoria;TotalDespesa");
    assert_eq!(lines[6], "Alimentação;1234.56");
    assert_eq!(lines[7], "Transporte;4.4");
}
