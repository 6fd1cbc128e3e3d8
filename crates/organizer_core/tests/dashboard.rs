use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use organizer_core::db::open_db_in_memory;
use organizer_core::finance::alerts::AlertLevel;
use organizer_core::finance::insights::GrowthTrend;
use organizer_core::model::goals::Goals;
use organizer_core::model::period::MonthKey;
use organizer_core::service::dashboard_service::Reminder;
use organizer_core::service::game_service::GameInput;
use organizer_core::service::toy_service::ToyCarInput;
use organizer_core::store::keys;
use organizer_core::{
    BackupService, DashboardService, FinanceService, GameService, GameStatus, KeyValueStore,
    NewTransaction, SqliteKvStore, ToyService, TransactionKind,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn seed(store: SqliteKvStore<'_>) {
    let today = date(2024, 6, 15);
    let finance = FinanceService::new(store);
    for (description, amount, kind, when, category) in [
        ("Salário", 3000.0, TransactionKind::Income, date(2024, 6, 5), "Trabalho"),
        ("Mercado", 500.0, TransactionKind::Expense, date(2024, 6, 8), "Alimentação"),
        ("Aluguel", 1000.0, TransactionKind::Expense, date(2024, 5, 8), "Moradia"),
    ] {
        finance
            .add_transaction(NewTransaction::new(description, amount, kind, when, category), today)
            .unwrap();
    }
    finance
        .set_month_budgets(
            MonthKey::new(2024, 6).unwrap(),
            vec![("Alimentação".to_string(), 800.0)],
            today,
        )
        .unwrap();

    let games = GameService::new(store);
    games
        .add_game(GameInput::new("Hades", "PC", GameStatus::Finished), at(2024, 6, 1))
        .unwrap();
    games
        .add_game(GameInput::new("Celeste", "PC", GameStatus::Playing), at(2024, 6, 2))
        .unwrap();
    games
        .add_game(GameInput::new("Doom", "PC", GameStatus::Backlog), at(2024, 5, 20))
        .unwrap();

    let toys = ToyService::new(store);
    for (name, number, year, series) in [
        ("Skyline", "1/250", 2020, "HW J-Imports"),
        ("Civic", "2/250", 2021, "HW J-Imports"),
        ("Mustang", "3/250", 2021, "Muscle Mania"),
    ] {
        toys.add_car(ToyCarInput::new(name, number, year).with_series(series), at(2024, 5, 3))
            .unwrap();
    }
}

#[test]
fn stats_summarize_every_module() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    seed(store);

    let stats = DashboardService::new(store).stats(date(2024, 6, 15)).unwrap();
    assert_eq!(stats.finance.income, 3000.0);
    assert_eq!(stats.finance.expenses, 500.0);
    assert_eq!(stats.finance.budgets, 1);
    assert_eq!(stats.games.total, 3);
    assert_eq!(stats.games.finished, 1);
    assert_eq!(stats.toy_cars.total, 3);
    assert_eq!(stats.toy_cars.series, 2);
    assert_eq!(stats.toy_cars.years, 2);
    assert_eq!(stats.backup.total_items(), 9);
}

#[test]
fn goals_persist_and_drive_alerts() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    seed(store);
    let dashboard = DashboardService::new(store);
    assert_eq!(dashboard.goals().unwrap(), Goals::default());
    assert!(dashboard.goal_alerts(date(2024, 6, 15)).unwrap().is_empty());

    let mut goals = Goals::default();
    goals.finance.monthly_savings = 2000.0;
    goals.games.games_to_finish = 2;
    goals.toy_cars.collection_target = 4;
    dashboard.save_goals(&goals).unwrap();
    assert_eq!(dashboard.goals().unwrap(), goals);
    let raw = store.get_raw(keys::APP_GOALS).unwrap().unwrap();
    assert!(raw.contains("\"toyCars\""));
    assert!(raw.contains("\"monthlySavings\""));

    let alerts = dashboard.goal_alerts(date(2024, 6, 15)).unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].level, AlertLevel::Success);
    assert!(alerts[0].message.contains("poupança mensal"));
    assert_eq!(alerts[1].level, AlertLevel::Info);
    assert_eq!(alerts[1].message, "Você está a 25% da sua meta de coleção");
}

#[test]
fn trends_compare_with_previous_month() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    seed(store);

    let trends = DashboardService::new(store).trends(date(2024, 6, 15)).unwrap();
    assert_eq!(trends.expenses.percent, -50);
    assert_eq!(trends.expenses.trend, GrowthTrend::Down);
    assert_eq!(trends.games_added.current, 2.0);
    assert_eq!(trends.games_added.percent, 100);
    assert_eq!(trends.cars_added.current, 0.0);
    assert_eq!(trends.cars_added.previous, 3.0);
    assert_eq!(trends.cars_added.trend, GrowthTrend::Down);
}

#[test]
fn reminders_are_throttled() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let dashboard = DashboardService::new(store);
    let now = at(2024, 6, 15);

    assert_eq!(
        dashboard.due_reminders(now).unwrap(),
        vec![
            Reminder::ConfigureAutoBackup,
            Reminder::WeeklyBackup,
            Reminder::MonthlyGoals
        ]
    );
    assert_eq!(
        dashboard.due_reminders(now + Duration::days(1)).unwrap(),
        vec![Reminder::ConfigureAutoBackup]
    );

    BackupService::new(store).run_auto_backup(now).unwrap();
    assert!(dashboard
        .due_reminders(now + Duration::days(2))
        .unwrap()
        .is_empty());
    assert_eq!(
        dashboard.due_reminders(now + Duration::days(8)).unwrap(),
        vec![Reminder::WeeklyBackup]
    );
}
