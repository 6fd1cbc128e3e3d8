//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose use-case level functions for finances, games, toy cars,
//!   dashboard, backup and theme to Dart via FRB.
//! - Translate every failure into a response envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each call opens its own connection; nothing is cached but the DB path.
//! - Dates cross the boundary as `YYYY-MM-DD`, months as `YYYY-MM`.

use chrono::{Local, NaiveDate, Utc};
use log::warn;
use organizer_core::finance::filter::{SortMode, TransactionFilter};
use organizer_core::finance::installments::RecurrenceFrequency;
use organizer_core::model::period::MonthKey;
use organizer_core::model::settings::Theme;
use organizer_core::service::game_service::{GameFilter, GameInput};
use organizer_core::service::toy_service::{ToyCarFilter, ToyCarInput};
use organizer_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_db,
    ping as ping_inner, BackupService, DashboardService, FinanceService, GameService, GameStatus,
    NewTransaction, SettingsService, SqliteKvStore, ToyService, TransactionKind,
};
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "organizer.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Health-check.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns an empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result of a mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or affected record, when there is one.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Text payload such as a CSV or backup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub ok: bool,
    pub file_name: String,
    pub text: String,
    pub message: String,
}

impl TextResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            file_name: String::new(),
            text: String::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionItem {
    pub id: String,
    pub description: String,
    pub amount: f64,
    /// `Receita` or `Despesa`.
    pub kind: String,
    pub date: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthResponse {
    pub ok: bool,
    pub items: Vec<TransactionItem>,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub health: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameItem {
    pub id: String,
    pub title: String,
    pub platform: String,
    pub status: String,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyCarItem {
    pub id: String,
    pub name: String,
    pub number: String,
    pub year: u16,
    pub series: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListResponse {
    pub ok: bool,
    pub items: Vec<GameItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyCarListResponse {
    pub ok: bool,
    pub items: Vec<ToyCarItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub month_income: f64,
    pub month_expenses: f64,
    pub budgets: u32,
    pub games_total: u32,
    pub games_playing: u32,
    pub games_finished: u32,
    pub toy_cars_total: u32,
    pub toy_car_series: u32,
    pub backup_items: u32,
    pub backup_size_kb: u32,
    /// Goal alerts and due reminders, in display order.
    pub notices: Vec<String>,
    pub message: String,
}

/// Adds an income or expense, optionally split or recurring.
///
/// # FFI contract
/// - `kind`: `Receita|Despesa` (or `income|expense`).
/// - `installments` wins over `recurrence` when both are given.
/// - Returns the id of the first created record.
#[flutter_rust_bridge::frb(sync)]
pub fn finance_add_transaction(
    description: String,
    amount: f64,
    kind: String,
    date: String,
    category: String,
    installments: Option<u32>,
    recurrence: Option<String>,
) -> ActionResponse {
    let result = (|| -> Result<(Option<String>, usize), String> {
        let kind = TransactionKind::parse(&kind).ok_or_else(|| format!("unknown kind `{kind}`"))?;
        let date = parse_date(&date)?;
        let mut input = NewTransaction::new(description, amount, kind, date, category);
        if let Some(count) = installments {
            input = input.with_installments(count);
        }
        if let Some(raw) = recurrence.as_deref().filter(|raw| !raw.trim().is_empty()) {
            input = input.with_recurrence(raw.parse::<RecurrenceFrequency>()?);
        }
        with_store(|store| {
            let created = FinanceService::new(store)
                .add_transaction(input, today())
                .map_err(|err| err.to_string())?;
            Ok((created.first().map(|tx| tx.id.to_string()), created.len()))
        })
    })();
    match result {
        Ok((id, count)) => ActionResponse::success(format!("{count} transação(ões) adicionada(s)."), id),
        Err(err) => failure("finance_add_transaction", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn finance_delete_transaction(id: String) -> ActionResponse {
    let result = parse_id(&id).and_then(|id| {
        with_store(|store| {
            FinanceService::new(store)
                .delete_transaction(id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(removed) => ActionResponse::success("Transação excluída.", Some(removed.id.to_string())),
        Err(err) => failure("finance_delete_transaction", err),
    }
}

/// Month list (newest first) with totals and health label.
#[flutter_rust_bridge::frb(sync)]
pub fn finance_month(month: String, search: String) -> MonthResponse {
    let result = month.parse::<MonthKey>().and_then(|month| {
        with_store(|store| {
            let filter = TransactionFilter::for_month(month).with_search(search);
            FinanceService::new(store)
                .month_view(&filter, SortMode::DateDesc, today())
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(view) => MonthResponse {
            ok: true,
            message: format!("{} transação(ões).", view.items.len()),
            items: view
                .items
                .into_iter()
                .map(|tx| TransactionItem {
                    id: tx.id.to_string(),
                    description: tx.description,
                    amount: tx.amount,
                    kind: tx.kind.label().to_string(),
                    date: tx.date.format("%Y-%m-%d").to_string(),
                    category: tx.category,
                })
                .collect(),
            income: view.summary.income,
            expenses: view.summary.expenses,
            balance: view.summary.balance,
            health: view.summary.health.label().to_string(),
        },
        Err(message) => MonthResponse {
            ok: false,
            items: Vec::new(),
            income: 0.0,
            expenses: 0.0,
            balance: 0.0,
            health: String::new(),
            message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn finance_export_csv() -> TextResponse {
    let file_name = organizer_core::finance::csv_io::export_file_name(today());
    text_response(file_name, |store| {
        FinanceService::new(store)
            .export_csv()
            .map_err(|err| err.to_string())
    })
}

/// Imports CSV text; `message` reports imported and skipped rows.
#[flutter_rust_bridge::frb(sync)]
pub fn finance_import_csv(text: String) -> ActionResponse {
    match with_store(|store| {
        FinanceService::new(store)
            .import_csv(&text)
            .map_err(|err| err.to_string())
    }) {
        Ok((imported, skipped)) => ActionResponse::success(
            format!("{imported} transação(ões) importada(s), {skipped} ignorada(s)."),
            None,
        ),
        Err(err) => failure("finance_import_csv", err),
    }
}

/// Adds a game; `status` accepts stored labels or English names.
#[flutter_rust_bridge::frb(sync)]
pub fn games_add(
    title: String,
    platform: String,
    status: String,
    rating: Option<u8>,
) -> ActionResponse {
    let result = GameStatus::parse(&status)
        .ok_or_else(|| format!("unknown status `{status}`"))
        .and_then(|status| {
            let mut input = GameInput::new(title, platform, status);
            if let Some(rating) = rating {
                input = input.with_rating(rating);
            }
            with_store(|store| {
                GameService::new(store)
                    .add_game(input, Utc::now())
                    .map_err(|err| err.to_string())
            })
        });
    match result {
        Ok(game) => ActionResponse::success("Jogo adicionado.", Some(game.id.to_string())),
        Err(err) => failure("games_add", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn games_delete(id: String) -> ActionResponse {
    let result = parse_id(&id).and_then(|id| {
        with_store(|store| {
            GameService::new(store)
                .delete_game(id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(game) => ActionResponse::success("Jogo excluído.", Some(game.id.to_string())),
        Err(err) => failure("games_delete", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn games_list(search: String) -> GameListResponse {
    let (ok, items, message) = list_parts(with_store(|store| {
        let filter = GameFilter {
            search,
            ..GameFilter::default()
        };
        let view = GameService::new(store)
            .view(&filter)
            .map_err(|err| err.to_string())?;
        Ok(view
            .items
            .into_iter()
            .map(|game| GameItem {
                id: game.id.to_string(),
                title: game.title,
                platform: game.platform,
                status: game.status.label().to_string(),
                rating: game.rating,
            })
            .collect())
    }));
    GameListResponse { ok, items, message }
}

#[flutter_rust_bridge::frb(sync)]
pub fn toys_add(name: String, number: String, year: u16, series: Option<String>) -> ActionResponse {
    let mut input = ToyCarInput::new(name, number, year);
    if let Some(series) = series {
        input = input.with_series(series);
    }
    match with_store(|store| {
        ToyService::new(store)
            .add_car(input, Utc::now())
            .map_err(|err| err.to_string())
    }) {
        Ok(car) => ActionResponse::success("Carrinho adicionado.", Some(car.id.to_string())),
        Err(err) => failure("toys_add", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn toys_delete(id: String) -> ActionResponse {
    let result = parse_id(&id).and_then(|id| {
        with_store(|store| {
            ToyService::new(store)
                .delete_car(id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(car) => ActionResponse::success("Carrinho excluído.", Some(car.id.to_string())),
        Err(err) => failure("toys_delete", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn toys_list(search: String, series: Option<String>) -> ToyCarListResponse {
    let (ok, items, message) = list_parts(with_store(|store| {
        let filter = ToyCarFilter { series, search };
        let view = ToyService::new(store)
            .view(&filter)
            .map_err(|err| err.to_string())?;
        Ok(view
            .items
            .into_iter()
            .map(|car| ToyCarItem {
                id: car.id.to_string(),
                name: car.name,
                number: car.number,
                year: car.year,
                series: car.series,
            })
            .collect())
    }));
    ToyCarListResponse { ok, items, message }
}

/// Landing-page counters plus goal alerts and due reminders.
///
/// # FFI contract
/// - Returned reminders are marked as shown and will not repeat within
///   their interval.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard() -> DashboardResponse {
    let result = with_store(|store| {
        let service = DashboardService::new(store);
        let stats = service.stats(today()).map_err(|err| err.to_string())?;
        let mut notices = service
            .goal_alerts(today())
            .map_err(|err| err.to_string())?
            .into_iter()
            .map(|alert| alert.message)
            .collect::<Vec<_>>();
        notices.extend(
            service
                .due_reminders(Utc::now())
                .map_err(|err| err.to_string())?
                .into_iter()
                .map(|reminder| reminder.message().to_string()),
        );
        Ok((stats, notices))
    });
    match result {
        Ok((stats, notices)) => DashboardResponse {
            ok: true,
            month_income: stats.finance.income,
            month_expenses: stats.finance.expenses,
            budgets: count(stats.finance.budgets),
            games_total: count(stats.games.total),
            games_playing: count(stats.games.playing),
            games_finished: count(stats.games.finished),
            toy_cars_total: count(stats.toy_cars.total),
            toy_car_series: count(stats.toy_cars.series),
            backup_items: count(stats.backup.total_items()),
            backup_size_kb: count(stats.backup.size_kb()),
            notices,
            message: "ok".to_string(),
        },
        Err(message) => DashboardResponse {
            ok: false,
            month_income: 0.0,
            month_expenses: 0.0,
            budgets: 0,
            games_total: 0,
            games_playing: 0,
            games_finished: 0,
            toy_cars_total: 0,
            toy_car_series: 0,
            backup_items: 0,
            backup_size_kb: 0,
            notices: Vec::new(),
            message,
        },
    }
}

/// Full backup document and its suggested file name.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_create() -> TextResponse {
    let result = with_store(|store| {
        BackupService::new(store)
            .create_backup(Utc::now())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(file) => TextResponse {
            ok: true,
            file_name: file.file_name,
            text: file.contents,
            message: "Backup criado.".to_string(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=backup_create");
            TextResponse::failure(err)
        }
    }
}

/// Restores a backup document; nothing is written when it is invalid.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_restore(text: String) -> ActionResponse {
    match with_store(|store| {
        BackupService::new(store)
            .restore(&text, Utc::now())
            .map_err(|err| err.to_string())
    }) {
        Ok(report) => ActionResponse::success(
            format!(
                "{} seção(ões) restaurada(s): {}. {} registro(s) ignorado(s).",
                report.sections.len(),
                report.sections.join(", "),
                report.skipped
            ),
            None,
        ),
        Err(err) => failure("backup_restore", err),
    }
}

/// Stored theme preference: `light|dark|auto`.
#[flutter_rust_bridge::frb(sync)]
pub fn theme_get() -> String {
    with_store(|store| {
        SettingsService::new(store)
            .theme()
            .map_err(|err| err.to_string())
    })
    .unwrap_or_default()
    .as_str()
    .to_string()
}

#[flutter_rust_bridge::frb(sync)]
pub fn theme_set(theme: String) -> ActionResponse {
    let result = Theme::parse(&theme)
        .ok_or_else(|| format!("unknown theme `{theme}`; expected light|dark|auto"))
        .and_then(|theme| {
            with_store(|store| {
                SettingsService::new(store)
                    .set_theme(theme)
                    .map_err(|err| err.to_string())
            })
        });
    match result {
        Ok(()) => ActionResponse::success("Tema salvo.", None),
        Err(err) => failure("theme_set", err),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("ORGANIZER_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_store<T>(f: impl FnOnce(SqliteKvStore<'_>) -> Result<T, String>) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("database open failed: {err}"))?;
    f(SqliteKvStore::new(&conn))
}

fn text_response(
    file_name: String,
    f: impl FnOnce(SqliteKvStore<'_>) -> Result<String, String>,
) -> TextResponse {
    match with_store(f) {
        Ok(text) => TextResponse {
            ok: true,
            file_name,
            text,
            message: "Exportação pronta.".to_string(),
        },
        Err(err) => TextResponse::failure(err),
    }
}

fn list_parts<T>(result: Result<Vec<T>, String>) -> (bool, Vec<T>, String) {
    match result {
        Ok(items) => {
            let message = format!("{} item(ns).", items.len());
            (true, items, message)
        }
        Err(message) => (false, Vec::new(), message),
    }
}

fn failure(call: &str, err: String) -> ActionResponse {
    warn!("event=ffi_call module=ffi status=error call={call}");
    ActionResponse::failure(format!("{call} failed: {err}"))
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid id `{raw}`"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date `{raw}`; expected YYYY-MM-DD"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, finance_add_transaction, finance_delete_transaction, finance_month,
        games_add, games_list, init_logging, ping, theme_get, theme_set, today, toys_add,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn added_transaction_shows_up_in_its_month_and_can_be_deleted() {
        let token = unique_token("mercado");
        let date = today().format("%Y-%m-%d").to_string();
        let created = finance_add_transaction(
            token.clone(),
            42.5,
            "Despesa".to_string(),
            date,
            "Alimentação".to_string(),
            None,
            None,
        );
        assert!(created.ok, "{}", created.message);
        let id = created.id.unwrap();

        let month = today().format("%Y-%m").to_string();
        let view = finance_month(month, token);
        assert!(view.ok, "{}", view.message);
        assert!(view.items.iter().any(|item| item.id == id));

        assert!(finance_delete_transaction(id).ok);
    }

    #[test]
    fn invalid_input_returns_failure_envelope() {
        let bad_kind = finance_add_transaction(
            "Teste".to_string(),
            10.0,
            "Transferência".to_string(),
            "2024-01-01".to_string(),
            "Outros".to_string(),
            None,
            None,
        );
        assert!(!bad_kind.ok);
        assert!(bad_kind.message.contains("unknown kind"));

        assert!(!finance_delete_transaction("not-a-uuid".to_string()).ok);
        assert!(!finance_month("2024-13".to_string(), String::new()).ok);
        assert!(!games_add("Hades".to_string(), "PC".to_string(), "Zerado".to_string(), None).ok);
    }

    #[test]
    fn games_and_toys_round_trip_through_envelopes() {
        let title = unique_token("Hollow Knight");
        let added = games_add(title.clone(), "PC".to_string(), "playing".to_string(), Some(5));
        assert!(added.ok, "{}", added.message);
        let listed = games_list(title);
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].status, "Jogando");

        let number = unique_token("HW");
        assert!(toys_add("Skyline".to_string(), number.clone(), 2021, None).ok);
        let duplicate = toys_add("Supra".to_string(), number, 2022, None);
        assert!(!duplicate.ok);
    }

    #[test]
    fn theme_set_rejects_unknown_values() {
        assert!(!theme_set("sepia".to_string()).ok);
        assert!(["light", "dark", "auto"].contains(&theme_get().as_str()));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
