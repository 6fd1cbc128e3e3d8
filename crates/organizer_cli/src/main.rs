//! Command-line front end for the organizer core.
//!
//! # Responsibility
//! - Map subcommands onto core use-case services.
//! - Resolve database path, logging and catalog key from flags or env.
//! - Keep output plain and line-oriented for shell use.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use organizer_core::finance::csv_io::{export_file_name, report_file_name};
use organizer_core::finance::filter::{group_by_date, SortMode, TransactionFilter};
use organizer_core::finance::installments::RecurrenceFrequency;
use organizer_core::metadata::{GameMetadataProvider, RawgClient, DEFAULT_SEARCH_LIMIT};
use organizer_core::model::money::{format_brl, parse_amount};
use organizer_core::model::period::MonthKey;
use organizer_core::model::settings::Theme;
use organizer_core::service::backup_service::backup_file_name;
use organizer_core::service::game_service::{games_export_file_name, GameFilter, GameInput};
use organizer_core::service::toy_service::{toys_export_file_name, ToyCarFilter, ToyCarInput};
use organizer_core::{
    default_log_level, init_logging, open_db, BackupService, DashboardService, FinanceService,
    GameService, GameStatus, NewTransaction, SettingsService, SqliteKvStore, ToyService,
    TransactionKind,
};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Personal organizer: finances, game backlog and toy-car collection.
#[derive(Parser)]
#[command(name = "organizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "ORGANIZER_DB_PATH", default_value = "organizer.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "ORGANIZER_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "ORGANIZER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Income, expenses, budgets and reports
    #[command(subcommand)]
    Finance(FinanceCommand),

    /// Game backlog
    #[command(subcommand)]
    Games(GamesCommand),

    /// Toy-car collection
    #[command(subcommand)]
    Toys(ToysCommand),

    /// Cross-module counters, goal alerts and reminders
    Dashboard,

    /// Full-data backup and restore
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Light/dark theme preference
    #[command(subcommand)]
    Theme(ThemeCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Finance(_) => "finance",
            Self::Games(_) => "games",
            Self::Toys(_) => "toys",
            Self::Dashboard => "dashboard",
            Self::Backup(_) => "backup",
            Self::Theme(_) => "theme",
        }
    }
}

#[derive(Subcommand)]
enum FinanceCommand {
    /// Add an income or expense
    Add {
        description: String,
        /// Amount, `1234.56` or `1.234,56`
        amount: String,
        /// receita|despesa (income|expense)
        #[arg(short, long, default_value = "despesa", value_parser = parse_kind)]
        kind: TransactionKind,
        /// Category name
        #[arg(short, long, default_value = "Outros")]
        category: String,
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Split into this many monthly installments
        #[arg(long)]
        installments: Option<u32>,
        /// weekly|monthly|yearly
        #[arg(long)]
        recurrence: Option<RecurrenceFrequency>,
    },

    /// List one month with totals
    List {
        #[command(flatten)]
        month: MonthArg,
        /// Description or category substring
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
        /// date_desc|date_asc|amount_desc|amount_asc
        #[arg(long, default_value = "date_desc")]
        sort: SortMode,
    },

    /// Totals for today compared with yesterday
    Today,

    /// Delete one transaction
    Delete { id: Uuid },

    /// Show or replace a month's budget limits
    Budget {
        #[command(flatten)]
        month: MonthArg,
        /// Limits as CATEGORY=AMOUNT; shows the budget when empty
        limits: Vec<String>,
    },

    /// Export all transactions as CSV
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import transactions from a CSV or JSON file
    Import { file: PathBuf },

    /// Write the `;`-separated monthly report
    Report {
        #[command(flatten)]
        month: MonthArg,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Yearly trend, projection, patterns and alerts
    Insights,
}

#[derive(Args)]
struct MonthArg {
    /// Month (YYYY-MM); defaults to the current month
    #[arg(short, long, value_parser = parse_month)]
    month: Option<MonthKey>,
}

impl MonthArg {
    fn or_current(&self) -> MonthKey {
        self.month.unwrap_or_else(|| MonthKey::of(today()))
    }
}

#[derive(Subcommand)]
enum GamesCommand {
    /// Add a game, optionally prefilled from the catalog
    Add {
        title: String,
        #[arg(short, long, default_value = "PC")]
        platform: String,
        /// backlog|playing|finished|paused|dropped
        #[arg(short, long, default_value = "backlog", value_parser = parse_status)]
        status: GameStatus,
        /// 1 to 5
        #[arg(short, long)]
        rating: Option<u8>,
        /// Catalog id to attach metadata from
        #[arg(long, requires = "api_key")]
        catalog_id: Option<u64>,
        #[arg(long, env = "RAWG_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    List {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(short, long)]
        platform: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<GameStatus>,
    },

    Delete { id: Uuid },

    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search the online catalog
    Lookup {
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
        #[arg(long, env = "RAWG_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

#[derive(Subcommand)]
enum ToysCommand {
    Add {
        name: String,
        /// Collector number, unique within the collection
        number: String,
        year: u16,
        #[arg(short, long)]
        series: Option<String>,
    },

    List {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long)]
        series: Option<String>,
    },

    Delete { id: Uuid },

    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BackupCommand {
    /// Write a full backup document
    Create {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore from a backup document
    Restore { file: PathBuf },
    /// Delete every stored record
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
    Stats,
}

#[derive(Subcommand)]
enum ThemeCommand {
    Get {
        /// Resolve `auto` as if the system prefers dark
        #[arg(long)]
        system_dark: bool,
    },
    Set {
        #[arg(value_parser = parse_theme)]
        theme: Theme,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, dir).map_err(|err| anyhow!(err).context("logging setup failed"))?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let store = SqliteKvStore::new(&conn);
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    match cli.command {
        Commands::Finance(command) => run_finance(store, command),
        Commands::Games(command) => run_games(store, command),
        Commands::Toys(command) => run_toys(store, command),
        Commands::Dashboard => run_dashboard(store),
        Commands::Backup(command) => run_backup(store, command),
        Commands::Theme(command) => run_theme(store, command),
    }
}

fn run_finance(store: SqliteKvStore<'_>, command: FinanceCommand) -> Result<()> {
    let service = FinanceService::new(store);
    match command {
        FinanceCommand::Add {
            description,
            amount,
            kind,
            category,
            date,
            installments,
            recurrence,
        } => {
            let amount = parse_amount(&amount)
                .with_context(|| format!("invalid amount `{amount}`"))?;
            let mut input = NewTransaction::new(
                description,
                amount,
                kind,
                date.unwrap_or_else(today),
                category,
            );
            if let Some(count) = installments {
                input = input.with_installments(count);
            }
            if let Some(frequency) = recurrence {
                input = input.with_recurrence(frequency);
            }
            let created = service
                .add_transaction(input, today())
                .context("failed to add transaction")?;
            for tx in &created {
                println!("{}\t{}\t{}", tx.id, tx.date, tx.description);
            }
            println!("added={}", created.len());
        }
        FinanceCommand::List {
            month,
            search,
            category,
            sort,
        } => {
            let mut filter = TransactionFilter::for_month(month.or_current()).with_search(search);
            if let Some(category) = category {
                filter = filter.with_category(category);
            }
            let view = service
                .month_view(&filter, sort, today())
                .context("failed to load month")?;
            let items = view.items.iter().collect::<Vec<_>>();
            for group in group_by_date(&items) {
                println!("# {}", group.date.format("%d/%m/%Y"));
                for tx in group.items {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        tx.id,
                        tx.kind,
                        format_brl(tx.amount),
                        tx.category,
                        tx.description
                    );
                }
            }
            let summary = &view.summary;
            println!(
                "month={} income={} expenses={} balance={}",
                summary.month,
                format_brl(summary.income),
                format_brl(summary.expenses),
                format_brl(summary.balance)
            );
            if let Some(trend) = &summary.trend {
                println!(
                    "vs_previous={} {}",
                    trend.direction.symbol(),
                    format_brl(trend.difference)
                );
            }
            println!(
                "health={} ({})",
                summary.health.label(),
                summary.health.message(summary.income)
            );
            for row in &summary.categories {
                match &row.budget {
                    Some(budget) => println!(
                        "  {}\t{}\t{:.0}% of {}",
                        row.category,
                        format_brl(row.spent),
                        budget.percentage,
                        format_brl(budget.limit)
                    ),
                    None => println!("  {}\t{}", row.category, format_brl(row.spent)),
                }
            }
            if let Some(savings) = &view.savings {
                println!("savings_goal={:.0}%", savings.percentage);
            }
        }
        FinanceCommand::Today => {
            let day = service.today_view(today()).context("failed to load today")?;
            println!(
                "date={} income={} expenses={} balance={} count={}",
                day.date,
                format_brl(day.income),
                format_brl(day.expenses),
                format_brl(day.balance),
                day.count
            );
            if let Some(trend) = day.trend {
                println!("vs_yesterday={} {:.1}%", trend.direction.symbol(), trend.percent);
            }
        }
        FinanceCommand::Delete { id } => {
            let removed = service
                .delete_transaction(id)
                .context("failed to delete transaction")?;
            println!("deleted={}", removed.id);
        }
        FinanceCommand::Budget { month, limits } => {
            let month = month.or_current();
            let book = if limits.is_empty() {
                service.budgets(today()).context("failed to load budgets")?
            } else {
                let parsed = limits
                    .iter()
                    .map(|raw| parse_limit(raw))
                    .collect::<Result<Vec<_>>>()?;
                service
                    .set_month_budgets(month, parsed, today())
                    .context("failed to save budgets")?
            };
            for (category, limit) in book.month(month) {
                println!("{category}\t{}", format_brl(limit));
            }
        }
        FinanceCommand::Export { output } => {
            let csv = service.export_csv().context("failed to export transactions")?;
            write_output(output, export_file_name(today()), &csv)?;
        }
        FinanceCommand::Import { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let is_json = file
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            let (imported, skipped) = if is_json {
                service.import_json(&text)
            } else {
                service.import_csv(&text)
            }
            .context("import failed")?;
            println!("imported={imported} skipped={skipped}");
        }
        FinanceCommand::Report { month, output } => {
            let month = month.or_current();
            let report = service
                .monthly_report(month)
                .context("failed to build report")?;
            write_output(output, report_file_name(month), &report)?;
        }
        FinanceCommand::Insights => {
            let insights = service.insights(today()).context("failed to analyze")?;
            for totals in &insights.yearly {
                println!(
                    "{}\tincome={}\texpenses={}",
                    totals.month,
                    format_brl(totals.income),
                    format_brl(totals.expenses)
                );
            }
            let projection = &insights.projection;
            println!(
                "projection income={} expenses={} balance={}",
                format_brl(projection.income),
                format_brl(projection.expenses),
                format_brl(projection.balance)
            );
            for recurring in &insights.patterns.recurring {
                println!(
                    "recurring {} ({}) x{} avg={}",
                    recurring.description,
                    recurring.category,
                    recurring.occurrences,
                    format_brl(recurring.average_amount)
                );
            }
            if let Some(suggestion) = &insights.patterns.highest_category {
                println!("{}", suggestion.message());
            }
            println!(
                "expenses_vs_last_month={}% ({})",
                insights.expense_change.percent,
                insights.expense_change.trend.as_str()
            );
            for alert in service.alerts(today()).context("failed to build alerts")? {
                println!("[{}] {}", alert.level.as_str(), alert.message);
            }
        }
    }
    Ok(())
}

fn run_games(store: SqliteKvStore<'_>, command: GamesCommand) -> Result<()> {
    let service = GameService::new(store);
    match command {
        GamesCommand::Add {
            title,
            platform,
            status,
            rating,
            catalog_id,
            api_key,
        } => {
            let mut input = GameInput::new(title, platform, status);
            if let (Some(id), Some(key)) = (catalog_id, api_key) {
                let metadata = RawgClient::new(&key)
                    .and_then(|client| client.details(id))
                    .with_context(|| format!("catalog lookup for id {id} failed"))?;
                input.metadata = Some(metadata);
            }
            if let Some(rating) = rating {
                input = input.with_rating(rating);
            }
            let game = service
                .add_game(input, Utc::now())
                .context("failed to add game")?;
            println!("added={}", game.id);
        }
        GamesCommand::List {
            search,
            platform,
            status,
        } => {
            let filter = GameFilter {
                platform,
                status,
                search,
            };
            let view = service.view(&filter).context("failed to list games")?;
            for game in &view.items {
                let rating = game.rating.map(|value| value.to_string()).unwrap_or_default();
                println!(
                    "{}\t{}\t{}\t{}\t{rating}",
                    game.id,
                    game.title,
                    game.platform,
                    game.status.label()
                );
            }
            let stats = view.stats;
            println!(
                "total={} playing={} finished={} backlog={}",
                stats.total, stats.playing, stats.finished, stats.backlog
            );
        }
        GamesCommand::Delete { id } => {
            let removed = service.delete_game(id).context("failed to delete game")?;
            println!("deleted={}", removed.id);
        }
        GamesCommand::Export { output } => {
            let csv = service.export_csv().context("failed to export games")?;
            write_output(output, games_export_file_name(today()), &csv)?;
        }
        GamesCommand::Lookup {
            query,
            limit,
            api_key,
        } => {
            let client = RawgClient::new(&api_key).context("catalog client setup failed")?;
            let results = client
                .search(&query, limit)
                .with_context(|| format!("catalog search for `{query}` failed"))?;
            if results.is_empty() {
                println!("no results (queries need at least 3 characters)");
            }
            for game in results {
                println!(
                    "{}\t{}\t{}\t{}",
                    game.id,
                    game.name,
                    game.released.unwrap_or_default(),
                    game.platforms.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn run_toys(store: SqliteKvStore<'_>, command: ToysCommand) -> Result<()> {
    let service = ToyService::new(store);
    match command {
        ToysCommand::Add {
            name,
            number,
            year,
            series,
        } => {
            let mut input = ToyCarInput::new(name, number, year);
            if let Some(series) = series {
                input = input.with_series(series);
            }
            let car = service.add_car(input, Utc::now()).context("failed to add car")?;
            println!("added={}", car.id);
        }
        ToysCommand::List { search, series } => {
            let view = service
                .view(&ToyCarFilter { series, search })
                .context("failed to list cars")?;
            for car in &view.items {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    car.id,
                    car.number,
                    car.name,
                    car.year,
                    car.series.as_deref().unwrap_or("-")
                );
            }
            let stats = view.stats;
            let year = stats
                .most_common_year
                .map(|year| year.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "total={} series={} most_common_year={year}",
                stats.total, stats.distinct_series
            );
        }
        ToysCommand::Delete { id } => {
            let removed = service.delete_car(id).context("failed to delete car")?;
            println!("deleted={}", removed.id);
        }
        ToysCommand::Export { output } => {
            let csv = service.export_csv().context("failed to export cars")?;
            write_output(output, toys_export_file_name(today()), &csv)?;
        }
    }
    Ok(())
}

fn run_dashboard(store: SqliteKvStore<'_>) -> Result<()> {
    let service = DashboardService::new(store);
    let stats = service.stats(today()).context("failed to load dashboard")?;
    println!(
        "finance income={} expenses={} budgets={}",
        format_brl(stats.finance.income),
        format_brl(stats.finance.expenses),
        stats.finance.budgets
    );
    println!(
        "games total={} playing={} finished={}",
        stats.games.total, stats.games.playing, stats.games.finished
    );
    println!(
        "toys total={} series={} years={}",
        stats.toy_cars.total, stats.toy_cars.series, stats.toy_cars.years
    );
    println!(
        "backup items={} size={}KB",
        stats.backup.total_items(),
        stats.backup.size_kb()
    );

    let trends = service.trends(today()).context("failed to compute trends")?;
    for (label, growth) in [
        ("expenses", trends.expenses),
        ("games_added", trends.games_added),
        ("cars_added", trends.cars_added),
    ] {
        println!("trend {label}={}% ({})", growth.percent, growth.trend.as_str());
    }
    for alert in service.goal_alerts(today()).context("failed to check goals")? {
        println!("[{}] {}", alert.level.as_str(), alert.message);
    }
    for reminder in service
        .due_reminders(Utc::now())
        .context("failed to check reminders")?
    {
        println!("{}", reminder.message());
    }
    Ok(())
}

fn run_backup(store: SqliteKvStore<'_>, command: BackupCommand) -> Result<()> {
    let service = BackupService::new(store);
    match command {
        BackupCommand::Create { output } => {
            let now = Utc::now();
            let file = service.create_backup(now).context("failed to create backup")?;
            write_output(output, backup_file_name(now), &file.contents)?;
        }
        BackupCommand::Restore { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let report = service
                .restore(&text, Utc::now())
                .context("restore failed")?;
            println!(
                "restored={} skipped={}",
                report.sections.join(","),
                report.skipped
            );
        }
        BackupCommand::Clear { yes } => {
            if !yes {
                bail!("refusing to clear all data without --yes");
            }
            let cleared = service.clear_all().context("failed to clear data")?;
            println!("cleared={cleared}");
        }
        BackupCommand::Stats => {
            let stats = service.stats().context("failed to read stats")?;
            println!(
                "transactions={} budget_periods={} games={} toy_cars={} size={}KB",
                stats.transactions,
                stats.budget_periods,
                stats.games,
                stats.toy_cars,
                stats.size_kb()
            );
            for record in service.history().context("failed to read history")? {
                println!("backup {} {}B", record.date, record.size);
            }
        }
    }
    Ok(())
}

fn run_theme(store: SqliteKvStore<'_>, command: ThemeCommand) -> Result<()> {
    let service = SettingsService::new(store);
    match command {
        ThemeCommand::Get { system_dark } => {
            let stored = service.theme().context("failed to read theme")?;
            println!("theme={stored} effective={}", stored.resolve(system_dark));
        }
        ThemeCommand::Set { theme } => {
            service.set_theme(theme).context("failed to save theme")?;
            println!("theme={theme}");
        }
    }
    Ok(())
}

fn write_output(output: Option<PathBuf>, default_name: String, contents: &str) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    fs::write(&path, contents).with_context(|| format!("failed to write `{}`", path.display()))?;
    println!("wrote={}", path.display());
    Ok(())
}

fn parse_limit(raw: &str) -> Result<(String, f64)> {
    let (category, amount) = raw
        .rsplit_once('=')
        .with_context(|| format!("budget limit `{raw}` must look like CATEGORY=AMOUNT"))?;
    let amount =
        parse_amount(amount).with_context(|| format!("invalid budget amount in `{raw}`"))?;
    Ok((category.to_string(), amount))
}

fn parse_kind(raw: &str) -> Result<TransactionKind, String> {
    TransactionKind::parse(raw).ok_or_else(|| format!("unknown kind `{raw}`"))
}

fn parse_status(raw: &str) -> Result<GameStatus, String> {
    GameStatus::parse(raw).ok_or_else(|| format!("unknown status `{raw}`"))
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    Theme::parse(raw).ok_or_else(|| format!("unknown theme `{raw}`; expected light|dark|auto"))
}

fn parse_month(raw: &str) -> Result<MonthKey, String> {
    raw.parse()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
