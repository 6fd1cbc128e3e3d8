//! Cross-module dashboard: counters, goals, trends and reminders.
//!
//! # Responsibility
//! - Summarize finance, games, toy cars and backups for the landing page.
//! - Persist personal goals and raise progress alerts against them.
//! - Throttle periodic reminders with stored timestamps.
//!
//! # Invariants
//! - A goal of zero is "not set" and never raises an alert.
//! - Each reminder fires at most once per interval.

use crate::finance::alerts::{Alert, AlertLevel};
use crate::finance::insights::{expense_change, growth, month_totals, Growth};
use crate::model::goals::Goals;
use crate::model::period::MonthKey;
use crate::service::backup_service::{BackupError, BackupService, BackupStats};
use crate::service::finance_service::{FinanceError, FinanceService};
use crate::service::game_service::{GameError, GameService, GameStats};
use crate::service::toy_service::{ToyError, ToyService};
use crate::store::keys;
use crate::store::stamps::{is_due, read_timestamp, write_timestamp};
use crate::store::{JsonStore, KeyValueStore, StoreError};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::info;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Progress at which a goal alert turns from silent to encouraging.
pub const GOAL_CLOSE_PERCENT: f64 = 75.0;
pub const BACKUP_REMINDER_DAYS: i64 = 7;
pub const GOAL_REMINDER_DAYS: i64 = 30;

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Wraps the failure of whichever module the dashboard was reading.
#[derive(Debug)]
pub enum DashboardError {
    Finance(FinanceError),
    Games(GameError),
    Toys(ToyError),
    Backup(BackupError),
    Store(StoreError),
}

impl Display for DashboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finance(err) => write!(f, "{err}"),
            Self::Games(err) => write!(f, "{err}"),
            Self::Toys(err) => write!(f, "{err}"),
            Self::Backup(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DashboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Finance(err) => Some(err),
            Self::Games(err) => Some(err),
            Self::Toys(err) => Some(err),
            Self::Backup(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<FinanceError> for DashboardError {
    fn from(value: FinanceError) -> Self {
        Self::Finance(value)
    }
}

impl From<GameError> for DashboardError {
    fn from(value: GameError) -> Self {
        Self::Games(value)
    }
}

impl From<ToyError> for DashboardError {
    fn from(value: ToyError) -> Self {
        Self::Toys(value)
    }
}

impl From<BackupError> for DashboardError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

impl From<StoreError> for DashboardError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinanceCard {
    pub income: f64,
    pub expenses: f64,
    /// Categories budgeted for the current month.
    pub budgets: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToyCarCard {
    pub total: usize,
    pub series: usize,
    pub years: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardStats {
    pub finance: FinanceCard,
    pub games: GameStats,
    pub toy_cars: ToyCarCard,
    pub backup: BackupStats,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardTrends {
    pub expenses: Growth,
    pub games_added: Growth,
    pub cars_added: Growth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    /// No automatic backup has ever run.
    ConfigureAutoBackup,
    WeeklyBackup,
    MonthlyGoals,
}

impl Reminder {
    pub fn message(self) -> &'static str {
        match self {
            Self::ConfigureAutoBackup => "Dica: configure o backup automático para proteger seus dados",
            Self::WeeklyBackup => "Lembrete: faça backup dos seus dados para mantê-los seguros",
            Self::MonthlyGoals => "Dica: defina metas para manter o foco nos seus objetivos",
        }
    }
}

pub struct DashboardService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn stats(&self, today: NaiveDate) -> DashboardResult<DashboardStats> {
        let finance = FinanceService::new(&self.store);
        let month = MonthKey::of(today);
        let totals = month_totals(&finance.transactions()?, month);
        let budgets = finance.budgets(today)?.category_count(month);

        let games = GameService::new(&self.store).games()?;
        let cars = ToyService::new(&self.store).cars()?;
        let series = cars
            .iter()
            .filter_map(|car| car.series.as_deref())
            .collect::<BTreeSet<_>>()
            .len();
        let years = cars.iter().map(|car| car.year).collect::<BTreeSet<_>>().len();

        Ok(DashboardStats {
            finance: FinanceCard {
                income: totals.income,
                expenses: totals.expenses,
                budgets,
            },
            games: GameStats::of(&games),
            toy_cars: ToyCarCard {
                total: cars.len(),
                series,
                years,
            },
            backup: BackupService::new(&self.store).stats()?,
        })
    }

    pub fn goals(&self) -> DashboardResult<Goals> {
        Ok(self.store.load_json(keys::APP_GOALS, Goals::default())?)
    }

    pub fn save_goals(&self, goals: &Goals) -> DashboardResult<()> {
        self.store.save_json(keys::APP_GOALS, goals)?;
        info!("event=goals_save module=dashboard status=ok");
        Ok(())
    }

    /// Alerts for savings, finished games and collection size goals.
    pub fn goal_alerts(&self, today: NaiveDate) -> DashboardResult<Vec<Alert>> {
        let goals = self.goals()?;
        let mut alerts = Vec::new();

        if goals.finance.monthly_savings > 0.0 {
            let transactions = FinanceService::new(&self.store).transactions()?;
            let balance = month_totals(&transactions, MonthKey::of(today)).balance();
            alerts.extend(goal_alert(
                balance / goals.finance.monthly_savings * 100.0,
                "poupança mensal",
            ));
        }
        if goals.games.games_to_finish > 0 {
            let finished = GameStats::of(&GameService::new(&self.store).games()?).finished;
            alerts.extend(goal_alert(
                finished as f64 / f64::from(goals.games.games_to_finish) * 100.0,
                "jogos",
            ));
        }
        if goals.toy_cars.collection_target > 0 {
            let owned = ToyService::new(&self.store).cars()?.len();
            alerts.extend(goal_alert(
                owned as f64 / f64::from(goals.toy_cars.collection_target) * 100.0,
                "coleção",
            ));
        }
        Ok(alerts)
    }

    /// Month-over-month change for expenses, games added and cars added.
    pub fn trends(&self, today: NaiveDate) -> DashboardResult<DashboardTrends> {
        let month = MonthKey::of(today);
        let previous = month.previous();
        let transactions = FinanceService::new(&self.store).transactions()?;
        let games = GameService::new(&self.store).games()?;
        let cars = ToyService::new(&self.store).cars()?;

        let added = |dates: &mut dyn Iterator<Item = NaiveDate>| -> Growth {
            let (mut current, mut before) = (0_u32, 0_u32);
            for date in dates {
                if month.contains(date) {
                    current += 1;
                } else if previous.contains(date) {
                    before += 1;
                }
            }
            growth(f64::from(current), f64::from(before))
        };

        Ok(DashboardTrends {
            expenses: expense_change(&transactions, today),
            games_added: added(&mut games.iter().map(|game| game.date_added.date_naive())),
            cars_added: added(&mut cars.iter().map(|car| car.date_added.date_naive())),
        })
    }

    /// Reminders due at `now`; each returned reminder is marked as shown.
    pub fn due_reminders(&self, now: DateTime<Utc>) -> DashboardResult<Vec<Reminder>> {
        let mut due = Vec::new();
        if read_timestamp(&self.store, keys::LAST_AUTO_BACKUP)?.is_none() {
            due.push(Reminder::ConfigureAutoBackup);
        }
        let throttled = [
            (
                Reminder::WeeklyBackup,
                keys::LAST_BACKUP_REMINDER,
                Duration::days(BACKUP_REMINDER_DAYS),
            ),
            (
                Reminder::MonthlyGoals,
                keys::LAST_GOAL_REMINDER,
                Duration::days(GOAL_REMINDER_DAYS),
            ),
        ];
        for (reminder, key, interval) in throttled {
            if is_due(&self.store, key, interval, now)? {
                write_timestamp(&self.store, key, now)?;
                due.push(reminder);
            }
        }
        Ok(due)
    }
}

fn goal_alert(progress: f64, goal: &str) -> Option<Alert> {
    if progress >= 100.0 {
        Some(Alert::new(
            AlertLevel::Success,
            format!("Parabéns! Você atingiu sua meta de {goal}"),
        ))
    } else if progress >= GOAL_CLOSE_PERCENT {
        Some(Alert::new(
            AlertLevel::Info,
            format!(
                "Você está a {}% da sua meta de {goal}",
                (100.0 - progress).round()
            ),
        ))
    } else {
        None
    }
}
