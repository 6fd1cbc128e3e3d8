//! Well-known store keys.

pub const FINANCE_TRANSACTIONS: &str = "finance_transactions";
pub const FINANCE_BUDGETS: &str = "finance_budgets";
pub const FINANCE_SAVINGS_GOAL: &str = "finance_savings_goal";
pub const FINANCE_CATEGORIES: &str = "finance_categories";
pub const FINANCE_TEMPLATES: &str = "finance_templates";
pub const FINANCE_ACCOUNTS: &str = "finance_accounts";
pub const FINANCE_BACKUPS: &str = "finance_backups";
pub const GAME_LIBRARY: &str = "game_library";
pub const TOY_CAR_COLLECTION: &str = "toy_car_collection";
pub const APP_SETTINGS: &str = "app_settings";
pub const APP_GOALS: &str = "app_goals";
pub const LAST_AUTO_BACKUP: &str = "last_auto_backup";
pub const LAST_BACKUP_REMINDER: &str = "last_backup_reminder";
pub const LAST_GOAL_REMINDER: &str = "last_goal_reminder";

/// Keys holding user data, in backup order.
pub const DATA_KEYS: &[&str] = &[
    FINANCE_TRANSACTIONS,
    FINANCE_BUDGETS,
    FINANCE_SAVINGS_GOAL,
    FINANCE_CATEGORIES,
    FINANCE_TEMPLATES,
    FINANCE_ACCOUNTS,
    GAME_LIBRARY,
    TOY_CAR_COLLECTION,
    APP_SETTINGS,
    APP_GOALS,
];
