//! Expense/income categories with display metadata.

use serde::{Deserialize, Serialize};

/// Named category with an icon class and a hex color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl Category {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }

    /// Display metadata used for names that match no known category.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self::new(name, FALLBACK_ICON, FALLBACK_COLOR)
    }
}

pub const FALLBACK_ICON: &str = "bi-tag";
pub const FALLBACK_COLOR: &str = "#6c757d";

const DEFAULTS: &[(&str, &str, &str)] = &[
    ("Alimentação", "bi-basket", "#FF6384"),
    ("Moradia", "bi-house", "#36A2EB"),
    ("Transporte", "bi-car-front", "#FFCE56"),
    ("Lazer", "bi-controller", "#4BC0C0"),
    ("Saúde", "bi-heart-pulse", "#9966FF"),
    ("Trabalho", "bi-briefcase", "#FF9F40"),
    ("Outros", "bi-three-dots", "#C9CBCF"),
];

/// Built-in categories; these cannot be deleted.
pub fn default_categories() -> Vec<Category> {
    DEFAULTS
        .iter()
        .map(|(name, icon, color)| Category::new(*name, *icon, *color))
        .collect()
}

pub fn is_default_category(name: &str) -> bool {
    DEFAULTS.iter().any(|(default, _, _)| *default == name)
}
