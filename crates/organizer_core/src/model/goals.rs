//! Personal goals across modules; zero means "not set".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinanceGoals {
    pub monthly_savings: f64,
    pub debt_reduction: f64,
    pub investment_target: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameGoals {
    pub games_to_finish: u32,
    pub hours_per_week: u32,
    pub backlog_reduction: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToyCarGoals {
    pub collection_target: u32,
    pub series_to_complete: Vec<String>,
    pub monthly_budget: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goals {
    pub finance: FinanceGoals,
    pub games: GameGoals,
    pub toy_cars: ToyCarGoals,
}
