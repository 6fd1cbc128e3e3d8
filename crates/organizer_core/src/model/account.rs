//! Wallets/accounts transactions can be attributed to.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCOUNT_ID: &str = "default";
pub const DEFAULT_ACCOUNT_NAME: &str = "Conta Principal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Opening balance; transaction totals are added on top.
    #[serde(default)]
    pub balance: f64,
}

impl Account {
    pub fn default_account() -> Self {
        Self {
            id: DEFAULT_ACCOUNT_ID.to_string(),
            name: DEFAULT_ACCOUNT_NAME.to_string(),
            balance: 0.0,
        }
    }
}
