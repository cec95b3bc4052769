//! Player balance

use serde::{Deserialize, Serialize};

/// Asset used when a balance is constructed locally
pub const DEFAULT_ASSET: &str = "BSV";

/// Player balance reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInfo {
    pub balance: f64,
    #[serde(default = "default_asset")]
    pub asset_code: String,
    #[serde(default = "default_asset")]
    pub asset_name: String,
}

fn default_asset() -> String {
    DEFAULT_ASSET.to_string()
}

impl BalanceInfo {
    /// Balance in the default asset
    pub fn new(balance: f64) -> Self {
        Self {
            balance,
            asset_code: default_asset(),
            asset_name: default_asset(),
        }
    }
}
