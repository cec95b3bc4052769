//! Bet requests and results

use serde::{Deserialize, Serialize};

/// A single wager inside a bet request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetItem {
    /// Quantity wagered (fiat or crypto depending on context)
    #[serde(rename = "q")]
    pub quantity: f64,
    /// Game specific bet codes, e.g. roulette pocket numbers
    #[serde(rename = "b", default, deserialize_with = "crate::null_as_default")]
    pub details: Vec<i64>,
}

impl BetItem {
    pub fn new(quantity: f64, details: impl Into<Vec<i64>>) -> Self {
        Self {
            quantity,
            details: details.into(),
        }
    }
}

/// Bet placed with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRequest {
    /// Game instance id (e.g. a lottery draw id)
    #[serde(rename = "d")]
    pub game_id: String,
    #[serde(rename = "b", default, deserialize_with = "crate::null_as_default")]
    pub items: Vec<BetItem>,
    /// Submission time
    #[serde(rename = "ts", default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<i64>,
    /// Crypto to fiat conversion rate at submission
    #[serde(rename = "rate", default, skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
    /// Fiat currency code
    #[serde(rename = "currency", default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Game title
    #[serde(rename = "title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Provably-fair token
    #[serde(rename = "pf", default, skip_serializing_if = "Option::is_none")]
    pub fairness_token: Option<String>,
}

impl BetRequest {
    /// Empty request for a game instance
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            items: Vec::new(),
            submitted_at: None,
            conversion_rate: None,
            currency: None,
            title: None,
            fairness_token: None,
        }
    }

    /// Add a wager
    pub fn with_item(mut self, item: BetItem) -> Self {
        self.items.push(item);
        self
    }

    /// A request without wagers must never reach the host
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all wagered quantities
    pub fn total_quantity(&self) -> f64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Saved bet templates, replaced wholesale on every save
pub type FavoriteBets = Vec<BetRequest>;

/// Host reply to `placeBet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBetAck {
    pub confirm: bool,
}

/// Outcome of a bet pushed by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetResult {
    /// Game instance id
    #[serde(rename = "d")]
    pub game_id: String,
    /// Raw outcome from the game service, e.g. cards drawn or the winning pocket
    #[serde(rename = "r", alias = "draw", default)]
    pub outcome: serde_json::Value,
    /// Total payout (fiat when split)
    #[serde(rename = "p", default, deserialize_with = "crate::null_as_default")]
    pub payout: f64,
    /// Crypto portion of the payout
    #[serde(rename = "pc", default, skip_serializing_if = "Option::is_none")]
    pub payout_crypto: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(rename = "ts", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Game specific payload interpreted by the game's result processor
    #[serde(rename = "gs", default)]
    pub game_specific: serde_json::Value,
}

impl BetResult {
    pub fn new(game_id: impl Into<String>, outcome: serde_json::Value, payout: f64) -> Self {
        Self {
            game_id: game_id.into(),
            outcome,
            payout,
            payout_crypto: None,
            txid: None,
            timestamp: None,
            game_specific: serde_json::Value::Null,
        }
    }

    /// Whether the bet paid anything out
    pub fn is_win(&self) -> bool {
        self.payout > 0.0 || self.payout_crypto.is_some_and(|p| p > 0.0)
    }
}
