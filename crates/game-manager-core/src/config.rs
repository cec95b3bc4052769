//! Bet configuration supplied by the host

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum and maximum stake
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetLimits {
    pub minbet: f64,
    pub maxbet: f64,
}

impl BetLimits {
    /// Whether a stake lies within the bounds (inclusive)
    pub fn allows(&self, quantity: f64) -> bool {
        quantity >= self.minbet && quantity <= self.maxbet
    }
}

/// Bet bounds, language and game specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetConfig {
    pub minbet: f64,
    pub maxbet: f64,
    /// Per bet-type overrides of the global bounds
    #[serde(
        default,
        deserialize_with = "crate::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub overrides: HashMap<String, BetLimits>,
    /// Language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Open extension bag, e.g. `isAmericanRoulette` for roulette
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub game_specific: serde_json::Map<String, serde_json::Value>,
}

impl BetConfig {
    pub fn new(minbet: f64, maxbet: f64) -> Self {
        Self {
            minbet,
            maxbet,
            overrides: HashMap::new(),
            lang: None,
            game_specific: serde_json::Map::new(),
        }
    }

    /// Global bounds
    pub fn limits(&self) -> BetLimits {
        BetLimits {
            minbet: self.minbet,
            maxbet: self.maxbet,
        }
    }

    /// Bounds for a bet type, falling back to the global bounds
    pub fn limits_for(&self, bet_type: &str) -> BetLimits {
        self.overrides
            .get(bet_type)
            .copied()
            .unwrap_or_else(|| self.limits())
    }

    /// Decode the game specific bag into a typed structure
    pub fn game_specific_as<T: DeserializeOwned>(&self) -> crate::Result<T> {
        let value = serde_json::Value::Object(self.game_specific.clone());
        serde_json::from_value(value).map_err(Into::into)
    }
}
