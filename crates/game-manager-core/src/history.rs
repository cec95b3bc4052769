//! Bet history records held by the host

use crate::bet::BetResult;
use crate::time::{normalize_date, parse_date_value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One wager as recorded in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetHistoryItem {
    /// Quantity in fiat
    #[serde(rename = "q")]
    pub quantity: f64,
    /// Quantity in crypto
    #[serde(rename = "qc", default, deserialize_with = "crate::null_as_default")]
    pub quantity_crypto: f64,
    #[serde(rename = "b", default, deserialize_with = "crate::null_as_default")]
    pub details: Vec<i64>,
    /// Payout for this single wager
    #[serde(rename = "p", default, deserialize_with = "crate::null_as_default")]
    pub payout: f64,
}

/// The request as recorded in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetHistoryRequest {
    #[serde(rename = "d")]
    pub game_id: String,
    #[serde(rename = "b", default, deserialize_with = "crate::null_as_default")]
    pub items: Vec<BetHistoryItem>,
}

/// A settled (or failed) bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetHistory {
    pub txid: String,
    /// Seconds or milliseconds, as the host sent it
    #[serde(deserialize_with = "date_value")]
    pub bet_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub asset_code: String,
    pub asset_name: String,
    pub bet_request: BetHistoryRequest,
    /// Total payout
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub bet_payout: f64,
    #[serde(default)]
    pub bet_result: Option<BetResult>,
}

impl BetHistory {
    /// Bet time in milliseconds
    pub fn bet_time_millis(&self) -> i64 {
        normalize_date(self.bet_time)
    }

    pub fn bet_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.bet_time_millis())
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Hosts send bet times as numbers or numeric strings
fn date_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Float(v) => Ok(v.trunc() as i64),
        Raw::Text(s) => parse_date_value(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid bet time: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const ENTRY: &str = r#"{
        "txid": "tx-1",
        "betTime": 1600000000,
        "error": "",
        "assetCode": "BSV",
        "assetName": "BSV",
        "betRequest": {"d": "draw-7", "b": [{"q": 1, "qc": 0.02, "b": [17], "p": 36}]},
        "betPayout": 36,
        "betResult": {"d": "draw-7", "r": [17], "p": 36, "gs": null}
    }"#;

    #[test]
    fn test_history_entry_from_host() {
        let entry: BetHistory = serde_json::from_str(ENTRY).unwrap();
        assert_eq!(entry.bet_time_millis(), 1_600_000_000_000);
        assert_eq!(entry.bet_time_utc().unwrap().year(), 2020);
        assert!(!entry.is_error());
        assert_eq!(entry.bet_request.items[0].quantity_crypto, 0.02);
        assert_eq!(entry.bet_result.unwrap().payout, 36.0);
    }

    #[test]
    fn test_string_bet_time() {
        let json = ENTRY.replace("1600000000", "\"1600000000123\"");
        let entry: BetHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(entry.bet_time, 1_600_000_000_123);
        assert_eq!(entry.bet_time_millis(), 1_600_000_000_123);
    }

    #[test]
    fn test_failed_bet_without_result() {
        let json = r#"{"txid":"tx-2","betTime":1,"error":"insufficient funds","assetCode":"BSV",
            "assetName":"BSV","betRequest":{"d":"g","b":[]},"betResult":null}"#;
        let entry: BetHistory = serde_json::from_str(json).unwrap();
        assert!(entry.is_error());
        assert!(entry.bet_result.is_none());
        assert_eq!(entry.bet_payout, 0.0);
    }

    #[test]
    fn test_null_amounts_and_lists() {
        let json = r#"{"txid":"tx-3","betTime":1,"assetCode":"BSV","assetName":"BSV",
            "betRequest":{"d":"g","b":[{"q":1,"qc":null,"b":null,"p":null}]},"betPayout":null}"#;
        let entry: BetHistory = serde_json::from_str(json).unwrap();
        let item = &entry.bet_request.items[0];
        assert_eq!(item.quantity_crypto, 0.0);
        assert!(item.details.is_empty());
        assert_eq!(entry.bet_payout, 0.0);

        let bare = r#"{"d":"g","b":null}"#;
        let request: BetHistoryRequest = serde_json::from_str(bare).unwrap();
        assert!(request.items.is_empty());
    }
}
