//! In-memory host application

use crate::handler::{HostHandler, Reply, decode_payload};
use async_trait::async_trait;
use chrono::Utc;
use game_manager_core::{
    BalanceInfo, BetConfig, BetHistory, BetHistoryItem, BetHistoryRequest, BetRequest, BetResult,
    DEFAULT_ASSET, FavoriteBets, Operation, PlaceBetAck,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Configuration for the in-memory host
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address the dev server listens on (default: 127.0.0.1:19740)
    pub addr: String,
    /// Starting player balance
    pub balance: f64,
    pub asset_code: String,
    pub asset_name: String,
    /// Bet bounds handed to games
    pub bet_config: BetConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        let mut bet_config = BetConfig::new(0.01, 100.0);
        bet_config.lang = Some("en".into());

        Self {
            addr: "127.0.0.1:19740".into(),
            balance: 100.0,
            asset_code: DEFAULT_ASSET.into(),
            asset_name: DEFAULT_ASSET.into(),
            bet_config,
        }
    }
}

#[derive(Debug, Default)]
struct HostState {
    balance: f64,
    /// Oldest first
    history: Vec<BetHistory>,
    favorites: FavoriteBets,
    game_state: Option<Value>,
    launched_urls: Vec<String>,
    exits: usize,
    next_tx: u64,
}

/// Parent application keeping balance, history, favorites and game state in memory.
///
/// Bets are accepted when every stake is within the configured bounds and
/// the balance covers the total. Outcomes are never computed here; the owner
/// reports them through [`MemoryHost::settle`].
pub struct MemoryHost {
    config: HostConfig,
    state: Mutex<HostState>,
}

impl MemoryHost {
    pub fn new(config: HostConfig) -> Self {
        let state = HostState {
            balance: config.balance,
            ..Default::default()
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub async fn balance(&self) -> f64 {
        self.state.lock().await.balance
    }

    /// History, newest first
    pub async fn history(&self) -> Vec<BetHistory> {
        self.state.lock().await.history.iter().rev().cloned().collect()
    }

    pub async fn favorites(&self) -> FavoriteBets {
        self.state.lock().await.favorites.clone()
    }

    pub async fn game_state(&self) -> Option<Value> {
        self.state.lock().await.game_state.clone()
    }

    pub async fn launched_urls(&self) -> Vec<String> {
        self.state.lock().await.launched_urls.clone()
    }

    /// Number of times a game asked to be dismissed
    pub async fn exits(&self) -> usize {
        self.state.lock().await.exits
    }

    /// Record the outcome of the newest unsettled bet for the result's game
    /// instance and credit the payout. Returns false if no bet matches.
    pub async fn settle(&self, result: &BetResult) -> bool {
        let mut state = self.state.lock().await;
        let Some(entry) = state
            .history
            .iter_mut()
            .rev()
            .find(|h| h.bet_request.game_id == result.game_id && h.bet_result.is_none())
        else {
            return false;
        };

        entry.bet_payout = result.payout;
        let mut settled = result.clone();
        settled.txid.get_or_insert_with(|| entry.txid.clone());
        entry.bet_result = Some(settled);
        state.balance += result.payout;

        info!(
            "Settled {} payout={} balance={}",
            result.game_id, result.payout, state.balance
        );
        true
    }

    async fn place_bet(&self, request: BetRequest) -> PlaceBetAck {
        let limits = self.config.bet_config.limits();
        let total = request.total_quantity();
        let mut state = self.state.lock().await;

        if request.is_empty() {
            return PlaceBetAck { confirm: false };
        }
        if let Some(item) = request.items.iter().find(|i| !limits.allows(i.quantity)) {
            debug!(
                "Stake {} outside [{}, {}]",
                item.quantity, limits.minbet, limits.maxbet
            );
            return PlaceBetAck { confirm: false };
        }
        if total > state.balance {
            debug!("Stake {} exceeds balance {}", total, state.balance);
            return PlaceBetAck { confirm: false };
        }

        state.balance -= total;
        state.next_tx += 1;
        let txid = format!("tx-{}", state.next_tx);
        let rate = request.conversion_rate.filter(|r| *r > 0.0);

        let entry = BetHistory {
            txid: txid.clone(),
            bet_time: request
                .submitted_at
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
            error: None,
            asset_code: self.config.asset_code.clone(),
            asset_name: self.config.asset_name.clone(),
            bet_request: BetHistoryRequest {
                game_id: request.game_id.clone(),
                items: request
                    .items
                    .iter()
                    .map(|item| BetHistoryItem {
                        quantity: item.quantity,
                        quantity_crypto: rate.map_or(item.quantity, |r| item.quantity / r),
                        details: item.details.clone(),
                        payout: 0.0,
                    })
                    .collect(),
            },
            bet_payout: 0.0,
            bet_result: None,
        };
        state.history.push(entry);

        info!(
            "Accepted bet {} for {} total={} balance={}",
            txid, request.game_id, total, state.balance
        );
        PlaceBetAck { confirm: true }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

fn to_reply<S: Serialize>(value: &S) -> Reply {
    serde_json::to_value(value).map_err(|e| Value::String(e.to_string()))
}

#[async_trait]
impl HostHandler for MemoryHost {
    async fn handle(&self, op: Operation, data: Value) -> Reply {
        match op {
            Operation::GetBalance => {
                let balance = BalanceInfo {
                    balance: self.balance().await,
                    asset_code: self.config.asset_code.clone(),
                    asset_name: self.config.asset_name.clone(),
                };
                to_reply(&balance)
            }
            Operation::GetBetConfig => to_reply(&self.config.bet_config),
            Operation::PlaceBet => {
                let request: BetRequest = decode_payload(op, data)?;
                to_reply(&self.place_bet(request).await)
            }
            Operation::GetHistory => to_reply(&self.history().await),
            Operation::SaveFavoriteBets => {
                let bets: FavoriteBets = decode_payload(op, data)?;
                debug!("Saved {} favorite bets", bets.len());
                self.state.lock().await.favorites = bets;
                Ok(Value::Null)
            }
            Operation::GetFavoriteBets => to_reply(&self.favorites().await),
            Operation::SaveGameState => {
                self.state.lock().await.game_state = Some(data);
                Ok(Value::Null)
            }
            Operation::GetGameState => Ok(self.game_state().await.unwrap_or(Value::Null)),
            Operation::ClearGameState => {
                self.state.lock().await.game_state = None;
                Ok(Value::Null)
            }
            Operation::LaunchUrl => match data {
                Value::String(url) if !url.is_empty() => {
                    info!("Launching {}", url);
                    self.state.lock().await.launched_urls.push(url);
                    Ok(Value::Null)
                }
                other => Err(Value::String(format!("Invalid launchURL payload: {}", other))),
            },
            Operation::ExitGame => {
                info!("Game asked to exit");
                self.state.lock().await.exits += 1;
                Ok(Value::Null)
            }
        }
    }
}
