//! Game manager façade
//!
//! Each method is one independent round trip to the host. The only state the
//! manager keeps is the bet history cache.

use crate::listener::BetResultListener;
use crate::processor::BetResultProcessor;
use game_manager_bridge::HostTransport;
use game_manager_core::{
    BalanceInfo, BetConfig, BetHistory, BetRequest, BetResult, BridgeError, FavoriteBets,
    Operation, PlaceBetAck, Result,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Client side adapter between a mini-game and its host application
pub struct GameManager<T, P> {
    transport: T,
    processor: P,
    /// Last history fetched from the host, never partially updated
    history: RwLock<Arc<Vec<BetHistory>>>,
}

impl<T: HostTransport, P: BetResultProcessor> GameManager<T, P> {
    /// Create a manager talking through `transport` and interpreting
    /// results with the game's `processor`
    pub fn new(transport: T, processor: P) -> Self {
        Self {
            transport,
            processor,
            history: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Player balance from the host
    pub async fn get_balance(&self) -> Result<BalanceInfo> {
        let value = self.transport.send(Operation::GetBalance, None).await?;
        decode(Operation::GetBalance, value)
    }

    /// Bet bounds and game specific settings from the host
    pub async fn get_bet_configuration(&self) -> Result<BetConfig> {
        let value = self.transport.send(Operation::GetBetConfig, None).await?;
        decode(Operation::GetBetConfig, value)
    }

    /// Send a bet to the host and return its confirmation flag.
    ///
    /// A request without wagers returns `false` without contacting the host.
    pub async fn place_bet(&self, request: &BetRequest) -> Result<bool> {
        if request.is_empty() {
            debug!("Not sending empty bet for {}", request.game_id);
            return Ok(false);
        }

        let payload = serde_json::to_value(request)?;
        let value = self.transport.send(Operation::PlaceBet, Some(payload)).await?;
        let ack: PlaceBetAck = decode(Operation::PlaceBet, value)?;
        debug!("Bet for {} confirmed={}", request.game_id, ack.confirm);
        Ok(ack.confirm)
    }

    /// Interpret a bet result with the game's processor.
    ///
    /// The result's `gs` payload is decoded into the processor's `GameData`.
    pub fn process_bet_results(&self, result: &BetResult) -> Result<P::Output> {
        let game_specific: P::GameData = serde_json::from_value(result.game_specific.clone())
            .map_err(|e| {
                BridgeError::Serialization(format!(
                    "Game specific payload for {}: {}",
                    result.game_id, e
                ))
            })?;
        self.processor.process_bet_results(result, game_specific)
    }

    /// Bet history, served from cache unless `force_refresh` is set or the
    /// cache is empty. A fetch replaces the cache wholesale.
    pub async fn get_history(&self, force_refresh: bool) -> Result<Arc<Vec<BetHistory>>> {
        if !force_refresh {
            let cached = self.history.read().await;
            if !cached.is_empty() {
                debug!("Serving {} history entries from cache", cached.len());
                return Ok(cached.clone());
            }
        }

        let value = self.transport.send(Operation::GetHistory, None).await?;
        let entries: Option<Vec<BetHistory>> = decode(Operation::GetHistory, value)?;
        let history = Arc::new(entries.unwrap_or_default());

        // Last write wins between overlapping refreshes
        *self.history.write().await = history.clone();
        debug!("History cache replaced with {} entries", history.len());
        Ok(history)
    }

    /// Current history cache without contacting the host
    pub async fn cached_history(&self) -> Arc<Vec<BetHistory>> {
        self.history.read().await.clone()
    }

    /// Send favorite bets to the host, replacing whatever it stored before.
    ///
    /// Fire-and-forget: no confirmation is awaited. An empty list is not sent.
    pub fn save_favorite_bets(&self, bets: &[BetRequest]) -> Result<()> {
        if bets.is_empty() {
            return Ok(());
        }
        let payload = serde_json::to_value(bets)?;
        self.transport.notify(Operation::SaveFavoriteBets, Some(payload))
    }

    /// Favorite bets stored by the host
    pub async fn get_favorite_bets(&self) -> Result<FavoriteBets> {
        let value = self.transport.send(Operation::GetFavoriteBets, None).await?;
        let bets: Option<FavoriteBets> = decode(Operation::GetFavoriteBets, value)?;
        Ok(bets.unwrap_or_default())
    }

    /// Send opaque game state to the host for safekeeping.
    ///
    /// Fire-and-forget. Blank state (null, false, 0, "", {} or []) is not sent.
    pub fn save_game_state<S: Serialize + ?Sized>(&self, state: &S) -> Result<()> {
        let payload = serde_json::to_value(state)?;
        if is_blank(&payload) {
            debug!("Not sending blank game state");
            return Ok(());
        }
        self.transport.notify(Operation::SaveGameState, Some(payload))
    }

    /// Game state stored by the host, None if nothing was saved
    pub async fn get_game_state<S: DeserializeOwned>(&self) -> Result<Option<S>> {
        let value = self.transport.send(Operation::GetGameState, None).await?;
        decode(Operation::GetGameState, value)
    }

    /// Ask the host to drop all saved game state. Fire-and-forget.
    pub fn clear_game_state(&self) -> Result<()> {
        self.transport.notify(
            Operation::ClearGameState,
            Some(Value::Object(Default::default())),
        )
    }

    /// Ask the host to open an external URL. Fire-and-forget.
    pub fn launch_url(&self, url: &str) -> Result<()> {
        self.transport
            .notify(Operation::LaunchUrl, Some(Value::String(url.to_string())))
    }

    /// Tell the host to hide the game, returning once it acknowledges
    pub async fn exit_game(&self) -> Result<()> {
        info!("Exiting game");
        self.transport.send(Operation::ExitGame, None).await?;
        Ok(())
    }

    /// Register for `betResult` notifications pushed by the host.
    /// Returns None if the transport cannot receive pushes.
    pub fn bet_results(&self) -> Option<BetResultListener<'_, T, P>> {
        self.transport
            .subscribe_bet_results()
            .map(|rx| BetResultListener::new(self, rx))
    }
}

fn decode<D: DeserializeOwned>(op: Operation, value: Value) -> Result<D> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::Serialization(format!("Invalid {} response: {}", op, e)))
}

/// Values a host should not be bothered with
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FnProcessor;
    use async_trait::async_trait;
    use game_manager_bridge::event_channel;
    use game_manager_core::{BetItem, BetResult};
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio_test::{assert_pending, task};

    /// Transport spy: records every call and answers from a script
    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(Operation, Option<Value>, bool)>>,
        script: Mutex<HashMap<Operation, VecDeque<std::result::Result<Value, Value>>>>,
    }

    impl RecordingTransport {
        fn answer(&self, op: Operation, value: Value) {
            self.push(op, Ok(value));
        }

        fn reject(&self, op: Operation, reason: Value) {
            self.push(op, Err(reason));
        }

        fn push(&self, op: Operation, reply: std::result::Result<Value, Value>) {
            self.script.lock().unwrap().entry(op).or_default().push_back(reply);
        }

        fn calls(&self) -> Vec<(Operation, Option<Value>, bool)> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, op: Operation) -> usize {
            self.calls().iter().filter(|(o, _, _)| *o == op).count()
        }
    }

    #[async_trait]
    impl HostTransport for RecordingTransport {
        async fn send(&self, op: Operation, payload: Option<Value>) -> Result<Value> {
            self.calls.lock().unwrap().push((op, payload, true));
            let reply = self
                .script
                .lock()
                .unwrap()
                .get_mut(&op)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(Value::Null));
            reply.map_err(BridgeError::Rejected)
        }

        fn notify(&self, op: Operation, payload: Option<Value>) -> Result<()> {
            self.calls.lock().unwrap().push((op, payload, false));
            Ok(())
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RouletteData {
        winning_pocket: u8,
    }

    type RouletteFn = fn(&BetResult, RouletteData) -> Result<String>;
    type Roulette = FnProcessor<RouletteData, RouletteFn>;

    fn roulette(result: &BetResult, data: RouletteData) -> Result<String> {
        Ok(format!("{}:{}:{}", result.game_id, data.winning_pocket, result.payout))
    }

    fn manager() -> GameManager<Arc<RecordingTransport>, Roulette> {
        let processor: Roulette = FnProcessor::new(roulette as RouletteFn);
        GameManager::new(Arc::new(RecordingTransport::default()), processor)
    }

    fn history_entry(txid: &str) -> Value {
        json!({
            "txid": txid,
            "betTime": 1600000000,
            "assetCode": "BSV",
            "assetName": "BSV",
            "betRequest": {"d": "g1", "b": [{"q": 1, "qc": 0.01, "b": [5], "p": 0}]},
            "betPayout": 0,
            "betResult": null
        })
    }

    #[tokio::test]
    async fn test_empty_bet_never_reaches_host() {
        let gm = manager();

        let confirmed = gm.place_bet(&BetRequest::new("g1")).await.unwrap();

        assert!(!confirmed);
        assert!(gm.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_place_bet_returns_host_confirmation() {
        let gm = manager();
        let request = BetRequest::new("g1").with_item(BetItem::new(2.0, vec![17]));

        gm.transport().answer(Operation::PlaceBet, json!({"confirm": true}));
        gm.transport().answer(Operation::PlaceBet, json!({"confirm": false}));

        assert!(gm.place_bet(&request).await.unwrap());
        assert!(!gm.place_bet(&request).await.unwrap());

        let calls = gm.transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Operation::PlaceBet);
        assert_eq!(calls[0].1, Some(json!({"d": "g1", "b": [{"q": 2.0, "b": [17]}]})));
        assert!(calls[0].2);
    }

    #[tokio::test]
    async fn test_place_bet_without_confirm_field() {
        let gm = manager();
        let request = BetRequest::new("g1").with_item(BetItem::new(1.0, vec![0]));
        gm.transport().answer(Operation::PlaceBet, json!({"ok": true}));

        let err = gm.place_bet(&request).await.unwrap_err();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_history_served_from_cache() {
        let gm = manager();
        gm.transport()
            .answer(Operation::GetHistory, json!([history_entry("tx-1")]));

        let first = gm.get_history(false).await.unwrap();
        let second = gm.get_history(false).await.unwrap();

        assert_eq!(gm.transport().count(Operation::GetHistory), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second[0].txid, "tx-1");
    }

    #[tokio::test]
    async fn test_forced_refresh_replaces_cache() {
        let gm = manager();
        gm.transport()
            .answer(Operation::GetHistory, json!([history_entry("tx-1")]));
        gm.transport().answer(
            Operation::GetHistory,
            json!([history_entry("tx-3"), history_entry("tx-2")]),
        );

        let first = gm.get_history(false).await.unwrap();
        let refreshed = gm.get_history(true).await.unwrap();

        assert_eq!(gm.transport().count(Operation::GetHistory), 2);
        assert!(!Arc::ptr_eq(&first, &refreshed));
        let txids: Vec<_> = refreshed.iter().map(|h| h.txid.as_str()).collect();
        assert_eq!(txids, vec!["tx-3", "tx-2"]);
        assert!(Arc::ptr_eq(&refreshed, &gm.cached_history().await));
    }

    #[tokio::test]
    async fn test_empty_history_is_fetched_again() {
        let gm = manager();
        gm.transport().answer(Operation::GetHistory, json!([]));

        assert!(gm.get_history(false).await.unwrap().is_empty());
        // Null from the host is treated as no history
        assert!(gm.get_history(false).await.unwrap().is_empty());
        assert_eq!(gm.transport().count(Operation::GetHistory), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache() {
        let gm = manager();
        gm.transport()
            .answer(Operation::GetHistory, json!([history_entry("tx-1")]));
        gm.transport()
            .reject(Operation::GetHistory, json!("history unavailable"));

        let cached = gm.get_history(false).await.unwrap();
        let err = gm.get_history(true).await.unwrap_err();

        assert_eq!(err.rejection(), Some(&json!("history unavailable")));
        assert!(Arc::ptr_eq(&cached, &gm.cached_history().await));
    }

    #[tokio::test]
    async fn test_favorites() {
        let gm = manager();

        gm.save_favorite_bets(&[]).unwrap();
        assert!(gm.transport().calls().is_empty());

        let favorite = BetRequest::new("g1").with_item(BetItem::new(1.0, vec![7, 8]));
        gm.save_favorite_bets(std::slice::from_ref(&favorite)).unwrap();

        let calls = gm.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Operation::SaveFavoriteBets);
        assert!(!calls[0].2, "favorites are fire-and-forget");

        gm.transport()
            .answer(Operation::GetFavoriteBets, json!([{"d": "g1", "b": [{"q": 1.0, "b": [7, 8]}]}]));
        assert_eq!(gm.get_favorite_bets().await.unwrap(), vec![favorite]);
        // Host with nothing saved
        assert!(gm.get_favorite_bets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_game_state_not_sent() {
        let gm = manager();

        gm.save_game_state(&Value::Null).unwrap();
        gm.save_game_state(&Option::<u32>::None).unwrap();
        gm.save_game_state(&json!({})).unwrap();
        gm.save_game_state(&HashMap::<String, u32>::new()).unwrap();
        gm.save_game_state("").unwrap();
        assert!(gm.transport().calls().is_empty());

        gm.save_game_state(&json!({"chips": [1, 5, 25]})).unwrap();
        let calls = gm.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Some(json!({"chips": [1, 5, 25]})));
        assert!(!calls[0].2);
    }

    #[tokio::test]
    async fn test_game_state_round_trip_through_host() {
        let gm = manager();
        gm.transport()
            .answer(Operation::GetGameState, json!({"level": 4}));

        let state: Option<HashMap<String, u32>> = gm.get_game_state().await.unwrap();
        assert_eq!(state.unwrap()["level"], 4);

        let nothing: Option<HashMap<String, u32>> = gm.get_game_state().await.unwrap();
        assert!(nothing.is_none());

        gm.clear_game_state().unwrap();
        let calls = gm.transport().calls();
        assert_eq!(calls[2], (Operation::ClearGameState, Some(json!({})), false));
    }

    #[tokio::test]
    async fn test_launch_url_and_exit() {
        let gm = manager();

        gm.launch_url("https://example.com/rules").unwrap();
        gm.exit_game().await.unwrap();

        let calls = gm.transport().calls();
        assert_eq!(
            calls[0],
            (Operation::LaunchUrl, Some(json!("https://example.com/rules")), false)
        );
        assert_eq!(calls[1], (Operation::ExitGame, None, true));
    }

    #[tokio::test]
    async fn test_rejections_propagate_unchanged() {
        let gm = manager();
        let reason = json!({"code": 402, "message": "insufficient funds"});
        gm.transport().reject(Operation::GetBalance, reason.clone());
        gm.transport().reject(Operation::PlaceBet, reason.clone());
        gm.transport().reject(Operation::ExitGame, reason.clone());
        gm.transport().reject(Operation::GetBetConfig, reason.clone());
        gm.transport().reject(Operation::GetFavoriteBets, reason.clone());
        gm.transport().reject(Operation::GetGameState, reason.clone());
        gm.transport().reject(Operation::GetHistory, reason.clone());

        let request = BetRequest::new("g1").with_item(BetItem::new(1.0, vec![1]));
        let errors = vec![
            gm.get_balance().await.unwrap_err(),
            gm.place_bet(&request).await.unwrap_err(),
            gm.exit_game().await.unwrap_err(),
            gm.get_bet_configuration().await.unwrap_err(),
            gm.get_favorite_bets().await.unwrap_err(),
            gm.get_game_state::<Value>().await.unwrap_err(),
            gm.get_history(true).await.unwrap_err(),
        ];

        for err in errors {
            assert_eq!(err.rejection(), Some(&reason));
        }
    }

    #[tokio::test]
    async fn test_balance_and_config() {
        let gm = manager();
        gm.transport().answer(
            Operation::GetBalance,
            json!({"balance": 1.25, "assetCode": "BSV", "assetName": "Bitcoin SV"}),
        );
        gm.transport().answer(
            Operation::GetBetConfig,
            json!({"minbet": 0.1, "maxbet": 50, "gameSpecific": {"isAmericanRoulette": false}}),
        );

        let balance = gm.get_balance().await.unwrap();
        assert_eq!(balance.balance, 1.25);
        assert_eq!(balance.asset_name, "Bitcoin SV");

        let config = gm.get_bet_configuration().await.unwrap();
        assert_eq!(config.maxbet, 50.0);
        assert_eq!(config.game_specific["isAmericanRoulette"], json!(false));
    }

    #[tokio::test]
    async fn test_config_with_null_game_specific() {
        let gm = manager();
        gm.transport().answer(
            Operation::GetBetConfig,
            json!({"minbet": 1, "maxbet": 5, "overrides": null, "gameSpecific": null}),
        );

        let config = gm.get_bet_configuration().await.unwrap();
        assert!(config.game_specific.is_empty());
        assert_eq!(config.limits_for("straight").maxbet, 5.0);
    }

    #[tokio::test]
    async fn test_process_bet_results_decodes_game_payload() {
        let gm = manager();
        let mut result = BetResult::new("spin-9", json!([32]), 36.0);
        result.game_specific = json!({"winningPocket": 32});

        assert_eq!(gm.process_bet_results(&result).unwrap(), "spin-9:32:36");

        result.game_specific = json!({"pocket": "red"});
        assert!(matches!(
            gm.process_bet_results(&result),
            Err(BridgeError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_requests_settle_independently() {
        let (transport, mut host) = event_channel();
        let gm = GameManager::new(transport, FnProcessor::new(roulette));

        let mut balance = task::spawn(gm.get_balance());
        let mut exit = task::spawn(gm.exit_game());
        assert_pending!(balance.poll());
        assert_pending!(exit.poll());

        let balance_event = host.recv().await.unwrap();
        let exit_event = host.recv().await.unwrap();
        assert_eq!(balance_event.name(), "getBalance");

        // Answer the later request first
        exit_event.reply.resolve(Value::Null);
        assert!(exit.poll().is_ready());
        assert_pending!(balance.poll());

        balance_event.reply.resolve(json!({"balance": 9}));
        match balance.poll() {
            std::task::Poll::Ready(Ok(info)) => assert_eq!(info, BalanceInfo::new(9.0)),
            other => panic!("balance not settled: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unanswered_request_never_settles() {
        let (transport, mut host) = event_channel();
        let gm = GameManager::new(transport, FnProcessor::new(roulette));

        let mut history = task::spawn(gm.get_history(false));
        assert_pending!(history.poll());

        let _held = host.recv().await.unwrap();
        assert_pending!(history.poll());
        assert_pending!(history.poll());
    }
}
