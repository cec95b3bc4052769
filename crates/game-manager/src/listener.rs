//! Listener for `betResult` notifications pushed by the host

use crate::manager::GameManager;
use crate::processor::BetResultProcessor;
use game_manager_bridge::HostTransport;
use game_manager_core::{BetResult, Result};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Routes pushed bet results through the game's processor.
///
/// Register one at game startup; results pushed before registration are not
/// replayed.
pub struct BetResultListener<'a, T, P> {
    manager: &'a GameManager<T, P>,
    rx: broadcast::Receiver<BetResult>,
}

impl<'a, T: HostTransport, P: BetResultProcessor> BetResultListener<'a, T, P> {
    pub(crate) fn new(manager: &'a GameManager<T, P>, rx: broadcast::Receiver<BetResult>) -> Self {
        Self { manager, rx }
    }

    /// Next pushed result mapped to game UI data.
    /// Returns None once the host side is gone.
    pub async fn next(&mut self) -> Option<Result<P::Output>> {
        self.next_raw()
            .await
            .map(|result| self.manager.process_bet_results(&result))
    }

    /// Next pushed result without processing
    pub async fn next_raw(&mut self) -> Option<BetResult> {
        loop {
            match self.rx.recv().await {
                Ok(result) => {
                    debug!("Bet result received for {}", result.game_id);
                    return Some(result);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Bet result channel closed");
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Bet result listener lagged, missed {} results", n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FnProcessor;
    use game_manager_bridge::event_channel;
    use serde_json::{Value, json};

    fn describe(result: &BetResult, multiplier: Option<u32>) -> Result<String> {
        Ok(format!("{} x{}", result.game_id, multiplier.unwrap_or(1)))
    }

    #[tokio::test]
    async fn test_pushed_results_are_processed() {
        let (transport, host) = event_channel();
        let gm = GameManager::new(transport, FnProcessor::new(describe));
        let mut listener = gm.bet_results().unwrap();

        let mut first = BetResult::new("draw-1", json!([4, 4]), 10.0);
        first.game_specific = json!(5);
        host.push_bet_result(first);
        host.push_bet_result(BetResult::new("draw-2", Value::Null, 0.0));

        assert_eq!(listener.next().await.unwrap().unwrap(), "draw-1 x5");
        assert_eq!(listener.next().await.unwrap().unwrap(), "draw-2 x1");
    }

    #[tokio::test]
    async fn test_lagged_listener_skips_to_oldest_retained() {
        let (transport, host) = event_channel();
        let gm = GameManager::new(transport, FnProcessor::new(describe));
        let mut listener = gm.bet_results().unwrap();

        // Channel keeps the newest 64 results
        for i in 0..70 {
            host.push_bet_result(BetResult::new(format!("r{}", i), Value::Null, 0.0));
        }

        assert_eq!(listener.next_raw().await.unwrap().game_id, "r6");
    }
}
