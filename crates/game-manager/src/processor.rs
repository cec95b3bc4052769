//! Per-game interpretation of bet results

use game_manager_core::{BetResult, Result};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Maps the generic bet result to data the game UI understands.
///
/// Every game supplies its own implementation; there is no default.
/// `GameData` is the typed shape of the result's `gs` payload.
pub trait BetResultProcessor: Send + Sync {
    /// Typed form of the game specific payload
    type GameData: DeserializeOwned;
    /// UI data produced for the game
    type Output;

    fn process_bet_results(
        &self,
        result: &BetResult,
        game_specific: Self::GameData,
    ) -> Result<Self::Output>;
}

/// Processor backed by a closure
pub struct FnProcessor<G, F> {
    f: F,
    _game_data: PhantomData<fn(G)>,
}

impl<G, F> FnProcessor<G, F> {
    pub fn new<O>(f: F) -> Self
    where
        F: Fn(&BetResult, G) -> Result<O>,
    {
        Self {
            f,
            _game_data: PhantomData,
        }
    }
}

impl<G, O, F> BetResultProcessor for FnProcessor<G, F>
where
    G: DeserializeOwned,
    F: Fn(&BetResult, G) -> Result<O> + Send + Sync,
{
    type GameData = G;
    type Output = O;

    fn process_bet_results(&self, result: &BetResult, game_specific: G) -> Result<O> {
        (self.f)(result, game_specific)
    }
}
