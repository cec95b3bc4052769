//! Operation names understood by the host

use crate::error::BridgeError;
use std::fmt;
use std::str::FromStr;

/// Name of the inbound notification carrying unsolicited bet outcomes
pub const BET_RESULT_EVENT: &str = "betResult";

/// Remote operations a game can ask the host to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetBalance,
    GetBetConfig,
    PlaceBet,
    GetHistory,
    SaveFavoriteBets,
    GetFavoriteBets,
    SaveGameState,
    GetGameState,
    ClearGameState,
    LaunchUrl,
    ExitGame,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::GetBalance,
        Operation::GetBetConfig,
        Operation::PlaceBet,
        Operation::GetHistory,
        Operation::SaveFavoriteBets,
        Operation::GetFavoriteBets,
        Operation::SaveGameState,
        Operation::GetGameState,
        Operation::ClearGameState,
        Operation::LaunchUrl,
        Operation::ExitGame,
    ];

    /// Wire name of the operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetBalance => "getBalance",
            Operation::GetBetConfig => "getBetConfig",
            Operation::PlaceBet => "placeBet",
            Operation::GetHistory => "getHistory",
            Operation::SaveFavoriteBets => "saveFavoriteBets",
            Operation::GetFavoriteBets => "getFavoriteBets",
            Operation::SaveGameState => "saveGameState",
            Operation::GetGameState => "getGameState",
            Operation::ClearGameState => "clearGameState",
            Operation::LaunchUrl => "launchURL",
            Operation::ExitGame => "exitGame",
        }
    }

    /// Whether the game waits for the host's reply.
    ///
    /// Saves, clears and URL launches are fire-and-forget.
    pub fn expects_reply(&self) -> bool {
        !matches!(
            self,
            Operation::SaveFavoriteBets
                | Operation::SaveGameState
                | Operation::ClearGameState
                | Operation::LaunchUrl
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| BridgeError::Protocol(format!("Unknown operation: {}", s)))
    }
}
