use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BattleId, CreatureIndex};

/// Every way an arena operation can be rejected.
///
/// Variants are structural so that callers (the crank in particular) can
/// decide between retry, roll-over and abort without looking at message
/// text. A returned error always means no state was mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail")]
pub enum ArenaError {
    #[error("Invalid creature index {0} (must be 0-3)")]
    InvalidCreatureIndex(u8),

    #[error("Invalid battle parameters: {0}")]
    InvalidParams(String),

    #[error("Amount {amount} below minimum {minimum}")]
    AmountTooSmall { amount: u64, minimum: u64 },

    #[error("Battle {0} already exists")]
    BattleExists(BattleId),

    #[error("Market for battle {0} already exists")]
    MarketExists(BattleId),

    #[error("Battle {0} not found")]
    BattleNotFound(BattleId),

    #[error("Market for battle {0} not found")]
    MarketNotFound(BattleId),

    #[error("No position for creature {creature} in battle {battle}")]
    PositionNotFound {
        battle: BattleId,
        creature: CreatureIndex,
    },

    #[error("Turn interval not met ({remaining_secs}s remaining)")]
    RateLimited { remaining_secs: i64 },

    #[error("Battle {0} is already over")]
    BattleAlreadyOver(BattleId),

    #[error("Market for battle {0} is settled")]
    MarketSettled(BattleId),

    #[error("Creature {0} has been eliminated")]
    CreatureEliminated(CreatureIndex),

    #[error("Battle {0} is not over yet")]
    BattleNotOver(BattleId),

    #[error("Creature {0} did not win")]
    NotWinner(CreatureIndex),

    #[error("Battle {0} ended without a winner")]
    NoWinner(BattleId),

    #[error("Position already claimed")]
    AlreadyClaimed,

    #[error("Insufficient shares: have {held}, need {requested}")]
    InsufficientShares { held: u64, requested: u64 },

    #[error("Share reserve for creature {0} would be depleted")]
    PoolDepleted(CreatureIndex),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Caller is not the arena authority")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),
}

/// Coarse classification used for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input or duplicate creation
    Validation,
    /// Turn interval not yet elapsed; retry shortly
    RateLimited,
    /// The caller's view is stale; the battle or market has moved on
    Terminal,
    /// Not enough shares or reserve
    InsufficientResources,
    /// Wrong signer on a privileged operation
    Unauthorized,
    /// Transport or ledger fault; retry with backoff
    HostFailure,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::HostFailure)
    }
}

impl ArenaError {
    pub fn kind(&self) -> ErrorKind {
        use ArenaError::*;
        match self {
            InvalidCreatureIndex(_)
            | InvalidParams(_)
            | AmountTooSmall { .. }
            | BattleExists(_)
            | MarketExists(_)
            | BattleNotFound(_)
            | MarketNotFound(_)
            | PositionNotFound { .. }
            | CreatureEliminated(_)
            | BattleNotOver(_)
            | NotWinner(_)
            | AlreadyClaimed
            | Overflow
            | Config(_) => ErrorKind::Validation,
            RateLimited { .. } => ErrorKind::RateLimited,
            BattleAlreadyOver(_) | MarketSettled(_) | NoWinner(_) => ErrorKind::Terminal,
            InsufficientShares { .. } | PoolDepleted(_) => ErrorKind::InsufficientResources,
            Unauthorized => ErrorKind::Unauthorized,
            Host(_) => ErrorKind::HostFailure,
        }
    }
}

impl From<std::io::Error> for ArenaError {
    fn from(e: std::io::Error) -> Self {
        ArenaError::Host(e.to_string())
    }
}

impl From<serde_json::Error> for ArenaError {
    fn from(e: serde_json::Error) -> Self {
        ArenaError::Host(format!("serialization: {}", e))
    }
}

impl From<toml::de::Error> for ArenaError {
    fn from(e: toml::de::Error) -> Self {
        ArenaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(
            ArenaError::RateLimited { remaining_secs: 3 }.kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(
            ArenaError::BattleAlreadyOver(BattleId(1)).kind(),
            ErrorKind::Terminal
        );
        assert_eq!(ArenaError::MarketSettled(BattleId(1)).kind(), ErrorKind::Terminal);
        assert_eq!(ArenaError::BattleExists(BattleId(1)).kind(), ErrorKind::Validation);
        assert_eq!(ArenaError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            ArenaError::InsufficientShares { held: 1, requested: 2 }.kind(),
            ErrorKind::InsufficientResources
        );
        assert_eq!(ArenaError::Host("timeout".into()).kind(), ErrorKind::HostFailure);
    }

    #[test]
    fn test_only_rate_limit_and_host_are_retryable() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::HostFailure.is_retryable());
        assert!(!ErrorKind::Terminal.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
    }

    #[test]
    fn test_error_survives_json() {
        let err = ArenaError::RateLimited { remaining_secs: 7 };
        let json = serde_json::to_string(&err).unwrap();
        let back: ArenaError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
