//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{ArenaError, Result};

/// Number of creatures in every battle
pub const CREATURE_COUNT: usize = 4;

/// Seconds since the unix epoch, as reported by the host ledger
pub type Timestamp = i64;

/// Smallest currency unit (10^9 per whole unit)
pub type Lamports = u64;

/// Base units in one whole currency unit
pub const LAMPORTS_PER_UNIT: Lamports = 1_000_000_000;

/// Caller-chosen battle identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BattleId(pub u64);

impl BattleId {
    /// The id a crank rolls over to once this battle is finished
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Authenticated identity of a caller (user or operator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of one of the four creatures; always in range once constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CreatureIndex(u8);

impl CreatureIndex {
    pub const ALL: [CreatureIndex; CREATURE_COUNT] = [
        CreatureIndex(0),
        CreatureIndex(1),
        CreatureIndex(2),
        CreatureIndex(3),
    ];

    pub fn new(index: u8) -> Result<Self> {
        if (index as usize) < CREATURE_COUNT {
            Ok(Self(index))
        } else {
            Err(ArenaError::InvalidCreatureIndex(index))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for CreatureIndex {
    type Error = ArenaError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CreatureIndex> for u8 {
    fn from(index: CreatureIndex) -> u8 {
        index.0
    }
}

impl fmt::Display for CreatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context the host attaches to every transaction.
///
/// `now` and `slot` come from the ledger, never from the caller, so they
/// are the only legitimate inputs for combat randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub caller: UserId,
    pub now: Timestamp,
    pub slot: u64,
}

impl TxContext {
    pub fn new(caller: UserId, now: Timestamp, slot: u64) -> Self {
        Self { caller, now, slot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creature_index_bounds() {
        assert!(CreatureIndex::new(0).is_ok());
        assert!(CreatureIndex::new(3).is_ok());
        assert_eq!(
            CreatureIndex::new(4),
            Err(ArenaError::InvalidCreatureIndex(4))
        );
    }

    #[test]
    fn test_creature_index_rejects_out_of_range_json() {
        let parsed: std::result::Result<CreatureIndex, _> = serde_json::from_str("7");
        assert!(parsed.is_err());
        let parsed: CreatureIndex = serde_json::from_str("2").unwrap();
        assert_eq!(parsed.get(), 2);
    }

    #[test]
    fn test_battle_id_next() {
        assert_eq!(BattleId(41).next(), BattleId(42));
        assert_eq!(BattleId(7).to_string(), "#7");
    }

    #[test]
    fn test_user_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }
}
