//! Position ledger
//!
//! Append-only: a position is created on first purchase and never removed.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{BattleId, CreatureIndex, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub battle_id: BattleId,
    pub user: UserId,
    pub creature: CreatureIndex,
}

impl PositionKey {
    pub fn new(battle_id: BattleId, user: UserId, creature: CreatureIndex) -> Self {
        Self {
            battle_id,
            user,
            creature,
        }
    }
}

/// A user's shares in one creature of one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub battle_id: BattleId,
    pub user: UserId,
    pub creature: CreatureIndex,
    pub shares: u64,
    pub claimed: bool,
}

impl Position {
    pub fn empty(key: PositionKey) -> Self {
        Self {
            battle_id: key.battle_id,
            user: key.user,
            creature: key.creature,
            shares: 0,
            claimed: false,
        }
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.battle_id, self.user, self.creature)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    positions: AHashMap<PositionKey, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    /// Insert or replace the record under the position's own key
    pub fn upsert(&mut self, position: Position) {
        self.positions.insert(position.key(), position);
    }

    pub fn for_battle(&self, battle_id: BattleId) -> impl Iterator<Item = &Position> + '_ {
        self.positions
            .values()
            .filter(move |p| p.battle_id == battle_id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
