//! Battle state record
//!
//! One battle per id. Status moves Active -> Over exactly once.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    DEFAULT_ATK, DEFAULT_DEF, DEFAULT_HP, DEFAULT_MAX_DURATION, DEFAULT_SPD,
    DEFAULT_TURN_INTERVAL,
};
use crate::combat::creature::Creature;
use crate::combat::resolution::Ability;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, CreatureIndex, Timestamp, UserId, CREATURE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleStatus {
    #[default]
    Active,
    Over,
}

/// Parameters for a new battle. All four creatures share the same stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleParams {
    pub hp: u16,
    pub atk: u16,
    pub def: u16,
    pub spd: u16,
    /// Minimum seconds between turns
    pub turn_interval_secs: Timestamp,
    /// Seconds after start at which the battle is forced to end
    pub max_duration_secs: Timestamp,
}

impl Default for BattleParams {
    fn default() -> Self {
        Self {
            hp: DEFAULT_HP,
            atk: DEFAULT_ATK,
            def: DEFAULT_DEF,
            spd: DEFAULT_SPD,
            turn_interval_secs: DEFAULT_TURN_INTERVAL,
            max_duration_secs: DEFAULT_MAX_DURATION,
        }
    }
}

impl BattleParams {
    pub fn validate(&self) -> Result<()> {
        if self.hp == 0 {
            return Err(ArenaError::InvalidParams("hp must be positive".into()));
        }
        if self.turn_interval_secs <= 0 {
            return Err(ArenaError::InvalidParams(
                "turn_interval_secs must be positive".into(),
            ));
        }
        if self.max_duration_secs < self.turn_interval_secs {
            return Err(ArenaError::InvalidParams(format!(
                "max_duration_secs ({}) shorter than turn_interval_secs ({})",
                self.max_duration_secs, self.turn_interval_secs
            )));
        }
        Ok(())
    }
}

/// Complete battle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub authority: UserId,
    pub creatures: [Creature; CREATURE_COUNT],
    pub current_turn: u64,
    pub start_timestamp: Timestamp,
    pub last_turn_timestamp: Timestamp,
    pub turn_interval: Timestamp,
    pub max_duration: Timestamp,
    pub status: BattleStatus,
    /// None while active, and for draws and timeouts once over
    pub winner: Option<CreatureIndex>,
}

impl Battle {
    pub fn new(id: BattleId, authority: UserId, params: &BattleParams, now: Timestamp) -> Self {
        let creature = Creature::new(params.hp, params.atk, params.def, params.spd);
        Self {
            id,
            authority,
            creatures: [creature; CREATURE_COUNT],
            current_turn: 0,
            start_timestamp: now,
            last_turn_timestamp: now,
            turn_interval: params.turn_interval_secs,
            max_duration: params.max_duration_secs,
            status: BattleStatus::Active,
            winner: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status == BattleStatus::Over
    }

    pub fn creature(&self, index: CreatureIndex) -> &Creature {
        &self.creatures[index.as_usize()]
    }

    pub fn is_alive(&self, index: CreatureIndex) -> bool {
        self.creature(index).alive
    }

    pub fn alive_indices(&self) -> Vec<CreatureIndex> {
        CreatureIndex::ALL
            .into_iter()
            .filter(|idx| self.is_alive(*idx))
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.creatures.iter().filter(|c| c.alive).count()
    }

    /// Seconds until the next turn may run (zero or negative means now)
    pub fn seconds_until_next_turn(&self, now: Timestamp) -> Timestamp {
        self.turn_interval
            .saturating_sub(now.saturating_sub(self.last_turn_timestamp))
    }

    pub fn elapsed(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.start_timestamp)
    }
}

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEnd {
    Winner(CreatureIndex),
    /// Every remaining creature fell in the same turn
    Draw,
    /// Max duration elapsed with two or more survivors
    Timeout,
}

/// A single resolved hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub attacker: CreatureIndex,
    pub target: CreatureIndex,
    pub ability: Ability,
    pub damage: u16,
    pub target_hp: u16,
    pub target_died: bool,
}

/// Record of one turn, for logs and the display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLog {
    pub battle_id: BattleId,
    pub turn_number: u64,
    pub timestamp: Timestamp,
    pub attacks: Vec<Attack>,
    pub end: Option<BattleEnd>,
}

impl TurnLog {
    pub fn deaths(&self) -> impl Iterator<Item = CreatureIndex> + '_ {
        self.attacks.iter().filter(|a| a.target_died).map(|a| a.target)
    }
}
