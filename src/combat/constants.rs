//! Combat system constants - all tunable values in one place

use crate::core::types::Timestamp;

// Damage
pub const MIN_DAMAGE: u16 = 1;
pub const MAX_DAMAGE: u16 = 1_000;
/// Upper bound (inclusive) of the random bonus added to every hit
pub const DAMAGE_VARIANCE: u16 = 3;

// Ability scaling, as numerator / denominator over (atk - def)
pub const HEAVY_STRIKE_SCALE: (u16, u16) = (3, 2);
pub const QUICK_JAB_SCALE: (u16, u16) = (3, 4);

// Battle timing defaults (seconds)
pub const DEFAULT_TURN_INTERVAL: Timestamp = 10;
pub const DEFAULT_MAX_DURATION: Timestamp = 86_400;

// Creature stat defaults
pub const DEFAULT_HP: u16 = 100;
pub const DEFAULT_ATK: u16 = 50;
pub const DEFAULT_DEF: u16 = 20;
pub const DEFAULT_SPD: u16 = 30;
