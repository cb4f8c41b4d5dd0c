//! Combat engine - four creatures, speed-ordered turns, seeded randomness
//!
//! Pure: nothing here touches shared state. The arena applies the returned
//! battle transactionally.

pub mod constants;
pub mod creature;
pub mod resolution;
pub mod state;
pub mod turn;

pub use creature::Creature;
pub use resolution::{attack_order, calculate_damage, pick_target, Ability};
pub use state::{Attack, Battle, BattleEnd, BattleParams, BattleStatus, TurnLog};
pub use turn::{advance, turn_rng, turn_seed};
