//! Attack resolution: who strikes first, whom they hit, and for how much
//!
//! Every random choice draws from the caller-supplied RNG so a turn can be
//! replayed exactly from its seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    DAMAGE_VARIANCE, HEAVY_STRIKE_SCALE, MAX_DAMAGE, MIN_DAMAGE, QUICK_JAB_SCALE,
};
use crate::combat::creature::Creature;
use crate::core::types::{CreatureIndex, CREATURE_COUNT};

/// Attack style rolled for each hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    BasicHit,
    HeavyStrike,
    QuickJab,
}

impl Ability {
    pub const ALL: [Ability; 3] = [Ability::BasicHit, Ability::HeavyStrike, Ability::QuickJab];

    /// Scale raw damage for this ability
    fn scale(self, raw: u32) -> u32 {
        match self {
            Ability::BasicHit => raw,
            Ability::HeavyStrike => raw * HEAVY_STRIKE_SCALE.0 as u32 / HEAVY_STRIKE_SCALE.1 as u32,
            Ability::QuickJab => raw * QUICK_JAB_SCALE.0 as u32 / QUICK_JAB_SCALE.1 as u32,
        }
    }
}

/// Living creatures in strike order: speed descending, index ascending on ties
pub fn attack_order(creatures: &[Creature; CREATURE_COUNT]) -> Vec<CreatureIndex> {
    let mut order: Vec<CreatureIndex> = CreatureIndex::ALL
        .into_iter()
        .filter(|idx| creatures[idx.as_usize()].alive)
        .collect();
    // Stable sort keeps index order among equal speeds
    order.sort_by(|a, b| creatures[b.as_usize()].spd.cmp(&creatures[a.as_usize()].spd));
    order
}

/// Pick a target uniformly among the other living creatures
pub fn pick_target<R: Rng + ?Sized>(
    attacker: CreatureIndex,
    creatures: &[Creature; CREATURE_COUNT],
    rng: &mut R,
) -> Option<CreatureIndex> {
    let candidates: Vec<CreatureIndex> = CreatureIndex::ALL
        .into_iter()
        .filter(|idx| *idx != attacker && creatures[idx.as_usize()].alive)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

pub fn pick_ability<R: Rng + ?Sized>(rng: &mut R) -> Ability {
    Ability::ALL[rng.gen_range(0..Ability::ALL.len())]
}

/// Damage for one hit.
///
/// `(atk - def)` saturating, scaled by ability, at least `MIN_DAMAGE`, plus
/// `variance`, capped at `MAX_DAMAGE`.
pub fn calculate_damage(atk: u16, def: u16, ability: Ability, variance: u16) -> u16 {
    let raw = atk.saturating_sub(def) as u32;
    let scaled = ability.scale(raw).max(MIN_DAMAGE as u32);
    let total = scaled + variance.min(DAMAGE_VARIANCE) as u32;
    total.min(MAX_DAMAGE as u32) as u16
}

pub fn roll_variance<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.gen_range(0..=DAMAGE_VARIANCE)
}
