//! Turn advancement
//!
//! Each turn: order by speed -> pick target -> roll ability -> apply damage
//! -> resolve outcome. `advance` is pure; it returns the next battle state
//! and leaves the input untouched, so a rejected turn changes nothing.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::combat::resolution::{
    attack_order, calculate_damage, pick_ability, pick_target, roll_variance,
};
use crate::combat::state::{Attack, Battle, BattleEnd, BattleStatus, TurnLog};
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, Timestamp, TxContext, CREATURE_COUNT};

/// Derive the turn's RNG seed from ledger-supplied context.
///
/// Callers cannot influence slot or timestamp, so they cannot steer targets.
pub fn turn_seed(ctx: &TxContext, battle_id: BattleId, turn: u64) -> u64 {
    let slot = ctx.slot.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    let time = (ctx.now as u64).wrapping_mul(0x517c_c1b7_2722_0a95);
    let salt = (battle_id.0.rotate_left(32) ^ turn).wrapping_mul(0x85eb_ca77_c2b2_ae63);
    let mixed = slot ^ time ^ salt;
    mixed ^ (mixed >> 31)
}

pub fn turn_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Run one turn of combat.
///
/// Fails with `BattleAlreadyOver` on a finished battle and `RateLimited`
/// when the turn interval has not elapsed.
pub fn advance<R: Rng + ?Sized>(
    battle: &Battle,
    now: Timestamp,
    rng: &mut R,
) -> Result<(Battle, TurnLog)> {
    if battle.is_over() || battle.alive_count() < 2 {
        return Err(ArenaError::BattleAlreadyOver(battle.id));
    }
    let remaining = battle.seconds_until_next_turn(now);
    if remaining > 0 {
        return Err(ArenaError::RateLimited {
            remaining_secs: remaining,
        });
    }
    let turn_number = battle
        .current_turn
        .checked_add(1)
        .ok_or(ArenaError::Overflow)?;

    let mut next = battle.clone();
    let mut attacks = Vec::with_capacity(CREATURE_COUNT);

    for attacker in attack_order(&next.creatures) {
        // Killed earlier in this same turn
        if !next.is_alive(attacker) {
            continue;
        }
        let Some(target) = pick_target(attacker, &next.creatures, rng) else {
            continue;
        };
        let ability = pick_ability(rng);
        let variance = roll_variance(rng);
        let damage = calculate_damage(
            next.creature(attacker).atk,
            next.creature(target).def,
            ability,
            variance,
        );

        let defender = &mut next.creatures[target.as_usize()];
        let target_died = defender.take_damage(damage);

        tracing::debug!(
            "Battle {} turn {}: creature {} {:?} creature {} for {} (hp {})",
            battle.id,
            turn_number,
            attacker,
            ability,
            target,
            damage,
            defender.current_hp
        );

        attacks.push(Attack {
            attacker,
            target,
            ability,
            damage,
            target_hp: defender.current_hp,
            target_died,
        });
    }

    let end = resolve_end(&next, now);
    if let Some(end) = end {
        next.status = BattleStatus::Over;
        next.winner = match end {
            BattleEnd::Winner(idx) => Some(idx),
            BattleEnd::Draw | BattleEnd::Timeout => None,
        };
    }
    next.current_turn = turn_number;
    next.last_turn_timestamp = now;

    let log = TurnLog {
        battle_id: battle.id,
        turn_number,
        timestamp: now,
        attacks,
        end,
    };
    Ok((next, log))
}

/// Knockouts are decided before the timeout, so a lone survivor always wins.
fn resolve_end(battle: &Battle, now: Timestamp) -> Option<BattleEnd> {
    match battle.alive_indices().as_slice() {
        [only] => Some(BattleEnd::Winner(*only)),
        [] => Some(BattleEnd::Draw),
        _ if battle.elapsed(now) >= battle.max_duration => Some(BattleEnd::Timeout),
        _ => None,
    }
}
