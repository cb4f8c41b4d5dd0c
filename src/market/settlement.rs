//! Settlement and parimutuel claims
//!
//! Winners split the whole pool (all four creatures) in proportion to the
//! winning shares they hold. Payouts floor, so their sum never exceeds the
//! pool frozen at settlement.

use serde::{Deserialize, Serialize};

use crate::combat::Battle;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{CreatureIndex, Lamports};
use crate::market::position::Position;
use crate::market::state::{Market, Settlement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub creature: CreatureIndex,
    pub shares: u64,
    pub payout: Lamports,
}

/// Freeze the pool once the battle is over
pub fn settle(battle: &Battle, market: &Market) -> Result<Settlement> {
    if !battle.is_over() {
        return Err(ArenaError::BattleNotOver(battle.id));
    }
    if market.is_settled() {
        return Err(ArenaError::MarketSettled(market.battle_id));
    }
    Ok(Settlement {
        winner: battle.winner,
        total_pool: market.total_pool,
        winning_shares: battle
            .winner
            .map(|w| market.outstanding_shares(w))
            .unwrap_or(0),
        paid_out: 0,
    })
}

/// `shares * total_pool / winning_shares`, floored
pub fn payout_for(shares: u64, settlement: &Settlement) -> Result<Lamports> {
    if settlement.winning_shares == 0 {
        return Ok(0);
    }
    let payout = (shares as u128)
        .checked_mul(settlement.total_pool as u128)
        .ok_or(ArenaError::Overflow)?
        / settlement.winning_shares as u128;
    Lamports::try_from(payout).map_err(|_| ArenaError::Overflow)
}

/// Claim winnings for a position, settling the market first if needed.
pub fn claim(
    battle: &Battle,
    market: &Market,
    position: Option<&Position>,
    creature: CreatureIndex,
) -> Result<(Market, Position, ClaimReceipt)> {
    let settlement = match market.settlement {
        Some(settlement) => settlement,
        None => settle(battle, market)?,
    };
    let winner = settlement
        .winner
        .ok_or(ArenaError::NoWinner(battle.id))?;
    if creature != winner {
        return Err(ArenaError::NotWinner(creature));
    }
    let position = position.ok_or(ArenaError::PositionNotFound {
        battle: battle.id,
        creature,
    })?;
    if position.claimed {
        return Err(ArenaError::AlreadyClaimed);
    }
    if position.shares == 0 {
        return Err(ArenaError::InsufficientShares {
            held: 0,
            requested: 1,
        });
    }

    let payout = payout_for(position.shares, &settlement)?;
    let paid_out = settlement
        .paid_out
        .checked_add(payout)
        .filter(|total| *total <= settlement.total_pool)
        .ok_or(ArenaError::Overflow)?;

    let mut next_market = market.clone();
    next_market.settlement = Some(Settlement {
        paid_out,
        ..settlement
    });
    let mut next_position = *position;
    next_position.claimed = true;

    let receipt = ClaimReceipt {
        creature,
        shares: position.shares,
        payout,
    };
    Ok((next_market, next_position, receipt))
}
