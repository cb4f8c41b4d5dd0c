//! Buying and selling creature shares while a battle is running
//!
//! Both operations validate everything, then return the next market and
//! position. Nothing is written here.

use serde::{Deserialize, Serialize};

use crate::combat::Battle;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{CreatureIndex, Lamports};
use crate::market::curve::MIN_BUY_AMOUNT;
use crate::market::position::Position;
use crate::market::state::Market;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub creature: CreatureIndex,
    pub amount: Lamports,
    pub shares_out: u64,
    pub position_shares: u64,
    /// Spot price after the trade, scaled by `PRICE_SCALE`
    pub spot_price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellReceipt {
    pub creature: CreatureIndex,
    pub shares_in: u64,
    pub refund: Lamports,
    pub position_shares: u64,
    pub spot_price: u64,
}

/// Trading closes when the battle ends, before or after settlement
fn ensure_open(battle: &Battle, market: &Market) -> Result<()> {
    if market.is_settled() || battle.is_over() {
        return Err(ArenaError::MarketSettled(market.battle_id));
    }
    Ok(())
}

/// Buy shares of `position.creature` for `amount`.
///
/// Funds are moved by the host's balance mechanism; this only prices.
pub fn buy(
    battle: &Battle,
    market: &Market,
    position: &Position,
    amount: Lamports,
) -> Result<(Market, Position, BuyReceipt)> {
    let creature = position.creature;
    ensure_open(battle, market)?;
    if amount < MIN_BUY_AMOUNT {
        return Err(ArenaError::AmountTooSmall {
            amount,
            minimum: MIN_BUY_AMOUNT,
        });
    }
    if !battle.is_alive(creature) {
        return Err(ArenaError::CreatureEliminated(creature));
    }

    let quote = market.quote_buy(creature, amount)?;
    let next_market = market.with_buy(creature, amount, &quote)?;
    let mut next_position = *position;
    next_position.shares = next_position
        .shares
        .checked_add(quote.shares_out)
        .ok_or(ArenaError::Overflow)?;

    let receipt = BuyReceipt {
        creature,
        amount,
        shares_out: quote.shares_out,
        position_shares: next_position.shares,
        spot_price: next_market.spot_price(creature),
    };
    Ok((next_market, next_position, receipt))
}

/// Sell `shares_in` back to the curve.
///
/// Shares of an eliminated creature cannot be sold.
pub fn sell(
    battle: &Battle,
    market: &Market,
    position: Option<&Position>,
    creature: CreatureIndex,
    shares_in: u64,
) -> Result<(Market, Position, SellReceipt)> {
    ensure_open(battle, market)?;
    if !battle.is_alive(creature) {
        return Err(ArenaError::CreatureEliminated(creature));
    }
    let held = position.map(|p| p.shares).unwrap_or(0);
    let position = match position {
        Some(p) if shares_in > 0 && p.shares >= shares_in => p,
        _ => {
            return Err(ArenaError::InsufficientShares {
                held,
                requested: shares_in,
            })
        }
    };

    let quote = market.quote_sell(creature, shares_in)?;
    let next_market = market.with_sell(creature, &quote)?;
    let mut next_position = *position;
    next_position.shares -= shares_in;

    let receipt = SellReceipt {
        creature,
        shares_in,
        refund: quote.refund,
        position_shares: next_position.shares,
        spot_price: next_market.spot_price(creature),
    };
    Ok((next_market, next_position, receipt))
}
