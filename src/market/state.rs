//! Market record paired 1:1 with a battle

use serde::{Deserialize, Serialize};

use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, CreatureIndex, Lamports, CREATURE_COUNT};
use crate::market::curve::{self, BuyQuote, SellQuote};

/// Frozen view of the pool at settlement time; claims pay out against it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub winner: Option<CreatureIndex>,
    pub total_pool: Lamports,
    /// Outstanding shares of the winning creature
    pub winning_shares: u64,
    pub paid_out: Lamports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub battle_id: BattleId,
    /// Unsold share reserve per creature
    pub share_pools: [u64; CREATURE_COUNT],
    /// Currency paid in per creature
    pub currency_pools: [Lamports; CREATURE_COUNT],
    pub total_pool: Lamports,
    /// Virtual liquidity `L`; also each reserve's starting size
    pub initial_liquidity: u64,
    /// `L * L`, carried as a decimal string on the wire
    #[serde(with = "u128_string")]
    pub k_constant: u128,
    pub settlement: Option<Settlement>,
}

impl Market {
    pub fn new(battle_id: BattleId, initial_liquidity: u64) -> Result<Self> {
        if initial_liquidity == 0 {
            return Err(ArenaError::InvalidParams(
                "initial liquidity must be positive".into(),
            ));
        }
        Ok(Self {
            battle_id,
            share_pools: [initial_liquidity; CREATURE_COUNT],
            currency_pools: [0; CREATURE_COUNT],
            total_pool: 0,
            initial_liquidity,
            k_constant: curve::k_constant(initial_liquidity),
            settlement: None,
        })
    }

    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }

    /// Shares held by users for this creature
    pub fn outstanding_shares(&self, creature: CreatureIndex) -> u64 {
        self.initial_liquidity
            .saturating_sub(self.share_pools[creature.as_usize()])
    }

    pub fn spot_price(&self, creature: CreatureIndex) -> u64 {
        let i = creature.as_usize();
        curve::spot_price(self.currency_pools[i], self.share_pools[i])
    }

    pub fn quote_buy(&self, creature: CreatureIndex, amount: Lamports) -> Result<BuyQuote> {
        let i = creature.as_usize();
        let quote = curve::quote_buy(
            self.share_pools[i],
            self.currency_pools[i],
            self.initial_liquidity,
            self.k_constant,
            amount,
        )
        .ok_or(ArenaError::Overflow)?;
        if quote.new_reserve == 0 {
            return Err(ArenaError::PoolDepleted(creature));
        }
        if quote.shares_out == 0 {
            return Err(ArenaError::AmountTooSmall {
                amount,
                minimum: curve::MIN_BUY_AMOUNT,
            });
        }
        Ok(quote)
    }

    pub fn quote_sell(&self, creature: CreatureIndex, shares_in: u64) -> Result<SellQuote> {
        let i = creature.as_usize();
        curve::quote_sell(
            self.share_pools[i],
            self.currency_pools[i],
            self.initial_liquidity,
            self.k_constant,
            shares_in,
        )
        .ok_or(ArenaError::Overflow)
    }

    /// Next state after a quoted buy; `self` is left untouched
    pub fn with_buy(&self, creature: CreatureIndex, amount: Lamports, quote: &BuyQuote) -> Result<Self> {
        let i = creature.as_usize();
        let mut next = self.clone();
        next.share_pools[i] = quote.new_reserve;
        next.currency_pools[i] = next.currency_pools[i]
            .checked_add(amount)
            .ok_or(ArenaError::Overflow)?;
        next.total_pool = next
            .total_pool
            .checked_add(amount)
            .ok_or(ArenaError::Overflow)?;
        Ok(next)
    }

    /// Next state after a quoted sell
    pub fn with_sell(&self, creature: CreatureIndex, quote: &SellQuote) -> Result<Self> {
        let i = creature.as_usize();
        let mut next = self.clone();
        next.share_pools[i] = quote.new_reserve;
        next.currency_pools[i] = next.currency_pools[i]
            .checked_sub(quote.refund)
            .ok_or(ArenaError::Overflow)?;
        next.total_pool = next
            .total_pool
            .checked_sub(quote.refund)
            .ok_or(ArenaError::Overflow)?;
        Ok(next)
    }
}

mod u128_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
