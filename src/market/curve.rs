//! Bonding curve math
//!
//! Each creature pool keeps a share reserve `s` and currency `c`, tied by
//! `s * (c + L) <= K` where `L` is the virtual liquidity and `K = L^2`.
//! Every division floors. Buys and sells both preserve the inequality,
//! which caps a buy-then-sell round trip at the amount paid in.

use serde::{Deserialize, Serialize};

use crate::core::types::Lamports;

/// Smallest accepted buy (0.01 units)
pub const MIN_BUY_AMOUNT: Lamports = 10_000_000;

/// Fixed-point scale for quoted prices
pub const PRICE_SCALE: u128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyQuote {
    pub shares_out: u64,
    pub new_reserve: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellQuote {
    pub refund: Lamports,
    pub new_reserve: u64,
}

pub fn k_constant(liquidity: u64) -> u128 {
    (liquidity as u128) * (liquidity as u128)
}

/// Shares released for `amount` paid into a pool.
///
/// Returns None on overflow or if the reserve would not shrink.
pub fn quote_buy(
    reserve: u64,
    pool: Lamports,
    liquidity: u64,
    k: u128,
    amount: Lamports,
) -> Option<BuyQuote> {
    let effective = (pool as u128)
        .checked_add(liquidity as u128)?
        .checked_add(amount as u128)?;
    if effective == 0 {
        return None;
    }
    let new_reserve: u64 = (k / effective).try_into().ok()?;
    let shares_out = reserve.checked_sub(new_reserve)?;
    Some(BuyQuote {
        shares_out,
        new_reserve,
    })
}

/// Currency returned for `shares_in` handed back to a pool.
///
/// The refund never exceeds the pool's currency. If rounding leaves the
/// curve above the current point, the refund is zero.
pub fn quote_sell(
    reserve: u64,
    pool: Lamports,
    liquidity: u64,
    k: u128,
    shares_in: u64,
) -> Option<SellQuote> {
    let new_reserve = reserve.checked_add(shares_in)?;
    if new_reserve == 0 {
        return None;
    }
    let effective_now = (pool as u128).checked_add(liquidity as u128)?;
    let effective_after = k / new_reserve as u128;
    let refund = effective_now.saturating_sub(effective_after);
    let refund = refund.min(pool as u128) as u64;
    Some(SellQuote { refund, new_reserve })
}

/// Currency per whole share, scaled by `PRICE_SCALE`; zero for an empty reserve
pub fn spot_price(pool: Lamports, shares: u64) -> u64 {
    if shares == 0 {
        return 0;
    }
    let price = (pool as u128) * PRICE_SCALE / shares as u128;
    price.min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: u64 = 1_000_000_000;

    #[test]
    fn test_initial_point_sits_on_curve() {
        assert_eq!(k_constant(L), (L as u128) * (L as u128));
    }

    #[test]
    fn test_half_unit_buys() {
        let k = k_constant(L);
        let first = quote_buy(L, 0, L, k, 500_000_000).unwrap();
        assert_eq!(first.new_reserve, 666_666_666);
        assert_eq!(first.shares_out, 333_333_334);

        let second = quote_buy(first.new_reserve, 500_000_000, L, k, 500_000_000).unwrap();
        assert_eq!(second.new_reserve, 500_000_000);
        assert_eq!(second.shares_out, 166_666_666);
        assert!(second.shares_out < first.shares_out);
    }

    #[test]
    fn test_round_trip_returns_at_most_paid() {
        let k = k_constant(L);
        let amount = 123_456_789;
        let buy = quote_buy(L, 0, L, k, amount).unwrap();
        let sell = quote_sell(buy.new_reserve, amount, L, k, buy.shares_out).unwrap();
        assert!(sell.refund <= amount);
        assert_eq!(sell.new_reserve, L);
    }

    #[test]
    fn test_sell_never_exceeds_pool() {
        let k = k_constant(L);
        let sell = quote_sell(L / 2, 10, L, k, L / 2).unwrap();
        assert!(sell.refund <= 10);
    }

    #[test]
    fn test_reserve_never_reaches_zero_for_sane_amounts() {
        let k = k_constant(L);
        // A thousand units against one unit of liquidity
        let buy = quote_buy(L, 0, L, k, 1_000 * L).unwrap();
        assert!(buy.new_reserve > 0);
    }

    #[test]
    fn test_spot_price() {
        assert_eq!(spot_price(0, 0), 0);
        assert_eq!(spot_price(500_000_000, 500_000_000), 1_000_000_000);
    }
}
