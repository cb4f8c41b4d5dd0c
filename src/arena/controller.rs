//! Battle lifecycle controller
//!
//! Holds every battle, market and position keyed by battle id. Each public
//! operation is one atomic transaction: the engines compute the next state
//! from immutable inputs and only a fully validated result is written.

use ahash::AHashMap;

use crate::arena::instruction::{ArenaSnapshot, Instruction, Outcome};
use crate::combat::{self, Battle, BattleParams, TurnLog};
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, CreatureIndex, Lamports, TxContext, UserId};
use crate::market::{
    self, BuyReceipt, ClaimReceipt, Market, Position, PositionKey, PositionLedger, SellReceipt,
    Settlement,
};

#[derive(Debug, Clone)]
pub struct Arena {
    authority: UserId,
    battles: AHashMap<BattleId, Battle>,
    markets: AHashMap<BattleId, Market>,
    positions: PositionLedger,
    /// Convenience pointer at the most recent battle; nothing depends on it
    latest_battle: Option<BattleId>,
}

impl Arena {
    pub fn new(authority: UserId) -> Self {
        Self {
            authority,
            battles: AHashMap::new(),
            markets: AHashMap::new(),
            positions: PositionLedger::new(),
            latest_battle: None,
        }
    }

    pub fn battle(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    pub fn market(&self, id: BattleId) -> Option<&Market> {
        self.markets.get(&id)
    }

    pub fn position(&self, id: BattleId, user: UserId, creature: CreatureIndex) -> Option<&Position> {
        self.positions.get(&PositionKey::new(id, user, creature))
    }

    pub fn positions_for(&self, id: BattleId) -> impl Iterator<Item = &Position> + '_ {
        self.positions.for_battle(id)
    }

    pub fn latest_battle(&self) -> Option<BattleId> {
        self.latest_battle
    }

    pub fn snapshot(&self, id: BattleId) -> Option<ArenaSnapshot> {
        let battle = self.battles.get(&id)?.clone();
        let mut positions: Vec<Position> = self.positions_for(id).copied().collect();
        positions.sort_by_key(|p| (p.creature, p.user.0));
        Some(ArenaSnapshot {
            battle,
            market: self.markets.get(&id).cloned(),
            positions,
        })
    }

    fn require_authority(&self, ctx: &TxContext) -> Result<()> {
        if ctx.caller != self.authority {
            return Err(ArenaError::Unauthorized);
        }
        Ok(())
    }

    fn load_battle(&self, id: BattleId) -> Result<&Battle> {
        self.battles.get(&id).ok_or(ArenaError::BattleNotFound(id))
    }

    fn load_market(&self, id: BattleId) -> Result<&Market> {
        self.markets.get(&id).ok_or(ArenaError::MarketNotFound(id))
    }

    /// Privileged. A duplicate id fails with `BattleExists` so callers can
    /// tell an idempotent retry from a real fault.
    pub fn create_battle(
        &mut self,
        ctx: &TxContext,
        id: BattleId,
        params: &BattleParams,
    ) -> Result<Battle> {
        self.require_authority(ctx)?;
        if self.battles.contains_key(&id) {
            return Err(ArenaError::BattleExists(id));
        }
        params.validate()?;

        let battle = Battle::new(id, ctx.caller, params, ctx.now);
        self.battles.insert(id, battle.clone());
        self.latest_battle = Some(id);
        tracing::info!("Battle {} created at {}", id, ctx.now);
        Ok(battle)
    }

    /// Privileged. Requires the battle and no existing market.
    pub fn create_market(
        &mut self,
        ctx: &TxContext,
        id: BattleId,
        initial_liquidity: Lamports,
    ) -> Result<Market> {
        self.require_authority(ctx)?;
        self.load_battle(id)?;
        if self.markets.contains_key(&id) {
            return Err(ArenaError::MarketExists(id));
        }
        let market = Market::new(id, initial_liquidity)?;
        self.markets.insert(id, market.clone());
        tracing::info!("Market for battle {} created with liquidity {}", id, initial_liquidity);
        Ok(market)
    }

    /// Permissionless: rate limited and seeded from the ledger context.
    pub fn advance_turn(&mut self, ctx: &TxContext, id: BattleId) -> Result<(Battle, TurnLog)> {
        let battle = self.load_battle(id)?;
        let mut rng = combat::turn_rng(combat::turn_seed(ctx, id, battle.current_turn));
        let (next, log) = combat::advance(battle, ctx.now, &mut rng)?;

        if next.is_over() {
            match next.winner {
                Some(winner) => tracing::info!(
                    "Battle {} over after turn {}: creature {} wins",
                    id,
                    next.current_turn,
                    winner
                ),
                None => tracing::info!(
                    "Battle {} over after turn {}: no winner ({:?})",
                    id,
                    next.current_turn,
                    log.end
                ),
            }
        }

        self.battles.insert(id, next.clone());
        Ok((next, log))
    }

    pub fn buy(
        &mut self,
        ctx: &TxContext,
        id: BattleId,
        creature: CreatureIndex,
        amount: Lamports,
    ) -> Result<BuyReceipt> {
        let battle = self.load_battle(id)?;
        let market = self.load_market(id)?;
        let key = PositionKey::new(id, ctx.caller, creature);
        let position = self
            .positions
            .get(&key)
            .copied()
            .unwrap_or_else(|| Position::empty(key));

        let (next_market, next_position, receipt) = market::buy(battle, market, &position, amount)?;

        self.markets.insert(id, next_market);
        self.positions.upsert(next_position);
        tracing::debug!(
            "{} bought {} shares of creature {} in battle {} for {}",
            ctx.caller,
            receipt.shares_out,
            creature,
            id,
            amount
        );
        Ok(receipt)
    }

    pub fn sell(
        &mut self,
        ctx: &TxContext,
        id: BattleId,
        creature: CreatureIndex,
        shares: u64,
    ) -> Result<SellReceipt> {
        let battle = self.load_battle(id)?;
        let market = self.load_market(id)?;
        let position = self.positions.get(&PositionKey::new(id, ctx.caller, creature));

        let (next_market, next_position, receipt) =
            market::sell(battle, market, position, creature, shares)?;

        self.markets.insert(id, next_market);
        self.positions.upsert(next_position);
        tracing::debug!(
            "{} sold {} shares of creature {} in battle {} for {}",
            ctx.caller,
            shares,
            creature,
            id,
            receipt.refund
        );
        Ok(receipt)
    }

    /// Permissionless; freezes the pool for claims.
    pub fn settle_market(&mut self, _ctx: &TxContext, id: BattleId) -> Result<Settlement> {
        let battle = self.load_battle(id)?;
        let market = self.load_market(id)?;
        let settlement = market::settle(battle, market)?;

        if let Some(market) = self.markets.get_mut(&id) {
            market.settlement = Some(settlement);
        }
        tracing::info!(
            "Market for battle {} settled: pool {}, winning shares {}",
            id,
            settlement.total_pool,
            settlement.winning_shares
        );
        Ok(settlement)
    }

    pub fn claim(
        &mut self,
        ctx: &TxContext,
        id: BattleId,
        creature: CreatureIndex,
    ) -> Result<ClaimReceipt> {
        let battle = self.load_battle(id)?;
        let market = self.load_market(id)?;
        let position = self.positions.get(&PositionKey::new(id, ctx.caller, creature));

        let (next_market, next_position, receipt) =
            market::claim(battle, market, position, creature)?;

        self.markets.insert(id, next_market);
        self.positions.upsert(next_position);
        tracing::info!(
            "{} claimed {} from battle {}",
            ctx.caller,
            receipt.payout,
            id
        );
        Ok(receipt)
    }

    /// Privileged. Moves the convenience pointer.
    pub fn set_current_battle(&mut self, ctx: &TxContext, id: BattleId) -> Result<BattleId> {
        self.require_authority(ctx)?;
        self.load_battle(id)?;
        self.latest_battle = Some(id);
        Ok(id)
    }

    /// Dispatch a wire instruction
    pub fn execute(&mut self, ctx: &TxContext, instruction: Instruction) -> Result<Outcome> {
        match instruction {
            Instruction::CreateBattle { battle_id, params } => self
                .create_battle(ctx, battle_id, &params)
                .map(|battle| Outcome::BattleCreated { battle }),
            Instruction::CreateMarket {
                battle_id,
                initial_liquidity,
            } => self
                .create_market(ctx, battle_id, initial_liquidity)
                .map(|market| Outcome::MarketCreated { market }),
            Instruction::AdvanceTurn { battle_id } => self
                .advance_turn(ctx, battle_id)
                .map(|(battle, log)| Outcome::TurnAdvanced { battle, log }),
            Instruction::Buy {
                battle_id,
                creature,
                amount,
            } => self
                .buy(ctx, battle_id, creature, amount)
                .map(|receipt| Outcome::Bought { receipt }),
            Instruction::Sell {
                battle_id,
                creature,
                shares,
            } => self
                .sell(ctx, battle_id, creature, shares)
                .map(|receipt| Outcome::Sold { receipt }),
            Instruction::Claim {
                battle_id,
                creature,
            } => self
                .claim(ctx, battle_id, creature)
                .map(|receipt| Outcome::Claimed { receipt }),
            Instruction::SettleMarket { battle_id } => self
                .settle_market(ctx, battle_id)
                .map(|settlement| Outcome::MarketSettled { settlement }),
            Instruction::SetCurrentBattle { battle_id } => self
                .set_current_battle(ctx, battle_id)
                .map(|battle_id| Outcome::CurrentBattleSet { battle_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::BattleStatus;
    use crate::core::types::{Timestamp, LAMPORTS_PER_UNIT};

    const T0: Timestamp = 1_700_000_000;

    fn arena() -> (Arena, UserId) {
        let operator = UserId::new();
        (Arena::new(operator), operator)
    }

    fn ctx(caller: UserId, now: Timestamp) -> TxContext {
        TxContext::new(caller, now, now as u64)
    }

    fn standard_params() -> BattleParams {
        BattleParams {
            hp: 100,
            atk: 50,
            def: 20,
            spd: 30,
            turn_interval_secs: 10,
            max_duration_secs: 86_400,
        }
    }

    #[test]
    fn test_create_battle() {
        let (mut arena, op) = arena();
        let battle = arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        assert!(battle.creatures.iter().all(|c| c.current_hp == 100));
        assert_eq!(battle.status, BattleStatus::Active);
        assert_eq!(arena.latest_battle(), Some(BattleId(1)));
    }

    #[test]
    fn test_duplicate_battle_is_distinct_error() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        let err = arena
            .create_battle(&ctx(op, T0 + 5), BattleId(1), &standard_params())
            .unwrap_err();
        assert_eq!(err, ArenaError::BattleExists(BattleId(1)));
        assert_eq!(arena.battle(BattleId(1)).unwrap().start_timestamp, T0);
    }

    #[test]
    fn test_privileged_ops_require_authority() {
        let (mut arena, op) = arena();
        let stranger = UserId::new();
        assert_eq!(
            arena.create_battle(&ctx(stranger, T0), BattleId(1), &standard_params()),
            Err(ArenaError::Unauthorized)
        );
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        assert_eq!(
            arena.create_market(&ctx(stranger, T0), BattleId(1), LAMPORTS_PER_UNIT),
            Err(ArenaError::Unauthorized)
        );
        assert_eq!(
            arena.set_current_battle(&ctx(stranger, T0), BattleId(1)),
            Err(ArenaError::Unauthorized)
        );
    }

    #[test]
    fn test_market_requires_battle_and_is_unique() {
        let (mut arena, op) = arena();
        assert_eq!(
            arena.create_market(&ctx(op, T0), BattleId(4), LAMPORTS_PER_UNIT),
            Err(ArenaError::BattleNotFound(BattleId(4)))
        );
        arena.create_battle(&ctx(op, T0), BattleId(4), &standard_params()).unwrap();
        arena.create_market(&ctx(op, T0), BattleId(4), LAMPORTS_PER_UNIT).unwrap();
        assert_eq!(
            arena.create_market(&ctx(op, T0), BattleId(4), LAMPORTS_PER_UNIT),
            Err(ArenaError::MarketExists(BattleId(4)))
        );
    }

    #[test]
    fn test_advance_is_permissionless_and_rate_limited() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        let anyone = UserId::new();

        let before = arena.battle(BattleId(1)).cloned();
        let err = arena.advance_turn(&ctx(anyone, T0 + 9), BattleId(1)).unwrap_err();
        assert!(matches!(err, ArenaError::RateLimited { .. }));
        assert_eq!(arena.battle(BattleId(1)).cloned(), before);

        let (battle, _) = arena.advance_turn(&ctx(anyone, T0 + 10), BattleId(1)).unwrap();
        assert_eq!(battle.current_turn, 1);
    }

    #[test]
    fn test_battles_are_independent() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        arena.create_battle(&ctx(op, T0 + 3), BattleId(2), &standard_params()).unwrap();
        arena.advance_turn(&ctx(op, T0 + 10), BattleId(1)).unwrap();
        assert_eq!(arena.battle(BattleId(1)).unwrap().current_turn, 1);
        assert_eq!(arena.battle(BattleId(2)).unwrap().current_turn, 0);
        // Latest pointer follows creation, not activity
        assert_eq!(arena.latest_battle(), Some(BattleId(2)));
    }

    #[test]
    fn test_buy_creates_position_lazily() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        arena.create_market(&ctx(op, T0), BattleId(1), LAMPORTS_PER_UNIT).unwrap();
        let user = UserId::new();
        let c = CreatureIndex::ALL[3];
        assert!(arena.position(BattleId(1), user, c).is_none());

        let receipt = arena.buy(&ctx(user, T0 + 1), BattleId(1), c, LAMPORTS_PER_UNIT / 2).unwrap();
        let position = arena.position(BattleId(1), user, c).unwrap();
        assert_eq!(position.shares, receipt.shares_out);
        assert!(!position.claimed);
        assert_eq!(arena.market(BattleId(1)).unwrap().total_pool, LAMPORTS_PER_UNIT / 2);
    }

    #[test]
    fn test_failed_buy_leaves_state_unchanged() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        arena.create_market(&ctx(op, T0), BattleId(1), LAMPORTS_PER_UNIT).unwrap();
        let user = UserId::new();
        let before = arena.market(BattleId(1)).cloned();
        assert!(arena.buy(&ctx(user, T0), BattleId(1), CreatureIndex::ALL[0], 1).is_err());
        assert_eq!(arena.market(BattleId(1)).cloned(), before);
        assert!(arena.positions.is_empty());
    }

    #[test]
    fn test_execute_dispatches() {
        let (mut arena, op) = arena();
        let outcome = arena
            .execute(
                &ctx(op, T0),
                Instruction::CreateBattle {
                    battle_id: BattleId(8),
                    params: standard_params(),
                },
            )
            .unwrap();
        assert!(matches!(outcome, Outcome::BattleCreated { .. }));
        let outcome = arena
            .execute(&ctx(op, T0 + 10), Instruction::AdvanceTurn { battle_id: BattleId(8) })
            .unwrap();
        match outcome {
            Outcome::TurnAdvanced { battle, log } => {
                assert_eq!(battle.current_turn, 1);
                assert_eq!(log.turn_number, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_execute_rejects_strangers_on_privileged_ops() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        let stranger = UserId::new();
        let privileged = [
            Instruction::CreateBattle {
                battle_id: BattleId(2),
                params: standard_params(),
            },
            Instruction::CreateMarket {
                battle_id: BattleId(1),
                initial_liquidity: LAMPORTS_PER_UNIT,
            },
            Instruction::SetCurrentBattle {
                battle_id: BattleId(1),
            },
        ];
        for instruction in privileged {
            assert_eq!(
                arena.execute(&ctx(stranger, T0 + 1), instruction),
                Err(ArenaError::Unauthorized)
            );
        }
        assert!(arena.battle(BattleId(2)).is_none());
        assert!(arena.market(BattleId(1)).is_none());

        // Anyone may crank a turn
        let outcome = arena.execute(
            &ctx(stranger, T0 + 10),
            Instruction::AdvanceTurn {
                battle_id: BattleId(1),
            },
        );
        assert!(matches!(outcome, Ok(Outcome::TurnAdvanced { .. })));
    }

    #[test]
    fn test_snapshot_includes_market_and_positions() {
        let (mut arena, op) = arena();
        arena.create_battle(&ctx(op, T0), BattleId(1), &standard_params()).unwrap();
        arena.create_market(&ctx(op, T0), BattleId(1), LAMPORTS_PER_UNIT).unwrap();
        arena
            .buy(&ctx(UserId::new(), T0), BattleId(1), CreatureIndex::ALL[0], LAMPORTS_PER_UNIT)
            .unwrap();
        let snap = arena.snapshot(BattleId(1)).unwrap();
        assert!(snap.market.is_some());
        assert_eq!(snap.positions.len(), 1);
        assert!(arena.snapshot(BattleId(2)).is_none());
    }
}
