//! Wire-level operations and their results

use serde::{Deserialize, Serialize};

use crate::combat::{Battle, BattleParams, TurnLog};
use crate::core::types::{BattleId, CreatureIndex, Lamports};
use crate::market::{BuyReceipt, ClaimReceipt, Market, Position, SellReceipt, Settlement};

/// One atomic state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    CreateBattle {
        battle_id: BattleId,
        params: BattleParams,
    },
    CreateMarket {
        battle_id: BattleId,
        initial_liquidity: Lamports,
    },
    AdvanceTurn {
        battle_id: BattleId,
    },
    Buy {
        battle_id: BattleId,
        creature: CreatureIndex,
        amount: Lamports,
    },
    Sell {
        battle_id: BattleId,
        creature: CreatureIndex,
        shares: u64,
    },
    Claim {
        battle_id: BattleId,
        creature: CreatureIndex,
    },
    SettleMarket {
        battle_id: BattleId,
    },
    SetCurrentBattle {
        battle_id: BattleId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    BattleCreated { battle: Battle },
    MarketCreated { market: Market },
    TurnAdvanced { battle: Battle, log: TurnLog },
    Bought { receipt: BuyReceipt },
    Sold { receipt: SellReceipt },
    Claimed { receipt: ClaimReceipt },
    MarketSettled { settlement: Settlement },
    CurrentBattleSet { battle_id: BattleId },
}

/// Read-only view handed to the display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub battle: Battle,
    pub market: Option<Market>,
    pub positions: Vec<Position>,
}
