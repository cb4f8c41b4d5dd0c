//! The crank loop
//!
//! Keeps one battle at a time moving: makes sure it and its market exist,
//! waits out the turn interval, advances, and rolls over to the next id
//! once the battle is over. A failed step is retried, never fatal.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::arena::{Instruction, Outcome};
use crate::combat::{Battle, TurnLog};
use crate::core::config::CrankConfig;
use crate::core::error::{ArenaError, ErrorKind, Result};
use crate::core::types::BattleId;
use crate::crank::checkpoint::Checkpoint;
use crate::crank::client::ArenaClient;
use crate::crank::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrankReport {
    pub battles_completed: u64,
    pub turns_advanced: u64,
    pub last_completed: Option<BattleId>,
    /// Where a restarted crank should pick up
    pub resume_battle_id: BattleId,
}

enum Watch {
    Finished,
    Shutdown,
}

pub struct Scheduler<A, K> {
    client: A,
    clock: K,
    config: CrankConfig,
    shutdown: watch::Receiver<bool>,
    report: CrankReport,
}

impl<A: ArenaClient, K: Clock> Scheduler<A, K> {
    pub fn new(client: A, clock: K, config: CrankConfig, shutdown: watch::Receiver<bool>) -> Self {
        let start = config.start_battle();
        Self {
            client,
            clock,
            config,
            shutdown,
            report: CrankReport {
                battles_completed: 0,
                turns_advanced: 0,
                last_completed: None,
                resume_battle_id: start,
            },
        }
    }

    /// Run until shutdown or `max_battles`, starting at `start`.
    pub async fn run(mut self, start: BattleId) -> CrankReport {
        let mut battle_id = start;
        tracing::info!("Crank starting at battle {}", battle_id);

        loop {
            if self.is_shutdown() {
                break;
            }

            if let Err(e) = self.ensure_battle(battle_id).await {
                tracing::warn!("Failed to prepare battle {}: {}", battle_id, e);
                if !self.pause(self.config.error_backoff_secs).await {
                    break;
                }
                continue;
            }
            self.save_checkpoint(battle_id);

            if let Watch::Shutdown = self.monitor(battle_id).await {
                break;
            }
            self.finish(battle_id).await;

            battle_id = battle_id.next();
            self.save_checkpoint(battle_id);

            if let Some(max) = self.config.max_battles {
                if self.report.battles_completed >= max {
                    tracing::info!("Completed {} battles, stopping", max);
                    break;
                }
            }

            tracing::info!(
                "Next battle {} in {}s",
                battle_id,
                self.config.inter_battle_delay_secs
            );
            if !self.pause(self.config.inter_battle_delay_secs).await {
                break;
            }
        }

        self.report.resume_battle_id = battle_id;
        self.save_checkpoint(battle_id);
        tracing::info!(
            "Crank stopped: {} battles, {} turns, resume at {}",
            self.report.battles_completed,
            self.report.turns_advanced,
            battle_id
        );
        self.report
    }

    /// Create the battle and market if absent. Losing a creation race to
    /// another crank counts as success.
    async fn ensure_battle(&self, id: BattleId) -> Result<()> {
        if self.client.battle(id).await?.is_none() {
            let create = Instruction::CreateBattle {
                battle_id: id,
                params: self.config.battle,
            };
            match self.client.execute(create).await {
                Ok(_) => tracing::info!("Created battle {}", id),
                Err(ArenaError::BattleExists(_)) => {
                    tracing::debug!("Battle {} was created by another party", id)
                }
                Err(e) => return Err(e),
            }
        }

        if self.client.market(id).await?.is_none() {
            let create = Instruction::CreateMarket {
                battle_id: id,
                initial_liquidity: self.config.initial_liquidity,
            };
            match self.client.execute(create).await {
                Ok(_) => tracing::info!("Created market for battle {}", id),
                Err(ArenaError::MarketExists(_)) => {
                    tracing::debug!("Market {} was created by another party", id)
                }
                Err(e) => return Err(e),
            }
        }

        if let Err(e) = self
            .client
            .execute(Instruction::SetCurrentBattle { battle_id: id })
            .await
        {
            tracing::warn!("Could not point current battle at {}: {}", id, e);
        }
        Ok(())
    }

    async fn monitor(&mut self, id: BattleId) -> Watch {
        let mut observed_turn: Option<u64> = None;

        loop {
            if self.is_shutdown() {
                return Watch::Shutdown;
            }

            let battle = match self.client.battle(id).await {
                Ok(Some(battle)) => battle,
                Ok(None) => {
                    tracing::warn!("Battle {} not found", id);
                    if !self.pause(self.config.error_backoff_secs).await {
                        return Watch::Shutdown;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch battle {}: {}", id, e);
                    if !self.pause(self.config.error_backoff_secs).await {
                        return Watch::Shutdown;
                    }
                    continue;
                }
            };

            if battle.is_over() {
                return Watch::Finished;
            }
            if let Some(turn) = observed_turn {
                if battle.current_turn > turn {
                    tracing::debug!(
                        "Battle {} advanced to turn {} by another party",
                        id,
                        battle.current_turn
                    );
                }
            }
            observed_turn = Some(battle.current_turn);

            // Recomputed on every wake
            let wait = battle.seconds_until_next_turn(self.clock.now());
            if wait > 0 {
                tracing::debug!("Battle {}: next turn in {}s", id, wait);
                if !self.pause(wait as u64).await {
                    return Watch::Shutdown;
                }
                continue;
            }

            match self
                .client
                .execute(Instruction::AdvanceTurn { battle_id: id })
                .await
            {
                Ok(Outcome::TurnAdvanced { battle, log }) => {
                    self.report.turns_advanced += 1;
                    observed_turn = Some(battle.current_turn);
                    log_turn(&battle, &log);
                    if battle.is_over() {
                        return Watch::Finished;
                    }
                }
                Ok(other) => tracing::warn!("Unexpected outcome for turn advance: {:?}", other),
                Err(e) => match e.kind() {
                    ErrorKind::RateLimited => {
                        tracing::debug!("Battle {}: {} (turn taken elsewhere)", id, e);
                        if !self.pause(self.config.rate_limited_backoff_secs).await {
                            return Watch::Shutdown;
                        }
                    }
                    ErrorKind::Terminal => {
                        tracing::info!("Battle {} already over", id);
                        return Watch::Finished;
                    }
                    kind => {
                        if kind.is_retryable() {
                            tracing::warn!("Battle {}: {} (retrying)", id, e);
                        } else {
                            tracing::error!("Failed to advance battle {}: {}", id, e);
                        }
                        if !self.pause(self.config.error_backoff_secs).await {
                            return Watch::Shutdown;
                        }
                    }
                },
            }
        }
    }

    /// Settle the finished battle's market. Claims settle lazily, so a
    /// failure here is only logged.
    async fn finish(&mut self, id: BattleId) {
        self.report.battles_completed += 1;
        self.report.last_completed = Some(id);

        match self
            .client
            .execute(Instruction::SettleMarket { battle_id: id })
            .await
        {
            Ok(Outcome::MarketSettled { settlement }) => tracing::info!(
                "Settled market {}: winner {:?}, pool {}",
                id,
                settlement.winner.map(|w| w.get()),
                settlement.total_pool
            ),
            Ok(other) => tracing::warn!("Unexpected outcome for settlement: {:?}", other),
            Err(ArenaError::MarketSettled(_)) => {
                tracing::debug!("Market {} already settled", id)
            }
            Err(e) => tracing::warn!("Could not settle market {}: {}", id, e),
        }
    }

    /// Sleep unless shutdown arrives first. Returns false on shutdown.
    async fn pause(&mut self, secs: u64) -> bool {
        if secs > 0 {
            tokio::select! {
                _ = self.clock.sleep(Duration::from_secs(secs)) => {}
                Ok(()) = self.shutdown.changed() => {}
            }
        }
        !self.is_shutdown()
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn save_checkpoint(&self, resume: BattleId) {
        let checkpoint = Checkpoint {
            resume_battle_id: resume,
            last_completed: self.report.last_completed,
            saved_at: self.clock.now(),
        };
        if let Err(e) = checkpoint.save(&self.config.checkpoint_path) {
            tracing::warn!(
                "Failed to write checkpoint {:?}: {}",
                self.config.checkpoint_path,
                e
            );
        }
    }
}

fn log_turn(battle: &Battle, log: &TurnLog) {
    let deaths: Vec<u8> = log.deaths().map(|c| c.get()).collect();
    tracing::info!(
        "Battle {} turn {}: {} attacks, eliminated {:?}, {} alive",
        battle.id,
        log.turn_number,
        log.attacks.len(),
        deaths,
        battle.alive_count()
    );
    if let Some(end) = log.end {
        tracing::info!("Battle {} ended: {:?}", battle.id, end);
    }
}
