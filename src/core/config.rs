//! Crank configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or none
//! at all) is enough to run against a local arena.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::combat::BattleParams;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, Lamports, UserId, LAMPORTS_PER_UNIT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrankConfig {
    /// JSON-RPC endpoint of the arena host
    pub rpc_endpoint: String,

    /// Identity the crank signs privileged operations as.
    ///
    /// Key material stays with the host; this is only the public identity.
    pub operator: Uuid,

    /// First battle id to create or resume
    pub start_battle_id: u64,

    /// Stats and timing for every battle the crank creates
    pub battle: BattleParams,

    /// Virtual liquidity `L` for each new market
    pub initial_liquidity: Lamports,

    /// Pause between a battle finishing and creating the next one
    pub inter_battle_delay_secs: u64,

    pub rate_limited_backoff_secs: u64,
    pub error_backoff_secs: u64,

    /// Where the last processed battle id is recorded
    pub checkpoint_path: PathBuf,

    /// Stop after this many completed battles (runs forever if unset)
    pub max_battles: Option<u64>,
}

impl Default for CrankConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://127.0.0.1:8899".to_string(),
            operator: Uuid::nil(),
            start_battle_id: 1,
            battle: BattleParams::default(),
            initial_liquidity: LAMPORTS_PER_UNIT,
            inter_battle_delay_secs: 30,
            rate_limited_backoff_secs: 2,
            error_backoff_secs: 5,
            checkpoint_path: PathBuf::from("arena_crank.checkpoint.json"),
            max_battles: None,
        }
    }
}

impl CrankConfig {
    /// Read and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ArenaError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config: CrankConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.battle
            .validate()
            .map_err(|e| ArenaError::Config(e.to_string()))?;

        if self.initial_liquidity == 0 {
            return Err(ArenaError::Config("initial_liquidity must be positive".into()));
        }
        if self.rate_limited_backoff_secs == 0 || self.error_backoff_secs == 0 {
            return Err(ArenaError::Config("Backoff intervals must be positive".into()));
        }
        if self.rpc_endpoint.is_empty() {
            return Err(ArenaError::Config("rpc_endpoint is empty".into()));
        }
        if self.max_battles == Some(0) {
            return Err(ArenaError::Config(
                "max_battles must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn operator_id(&self) -> UserId {
        UserId(self.operator)
    }

    pub fn start_battle(&self) -> BattleId {
        BattleId(self.start_battle_id)
    }
}
