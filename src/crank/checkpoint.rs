//! Resume point for the crank

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{BattleId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Battle to pick up on restart (may be in progress)
    pub resume_battle_id: BattleId,
    pub last_completed: Option<BattleId>,
    pub saved_at: Timestamp,
}

impl Checkpoint {
    /// `Ok(None)` when no checkpoint has been written yet
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Write via a sibling temp file and rename, so a crash never leaves a
    /// truncated checkpoint.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Checkpoint::load(dir.path().join("none.json")).unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crank.json");
        let checkpoint = Checkpoint {
            resume_battle_id: BattleId(8),
            last_completed: Some(BattleId(7)),
            saved_at: 1_700_000_000,
        };
        checkpoint.save(&path).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap(), Some(checkpoint));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crank.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Checkpoint::load(&path).is_err());
    }
}
