//! Mining configuration shared by the chain and its callers.
//!
//! The core mining functions accept any difficulty; the supported range is
//! enforced here, at the point where a caller turns user input into a
//! [`ChainConfig`].

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MINING_BATCH_SIZE, MIN_DIFFICULTY};
use crate::error::{ChainError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainConfig {
    /// Leading zero characters required in a mined hash.
    pub difficulty: usize,
    /// Nonces tried per cooperative step batch. Has no effect on the mined result.
    pub batch_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            batch_size: MINING_BATCH_SIZE,
        }
    }
}

impl ChainConfig {
    pub fn new(difficulty: usize, batch_size: usize) -> Result<Self> {
        let config = Self {
            difficulty,
            batch_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(ChainError::DifficultyOutOfRange(self.difficulty));
        }
        if self.batch_size == 0 {
            return Err(ChainError::ZeroBatchSize);
        }
        Ok(())
    }
}

/// Pull an arbitrary requested difficulty into the supported range.
pub fn clamp_difficulty(requested: usize) -> usize {
    requested.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}
