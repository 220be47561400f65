use thiserror::Error;

use crate::constants::{MAX_DIFFICULTY, MIN_DIFFICULTY};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(
        "difficulty {0} is outside the supported range {min}..={max}",
        min = MIN_DIFFICULTY,
        max = MAX_DIFFICULTY
    )]
    DifficultyOutOfRange(usize),

    #[error("mining batch size must be at least 1")]
    ZeroBatchSize,

    #[error("no block at position {position} (chain has {len} blocks)")]
    NoSuchBlock { position: usize, len: usize },

    #[error("malformed chain document: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
