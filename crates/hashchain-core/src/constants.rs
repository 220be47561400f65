pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const HASH_PREVIEW_LEN: usize = 10;

pub const GENESIS_INDEX: u64 = 0;
pub const GENESIS_TIMESTAMP: u64 = 0;
pub const GENESIS_DATA: &str = "Genesis Block";
pub const GENESIS_PREVIOUS_HASH: &str = "0";

pub const MIN_DIFFICULTY: usize = 1;
pub const MAX_DIFFICULTY: usize = 10;
pub const DEFAULT_DIFFICULTY: usize = 2;

/// Nonces tried per cooperative mining batch.
pub const MINING_BATCH_SIZE: usize = 8000;
/// Nonces per chunk handed to the rayon search.
pub const PARALLEL_CHUNK_SIZE: u64 = 1 << 16;
