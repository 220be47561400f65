//! In-memory chain: a mined genesis record followed by appended records.
//!
//! The chain never rejects a record on append or replace; call
//! [`Chain::validate`] for the verdict.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::config::ChainConfig;
use crate::constants::{
    GENESIS_DATA, GENESIS_INDEX, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP,
};
use crate::error::{ChainError, Result};
use crate::patch::BlockPatch;
use crate::pow::{mine_block, MiningSession};
use crate::validate::{is_chain_valid, validate_chain, Verdict};
use crate::BlockRecord;

#[derive(Clone, Debug)]
pub struct Chain {
    blocks: Vec<BlockRecord>,
    difficulty: usize,
}

impl Chain {
    /// Create a chain holding only the genesis record, mined at `difficulty`.
    pub fn new(difficulty: usize) -> Self {
        Self {
            blocks: vec![genesis_block(difficulty)],
            difficulty,
        }
    }

    /// Wrap an existing sequence, e.g. one decoded from JSON. Nothing is checked.
    pub fn with_blocks(blocks: Vec<BlockRecord>, difficulty: usize) -> Self {
        Self { blocks, difficulty }
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.difficulty))
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<BlockRecord> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn latest(&self) -> Option<&BlockRecord> {
        self.blocks.last()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Future mining only; existing records keep the difficulty they were mined at.
    pub fn set_difficulty(&mut self, difficulty: usize) {
        self.difficulty = difficulty;
    }

    /// Append a record as-is. Mining it is the caller's job.
    pub fn add_block(&mut self, record: BlockRecord) {
        self.blocks.push(record);
    }

    /// Build, mine and append a record carrying `data`, stamped with the
    /// current time.
    pub fn add_block_with_data(&mut self, data: impl Into<String>) -> &BlockRecord {
        self.add_block_with_data_at(data, now_millis())
    }

    pub fn add_block_with_data_at(
        &mut self,
        data: impl Into<String>,
        timestamp: u64,
    ) -> &BlockRecord {
        let candidate = self.candidate(data.into(), timestamp);
        let mined = mine_block(candidate, self.difficulty);
        self.push_mined(mined)
    }

    /// The unmined record `add_block_with_data` would start from.
    pub fn next_candidate(&self, data: impl Into<String>) -> BlockRecord {
        self.candidate(data.into(), now_millis())
    }

    /// [`Chain::next_candidate`] as a resumable session. Hand the finished
    /// record to [`Chain::add_block`].
    pub fn start_mining(&self, data: impl Into<String>) -> MiningSession {
        MiningSession::new(self.next_candidate(data), self.difficulty)
    }

    /// Append `count` blocks with generated payloads. Returns how many were added.
    pub fn auto_mine(&mut self, count: usize) -> usize {
        for _ in 0..count {
            let data = format!("Transaction {}", self.blocks.len());
            self.add_block_with_data(data);
        }
        count
    }

    /// Replace every record verbatim. Nothing is re-mined or rejected; a
    /// replacement that does not validate is accepted and logged at `warn`.
    pub fn set_chain(&mut self, records: Vec<BlockRecord>) {
        if !records.is_empty() && !is_chain_valid(&records) {
            warn!(len = records.len(), "chain replaced with an invalid sequence");
        }
        self.blocks = records;
    }

    /// Drop every record and start over from a fresh genesis at the current difficulty.
    pub fn reset(&mut self) {
        self.blocks = vec![genesis_block(self.difficulty)];
        info!(difficulty = self.difficulty, "chain reset");
    }

    /// Overwrite fields of the record at `position` without re-mining it.
    pub fn edit_block(&mut self, position: usize, patch: &BlockPatch) -> Result<&BlockRecord> {
        let len = self.blocks.len();
        let slot = self
            .blocks
            .get_mut(position)
            .ok_or(ChainError::NoSuchBlock { position, len })?;
        *slot = patch.apply(slot.clone());
        Ok(&*slot)
    }

    pub fn validate(&self) -> Verdict {
        validate_chain(&self.blocks)
    }

    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.blocks)
    }

    fn candidate(&self, data: String, timestamp: u64) -> BlockRecord {
        let previous_hash = self
            .latest()
            .map_or(GENESIS_PREVIOUS_HASH, BlockRecord::hash);
        BlockRecord::new(self.blocks.len() as u64, timestamp, data, previous_hash)
    }

    fn push_mined(&mut self, record: BlockRecord) -> &BlockRecord {
        self.blocks.push(record);
        &self.blocks[self.blocks.len() - 1]
    }
}

/// The genesis record mined at `difficulty`. Its timestamp is fixed, so every
/// chain built at the same difficulty starts from the same record.
pub fn genesis_block(difficulty: usize) -> BlockRecord {
    let genesis = BlockRecord::new(
        GENESIS_INDEX,
        GENESIS_TIMESTAMP,
        GENESIS_DATA,
        GENESIS_PREVIOUS_HASH,
    );
    mine_block(genesis, difficulty)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::Outcome;
    use crate::validate::Fault;

    #[test]
    fn genesis_block_example() {
        let genesis = genesis_block(2);
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.timestamp(), 0);
        assert_eq!(genesis.data(), "Genesis Block");
        assert_eq!(genesis.previous_hash(), "0");
        assert_eq!(genesis.nonce(), 18);
        assert!(genesis.hash().starts_with("00"));
    }

    #[test]
    fn new_chain_holds_valid_genesis() {
        let chain = Chain::new(2);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.difficulty(), 2);
        assert!(chain.is_valid());
        assert_eq!(chain.latest(), Some(&genesis_block(2)));
    }

    #[test]
    fn from_config_validates() {
        assert!(Chain::from_config(&ChainConfig::new(3, 1).unwrap()).is_ok());
        let bad = ChainConfig {
            difficulty: 42,
            batch_size: 1,
        };
        assert!(matches!(
            Chain::from_config(&bad),
            Err(ChainError::DifficultyOutOfRange(42))
        ));
    }

    #[test]
    fn add_block_with_data_links_and_mines() {
        let mut chain = Chain::new(2);
        let genesis_hash = chain.blocks()[0].hash().to_string();
        let block = chain
            .add_block_with_data_at("Alice pays Bob 10", 1_700_000_000_000)
            .clone();
        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), genesis_hash);
        assert_eq!(block.nonce(), 461);
        assert!(block.hash().starts_with("00"));
        assert_eq!(chain.len(), 2);
        assert!(chain.is_valid());
    }

    #[test]
    fn add_block_with_data_uses_wall_clock() {
        let mut chain = Chain::new(1);
        let before = now_millis();
        let block = chain.add_block_with_data("now").clone();
        assert!(block.timestamp() >= before);
        assert!(chain.is_valid());
    }

    #[test]
    fn add_block_skips_validation() {
        let mut chain = Chain::new(1);
        chain.add_block(BlockRecord::new(1, 0, "unmined", "wrong"));
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_valid());
    }

    #[test]
    fn session_result_can_be_appended() {
        let mut chain = Chain::new(2);
        let mut outcome = chain.start_mining("cooperative").run(50);
        let mined = loop {
            match outcome {
                Outcome::Continue(session) => outcome = session.run(50),
                Outcome::Done(record) => break record,
            }
        };
        assert_eq!(mined.index(), 1);
        chain.add_block(mined);
        assert!(chain.is_valid());
    }

    #[test]
    fn next_candidate_links_to_latest() {
        let mut chain = Chain::new(1);
        chain.add_block_with_data_at("one", 1);
        let candidate = chain.next_candidate("two");
        assert_eq!(candidate.index(), 2);
        assert_eq!(candidate.nonce(), 0);
        assert_eq!(candidate.previous_hash(), chain.blocks()[1].hash());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn with_blocks_keeps_records_verbatim() {
        let records = vec![BlockRecord::new(0, 0, "unmined", "0")];
        let chain = Chain::with_blocks(records.clone(), 4);
        assert_eq!(chain.blocks(), records.as_slice());
        assert_eq!(chain.difficulty(), 4);
        assert!(chain.is_valid());
    }

    #[test]
    fn set_difficulty_only_affects_new_blocks() {
        let mut chain = Chain::new(1);
        let genesis = chain.blocks()[0].clone();
        chain.set_difficulty(3);
        assert_eq!(chain.blocks()[0], genesis);
        let block = chain.add_block_with_data_at("harder", 5).clone();
        assert!(block.hash().starts_with("000"));
        assert!(chain.is_valid());
    }

    #[test]
    fn auto_mine_appends_numbered_transactions() {
        let mut chain = Chain::new(1);
        assert_eq!(chain.auto_mine(3), 3);
        let data: Vec<&str> = chain.blocks().iter().map(BlockRecord::data).collect();
        assert_eq!(
            data,
            ["Genesis Block", "Transaction 1", "Transaction 2", "Transaction 3"]
        );
        assert!(chain.is_valid());
    }

    #[test]
    fn set_chain_replaces_everything() {
        let mut chain = Chain::new(1);
        chain.auto_mine(2);
        let mut records = chain.blocks().to_vec();
        records.truncate(1);
        chain.set_chain(records);
        assert_eq!(chain.len(), 1);

        chain.set_chain(Vec::new());
        assert!(chain.is_empty());
        assert!(!chain.is_valid());
        // An emptied chain links its next block to the genesis sentinel.
        let block = chain.add_block_with_data_at("orphan", 1).clone();
        assert_eq!(block.index(), 0);
        assert_eq!(block.previous_hash(), "0");
    }

    #[test]
    fn set_chain_accepts_invalid_sequence_verbatim() {
        let mut chain = Chain::new(1);
        let tampered = vec![BlockRecord::new(0, 0, "unmined", "0").with_nonce(7, "beef".into())];
        chain.set_chain(tampered.clone());
        assert_eq!(chain.blocks(), tampered.as_slice());
        assert!(!chain.is_valid());
    }

    #[test]
    fn reset_restores_genesis_at_current_difficulty() {
        let mut chain = Chain::new(1);
        chain.auto_mine(2);
        chain.set_difficulty(2);
        chain.reset();
        assert_eq!(chain.blocks(), [genesis_block(2)]);
    }

    #[test]
    fn edit_block_flips_validity() {
        let mut chain = Chain::new(2);
        chain.add_block_with_data_at("Alice pays Bob 10", 1_700_000_000_000);
        assert!(chain.is_valid());

        let edited = chain
            .edit_block(1, &BlockPatch::default().data("Alice pays Bob 11"))
            .unwrap()
            .clone();
        assert_eq!(edited.data(), "Alice pays Bob 11");
        assert!(!chain.is_valid());
        assert!(chain.blocks()[0].is_content_valid());
        assert!(matches!(
            chain.validate(),
            Verdict::Broken(Fault::ContentMismatch { position: 1, .. })
        ));
    }

    #[test]
    fn edit_block_out_of_range() {
        let mut chain = Chain::new(1);
        let err = chain.edit_block(5, &BlockPatch::default()).unwrap_err();
        assert!(matches!(err, ChainError::NoSuchBlock { position: 5, len: 1 }));
    }
}
