use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;
pub mod patch;
pub mod pow;
pub mod validate;

pub use chain::Chain;
pub use config::ChainConfig;
pub use error::{ChainError, Result};
pub use patch::BlockPatch;
pub use pow::{mine_block, try_next_nonce, MiningSession, Outcome};
pub use validate::{inspect_chain, is_chain_valid, validate_chain, Fault, RecordStatus, Verdict};

/// A digest that renders its output as lowercase hex.
///
/// Records hash with [`Sha256Hash`]; any other deterministic digest can be
/// plugged into [`BlockRecord::calculate_hash_with`].
pub trait HashFunction {
    fn hex_digest(&self, input: &[u8]) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hash;

impl HashFunction for Sha256Hash {
    fn hex_digest(&self, input: &[u8]) -> String {
        hex::encode(Sha256::digest(input))
    }
}

/// Serialized shape of a record, as exchanged with callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockData {
    pub index: u64,
    pub timestamp: u64,
    pub data: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

/// One link of the chain.
///
/// A record is a value: mining and editing consume it and hand back a new one.
/// The stored `hash` is whatever was last computed or supplied, so it may
/// disagree with [`BlockRecord::calculate_hash`] after an edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BlockData", into = "BlockData")]
pub struct BlockRecord {
    index: u64,
    timestamp: u64,
    data: String,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl BlockRecord {
    /// Build a record with nonce 0 and its hash computed. No difficulty check.
    pub fn new(
        index: u64,
        timestamp: u64,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut record = Self {
            index,
            timestamp,
            data: data.into(),
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        record.hash = record.calculate_hash();
        record
    }

    /// Rebuild a record from its serialized form. `nonce` and `hash` are taken
    /// verbatim, nothing is recomputed.
    pub fn from_data(data: BlockData) -> Self {
        Self {
            index: data.index,
            timestamp: data.timestamp,
            data: data.data,
            previous_hash: data.previous_hash,
            nonce: data.nonce,
            hash: data.hash,
        }
    }

    pub fn to_data(&self) -> BlockData {
        self.clone().into()
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The string fed to the digest: index, previous hash, timestamp, data and
    /// nonce, numbers in decimal, concatenated in that order.
    pub fn preimage(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.index, self.previous_hash, self.timestamp, self.data, self.nonce
        )
    }

    pub fn calculate_hash(&self) -> String {
        HashTemplate::new(self).hash_with_nonce(self.nonce)
    }

    pub fn calculate_hash_with<H: HashFunction>(&self, hasher: &H) -> String {
        hasher.hex_digest(self.preimage().as_bytes())
    }

    pub fn is_content_valid(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        pow::meets_difficulty(&self.hash, difficulty)
    }

    /// Same fields with `nonce` and the hash already computed for it.
    pub(crate) fn with_nonce(mut self, nonce: u64, hash: String) -> Self {
        self.nonce = nonce;
        self.hash = hash;
        self
    }
}

impl From<BlockData> for BlockRecord {
    fn from(data: BlockData) -> Self {
        Self::from_data(data)
    }
}

impl From<BlockRecord> for BlockData {
    fn from(record: BlockRecord) -> Self {
        Self {
            index: record.index,
            timestamp: record.timestamp,
            data: record.data,
            previous_hash: record.previous_hash,
            nonce: record.nonce,
            hash: record.hash,
        }
    }
}

/// SHA-256 state primed with every field except the nonce, so a nonce search
/// only hashes the nonce suffix on top of a cloned state.
#[derive(Clone)]
pub(crate) struct HashTemplate {
    prefix: Sha256,
}

impl HashTemplate {
    pub(crate) fn new(record: &BlockRecord) -> Self {
        let prefix = Sha256::new_with_prefix(format!(
            "{}{}{}{}",
            record.index, record.previous_hash, record.timestamp, record.data
        ));
        Self { prefix }
    }

    pub(crate) fn hash_with_nonce(&self, nonce: u64) -> String {
        let mut hasher = self.prefix.clone();
        hasher.update(nonce.to_string());
        hex::encode(hasher.finalize())
    }
}

/// Parse a JSON array of serialized records.
pub fn chain_from_json(json: &str) -> Result<Vec<BlockRecord>> {
    Ok(serde_json::from_str(json)?)
}

pub fn chain_to_json(records: &[BlockRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_NONCE_D2: u64 = 18;
    const GENESIS_HASH_D2: &str =
        "00bc7ce8c5eb64025e04e041664ed2166864572733c7087851943c55fb14ecfc";

    #[test]
    fn new_record_hash_example() {
        let record = BlockRecord::new(0, 0, "Genesis Block", "0");
        assert_eq!(record.nonce(), 0);
        assert_eq!(
            record.hash(),
            "988c37d9df7b23e7462ca89ec726f16480efc0f7d7d42e17c0a4adc3b334b96b"
        );
    }

    #[test]
    fn preimage_field_order() {
        let record = BlockRecord::new(7, 1_700_000_000_000, "pay", "abc");
        assert_eq!(record.preimage(), "7abc1700000000000pay0");
    }

    #[test]
    fn calculate_hash_is_pure() {
        let record = BlockRecord::new(3, 1_600_000_000_000, "Bob pays Carol 4", "ff00");
        let h1 = record.calculate_hash();
        let h2 = record.calculate_hash();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), constants::HASH_HEX_SIZE);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn template_matches_full_preimage() {
        let record = BlockRecord::new(2, 99, "x", "prev");
        let template = HashTemplate::new(&record);
        for nonce in [0u64, 1, 17, 123_456] {
            let expected = Sha256Hash.hex_digest(format!("2prev99x{nonce}").as_bytes());
            assert_eq!(template.hash_with_nonce(nonce), expected);
        }
        assert_eq!(record.calculate_hash_with(&Sha256Hash), record.calculate_hash());
    }

    #[test]
    fn custom_hash_function_is_used() {
        struct Echo;
        impl HashFunction for Echo {
            fn hex_digest(&self, input: &[u8]) -> String {
                hex::encode(input)
            }
        }
        let record = BlockRecord::new(1, 2, "d", "p");
        assert_eq!(record.calculate_hash_with(&Echo), hex::encode("1p2d0"));
    }

    #[test]
    fn from_data_trusts_nonce_and_hash() {
        let data = BlockData {
            index: 1,
            timestamp: 5,
            data: "edited".into(),
            previous_hash: "abc".into(),
            nonce: 42,
            hash: "not-a-real-hash".into(),
        };
        let record = BlockRecord::from_data(data.clone());
        assert_eq!(record.nonce(), 42);
        assert_eq!(record.hash(), "not-a-real-hash");
        assert!(!record.is_content_valid());
        assert_eq!(record.to_data(), data);
    }

    #[test]
    fn serialization_uses_camel_case_shape() {
        let record = BlockData {
            index: 0,
            timestamp: 0,
            data: "Genesis Block".into(),
            previous_hash: "0".into(),
            nonce: GENESIS_NONCE_D2,
            hash: GENESIS_HASH_D2.into(),
        };
        let record = BlockRecord::from(record);
        let json = serde_json::to_string(&record).unwrap();
        let expected = format!(
            r#"{{"index":0,"timestamp":0,"data":"Genesis Block","previousHash":"0","nonce":18,"hash":"{GENESIS_HASH_D2}"}}"#
        );
        assert_eq!(json, expected);
        let back: BlockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(back.is_content_valid());
    }

    #[test]
    fn chain_json_rejects_garbage() {
        assert!(matches!(
            chain_from_json("[{\"index\":\"zero\"}]"),
            Err(ChainError::Decode(_))
        ));
        assert!(chain_from_json("[]").unwrap().is_empty());
    }

    #[test]
    fn hash_changes_with_every_field() {
        let base = BlockRecord::new(1, 10, "data", "prev");
        let variants = [
            BlockRecord::new(2, 10, "data", "prev"),
            BlockRecord::new(1, 11, "data", "prev"),
            BlockRecord::new(1, 10, "Data", "prev"),
            BlockRecord::new(1, 10, "data", "prev0"),
            base.clone().with_nonce(1, HashTemplate::new(&base).hash_with_nonce(1)),
        ];
        for variant in variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }
}
