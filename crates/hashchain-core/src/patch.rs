//! Typed field overrides for hand-edited records.
//!
//! A patch never re-mines: the result keeps whatever `hash` the patch (or the
//! original record) carries, which is how tampering becomes visible to the
//! validator.

use serde::{Deserialize, Serialize};

use crate::BlockRecord;

/// The editable fields of a record. `index` is not editable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockPatch {
    pub data: Option<String>,
    pub timestamp: Option<u64>,
    pub previous_hash: Option<String>,
    pub nonce: Option<u64>,
    pub hash: Option<String>,
}

impl BlockPatch {
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
            && self.timestamp.is_none()
            && self.previous_hash.is_none()
            && self.nonce.is_none()
            && self.hash.is_none()
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn previous_hash(mut self, previous_hash: impl Into<String>) -> Self {
        self.previous_hash = Some(previous_hash.into());
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Merge into `record`. Fields left `None` are kept.
    pub fn apply(&self, record: BlockRecord) -> BlockRecord {
        let mut data = record.to_data();
        if let Some(value) = &self.data {
            data.data = value.clone();
        }
        if let Some(value) = self.timestamp {
            data.timestamp = value;
        }
        if let Some(value) = &self.previous_hash {
            data.previous_hash = value.clone();
        }
        if let Some(value) = self.nonce {
            data.nonce = value;
        }
        if let Some(value) = &self.hash {
            data.hash = value.clone();
        }
        BlockRecord::from_data(data)
    }
}
