//! Chain validity checks.
//!
//! Every record, genesis included, must be content-valid: its stored hash must
//! match the hash recomputed from its fields. Every record after the first must
//! also be link-valid: its `previous_hash` must equal the stored hash of the
//! record before it. The genesis record has no link check; its `"0"` sentinel
//! is not inspected.
//!
//! These functions take any slice of records, not only a live [`crate::Chain`],
//! so hand-edited sequences can be checked as they are.

use serde::Serialize;
use tracing::debug;

use crate::BlockRecord;

/// Why a chain failed, with both hashes that disagreed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fault {
    /// The stored hash is not the hash of the record's fields.
    #[serde(rename_all = "camelCase")]
    ContentMismatch {
        position: usize,
        index: u64,
        stored: String,
        computed: String,
    },
    /// The record does not point at its predecessor's hash.
    #[serde(rename_all = "camelCase")]
    LinkMismatch {
        position: usize,
        index: u64,
        previous_hash: String,
        predecessor_hash: String,
    },
}

impl Fault {
    pub fn position(&self) -> usize {
        match self {
            Fault::ContentMismatch { position, .. } | Fault::LinkMismatch { position, .. } => {
                *position
            }
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::ContentMismatch {
                position,
                index,
                stored,
                computed,
            } => write!(
                f,
                "block {index} at position {position}: stored hash {stored} does not match computed hash {computed}"
            ),
            Fault::LinkMismatch {
                position,
                index,
                previous_hash,
                predecessor_hash,
            } => write!(
                f,
                "block {index} at position {position}: previous hash {previous_hash} does not match predecessor hash {predecessor_hash}"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "fault", rename_all = "camelCase")]
pub enum Verdict {
    Valid,
    Empty,
    Broken(Fault),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Verdict::Broken(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Per-record findings, computed without stopping at the first failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatus {
    pub position: usize,
    pub index: u64,
    pub content_valid: bool,
    /// `None` for the first record, which has no predecessor.
    pub link_valid: Option<bool>,
}

impl RecordStatus {
    pub fn is_valid(&self) -> bool {
        self.content_valid && self.link_valid.unwrap_or(true)
    }
}

fn content_fault(position: usize, record: &BlockRecord) -> Option<Fault> {
    let computed = record.calculate_hash();
    if computed == record.hash() {
        return None;
    }
    Some(Fault::ContentMismatch {
        position,
        index: record.index(),
        stored: record.hash().to_string(),
        computed,
    })
}

fn link_fault(position: usize, record: &BlockRecord, previous: &BlockRecord) -> Option<Fault> {
    if record.previous_hash() == previous.hash() {
        return None;
    }
    Some(Fault::LinkMismatch {
        position,
        index: record.index(),
        previous_hash: record.previous_hash().to_string(),
        predecessor_hash: previous.hash().to_string(),
    })
}

/// Check the records in order and report the first fault. For each record the
/// content check runs before the link check.
pub fn validate_chain(records: &[BlockRecord]) -> Verdict {
    let Some(genesis) = records.first() else {
        return Verdict::Empty;
    };
    if let Some(fault) = content_fault(0, genesis) {
        debug!(%fault, "chain invalid");
        return Verdict::Broken(fault);
    }
    for (position, pair) in records.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let position = position + 1;
        let fault = content_fault(position, current)
            .or_else(|| link_fault(position, current, previous));
        if let Some(fault) = fault {
            debug!(%fault, "chain invalid");
            return Verdict::Broken(fault);
        }
    }
    Verdict::Valid
}

/// `false` for an empty slice or any fault.
pub fn is_chain_valid(records: &[BlockRecord]) -> bool {
    validate_chain(records).is_valid()
}

/// Content and link status of every record.
pub fn inspect_chain(records: &[BlockRecord]) -> Vec<RecordStatus> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| RecordStatus {
            position,
            index: record.index(),
            content_valid: record.is_content_valid(),
            link_valid: position
                .checked_sub(1)
                .map(|prev| record.previous_hash() == records[prev].hash()),
        })
        .collect()
}
