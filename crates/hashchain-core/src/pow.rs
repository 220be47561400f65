//! Proof-of-work over a record's nonce.
//!
//! A record meets `difficulty` when the first `difficulty` characters of its
//! hex hash are all `'0'`. Expected work is about `16^difficulty` hashes.

use tracing::{debug, info};

use crate::{BlockRecord, HashTemplate};

pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Mine the record by incrementing its nonce until its hash meets
/// `difficulty`. The nonce always advances at least once, so the result
/// equals a loop of [`try_next_nonce`] from the same record.
pub fn mine_block(record: BlockRecord, difficulty: usize) -> BlockRecord {
    let template = HashTemplate::new(&record);
    let mut nonce = record.nonce();
    loop {
        nonce = nonce.wrapping_add(1);
        let hash = template.hash_with_nonce(nonce);
        if meets_difficulty(&hash, difficulty) {
            let mined = record.with_nonce(nonce, hash);
            info!(
                index = mined.index(),
                nonce,
                hash = mined.hash(),
                "mined block"
            );
            return mined;
        }
    }
}

/// Advance the nonce by exactly one and rehash. Returns the new record and
/// whether it now meets `difficulty`.
pub fn try_next_nonce(record: BlockRecord, difficulty: usize) -> (BlockRecord, bool) {
    let nonce = record.nonce().wrapping_add(1);
    let hash = HashTemplate::new(&record).hash_with_nonce(nonce);
    let done = meets_difficulty(&hash, difficulty);
    (record.with_nonce(nonce, hash), done)
}

/// Result of advancing a [`MiningSession`].
pub enum Outcome {
    Continue(MiningSession),
    Done(BlockRecord),
}

/// A resumable nonce search for one candidate record.
///
/// The session owns its candidate; dropping it abandons the search. Driving a
/// session to completion, in any batch sizes, produces exactly the record
/// [`mine_block`] returns for the same input.
pub struct MiningSession {
    record: BlockRecord,
    difficulty: usize,
    template: HashTemplate,
    attempts: u64,
}

impl MiningSession {
    pub fn new(record: BlockRecord, difficulty: usize) -> Self {
        let template = HashTemplate::new(&record);
        Self {
            record,
            difficulty,
            template,
            attempts: 0,
        }
    }

    pub fn record(&self) -> &BlockRecord {
        &self.record
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Hashes computed so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// One unit of work: try the next nonce.
    pub fn step(mut self) -> Outcome {
        let nonce = self.record.nonce().wrapping_add(1);
        let hash = self.template.hash_with_nonce(nonce);
        self.attempts += 1;
        self.record = self.record.with_nonce(nonce, hash);
        if self.record.meets_difficulty(self.difficulty) {
            info!(
                index = self.record.index(),
                nonce,
                attempts = self.attempts,
                hash = self.record.hash(),
                "mined block"
            );
            Outcome::Done(self.record)
        } else {
            Outcome::Continue(self)
        }
    }

    /// Up to `batch` steps, then yield back to the caller.
    pub fn run(self, batch: usize) -> Outcome {
        let mut session = self;
        for _ in 0..batch {
            match session.step() {
                Outcome::Continue(next) => session = next,
                done @ Outcome::Done(_) => return done,
            }
        }
        debug!(
            index = session.record.index(),
            nonce = session.record.nonce(),
            attempts = session.attempts,
            "mining batch exhausted"
        );
        Outcome::Continue(session)
    }

    /// Step until done. Unbounded.
    pub fn finish(self) -> BlockRecord {
        let mut session = self;
        loop {
            match session.step() {
                Outcome::Continue(next) => session = next,
                Outcome::Done(record) => return record,
            }
        }
    }
}
