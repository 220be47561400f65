use crate::{pow::meets_difficulty, BlockRecord, HashTemplate};
use rayon::prelude::*;
use tracing::{debug, info};

/// Mines a record by searching nonces in parallel, one chunk of `chunk`
/// nonces at a time, starting after the current nonce. Each chunk is scanned
/// with `find_first` and the search wraps from `u64::MAX` to 0, so the result
/// equals [`crate::pow::mine_block`] on the same input.
pub fn mine_block_parallel(record: BlockRecord, difficulty: usize, chunk: u64) -> BlockRecord {
    let span = chunk.max(1) - 1;
    // Every field except the nonce is fixed for the whole search.
    let template = HashTemplate::new(&record);
    let mut start = record.nonce().wrapping_add(1);

    loop {
        let end = start.saturating_add(span);
        let found = (start..=end).into_par_iter().find_first(|nonce| {
            meets_difficulty(&template.hash_with_nonce(*nonce), difficulty)
        });

        if let Some(nonce) = found {
            let hash = template.hash_with_nonce(nonce);
            info!(
                index = record.index(),
                nonce,
                hash = %hash,
                "mined block in parallel"
            );
            return record.with_nonce(nonce, hash);
        }

        debug!(index = record.index(), start, end, "chunk exhausted");
        if end == u64::MAX {
            // Nonce space exhausted, wrap around.
            start = 0;
        } else {
            start = end + 1;
        }
    }
}
