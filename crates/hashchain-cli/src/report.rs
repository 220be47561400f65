use std::fmt;

use hashchain_core::{constants::HASH_PREVIEW_LEN, BlockRecord, Fault, RecordStatus, Verdict};

fn short_hash(hash: &str) -> String {
    if hash.chars().count() <= HASH_PREVIEW_LEN {
        hash.to_string()
    } else {
        let preview: String = hash.chars().take(HASH_PREVIEW_LEN).collect();
        format!("{preview}...")
    }
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "BAD"
    }
}

/// Plain-text table of every block followed by the verdict.
pub struct Report<'a> {
    pub records: &'a [BlockRecord],
    pub statuses: &'a [RecordStatus],
    pub verdict: &'a Verdict,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4}  {:>6}  {:>10}  {:<13}  {:<13}  {:<7}  {:<4}  data",
            "pos", "index", "nonce", "hash", "previous", "content", "link"
        )?;
        for (record, status) in self.records.iter().zip(self.statuses) {
            let link = status.link_valid.map_or("-", mark);
            writeln!(
                f,
                "{:>4}  {:>6}  {:>10}  {:<13}  {:<13}  {:<7}  {:<4}  {}",
                status.position,
                record.index(),
                record.nonce(),
                short_hash(record.hash()),
                short_hash(record.previous_hash()),
                mark(status.content_valid),
                link,
                record.data()
            )?;
        }
        match self.verdict {
            Verdict::Valid => writeln!(f, "chain valid"),
            Verdict::Empty => writeln!(f, "chain invalid: chain is empty"),
            Verdict::Broken(fault @ Fault::ContentMismatch { .. }) => {
                writeln!(f, "chain invalid: content mismatch, {fault}")
            }
            Verdict::Broken(fault @ Fault::LinkMismatch { .. }) => {
                writeln!(f, "chain invalid: link mismatch, {fault}")
            }
        }
    }
}
