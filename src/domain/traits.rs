// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer reads splits through RecordSource and
// never learns whether they came from a Quora TSV, an SNLI TSV,
// or a Vec built in a test.

use crate::domain::error::Result;
use crate::domain::record::RawRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the raw records of one split.
///
/// Implementations:
///   - TsvLoader        → tab-separated corpus files
///   - Vec<RawRecord>   → records already in memory
pub trait RecordSource {
    /// Read every record of this source, in corpus order.
    fn read_records(&self) -> Result<Vec<RawRecord>>;

    /// Short human-readable name used in log lines
    fn describe(&self) -> String;
}

impl RecordSource for Vec<RawRecord> {
    fn read_records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory records", self.len())
    }
}
