// ============================================================
// Layer 5 — Coverage Report
// ============================================================
// Records how well the worddict covers each split, one CSV row
// per split, so a run can be sanity-checked without loading the
// JSON artifacts.
//
// Columns:
//   - split:           train / dev / test
//   - records:         number of indexed records
//   - tokens:          total indices over premises + hypotheses
//   - oov_tokens:      indices equal to the OOV index
//   - empty_sequences: sentences left with no tokens at all
//   - oov_rate:        oov_tokens / tokens
//
// Output file: {target_dir}/report.csv
//
//   split,records,tokens,oov_tokens,empty_sequences,oov_rate
//   train,363846,8306126,61234,12,0.007372
//   dev,40430,923120,15012,0,0.016262
//
// The file is rewritten on every run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::data::vocabulary::OOV_INDEX;
use crate::domain::record::{IndexedRecord, Split};

pub const REPORT_FILE: &str = "report.csv";

/// Coverage figures of one indexed split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub split:           Split,
    pub records:         usize,
    pub tokens:          usize,
    pub oov_tokens:      usize,
    pub empty_sequences: usize,
}

impl SplitStats {
    pub fn from_records(split: Split, records: &[IndexedRecord]) -> Self {
        let mut stats = Self {
            split,
            records:         records.len(),
            tokens:          0,
            oov_tokens:      0,
            empty_sequences: 0,
        };

        for r in records {
            for seq in [&r.premise_indices, &r.hypothesis_indices] {
                stats.tokens     += seq.len();
                stats.oov_tokens += seq.iter().filter(|&&i| i == OOV_INDEX).count();
                if seq.is_empty() {
                    stats.empty_sequences += 1;
                }
            }
        }
        stats
    }

    /// Fraction of tokens mapped to OOV; 0 for a split without tokens
    pub fn oov_rate(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.oov_tokens as f64 / self.tokens as f64
        }
    }
}

/// Writes SplitStats rows to a CSV file.
pub struct ReportWriter {
    csv_path: PathBuf,
}

impl ReportWriter {
    /// Create the report, truncating any previous run's file.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join(REPORT_FILE);
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "split,records,tokens,oov_tokens,empty_sequences,oov_rate")?;

        Ok(Self { csv_path })
    }

    /// Append one split's row
    pub fn log(&self, s: &SplitStats) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{},{},{},{:.6}",
            s.split,
            s.records,
            s.tokens,
            s.oov_tokens,
            s.empty_sequences,
            s.oov_rate(),
        )?;

        tracing::info!(
            "{}: {} records, {} tokens, OOV rate {:.4}",
            s.split,
            s.records,
            s.tokens,
            s.oov_rate(),
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_records() {
        let records = vec![
            IndexedRecord::new(vec![2, OOV_INDEX, 3], vec![], 0, "a"),
            IndexedRecord::new(vec![OOV_INDEX], vec![4], 1, "b"),
        ];
        let s = SplitStats::from_records(Split::Dev, &records);
        assert_eq!(s.records, 2);
        assert_eq!(s.tokens, 5);
        assert_eq!(s.oov_tokens, 2);
        assert_eq!(s.empty_sequences, 1);
        assert!((s.oov_rate() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_rate_of_empty_split() {
        assert_eq!(SplitStats::from_records(Split::Test, &[]).oov_rate(), 0.0);
    }

    #[test]
    fn test_csv_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::create(dir.path()).unwrap();
        let stats  = SplitStats::from_records(
            Split::Train,
            &[IndexedRecord::new(vec![2, 1], vec![3, 4], 0, "x")],
        );
        writer.log(&stats).unwrap();

        let text = fs::read_to_string(writer.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "train,1,4,1,0,0.250000");

        // A second run starts a fresh file
        let again = ReportWriter::create(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(again.csv_path()).unwrap().lines().count(), 1);
    }
}
