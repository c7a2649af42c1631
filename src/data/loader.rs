// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads one split of a sentence-pair corpus from a tab-separated
// file into RawRecords.
//
// Two layouts ship as presets:
//
//   Quora (BiMPM split, no header):
//     label \t question1 \t question2 \t pair_id
//
//   SNLI / MultiNLI (header row, 14 columns):
//     gold_label \t parse1 \t parse2 \t bparse1 \t bparse2
//       \t sentence1 \t sentence2 \t captionID \t pairID ...
//     rows with gold_label "-" have no annotator consensus and
//     are skipped; parentheses left over from parse trees are
//     removed before tokenization
//
// Anything else can be described with a Custom layout.
//
// A row with too few columns is a MalformedRecord error carrying
// the file name and 1-based line number. It is never skipped: a
// silently shorter split would look valid downstream.

use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::error::{PreprocessError, Result};
use crate::domain::record::RawRecord;
use crate::domain::traits::RecordSource;

/// Column layout of a tab-separated corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsvLayout {
    pub label_column:      usize,
    pub premise_column:    usize,
    pub hypothesis_column: usize,

    /// Column holding the pair id; None numbers records by line
    pub id_column: Option<usize>,

    /// Skip the first line
    #[serde(default)]
    pub has_header: bool,

    /// Rows carrying this label are dropped
    #[serde(default)]
    pub skip_label: Option<String>,

    /// Remove '(' and ')' from both sentences
    #[serde(default)]
    pub strip_parentheses: bool,
}

impl TsvLayout {
    pub fn quora() -> Self {
        Self {
            label_column:      0,
            premise_column:    1,
            hypothesis_column: 2,
            id_column:         Some(3),
            has_header:        false,
            skip_label:        None,
            strip_parentheses: false,
        }
    }

    pub fn snli() -> Self {
        Self {
            label_column:      0,
            premise_column:    5,
            hypothesis_column: 6,
            id_column:         Some(8),
            has_header:        true,
            skip_label:        Some("-".into()),
            strip_parentheses: true,
        }
    }

    /// Number of columns a row needs to be usable
    fn required_columns(&self) -> usize {
        [self.label_column, self.premise_column, self.hypothesis_column]
            .into_iter()
            .chain(self.id_column)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Corpus format as written in the config file:
/// `"quora"`, `"snli"` or `{"custom": { ...TsvLayout... }}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusFormat {
    #[default]
    Quora,
    Snli,
    Custom(TsvLayout),
}

impl CorpusFormat {
    pub fn layout(&self) -> TsvLayout {
        match self {
            CorpusFormat::Quora          => TsvLayout::quora(),
            CorpusFormat::Snli           => TsvLayout::snli(),
            CorpusFormat::Custom(layout) => layout.clone(),
        }
    }
}

/// Loads one split from a TSV file.
/// Implements the RecordSource trait from Layer 3.
#[derive(Debug, Clone)]
pub struct TsvLoader {
    path:   PathBuf,
    layout: TsvLayout,
}

impl TsvLoader {
    pub fn new(path: impl Into<PathBuf>, layout: TsvLayout) -> Self {
        Self { path: path.into(), layout }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse records from any buffered reader; `origin` names the
    /// source in error messages.
    pub fn parse<R: BufRead>(&self, reader: R, origin: &str) -> Result<Vec<RawRecord>> {
        let layout   = &self.layout;
        let required = layout.required_columns();

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (i, line) in reader.lines().enumerate() {
            let line    = line?;
            let line_no = i + 1;

            if i == 0 && layout.has_header {
                continue;
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < required {
                return Err(PreprocessError::MalformedRecord {
                    file:   origin.to_string(),
                    line:   line_no,
                    reason: format!("expected at least {required} columns, found {}", columns.len()),
                });
            }

            let label = columns[layout.label_column].trim();
            if layout.skip_label.as_deref() == Some(label) {
                skipped += 1;
                continue;
            }

            let id = match layout.id_column {
                Some(c) => columns[c].trim().to_string(),
                None    => line_no.to_string(),
            };
            if label.is_empty() || id.is_empty() {
                return Err(PreprocessError::MalformedRecord {
                    file:   origin.to_string(),
                    line:   line_no,
                    reason: "empty label or id field".into(),
                });
            }

            let clean = |s: &str| {
                if layout.strip_parentheses {
                    s.replace(['(', ')'], "")
                } else {
                    s.to_string()
                }
            };

            records.push(RawRecord::new(
                clean(columns[layout.premise_column]),
                clean(columns[layout.hypothesis_column]),
                label,
                id,
            ));
        }

        if skipped > 0 {
            tracing::debug!("{}: skipped {} rows without a usable label", origin, skipped);
        }
        Ok(records)
    }
}

impl RecordSource for TsvLoader {
    fn read_records(&self) -> Result<Vec<RawRecord>> {
        let file = File::open(&self.path).map_err(|source| PreprocessError::Read {
            path: self.path.display().to_string(),
            source,
        })?;

        let records = self.parse(BufReader::new(file), &self.path.display().to_string())?;
        tracing::info!("Read {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
