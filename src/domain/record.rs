// ============================================================
// Layer 3 — Sentence-Pair Records
// ============================================================
// A corpus for paraphrase identification or entailment is a
// list of sentence pairs with a class label:
//
//   premise:    "How do I learn Rust quickly?"
//   hypothesis: "What is the fastest way to learn Rust?"
//   label:      "1"          (Quora: duplicate)
//   id:         "402555"
//
// RawRecord is what the loader hands us. IndexedRecord is what
// the model consumes: every token replaced by its vocabulary
// index, every label replaced by its class index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Class index given to records whose gold label is hidden
/// (unlabelled test sets). Never produced by the label encoder.
pub const HIDDEN_LABEL_INDEX: i64 = -1;

/// One raw sentence pair, exactly as read from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// First sentence of the pair (the question / premise)
    pub premise: String,

    /// Second sentence of the pair (the candidate / hypothesis)
    pub hypothesis: String,

    /// Label string as it appears in the corpus
    pub label: String,

    /// Identifier of the pair, kept for traceability
    pub id: String,
}

impl RawRecord {
    pub fn new(
        premise:    impl Into<String>,
        hypothesis: impl Into<String>,
        label:      impl Into<String>,
        id:         impl Into<String>,
    ) -> Self {
        Self {
            premise:    premise.into(),
            hypothesis: hypothesis.into(),
            label:      label.into(),
            id:         id.into(),
        }
    }
}

/// A sentence pair mapped onto the vocabulary.
///
/// The index sequences are NOT padded. `premise_length` and
/// `hypothesis_length` carry the real token counts so the
/// batcher can build masks once it pads to a common length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub premise_indices:    Vec<usize>,
    pub premise_length:     usize,
    pub hypothesis_indices: Vec<usize>,
    pub hypothesis_length:  usize,

    /// Class index from the label encoder, or HIDDEN_LABEL_INDEX
    pub label_index: i64,

    pub id: String,
}

impl IndexedRecord {
    pub fn new(
        premise_indices:    Vec<usize>,
        hypothesis_indices: Vec<usize>,
        label_index:        i64,
        id:                 impl Into<String>,
    ) -> Self {
        Self {
            premise_length:    premise_indices.len(),
            hypothesis_length: hypothesis_indices.len(),
            premise_indices,
            hypothesis_indices,
            label_index,
            id: id.into(),
        }
    }

    /// True when the gold label of this record is unknown
    pub fn is_hidden(&self) -> bool {
        self.label_index == HIDDEN_LABEL_INDEX
    }
}

/// The three corpus splits a preprocessing run handles.
/// Only `Train` may contribute to the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Dev, Split::Test];

    pub fn name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev   => "dev",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
