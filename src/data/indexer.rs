// ============================================================
// Layer 4 — Indexer
// ============================================================
// Replaces every token of every sentence pair with its index in
// a fixed vocabulary, and every label with its class index.
//
//   tokens:  ["a", "cat", "purred"]
//   indices: [ 2,   3,     1     ]   ← "purred" is OOV
//
// Unknown tokens become the OOV index instead of disappearing, so
// the index sequence always has the same length as the token
// sequence. A literal "_PAD_" in the text is treated as unknown,
// so a real token can never look like padding. Records whose
// sentences are empty after filtering are kept with empty
// sequences, so split sizes stay verifiable.
//
// Records are independent once the vocabulary exists, so they are
// indexed in parallel with rayon. The collect preserves input order.

use rayon::prelude::*;

use crate::data::tokenizer::Tokenizer;
use crate::data::vocabulary::{LabelEncoder, Vocabulary, OOV_INDEX, PAD_INDEX};
use crate::domain::error::{PreprocessError, Result};
use crate::domain::record::{IndexedRecord, RawRecord, HIDDEN_LABEL_INDEX};

/// Borrows everything indexing needs; holds nothing mutable.
#[derive(Debug, Clone, Copy)]
pub struct Indexer<'a> {
    tokenizer:    &'a Tokenizer,
    vocabulary:   &'a Vocabulary,
    labels:       &'a LabelEncoder,
    hidden_label: Option<&'a str>,
}

impl<'a> Indexer<'a> {
    pub fn new(
        tokenizer:    &'a Tokenizer,
        vocabulary:   &'a Vocabulary,
        labels:       &'a LabelEncoder,
        hidden_label: Option<&'a str>,
    ) -> Self {
        Self { tokenizer, vocabulary, labels, hidden_label }
    }

    /// Map a token sequence onto vocabulary indices (OOV for unknowns).
    /// A literal padding token in the text becomes OOV: index 0 only
    /// ever comes from the batcher's padding.
    pub fn tokens_to_indices(&self, tokens: &[String]) -> Vec<usize> {
        tokens
            .iter()
            .map(|t| match self.vocabulary.index_of(t) {
                PAD_INDEX => OOV_INDEX,
                i         => i,
            })
            .collect()
    }

    /// Tokenize and index one sentence
    pub fn sentence_to_indices(&self, sentence: &str) -> Vec<usize> {
        self.tokens_to_indices(&self.tokenizer.tokenize(sentence))
    }

    /// Class index of a label, HIDDEN_LABEL_INDEX for the hidden
    /// placeholder, UnknownLabel for anything the training split lacked.
    pub fn label_index(&self, record: &RawRecord) -> Result<i64> {
        if Some(record.label.as_str()) == self.hidden_label {
            return Ok(HIDDEN_LABEL_INDEX);
        }
        self.labels
            .encode(&record.label)
            .map(|class| class as i64)
            .ok_or_else(|| PreprocessError::UnknownLabel {
                label: record.label.clone(),
                id:    record.id.clone(),
            })
    }

    pub fn index_record(&self, record: &RawRecord) -> Result<IndexedRecord> {
        let label_index = self.label_index(record)?;
        Ok(IndexedRecord::new(
            self.sentence_to_indices(&record.premise),
            self.sentence_to_indices(&record.hypothesis),
            label_index,
            record.id.clone(),
        ))
    }

    /// Index a whole split, preserving record order.
    pub fn transform(&self, records: &[RawRecord]) -> Result<Vec<IndexedRecord>> {
        records
            .par_iter()
            .map(|record| self.index_record(record))
            .collect()
    }
}

/// Inverse of indexing: look each index up in the vocabulary.
/// Indices outside the vocabulary yield None.
pub fn indices_to_tokens<'v>(vocabulary: &'v Vocabulary, indices: &[usize]) -> Vec<Option<&'v str>> {
    indices.iter().map(|&i| vocabulary.token(i)).collect()
}
