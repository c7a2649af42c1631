// ============================================================
// Layer 4 — Sentence-Pair Batcher
// ============================================================
// Implements burn's Batcher trait to turn a Vec<IndexedRecord>
// into tensors for an ESIM-style model.
//
// IndexedRecords are deliberately unpadded. Padding happens here,
// per batch, to the longest sentence IN THE BATCH:
//
//   premise A: [2, 7, 9]         → [2, 7, 9, 0]   mask [1, 1, 1, 0]
//   premise B: [4, 5, 6, 8]      → [4, 5, 6, 8]   mask [1, 1, 1, 1]
//
// Padding uses index 0, whose embedding row is all zeros.
//
// Why pad per batch and not per split?
//   Sentence lengths in NLI corpora have a long tail. Padding every
//   record to the longest sentence of the split would turn most of
//   each batch into zeros. Padding per batch keeps the tensors no
//   larger than the batch needs.
//
// Why carry masks as well as lengths?
//   The attention step of ESIM needs to ignore padded positions,
//   and a 0/1 mask is what the softmax masking multiplies by.
//
// Output shapes (N = batch size, P / H = longest premise / hypothesis):
//   premises          [N, P]    premise_mask      [N, P]
//   hypotheses        [N, H]    hypothesis_mask   [N, H]
//   premise_lengths   [N]       hypothesis_lengths [N]
//   labels            [N]       (-1 for hidden labels)
//
// Reference: Burn Book §4 (Batcher)
//            Chen et al. (2017) Enhanced LSTM for NLI

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::embeddings::EmbeddingMatrix;
use crate::data::vocabulary::PAD_INDEX;
use crate::domain::record::IndexedRecord;

// ─── PairBatch ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    pub premises:           Tensor<B, 2, Int>,
    pub premise_mask:       Tensor<B, 2, Int>,
    pub premise_lengths:    Tensor<B, 1, Int>,
    pub hypotheses:         Tensor<B, 2, Int>,
    pub hypothesis_mask:    Tensor<B, 2, Int>,
    pub hypothesis_lengths: Tensor<B, 1, Int>,
    pub labels:             Tensor<B, 1, Int>,
}

// ─── PairBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on it.
#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn padded_tensor(&self, seqs: &[&[usize]]) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
        let padded = pad_sequences(seqs);
        let shape  = [seqs.len(), padded.width];

        let ids = Tensor::<B, 1, Int>::from_ints(padded.ids.as_slice(), &self.device)
            .reshape(shape);
        let mask = Tensor::<B, 1, Int>::from_ints(padded.mask.as_slice(), &self.device)
            .reshape(shape);
        (ids, mask)
    }

    fn int_vector(&self, values: Vec<i32>) -> Tensor<B, 1, Int> {
        Tensor::<B, 1, Int>::from_ints(values.as_slice(), &self.device)
    }
}

impl<B: Backend> Batcher<IndexedRecord, PairBatch<B>> for PairBatcher<B> {
    fn batch(&self, items: Vec<IndexedRecord>) -> PairBatch<B> {
        let premises: Vec<&[usize]> = items.iter().map(|r| r.premise_indices.as_slice()).collect();
        let hypotheses: Vec<&[usize]> = items.iter().map(|r| r.hypothesis_indices.as_slice()).collect();

        let (premises, premise_mask)      = self.padded_tensor(&premises);
        let (hypotheses, hypothesis_mask) = self.padded_tensor(&hypotheses);

        let premise_lengths    = self.int_vector(items.iter().map(|r| r.premise_length as i32).collect());
        let hypothesis_lengths = self.int_vector(items.iter().map(|r| r.hypothesis_length as i32).collect());
        let labels             = self.int_vector(items.iter().map(|r| r.label_index as i32).collect());

        PairBatch {
            premises,
            premise_mask,
            premise_lengths,
            hypotheses,
            hypothesis_mask,
            hypothesis_lengths,
            labels,
        }
    }
}

/// Flattened, padded sequences plus their mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padded {
    pub ids:   Vec<i32>,
    pub mask:  Vec<i32>,
    pub width: usize,
}

/// Right-pad every sequence with PAD_INDEX to the longest one.
/// Width is at least 1 so an all-empty batch still has a valid shape.
pub fn pad_sequences(seqs: &[&[usize]]) -> Padded {
    let width = seqs.iter().map(|s| s.len()).max().unwrap_or(0).max(1);

    let mut ids  = Vec::with_capacity(seqs.len() * width);
    let mut mask = Vec::with_capacity(seqs.len() * width);

    for seq in seqs {
        ids.extend(seq.iter().map(|&i| i as i32));
        mask.extend(std::iter::repeat(1).take(seq.len()));
        ids.extend(std::iter::repeat(PAD_INDEX as i32).take(width - seq.len()));
        mask.extend(std::iter::repeat(0).take(width - seq.len()));
    }

    Padded { ids, mask, width }
}

/// The embedding matrix as a [rows, dim] float tensor, ready to
/// initialise an embedding layer's weights.
pub fn embedding_tensor<B: Backend>(matrix: &EmbeddingMatrix, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_floats(matrix.as_slice(), device).reshape(matrix.shape())
}
