// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw sentence pairs and model-ready arrays.
//
//   train.tsv / dev.tsv / test.tsv
//       │
//       ▼
//   TsvLoader         → RawRecords per split
//       │
//       ▼
//   Tokenizer         → cleaned token sequences
//       │
//       ▼
//   Vocabulary        → worddict + label encoder (train only)
//       │
//       ▼
//   Indexer           → IndexedRecords for every split
//       │
//       ▼
//   Embeddings        → matrix aligned to the worddict
//       │
//       ▼
//   PairDataset / PairBatcher → padded tensors for burn
//
// Preprocessor ties the middle steps together around a single
// tokenizer configuration.

/// Reads sentence-pair splits from TSV files
pub mod loader;

/// Character normalisation and tokenization
pub mod tokenizer;

/// Worddict, label encoder and frequency ranking
pub mod vocabulary;

/// Token and label indexing
pub mod indexer;

/// Pretrained vectors → aligned embedding matrix
pub mod embeddings;

/// The core operations behind one shared configuration
pub mod preprocessor;

/// burn Dataset over indexed records
pub mod dataset;

/// burn Batcher with per-batch padding and masks
pub mod batcher;
