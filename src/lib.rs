//! Sentence-pair corpus preprocessing for ESIM-style models.
//!
//! Reads premise / hypothesis / label records, builds a worddict from
//! the training split, maps every split to index sequences and builds
//! an embedding matrix aligned row-for-row with the worddict.
//!
//! Layers:
//!   1. [`cli`]: command-line entry points
//!   2. [`application`]: preprocess / inspect workflows
//!   3. [`domain`]: records, errors, traits
//!   4. [`data`]: tokenizer, vocabulary, indexer, embeddings
//!   5. [`infra`]: artifact files, tokenizer export, report

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;

pub use data::embeddings::{EmbeddingMatrix, EmbeddingOptions, EmbeddingReport, FallbackPolicy};
pub use data::preprocessor::{Dictionaries, Preprocessor, PreprocessorOptions};
pub use data::tokenizer::{Tokenizer, TokenizerConfig};
pub use data::vocabulary::{LabelEncoder, Vocabulary};
pub use domain::error::{PreprocessError, Result};
pub use domain::record::{IndexedRecord, RawRecord, Split};
