// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Loads the artifacts of a finished run and checks that they
// still agree with each other. A directory without
// preprocess_config.json holds no finished run and is refused
// before anything else is read.
//
//   - the embedding matrix has one row per worddict entry
//   - the padding row is all zeros
//   - every stored index is inside the worddict
//   - every label index is -1 or a class of the labeldict
//
// It can also turn one stored record back into tokens, which is
// the quickest way to eyeball a run.

use anyhow::Result;
use burn::data::dataset::Dataset;
use std::path::PathBuf;

use crate::data::{
    dataset::PairDataset,
    embeddings::{EmbeddingMatrix, EmbeddingReport},
    indexer::indices_to_tokens,
    preprocessor::Dictionaries,
    vocabulary::{PAD_INDEX, Vocabulary},
};
use crate::domain::{
    error::PreprocessError,
    record::{IndexedRecord, Split, HIDDEN_LABEL_INDEX},
};
use crate::infra::{artifact_store::ArtifactStore, report::SplitStats};

/// Summary of one stored split
#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub stats:            SplitStats,
    pub labelled:         usize,
    pub longest_sentence: usize,
}

#[derive(Debug, Clone)]
pub struct InspectSummary {
    pub target_dir:      PathBuf,
    pub vocabulary_size: usize,
    pub labels:          Vec<String>,
    pub embedding_shape: [usize; 2],
    pub embedding:       Option<EmbeddingReport>,
    pub splits:          Vec<SplitSummary>,
}

/// A stored record mapped back to tokens and its label string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub id:         String,
    pub premise:    Vec<String>,
    pub hypothesis: Vec<String>,

    /// None for hidden labels
    pub label: Option<String>,
}

pub struct InspectUseCase {
    store:      ArtifactStore,
    dicts:      Dictionaries,
    embeddings: EmbeddingMatrix,
}

impl InspectUseCase {
    /// Load the worddict, labeldict and embedding matrix.
    pub fn open(target_dir: impl Into<PathBuf>) -> Result<Self> {
        let store      = ArtifactStore::open(target_dir)?;
        let dicts      = store.load_dictionaries()?;
        let embeddings = store.load_embeddings()?;

        if embeddings.rows() != dicts.words.len() {
            return Err(PreprocessError::InvalidArtifact(format!(
                "embedding matrix has {} rows but the worddict has {} entries",
                embeddings.rows(),
                dicts.words.len()
            )).into());
        }
        if embeddings.rows() > 0 && embeddings.row(PAD_INDEX).iter().any(|&v| v != 0.0) {
            return Err(PreprocessError::InvalidArtifact(
                "the padding row of the embedding matrix is not zero".into(),
            ).into());
        }

        Ok(Self { store, dicts, embeddings })
    }

    pub fn dictionaries(&self) -> &Dictionaries {
        &self.dicts
    }

    /// Validate every stored split and summarise the run.
    pub fn summarize(&self) -> Result<InspectSummary> {
        let mut splits = Vec::with_capacity(Split::ALL.len());

        for split in Split::ALL {
            let records = self.load_checked(split)?;
            let stats   = SplitStats::from_records(split, &records);
            let dataset = PairDataset::new(records);

            tracing::debug!("{}: {} records validated", split, dataset.len());
            splits.push(SplitSummary {
                stats,
                labelled:         dataset.labelled_count(),
                longest_sentence: dataset.longest_sentence(),
            });
        }

        Ok(InspectSummary {
            target_dir:      self.store.dir().to_path_buf(),
            vocabulary_size: self.dicts.words.len(),
            labels:          self.dicts.labels.iter().map(|(_, l)| l.to_string()).collect(),
            embedding_shape: self.embeddings.shape(),
            embedding:       self.store.load_embedding_report().ok(),
            splits,
        })
    }

    /// Decode the `n`-th record of `split` (0-based).
    pub fn decode(&self, split: Split, n: usize) -> Result<DecodedRecord> {
        let records = self.load_checked(split)?;
        let Some(record) = records.get(n) else {
            anyhow::bail!("The {} split has {} records, no record #{}", split, records.len(), n);
        };

        let label = if record.is_hidden() {
            None
        } else {
            let class = usize::try_from(record.label_index)?;
            self.dicts.labels.decode(class).map(str::to_string)
        };

        Ok(DecodedRecord {
            id:         record.id.clone(),
            premise:    decode_tokens(&self.dicts.words, &record.premise_indices),
            hypothesis: decode_tokens(&self.dicts.words, &record.hypothesis_indices),
            label,
        })
    }

    fn load_checked(&self, split: Split) -> Result<Vec<IndexedRecord>> {
        let records = self.store.load_split(split)?;
        let vocab   = self.dicts.words.len();
        let classes = self.dicts.labels.len() as i64;

        for r in &records {
            if let Some(&bad) = r.premise_indices.iter().chain(&r.hypothesis_indices).find(|&&i| i >= vocab) {
                return Err(PreprocessError::InvalidArtifact(format!(
                    "{} record '{}' holds index {} outside a worddict of {}",
                    split, r.id, bad, vocab
                )).into());
            }
            if r.label_index != HIDDEN_LABEL_INDEX && !(0..classes).contains(&r.label_index) {
                return Err(PreprocessError::InvalidArtifact(format!(
                    "{} record '{}' has label index {} but there are {} classes",
                    split, r.id, r.label_index, classes
                )).into());
            }
            if r.premise_length != r.premise_indices.len() || r.hypothesis_length != r.hypothesis_indices.len() {
                return Err(PreprocessError::InvalidArtifact(format!(
                    "{} record '{}' has lengths that do not match its indices",
                    split, r.id
                )).into());
            }
        }
        Ok(records)
    }
}

// Indices were range-checked by load_checked.
fn decode_tokens(vocabulary: &Vocabulary, indices: &[usize]) -> Vec<String> {
    indices_to_tokens(vocabulary, indices)
        .into_iter()
        .map(|t| t.unwrap_or_default().to_string())
        .collect()
}
