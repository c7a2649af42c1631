// ============================================================
// Layer 4 — Preprocessor
// ============================================================
// Owns the one tokenizer configuration of a run and exposes the
// three core operations in the order a run performs them:
//
//   build_worddict(train)              → Dictionaries
//   transform_to_indices(split, dicts) → Vec<IndexedRecord>
//   build_embedding_matrix(path, vocab)→ EmbeddingMatrix
//
// The Preprocessor itself never stores the dictionaries. They are
// returned as values and passed back in by reference, so dev and
// test are always indexed with the vocabulary built from train.
//
// Why build the worddict from train only?
//   Dev and test stand in for data the model has never seen. Words
//   that only occur there must look unknown to the model (OOV), the
//   same way they would in production.
//
// Reference: Rust Book §5 (Structs), §10 (Lifetimes)

use rayon::prelude::*;
use std::path::Path;

use crate::data::embeddings::{self, EmbeddingMatrix, EmbeddingOptions, EmbeddingReport};
use crate::data::indexer::Indexer;
use crate::data::tokenizer::{Tokenizer, TokenizerConfig};
use crate::data::vocabulary::{self, LabelEncoder, Vocabulary};
use crate::domain::error::{PreprocessError, Result};
use crate::domain::record::{IndexedRecord, RawRecord};

/// Everything that parameterises a preprocessing run's core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessorOptions {
    pub tokenizer: TokenizerConfig,

    /// Total vocabulary size including reserved tokens; None keeps all
    pub num_words: Option<i64>,

    /// Label marking records without a gold label
    pub hidden_label: Option<String>,

    pub embedding: EmbeddingOptions,
}

/// The word and label dictionaries built from the training split.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionaries {
    pub words:  Vocabulary,
    pub labels: LabelEncoder,
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    tokenizer:    Tokenizer,
    num_words:    Option<usize>,
    hidden_label: Option<String>,
    embedding:    EmbeddingOptions,
}

impl Preprocessor {
    /// Validate options and build the shared tokenizer.
    pub fn new(options: PreprocessorOptions) -> Result<Self> {
        let tokenizer = Tokenizer::new(&options.tokenizer)?;
        let reserved  = tokenizer.reserved_tokens().len();

        let num_words = match options.num_words {
            None => None,
            Some(n) if n < 0 => {
                return Err(PreprocessError::Configuration(format!(
                    "num_words must not be negative (got {n})"
                )))
            }
            Some(n) if (n as u64) < reserved as u64 => {
                return Err(PreprocessError::Configuration(format!(
                    "num_words ({n}) must be at least the {reserved} reserved tokens"
                )))
            }
            Some(n) => Some(n as usize),
        };

        Ok(Self {
            tokenizer,
            num_words,
            hidden_label: options.hidden_label,
            embedding:    options.embedding,
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn tokenize(&self, sentence: &str) -> Vec<String> {
        self.tokenizer.tokenize(sentence)
    }

    pub fn num_words(&self) -> Option<usize> {
        self.num_words
    }

    pub fn hidden_label(&self) -> Option<&str> {
        self.hidden_label.as_deref()
    }

    /// Build the vocabulary and label encoder from the training split.
    ///
    /// Sentences are tokenized in parallel; counting then walks all
    /// premises followed by all hypotheses in record order, which
    /// fixes the first-seen position used to break frequency ties.
    pub fn build_worddict(&self, records: &[RawRecord]) -> Result<Dictionaries> {
        if records.is_empty() {
            return Err(PreprocessError::Configuration(
                "the training split is empty".into(),
            ));
        }

        let tokenized: Vec<(Vec<String>, Vec<String>)> = records
            .par_iter()
            .map(|r| (self.tokenize(&r.premise), self.tokenize(&r.hypothesis)))
            .collect();

        let reserved = self.tokenizer.reserved_tokens();
        let premises = tokenized.iter().map(|(p, _)| p.as_slice());
        let hypotheses = tokenized.iter().map(|(_, h)| h.as_slice());
        let ranked = vocabulary::count_frequencies(premises.chain(hypotheses), &reserved);

        let words = vocabulary::select_vocabulary(&reserved, &ranked, self.num_words)?;
        let labels = LabelEncoder::fit(
            records.iter().map(|r| r.label.as_str()),
            self.hidden_label(),
        );

        tracing::info!(
            "Worddict: {} entries ({} distinct training tokens), {} labels",
            words.len(),
            ranked.len(),
            labels.len()
        );

        Ok(Dictionaries { words, labels })
    }

    /// Index any split with dictionaries built by `build_worddict`.
    pub fn transform_to_indices(
        &self,
        records:    &[RawRecord],
        vocabulary: &Vocabulary,
        labels:     &LabelEncoder,
    ) -> Result<Vec<IndexedRecord>> {
        self.indexer(vocabulary, labels).transform(records)
    }

    pub fn indexer<'a>(&'a self, vocabulary: &'a Vocabulary, labels: &'a LabelEncoder) -> Indexer<'a> {
        Indexer::new(&self.tokenizer, vocabulary, labels, self.hidden_label())
    }

    /// Build the embedding matrix aligned to `vocabulary`.
    pub fn build_embedding_matrix(
        &self,
        vectors_file: impl AsRef<Path>,
        vocabulary:   &Vocabulary,
    ) -> Result<(EmbeddingMatrix, EmbeddingReport)> {
        embeddings::build_embedding_matrix(vectors_file, vocabulary, &self.embedding)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::{OOV_TOKEN, PAD_TOKEN};
    use std::io::Write;

    fn lowercase_options(num_words: Option<i64>) -> PreprocessorOptions {
        PreprocessorOptions {
            tokenizer: TokenizerConfig { lowercase: true, ..Default::default() },
            num_words,
            hidden_label: Some("hidden".into()),
            ..Default::default()
        }
    }

    fn cat_split() -> Vec<RawRecord> {
        vec![RawRecord::new("A cat sat", "A cat slept", "entailment", "0")]
    }

    #[test]
    fn test_cat_scenario_vocabulary() {
        let p     = Preprocessor::new(lowercase_options(Some(10))).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();

        let expected = [PAD_TOKEN, OOV_TOKEN, "a", "cat", "sat", "slept"];
        assert_eq!(dicts.words.len(), expected.len());
        for (i, token) in expected.iter().enumerate() {
            assert_eq!(dicts.words.get(token), Some(i), "index of {token}");
        }
        assert_eq!(dicts.labels.len(), 1);
        assert_eq!(dicts.labels.encode("entailment"), Some(0));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let records: Vec<RawRecord> = (0..50)
            .map(|i| RawRecord::new(
                format!("w{} w{} shared", i % 7, i % 3),
                format!("x{} shared", i % 5),
                if i % 2 == 0 { "0" } else { "1" },
                i.to_string(),
            ))
            .collect();
        let p = Preprocessor::new(lowercase_options(Some(12))).unwrap();
        let a = p.build_worddict(&records).unwrap();
        let b = p.build_worddict(&records).unwrap();
        assert_eq!(a, b);
        assert!(a.words.len() <= 12);
    }

    #[test]
    fn test_unbounded_vocabulary_counts_distinct_tokens() {
        let p     = Preprocessor::new(lowercase_options(None)).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        // a, cat, sat, slept + pad + oov
        assert_eq!(dicts.words.len(), 6);
    }

    #[test]
    fn test_markers_get_reserved_slots() {
        let options = PreprocessorOptions {
            tokenizer: TokenizerConfig {
                lowercase: true,
                bos: Some("_BOS_".into()),
                eos: Some("_EOS_".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let p     = Preprocessor::new(options).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        assert_eq!(dicts.words.get("_BOS_"), Some(2));
        assert_eq!(dicts.words.get("_EOS_"), Some(3));
        assert_eq!(dicts.words.get("a"), Some(4));

        let indexed = p
            .transform_to_indices(&cat_split(), &dicts.words, &dicts.labels)
            .unwrap();
        assert_eq!(indexed[0].premise_indices, vec![2, 4, 5, 6, 3]);
    }

    #[test]
    fn test_eos_without_bos_stays_dense() {
        let options = PreprocessorOptions {
            tokenizer: TokenizerConfig { eos: Some("</s>".into()), ..Default::default() },
            ..Default::default()
        };
        let p     = Preprocessor::new(options).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        assert_eq!(dicts.words.get("</s>"), Some(2));
    }

    #[test]
    fn test_invalid_num_words() {
        assert!(matches!(
            Preprocessor::new(lowercase_options(Some(-1))),
            Err(PreprocessError::Configuration(_))
        ));
        assert!(matches!(
            Preprocessor::new(lowercase_options(Some(1))),
            Err(PreprocessError::Configuration(_))
        ));
        // exactly the reserved tokens is allowed: every word is OOV
        let p     = Preprocessor::new(lowercase_options(Some(2))).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        assert_eq!(dicts.words.len(), 2);
    }

    #[test]
    fn test_empty_training_split() {
        let p = Preprocessor::new(lowercase_options(None)).unwrap();
        assert!(matches!(p.build_worddict(&[]), Err(PreprocessError::Configuration(_))));
    }

    #[test]
    fn test_dev_with_unseen_label() {
        let p     = Preprocessor::new(lowercase_options(Some(10))).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        let dev   = vec![RawRecord::new("a dog", "a cat", "contradiction", "d0")];
        let err   = p.transform_to_indices(&dev, &dicts.words, &dicts.labels).unwrap_err();
        assert!(matches!(err, PreprocessError::UnknownLabel { .. }));
    }

    #[test]
    fn test_index_lengths_match_token_lengths() {
        let p     = Preprocessor::new(lowercase_options(Some(4))).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        let dev   = vec![
            RawRecord::new("The cat sat on the mat", "", "entailment", "d0"),
            RawRecord::new("", "cat", "hidden", "d1"),
        ];
        let indexed = p.transform_to_indices(&dev, &dicts.words, &dicts.labels).unwrap();

        assert_eq!(indexed.len(), dev.len());
        for (raw, idx) in dev.iter().zip(&indexed) {
            assert_eq!(idx.premise_indices.len(), p.tokenize(&raw.premise).len());
            assert_eq!(idx.hypothesis_indices.len(), p.tokenize(&raw.hypothesis).len());
        }
        assert_eq!(indexed[1].label_index, -1);
    }

    #[test]
    fn test_embedding_alignment_from_file() {
        let p     = Preprocessor::new(lowercase_options(None)).unwrap();
        let dicts = p.build_worddict(&[RawRecord::new("cat", "dog", "0", "0")]).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat 0.1 0.2").unwrap();
        writeln!(file, "emu 0.3 0.4").unwrap();

        let (m, report) = p.build_embedding_matrix(file.path(), &dicts.words).unwrap();
        let cat = dicts.words.get("cat").unwrap();
        let dog = dicts.words.get("dog").unwrap();

        assert_eq!(m.rows(), dicts.words.len());
        assert_eq!(m.row(0), &[0.0, 0.0]);
        assert_eq!(m.row(cat), &[0.1, 0.2]);
        assert!(m.row(dog).iter().any(|&x| x != 0.0));
        assert_eq!(report.matched, 1);
    }

    #[test]
    fn test_missing_vectors_file() {
        let p     = Preprocessor::new(lowercase_options(None)).unwrap();
        let dicts = p.build_worddict(&cat_split()).unwrap();
        let err   = p.build_embedding_matrix("/definitely/not/here.txt", &dicts.words).unwrap_err();
        assert!(matches!(err, PreprocessError::Read { .. }));
    }
}
