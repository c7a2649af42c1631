// ============================================================
// Layer 2 — Preprocessing Configuration
// ============================================================
// One JSON file describes a whole run. The keys follow the
// historic `quora_preprocessing.json` layout:
//
//   {
//     "data_dir": "../../data/dataset/quora",
//     "embeddings_file": "../../data/embeddings/glove.840B.300d.txt",
//     "target_dir": "../../data/preprocessed/quora",
//     "lowercase": false,
//     "ignore_punctuation": false,
//     "num_words": null,
//     "stopwords": [],
//     "bos": "_BOS_",
//     "eos": "_EOS_"
//   }
//
// Every key is optional; missing keys take the Default values.
// Relative paths are resolved against the directory holding the
// config file, not the working directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::embeddings::{EmbeddingOptions, FallbackPolicy, DEFAULT_SEED};
use crate::data::loader::CorpusFormat;
use crate::data::preprocessor::PreprocessorOptions;
use crate::data::tokenizer::TokenizerConfig;
use crate::domain::record::Split;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub data_dir:        PathBuf,
    pub embeddings_file: PathBuf,
    pub target_dir:      PathBuf,

    pub train_file: String,
    pub dev_file:   String,
    pub test_file:  String,
    pub format:     CorpusFormat,

    pub lowercase:          bool,
    pub ignore_punctuation: bool,
    pub num_words:          Option<i64>,
    pub stopwords:          Vec<String>,
    pub bos:                Option<String>,
    pub eos:                Option<String>,

    /// Label of test records that carry no gold label
    pub hidden_label: Option<String>,

    pub seed:             u64,
    pub fallback:         FallbackPolicy,
    pub export_tokenizer: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            data_dir:           PathBuf::from("data/dataset"),
            embeddings_file:    PathBuf::from("data/embeddings/glove.840B.300d.txt"),
            target_dir:         PathBuf::from("data/preprocessed"),
            train_file:         "train.tsv".to_string(),
            dev_file:           "dev.tsv".to_string(),
            test_file:          "test.tsv".to_string(),
            format:             CorpusFormat::default(),
            lowercase:          false,
            ignore_punctuation: false,
            num_words:          None,
            stopwords:          Vec::new(),
            bos:                None,
            eos:                None,
            hidden_label:       Some("hidden".to_string()),
            seed:               DEFAULT_SEED,
            fallback:           FallbackPolicy::default(),
            export_tokenizer:   false,
        }
    }
}

impl PreprocessConfig {
    /// Read a config file and anchor its relative paths to it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        Ok(config)
    }

    /// Join every relative path onto `base`; absolute paths are kept.
    pub fn resolve_paths(&mut self, base: &Path) {
        for p in [&mut self.data_dir, &mut self.embeddings_file, &mut self.target_dir] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    /// Path of one split's corpus file
    pub fn split_path(&self, split: Split) -> PathBuf {
        let name = match split {
            Split::Train => &self.train_file,
            Split::Dev   => &self.dev_file,
            Split::Test  => &self.test_file,
        };
        self.data_dir.join(name)
    }

    pub fn preprocessor_options(&self) -> PreprocessorOptions {
        PreprocessorOptions {
            tokenizer: TokenizerConfig {
                lowercase:          self.lowercase,
                ignore_punctuation: self.ignore_punctuation,
                stopwords:          self.stopwords.clone(),
                bos:                self.bos.clone(),
                eos:                self.eos.clone(),
            },
            num_words:    self.num_words,
            hidden_label: self.hidden_label.clone(),
            embedding:    EmbeddingOptions { seed: self.seed, fallback: self.fallback },
        }
    }
}
