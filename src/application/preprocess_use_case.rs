// ============================================================
// Layer 2 — PreprocessUseCase
// ============================================================
// Runs the full preprocessing pipeline in order:
//
//   Step 1: Validate options, check split files  (Layer 4 - data)
//   Step 2: Read train, build worddict           (Layer 4 - data)
//   Step 3: Index train / dev / test             (Layer 4 - data)
//   Step 4: Coverage report                      (Layer 5 - infra)
//   Step 5: Embedding matrix                     (Layer 4 - data)
//   Step 6: Optional tokenizer.json export       (Layer 5 - infra)
//   Step 7: Save the effective config            (Layer 5 - infra)
//   Step 8: Commit the staged run                (Layer 5 - infra)
//
// Steps 2 to 7 write into a staging directory next to target_dir.
// Only Step 8 touches target_dir itself, and it moves
// preprocess_config.json in last, so the presence of that file
// marks a complete artifact set. A run that fails earlier leaves
// the previous set in target_dir as it was.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::config::PreprocessConfig;
use crate::data::{
    embeddings::EmbeddingReport,
    loader::TsvLoader,
    preprocessor::{Dictionaries, Preprocessor},
};
use crate::domain::{
    record::{RawRecord, Split},
    traits::RecordSource,
};
use crate::infra::{
    artifact_store::{ArtifactStore, CONFIG_FILE},
    report::{ReportWriter, SplitStats},
    tokenizer_store::TokenizerStore,
};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub target_dir:      PathBuf,
    pub vocabulary_size: usize,
    pub labels:          Vec<String>,
    pub splits:          Vec<SplitStats>,
    pub embedding:       EmbeddingReport,
    pub embedding_dim:   usize,
}

pub struct PreprocessUseCase {
    config: PreprocessConfig,
}

impl PreprocessUseCase {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn execute(&self) -> Result<PreprocessSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate before touching the target directory ────────────
        let preprocessor = Preprocessor::new(cfg.preprocessor_options())
            .context("Invalid preprocessing options")?;

        for split in Split::ALL {
            let path = cfg.split_path(split);
            if !path.is_file() {
                anyhow::bail!("Missing {} file '{}'", split, path.display());
            }
        }
        let store = ArtifactStore::staging(&cfg.target_dir)?;
        tracing::debug!("Staging run in '{}'", store.dir().display());

        // ── Step 2: Worddict from the training split ─────────────────────────
        tracing::info!("==================== Preprocessing train set ====================");
        let train = self.read_split(Split::Train)?;

        tracing::info!("Computing worddict and saving it");
        let dicts = preprocessor.build_worddict(&train)?;
        store.save_dictionaries(&dicts)?;

        // ── Step 3 + 4: Index every split, one report row each ───────────────
        let report     = ReportWriter::create(store.dir())?;
        let mut splits = Vec::with_capacity(Split::ALL.len());

        splits.push(self.index_split(&preprocessor, &dicts, &store, &report, Split::Train, &train)?);
        drop(train);

        for split in [Split::Dev, Split::Test] {
            tracing::info!("==================== Preprocessing {} set ====================", split);
            let records = self.read_split(split)?;
            splits.push(self.index_split(&preprocessor, &dicts, &store, &report, split, &records)?);
        }

        // ── Step 5: Embedding matrix ─────────────────────────────────────────
        tracing::info!("==================== Preprocessing embeddings ====================");
        tracing::info!("Building embedding matrix from '{}'", cfg.embeddings_file.display());
        let (matrix, embedding) = preprocessor
            .build_embedding_matrix(&cfg.embeddings_file, &dicts.words)
            .with_context(|| format!(
                "Cannot build embedding matrix from '{}'", cfg.embeddings_file.display()
            ))?;
        store.save_embeddings(&matrix, &embedding)?;

        // ── Step 6: tokenizer.json ───────────────────────────────────────────
        if cfg.export_tokenizer {
            let reserved = preprocessor.tokenizer().reserved_tokens();
            TokenizerStore::new(store.dir()).export(&dicts.words, &reserved, cfg.lowercase)?;
        }

        // ── Step 7: Effective config ─────────────────────────────────────────
        store.save_pretty(CONFIG_FILE, cfg)?;

        // ── Step 8: Move the finished run into target_dir ────────────────────
        let store = store
            .commit(&cfg.target_dir)
            .with_context(|| format!("Cannot commit run to '{}'", cfg.target_dir.display()))?;
        tracing::info!("Preprocessed data saved in '{}'", store.dir().display());

        Ok(PreprocessSummary {
            target_dir:      store.dir().to_path_buf(),
            vocabulary_size: dicts.words.len(),
            labels:          dicts.labels.iter().map(|(_, l)| l.to_string()).collect(),
            splits,
            embedding,
            embedding_dim:   matrix.dim(),
        })
    }

    fn read_split(&self, split: Split) -> Result<Vec<RawRecord>> {
        let loader = TsvLoader::new(self.config.split_path(split), self.config.format.layout());
        tracing::info!("Reading data from '{}'", loader.describe());
        loader
            .read_records()
            .with_context(|| format!("Cannot read the {} split", split))
    }

    fn index_split(
        &self,
        preprocessor: &Preprocessor,
        dicts:        &Dictionaries,
        store:        &ArtifactStore,
        report:       &ReportWriter,
        split:        Split,
        records:      &[RawRecord],
    ) -> Result<SplitStats> {
        tracing::info!("Transforming words in premises and hypotheses to indices");
        let indexed = preprocessor
            .transform_to_indices(records, &dicts.words, &dicts.labels)
            .with_context(|| format!("Cannot index the {} split", split))?;

        tracing::info!("Saving result");
        store.save_split(split, &indexed)?;

        let stats = SplitStats::from_records(split, &indexed);
        report.log(&stats)?;
        Ok(stats)
    }
}
