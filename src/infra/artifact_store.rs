// ============================================================
// Layer 5 — Artifact Store
// ============================================================
// Saves and restores every output of a preprocessing run as JSON
// inside one target directory:
//
//   target_dir/
//     worddict.json           ← {"_PAD_": 0, "_OOV_": 1, "the": 2, ...}
//     labeldict.json          ← {"0": 0, "1": 1}
//     train_data.json         ← [IndexedRecord, ...]
//     dev_data.json
//     test_data.json
//     embeddings.json         ← [[0.0, ...], [...], ...]
//     embedding_report.json   ← matched / missed counts
//     preprocess_config.json  ← effective configuration
//
// Loading goes through the serde impls of the core types, which
// reject artifacts that break their invariants (gaps in the
// worddict, ragged embedding rows).
//
// Why stage a run?
//   A run that fails halfway must not leave a worddict from the
//   new run next to an embedding matrix from the old one. A run
//   writes into `{target_dir}.partial` and only a successful run
//   is committed into target_dir:
//
//     1. preprocess_config.json is removed from target_dir
//     2. every staged artifact is renamed into target_dir, and
//        artifacts this run did not produce are deleted
//     3. preprocess_config.json is moved in last
//
//   A failed run leaves target_dir untouched; a failure during the
//   commit leaves it without preprocess_config.json, and a set
//   without that file is never opened for reading.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::embeddings::{EmbeddingMatrix, EmbeddingReport};
use crate::data::preprocessor::Dictionaries;
use crate::data::vocabulary::{LabelEncoder, Vocabulary};
use crate::domain::error::PreprocessError;
use crate::domain::record::{IndexedRecord, Split};
use crate::infra::report::REPORT_FILE;
use crate::infra::tokenizer_store::TOKENIZER_FILE;

pub const WORDDICT_FILE:         &str = "worddict.json";
pub const LABELDICT_FILE:        &str = "labeldict.json";
pub const EMBEDDINGS_FILE:       &str = "embeddings.json";
pub const EMBEDDING_REPORT_FILE: &str = "embedding_report.json";
pub const CONFIG_FILE:           &str = "preprocess_config.json";
pub const STAGING_SUFFIX:        &str = ".partial";

/// File name of the indexed records of one split
pub fn split_file(split: Split) -> String {
    format!("{}_data.json", split.name())
}

/// Every file a run may produce, except the config written last
fn run_files() -> Vec<String> {
    let mut files: Vec<String> = [WORDDICT_FILE, LABELDICT_FILE]
        .iter()
        .map(|f| f.to_string())
        .collect();
    files.extend(Split::ALL.iter().map(|&s| split_file(s)));
    files.extend(
        [EMBEDDINGS_FILE, EMBEDDING_REPORT_FILE, REPORT_FILE, TOKENIZER_FILE]
            .iter()
            .map(|f| f.to_string()),
    );
    files
}

/// Sibling directory a run into `target` is staged in
pub fn staging_dir(target: &Path) -> Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        anyhow::anyhow!("Target directory '{}' has no final path component", target.display())
    })?;
    Ok(target.with_file_name(format!("{}{}", name.to_string_lossy(), STAGING_SUFFIX)))
}

/// Reads and writes run artifacts in a single directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Store for writing; creates the directory (like `mkdir -p`).
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create target directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Fresh staging store for a run into `target`. Leftovers of an
    /// earlier failed run are discarded.
    pub fn staging(target: &Path) -> Result<Self> {
        let dir = staging_dir(target)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Cannot clear staging directory '{}'", dir.display()))?;
        }
        Self::create(dir)
    }

    /// Move this staged run into `target` and return a store on it.
    pub fn commit(self, target: &Path) -> Result<Self> {
        fs::create_dir_all(target)
            .with_context(|| format!("Cannot create target directory '{}'", target.display()))?;

        let marker = target.join(CONFIG_FILE);
        if marker.exists() {
            fs::remove_file(&marker)
                .with_context(|| format!("Cannot remove '{}'", marker.display()))?;
        }

        for name in run_files() {
            let staged = self.path(&name);
            let dest   = target.join(&name);
            if staged.exists() {
                fs::rename(&staged, &dest).with_context(|| {
                    format!("Cannot move '{}' to '{}'", staged.display(), dest.display())
                })?;
            } else if dest.exists() {
                fs::remove_file(&dest)
                    .with_context(|| format!("Cannot remove stale '{}'", dest.display()))?;
            }
        }

        let staged = self.path(CONFIG_FILE);
        if !staged.is_file() {
            anyhow::bail!("Staged run in '{}' has no {}", self.dir.display(), CONFIG_FILE);
        }
        fs::rename(&staged, &marker)
            .with_context(|| format!("Cannot move '{}' into place", staged.display()))?;

        fs::remove_dir_all(&self.dir)
            .with_context(|| format!("Cannot remove '{}'", self.dir.display()))?;

        tracing::debug!("Committed '{}' to '{}'", self.dir.display(), target.display());
        Ok(Self { dir: target.to_path_buf() })
    }

    /// Store for reading. The directory must hold a complete run,
    /// which is marked by preprocess_config.json.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Target directory '{}' does not exist. Have you run 'preprocess' first?",
                dir.display()
            );
        }
        if !dir.join(CONFIG_FILE).is_file() {
            return Err(PreprocessError::InvalidArtifact(format!(
                "'{}' holds no {}: the run that wrote it did not complete",
                dir.display(),
                CONFIG_FILE
            )).into());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Serialise `value` to `{dir}/{name}`. Large artifacts are
    /// written compactly through a buffered writer.
    pub fn save_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        let file = File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)
            .with_context(|| format!("Cannot serialise '{}'", path.display()))?;
        writer.flush()?;

        tracing::debug!("Saved '{}'", path.display());
        Ok(path)
    }

    /// Same as save_json but indented, for small files people read
    pub fn save_pretty<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(path)
    }

    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        let file = File::open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid artifact '{}'", path.display()))
    }

    pub fn save_dictionaries(&self, dicts: &Dictionaries) -> Result<()> {
        self.save_pretty(WORDDICT_FILE, &dicts.words)?;
        self.save_pretty(LABELDICT_FILE, &dicts.labels)?;
        Ok(())
    }

    pub fn load_dictionaries(&self) -> Result<Dictionaries> {
        let words: Vocabulary    = self.load_json(WORDDICT_FILE)?;
        let labels: LabelEncoder = self.load_json(LABELDICT_FILE)?;
        Ok(Dictionaries { words, labels })
    }

    pub fn save_split(&self, split: Split, records: &[IndexedRecord]) -> Result<PathBuf> {
        self.save_json(&split_file(split), records)
    }

    pub fn load_split(&self, split: Split) -> Result<Vec<IndexedRecord>> {
        self.load_json(&split_file(split))
    }

    pub fn save_embeddings(&self, matrix: &EmbeddingMatrix, report: &EmbeddingReport) -> Result<PathBuf> {
        self.save_pretty(EMBEDDING_REPORT_FILE, report)?;
        self.save_json(EMBEDDINGS_FILE, matrix)
    }

    pub fn load_embeddings(&self) -> Result<EmbeddingMatrix> {
        self.load_json(EMBEDDINGS_FILE)
    }

    pub fn load_embedding_report(&self) -> Result<EmbeddingReport> {
        self.load_json(EMBEDDING_REPORT_FILE)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::{OOV_TOKEN, PAD_TOKEN};

    fn dictionaries() -> Dictionaries {
        Dictionaries {
            words: Vocabulary::from_tokens(
                [PAD_TOKEN, OOV_TOKEN, "cat"].iter().map(|s| s.to_string()).collect(),
            ).unwrap(),
            labels: LabelEncoder::fit(["0", "1"], None),
        }
    }

    #[test]
    fn test_dictionaries_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path().join("out")).unwrap();
        store.save_dictionaries(&dictionaries()).unwrap();
        assert_eq!(store.load_dictionaries().unwrap(), dictionaries());
    }

    #[test]
    fn test_split_files_are_named_per_split() {
        assert_eq!(split_file(Split::Train), "train_data.json");
        assert_eq!(split_file(Split::Dev), "dev_data.json");

        let dir     = tempfile::tempdir().unwrap();
        let store   = ArtifactStore::create(dir.path()).unwrap();
        let records = vec![IndexedRecord::new(vec![2], vec![], 1, "q")];
        store.save_split(Split::Test, &records).unwrap();
        assert!(dir.path().join("test_data.json").exists());
        assert_eq!(store.load_split(Split::Test).unwrap(), records);
    }

    #[test]
    fn test_corrupt_worddict_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path()).unwrap();
        fs::write(store.path(WORDDICT_FILE), r#"{"_PAD_": 0, "_OOV_": 1, "cat": 5}"#).unwrap();
        fs::write(store.path(LABELDICT_FILE), r#"{"0": 0}"#).unwrap();
        assert!(store.load_dictionaries().is_err());
    }

    #[test]
    fn test_open_requires_existing_dir() {
        assert!(ArtifactStore::open("/no/such/preprocessed").is_err());
    }

    #[test]
    fn test_open_requires_config_marker() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path()).unwrap();
        store.save_dictionaries(&dictionaries()).unwrap();

        let err = ArtifactStore::open(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreprocessError>(),
            Some(PreprocessError::InvalidArtifact(_))
        ));

        fs::write(store.path(CONFIG_FILE), "{}").unwrap();
        assert!(ArtifactStore::open(dir.path()).is_ok());
    }

    #[test]
    fn test_staging_dir_is_a_sibling() {
        let target = Path::new("/data/preprocessed/quora");
        assert_eq!(
            staging_dir(target).unwrap(),
            PathBuf::from("/data/preprocessed/quora.partial")
        );
        assert!(staging_dir(Path::new("/")).is_err());
    }

    #[test]
    fn test_commit_replaces_previous_run() {
        let root   = tempfile::tempdir().unwrap();
        let target = root.path().join("out");

        // An earlier complete run, including a tokenizer export
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join(WORDDICT_FILE), "old").unwrap();
        fs::write(target.join(TOKENIZER_FILE), "old").unwrap();
        fs::write(target.join(CONFIG_FILE), "old").unwrap();
        fs::write(target.join("notes.txt"), "kept").unwrap();

        let staged = ArtifactStore::staging(&target).unwrap();
        staged.save_dictionaries(&dictionaries()).unwrap();
        staged.save_pretty(CONFIG_FILE, &serde_json::json!({"seed": 1})).unwrap();
        let staging = staged.dir().to_path_buf();

        let store = staged.commit(&target).unwrap();
        assert_eq!(store.dir(), target.as_path());
        assert!(!staging.exists());
        assert_eq!(store.load_dictionaries().unwrap(), dictionaries());
        assert!(!target.join(TOKENIZER_FILE).exists());
        assert_eq!(fs::read_to_string(target.join("notes.txt")).unwrap(), "kept");
        assert!(fs::read_to_string(target.join(CONFIG_FILE)).unwrap().contains("seed"));
    }

    #[test]
    fn test_commit_without_config_is_refused() {
        let root   = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        let staged = ArtifactStore::staging(&target).unwrap();
        staged.save_dictionaries(&dictionaries()).unwrap();

        assert!(staged.commit(&target).is_err());
        assert!(!target.join(CONFIG_FILE).exists());
        assert!(ArtifactStore::open(&target).is_err());
    }

    #[test]
    fn test_staging_discards_leftovers() {
        let root   = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        let first  = ArtifactStore::staging(&target).unwrap();
        fs::write(first.path(EMBEDDINGS_FILE), "half-written").unwrap();

        let second = ArtifactStore::staging(&target).unwrap();
        assert!(!second.path(EMBEDDINGS_FILE).exists());
    }
}
