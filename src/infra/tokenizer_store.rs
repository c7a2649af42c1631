// ============================================================
// Layer 5 — Tokenizer Export
// ============================================================
// Writes the worddict as a HuggingFace `tokenizer.json` so other
// tooling can encode text with exactly the same token → index
// mapping.
//
// The export is a WordLevel model:
//   - vocab:         the worddict, unchanged
//   - unk_token:     _OOV_
//   - pre_tokenizer: WhitespaceSplit
//   - normalizer:    Lowercase, only when the run lowercased
//
// Punctuation stripping and stopword removal have no WordLevel
// equivalent; encoding text that was already tokenized by this
// crate gives identical indices.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::data::vocabulary::{Vocabulary, OOV_TOKEN};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Load a previously exported tokenizer
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Write the vocabulary as tokenizer JSON, then load it back so
    /// a broken export fails the run instead of a later consumer.
    pub fn export(&self, vocabulary: &Vocabulary, reserved: &[&str], lowercase: bool) -> Result<Tokenizer> {
        let added_tokens: Vec<serde_json::Value> = reserved
            .iter()
            .filter_map(|token| vocabulary.get(token).map(|id| (id, token)))
            .map(|(id, token)| serde_json::json!({
                "id": id,
                "content": token,
                "single_word": false,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true
            }))
            .collect();

        let normalizer = if lowercase {
            serde_json::json!({ "type": "Lowercase" })
        } else {
            serde_json::Value::Null
        };

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": normalizer,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocabulary,
                "unk_token": OOV_TOKEN
            }
        });

        let path = self.dir.join(TOKENIZER_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON to '{}'", path.display()))?;

        tracing::info!(
            "Exported tokenizer with {} entries to '{}'",
            vocabulary.len(),
            path.display()
        );

        self.load()
    }
}
