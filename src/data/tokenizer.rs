// ============================================================
// Layer 4 — Tokenizer / Normalizer
// ============================================================
// Turns one raw sentence into the token sequence that both the
// vocabulary builder and the indexer see.
//
// Steps (applied in order):
//   1. Normalise characters: tabs, NBSP, zero-width spaces, BOMs
//      and other control characters become a plain space
//   2. Optionally lowercase
//   3. Split on whitespace
//   4. Optionally strip ASCII punctuation from token edges
//      ("don't" keeps its apostrophe, "cat." becomes "cat")
//   5. Drop stopwords
//   6. Optionally wrap with BOS / EOS markers
//
// The Tokenizer is built ONCE from a TokenizerConfig and then
// shared. Building the vocabulary with one set of options and
// indexing with another would silently misalign every split.
//
// Reference: Rust Book §8 (Strings in Rust)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::vocabulary::{OOV_TOKEN, PAD_TOKEN};
use crate::domain::error::{PreprocessError, Result};

/// User-facing tokenizer options, as they appear in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Lowercase sentences before splitting
    pub lowercase: bool,

    /// Strip ASCII punctuation from token boundaries
    pub ignore_punctuation: bool,

    /// Tokens removed after normalisation (exact match)
    pub stopwords: Vec<String>,

    /// Literal marker prepended to every sentence
    pub bos: Option<String>,

    /// Literal marker appended to every sentence
    pub eos: Option<String>,
}

/// A validated, immutable tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    lowercase:          bool,
    ignore_punctuation: bool,
    stopwords:          HashSet<String>,
    bos:                Option<String>,
    eos:                Option<String>,
}

impl Tokenizer {
    /// Validate the configuration and build the tokenizer.
    ///
    /// Markers must be single non-empty tokens, distinct from each
    /// other and from the padding / OOV tokens, otherwise two
    /// reserved vocabulary slots would collide.
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        let bos = config.bos.clone();
        let eos = config.eos.clone();

        for marker in bos.iter().chain(eos.iter()) {
            if marker.is_empty() || marker.chars().any(char::is_whitespace) {
                return Err(PreprocessError::Configuration(format!(
                    "sentence marker '{marker}' must be a single non-empty token"
                )));
            }
            if marker == PAD_TOKEN || marker == OOV_TOKEN {
                return Err(PreprocessError::Configuration(format!(
                    "sentence marker '{marker}' collides with a reserved token"
                )));
            }
        }
        if let (Some(b), Some(e)) = (&bos, &eos) {
            if b == e {
                return Err(PreprocessError::Configuration(format!(
                    "bos and eos must differ (both are '{b}')"
                )));
            }
        }

        // Stopwords follow the case policy of the sentences they filter
        let stopwords = config
            .stopwords
            .iter()
            .map(|w| if config.lowercase { w.to_lowercase() } else { w.clone() })
            .collect();

        Ok(Self {
            lowercase:          config.lowercase,
            ignore_punctuation: config.ignore_punctuation,
            stopwords,
            bos,
            eos,
        })
    }

    /// Tokenize one sentence. Never fails: an empty sentence gives
    /// an empty sequence (or just the markers).
    pub fn tokenize(&self, sentence: &str) -> Vec<String> {
        let normalised = normalize(sentence);
        let text = if self.lowercase {
            normalised.to_lowercase()
        } else {
            normalised
        };

        let mut tokens = Vec::with_capacity(text.len() / 4 + 2);

        if let Some(bos) = &self.bos {
            tokens.push(bos.clone());
        }

        for raw in text.split_whitespace() {
            let token = if self.ignore_punctuation {
                raw.trim_matches(|c: char| c.is_ascii_punctuation())
            } else {
                raw
            };

            if token.is_empty() || self.stopwords.contains(token) {
                continue;
            }
            tokens.push(token.to_string());
        }

        if let Some(eos) = &self.eos {
            tokens.push(eos.clone());
        }

        tokens
    }

    pub fn bos(&self) -> Option<&str> {
        self.bos.as_deref()
    }

    pub fn eos(&self) -> Option<&str> {
        self.eos.as_deref()
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    /// Reserved tokens in vocabulary order: padding, OOV, then the
    /// configured sentence markers.
    pub fn reserved_tokens(&self) -> Vec<&str> {
        let mut reserved = vec![PAD_TOKEN, OOV_TOKEN];
        reserved.extend(self.bos());
        reserved.extend(self.eos());
        reserved
    }
}

/// Map invisible and control characters to plain spaces so they
/// never end up glued to a token.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' | '\r' | '\n'               => ' ',
            '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            c if c.is_control()              => ' ',
            c                                => c,
        })
        .collect()
}
