// ============================================================
// Layer 4 — Vocabulary and Label Encoder
// ============================================================
// The vocabulary ("worddict") maps each token to a dense index:
//
//   0  _PAD_      padding, always the zero embedding row
//   1  _OOV_      any token the vocabulary does not know
//   2  <bos>      only when a BOS marker is configured
//   3  <eos>      only when an EOS marker is configured
//   .. corpus tokens by descending training frequency
//
// Ties in frequency are broken by the position where a token was
// first seen, recorded explicitly while counting. Map iteration
// order is never consulted, so identical input always yields an
// identical vocabulary.
//
// The label encoder maps label strings to class indices in the
// order the labels first appear in the training split.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::error::{PreprocessError, Result};

pub const PAD_TOKEN: &str = "_PAD_";
pub const OOV_TOKEN: &str = "_OOV_";
pub const PAD_INDEX: usize = 0;
pub const OOV_INDEX: usize = 1;

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// Immutable token → index mapping with dense indices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>")]
pub struct Vocabulary {
    /// tokens[i] is the token with index i
    tokens: Vec<String>,
    index:  HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from tokens listed in index order.
    /// The first two must be the padding and OOV tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        if tokens.get(PAD_INDEX).map(String::as_str) != Some(PAD_TOKEN)
            || tokens.get(OOV_INDEX).map(String::as_str) != Some(OOV_TOKEN)
        {
            return Err(PreprocessError::InvalidArtifact(format!(
                "vocabulary must start with {PAD_TOKEN} at {PAD_INDEX} and {OOV_TOKEN} at {OOV_INDEX}"
            )));
        }

        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(PreprocessError::InvalidArtifact(format!(
                    "token '{token}' appears twice in the vocabulary"
                )));
            }
        }

        Ok(Self { tokens, index })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of a token, if the vocabulary holds it
    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Index of a token, falling back to the OOV index
    pub fn index_of(&self, token: &str) -> usize {
        self.get(token).unwrap_or(OOV_INDEX)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Inverse lookup: the token stored at `index`
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// (index, token) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.tokens.iter().enumerate().map(|(i, t)| (i, t.as_str()))
    }
}

impl Serialize for Vocabulary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(i, t)| (t, i)))
    }
}

impl TryFrom<BTreeMap<String, usize>> for Vocabulary {
    type Error = PreprocessError;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self> {
        let tokens = dense_from_map(map, "vocabulary")?;
        Self::from_tokens(tokens)
    }
}

// ─── LabelEncoder ─────────────────────────────────────────────────────────────
/// Immutable label → class index mapping, first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>")]
pub struct LabelEncoder {
    labels: Vec<String>,
    index:  HashMap<String, usize>,
}

impl LabelEncoder {
    /// Collect the distinct labels in the order they first appear.
    /// `hidden` names a placeholder label that is never encoded.
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>, hidden: Option<&str>) -> Self {
        let mut ordered = Vec::new();
        let mut index   = HashMap::new();

        for label in labels {
            if Some(label) == hidden || index.contains_key(label) {
                continue;
            }
            index.insert(label.to_string(), ordered.len());
            ordered.push(label.to_string());
        }

        Self { labels: ordered, index }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn decode(&self, class: usize) -> Option<&str> {
        self.labels.get(class).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().enumerate().map(|(i, l)| (i, l.as_str()))
    }
}

impl Serialize for LabelEncoder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(i, l)| (l, i)))
    }
}

impl TryFrom<BTreeMap<String, usize>> for LabelEncoder {
    type Error = PreprocessError;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self> {
        let labels = dense_from_map(map, "label encoder")?;
        let index  = labels.iter().enumerate().map(|(i, l)| (l.clone(), i)).collect();
        Ok(Self { labels, index })
    }
}

/// Invert a token → index map, requiring indices 0..len with no gaps.
fn dense_from_map(map: BTreeMap<String, usize>, what: &str) -> Result<Vec<String>> {
    let n = map.len();
    let mut slots: Vec<Option<String>> = vec![None; n];

    for (key, i) in map {
        let Some(slot) = slots.get_mut(i) else {
            return Err(PreprocessError::InvalidArtifact(format!(
                "{what}: index {i} of '{key}' is out of range for {n} entries"
            )));
        };
        if let Some(other) = slot {
            return Err(PreprocessError::InvalidArtifact(format!(
                "{what}: '{key}' and '{other}' share index {i}"
            )));
        }
        *slot = Some(key);
    }

    // n keys in n slots with no collision means every slot is filled
    Ok(slots.into_iter().flatten().collect())
}

// ─── Frequency Counting ───────────────────────────────────────────────────────
/// A corpus token with its frequency and first-seen position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCount {
    pub token:      String,
    pub count:      usize,
    pub first_seen: usize,
}

/// Count tokens over sequences visited in order, skipping the
/// reserved tokens. Returns counts ranked by descending frequency,
/// ties by first-seen position.
pub fn count_frequencies<'a, I>(sequences: I, reserved: &[&str]) -> Vec<TokenCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let reserved: HashSet<&str> = reserved.iter().copied().collect();
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<TokenCount> = Vec::new();

    for sequence in sequences {
        for token in sequence {
            if reserved.contains(token.as_str()) {
                continue;
            }
            match slots.get(token.as_str()) {
                Some(&slot) => counts[slot].count += 1,
                None => {
                    slots.insert(token.as_str(), counts.len());
                    counts.push(TokenCount {
                        token:      token.clone(),
                        count:      1,
                        first_seen: counts.len(),
                    });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));
    counts
}

/// Assign indices: reserved tokens first, then the highest ranked
/// corpus tokens until `num_words` entries exist in total.
pub fn select_vocabulary(
    reserved:  &[&str],
    ranked:    &[TokenCount],
    num_words: Option<usize>,
) -> Result<Vocabulary> {
    let budget = match num_words {
        Some(n) if n < reserved.len() => {
            return Err(PreprocessError::Configuration(format!(
                "num_words ({n}) is smaller than the {} reserved tokens",
                reserved.len()
            )))
        }
        Some(n) => n - reserved.len(),
        None    => ranked.len(),
    };

    let tokens: Vec<String> = reserved
        .iter()
        .map(|t| t.to_string())
        .chain(ranked.iter().take(budget).map(|c| c.token.clone()))
        .collect();

    Vocabulary::from_tokens(tokens)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|s| s.split_whitespace().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_frequency_then_first_seen() {
        let data   = seqs(&["b a c", "c a d"]);
        let ranked = count_frequencies(data.iter().map(Vec::as_slice), &[]);
        let order: Vec<&str> = ranked.iter().map(|c| c.token.as_str()).collect();
        // a and c appear twice (a first), then b before d
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_reserved_tokens_not_counted() {
        let data   = seqs(&["<s> cat </s>", "<s> dog </s>"]);
        let ranked = count_frequencies(data.iter().map(Vec::as_slice), &["<s>", "</s>"]);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|c| c.count == 1));
    }

    #[test]
    fn test_select_respects_budget() {
        let data   = seqs(&["a a a b b c"]);
        let ranked = count_frequencies(data.iter().map(Vec::as_slice), &[]);
        let vocab  = select_vocabulary(&[PAD_TOKEN, OOV_TOKEN], &ranked, Some(4)).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.get("a"), Some(2));
        assert_eq!(vocab.get("b"), Some(3));
        assert_eq!(vocab.get("c"), None);
        assert_eq!(vocab.index_of("c"), OOV_INDEX);
    }

    #[test]
    fn test_select_all_when_unbounded() {
        let data   = seqs(&["x y z"]);
        let ranked = count_frequencies(data.iter().map(Vec::as_slice), &[]);
        let vocab  = select_vocabulary(&[PAD_TOKEN, OOV_TOKEN], &ranked, None).unwrap();
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn test_budget_below_reserved_fails() {
        let err = select_vocabulary(&[PAD_TOKEN, OOV_TOKEN, "<s>"], &[], Some(2)).unwrap_err();
        assert!(matches!(err, PreprocessError::Configuration(_)));
    }

    #[test]
    fn test_inverse_lookup() {
        let vocab = Vocabulary::from_tokens(
            vec![PAD_TOKEN.into(), OOV_TOKEN.into(), "cat".into()],
        ).unwrap();
        assert_eq!(vocab.token(2), Some("cat"));
        assert_eq!(vocab.token(3), None);
    }

    #[test]
    fn test_vocabulary_json_is_flat_map() {
        let vocab = Vocabulary::from_tokens(
            vec![PAD_TOKEN.into(), OOV_TOKEN.into(), "cat".into()],
        ).unwrap();
        let json: serde_json::Value = serde_json::to_value(&vocab).unwrap();
        assert_eq!(json, serde_json::json!({"_PAD_": 0, "_OOV_": 1, "cat": 2}));

        let back: Vocabulary = serde_json::from_value(json).unwrap();
        assert_eq!(back, vocab);
    }

    #[test]
    fn test_vocabulary_rejects_gaps_and_missing_reserved() {
        let gap = serde_json::json!({"_PAD_": 0, "_OOV_": 1, "cat": 3});
        assert!(serde_json::from_value::<Vocabulary>(gap).is_err());

        let no_pad = serde_json::json!({"cat": 0, "_OOV_": 1});
        assert!(serde_json::from_value::<Vocabulary>(no_pad).is_err());
    }

    #[test]
    fn test_label_encoder_first_seen_order() {
        let labels = LabelEncoder::fit(
            ["neutral", "entailment", "neutral", "hidden", "contradiction"],
            Some("hidden"),
        );
        assert_eq!(labels.encode("neutral"), Some(0));
        assert_eq!(labels.encode("entailment"), Some(1));
        assert_eq!(labels.encode("contradiction"), Some(2));
        assert_eq!(labels.encode("hidden"), None);
        assert_eq!(labels.decode(1), Some("entailment"));
    }

    #[test]
    fn test_label_encoder_roundtrips_through_json() {
        let labels = LabelEncoder::fit(["1", "0"], None);
        let json   = serde_json::to_string(&labels).unwrap();
        let back: LabelEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, labels);
        assert_eq!(back.encode("1"), Some(0));
    }
}
