// ============================================================
// Layer 4 — Embedding Matrix Builder
// ============================================================
// Builds the (vocabulary_size × embedding_dim) matrix used to
// initialise the model's embedding layer. Row i belongs to the
// token with vocabulary index i.
//
// Input: a plain-text vectors file (GloVe / fastText style)
//
//   the 0.418 0.24968 -0.41242 ...
//   cat 0.45281 -0.50108 -0.53714 ...
//
// How the matrix is filled:
//   1. Stream the file one line at a time, keeping only the rows
//      of tokens that are in the vocabulary
//   2. Tokens never found in the file get a random row drawn
//      from a seeded normal distribution (see FallbackPolicy)
//   3. Row 0 (padding) is always the zero vector
//
// Line handling:
//   - blank lines are skipped
//   - a word2vec header ("400000 300") on the first line is
//     recognised and its dimension enforced
//   - a line whose second field is not a number is skipped
//     (GloVe 840B holds multi-word tokens like ". . .")
//   - a vector line with a different width than the first one
//     is a DimensionMismatch error
//   - duplicate tokens: the first occurrence wins
//
// Why stream instead of loading the file?
//   GloVe 840B is over 5 GB of text. Only the vocabulary's rows are
//   kept, so memory stays at vocabulary_size × embedding_dim.
//
// Reference: Pennington et al. (2014) GloVe
//            rand_distr crate documentation (Normal)

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize, Serializer};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::vocabulary::{Vocabulary, PAD_INDEX};
use crate::domain::error::{PreprocessError, Result};

pub const DEFAULT_SEED: u64 = 42;

// ─── Options ──────────────────────────────────────────────────────────────────
/// How rows of unmatched vocabulary tokens are sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Normal(mean, std) where mean and population std are taken
    /// over every value of every matched row. Falls back to
    /// Normal(0, 1) when nothing matched or the std is degenerate.
    #[default]
    MatchedStatistics,

    /// Normal(0, 1) regardless of the matched rows
    StandardNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingOptions {
    pub seed:     u64,
    pub fallback: FallbackPolicy,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED, fallback: FallbackPolicy::default() }
    }
}

// ─── EmbeddingMatrix ──────────────────────────────────────────────────────────
/// Dense row-major f32 matrix, one row per vocabulary index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>")]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    rows: usize,
    dim:  usize,
}

impl EmbeddingMatrix {
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self { data: vec![0.0; rows * dim], rows, dim }
    }

    /// Build from explicit rows; all rows must share one non-zero width.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if dim == 0 {
            return Err(PreprocessError::InvalidArtifact(
                "embedding matrix must have at least one row of non-zero width".into(),
            ));
        }

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(PreprocessError::InvalidArtifact(format!(
                    "embedding row {i} has {} values, expected {dim}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self { data, rows: rows.len(), dim })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.dim]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Row-major values, rows × dim long
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim.max(1))
    }
}

impl Serialize for EmbeddingMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_rows())
    }
}

impl TryFrom<Vec<Vec<f32>>> for EmbeddingMatrix {
    type Error = PreprocessError;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

/// Counts gathered while building the matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingReport {
    /// Vocabulary tokens (padding excluded) found in the file
    pub matched: usize,

    /// Vocabulary tokens (padding excluded) given a sampled row
    pub missed: usize,

    /// Lines skipped because they did not parse as a vector
    pub skipped_lines: usize,

    /// Vocabulary tokens seen again after their first occurrence
    pub duplicates: usize,
}

// ─── Building ─────────────────────────────────────────────────────────────────
/// Build the embedding matrix from a vectors file on disk.
pub fn build_embedding_matrix(
    path:       impl AsRef<Path>,
    vocabulary: &Vocabulary,
    options:    &EmbeddingOptions,
) -> Result<(EmbeddingMatrix, EmbeddingReport)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PreprocessError::Read {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!("Reading word vectors from '{}'", path.display());
    read_embedding_matrix(BufReader::new(file), &path.display().to_string(), vocabulary, options)
}

/// Build the embedding matrix from any buffered reader.
/// `origin` names the source in errors.
pub fn read_embedding_matrix<R: BufRead>(
    mut reader: R,
    origin:     &str,
    vocabulary: &Vocabulary,
    options:    &EmbeddingOptions,
) -> Result<(EmbeddingMatrix, EmbeddingReport)> {
    let mut report  = EmbeddingReport::default();
    let mut matrix: Option<EmbeddingMatrix> = None;
    let mut matched = vec![false; vocabulary.len()];

    let mut header_dim: Option<usize> = None;
    let mut seen_content = false;
    let mut line    = String::new();
    let mut line_no = 0usize;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;

        let mut fields = line.split_whitespace();
        let Some(token) = fields.next() else {
            continue;
        };

        if !seen_content {
            seen_content = true;
            if let Some(dim) = parse_header(&line) {
                tracing::debug!("word2vec header declares dimension {}", dim);
                header_dim = Some(dim);
                continue;
            }
        }

        // A vector line has a number right after the token
        let values = fields.clone();
        let Some(first) = fields.next() else {
            report.skipped_lines += 1;
            continue;
        };
        if first.parse::<f32>().is_err() {
            report.skipped_lines += 1;
            continue;
        }
        let found = values.clone().count();

        let expected = match &matrix {
            Some(m) => m.dim(),
            None    => header_dim.unwrap_or(found),
        };
        if found != expected {
            return Err(PreprocessError::DimensionMismatch { line: line_no, expected, found });
        }
        let m = matrix.get_or_insert_with(|| EmbeddingMatrix::zeros(vocabulary.len(), found));

        let Some(i) = vocabulary.get(token) else {
            continue;
        };
        if i == PAD_INDEX {
            continue;
        }
        if matched[i] {
            report.duplicates += 1;
            continue;
        }

        let row = m.row_mut(i);
        let mut parsed = true;
        for (slot, raw) in row.iter_mut().zip(values) {
            match raw.parse::<f32>() {
                Ok(v)  => *slot = v,
                Err(_) => {
                    parsed = false;
                    break;
                }
            }
        }
        if !parsed {
            tracing::warn!("Skipping unparseable vector for '{}' at line {}", token, line_no);
            row.fill(0.0);
            report.skipped_lines += 1;
            continue;
        }

        matched[i] = true;
        report.matched += 1;
    }

    let mut matrix = matrix.ok_or_else(|| PreprocessError::NoVectors(origin.to_string()))?;

    let distribution = fallback_distribution(&matrix, &matched, options.fallback)?;
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);

    // Ascending index order keeps sampling reproducible
    for i in 0..matrix.rows() {
        if i == PAD_INDEX || matched[i] {
            continue;
        }
        for v in matrix.row_mut(i) {
            *v = distribution.sample(&mut rng) as f32;
        }
        report.missed += 1;
    }
    if matrix.rows() > PAD_INDEX {
        matrix.row_mut(PAD_INDEX).fill(0.0);
    }

    tracing::info!(
        "Embedding matrix {}x{}: {} matched, missed words: {}",
        matrix.rows(),
        matrix.dim(),
        report.matched,
        report.missed,
    );
    if report.skipped_lines > 0 {
        tracing::debug!("Skipped {} non-vector lines", report.skipped_lines);
    }

    Ok((matrix, report))
}

/// A word2vec text header is exactly two unsigned integers: count and dimension.
fn parse_header(line: &str) -> Option<usize> {
    let mut fields = line.split_whitespace();
    let (count, dim) = (fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }
    count.parse::<usize>().ok()?;
    dim.parse::<usize>().ok().filter(|&d| d > 0)
}

/// Choose the distribution unmatched rows are sampled from.
fn fallback_distribution(
    matrix:  &EmbeddingMatrix,
    matched: &[bool],
    policy:  FallbackPolicy,
) -> Result<Normal<f64>> {
    let (mean, std) = match policy {
        FallbackPolicy::StandardNormal    => (0.0, 1.0),
        FallbackPolicy::MatchedStatistics => matched_statistics(matrix, matched).unwrap_or((0.0, 1.0)),
    };

    tracing::debug!("Fallback rows ~ Normal(mean={:.6}, std={:.6})", mean, std);
    Normal::new(mean, std).map_err(|e| {
        PreprocessError::Configuration(format!("invalid fallback distribution: {e}"))
    })
}

/// Mean and population standard deviation over all values of the
/// matched rows (Welford's algorithm). None when there is nothing
/// to measure or the spread is not a usable std.
fn matched_statistics(matrix: &EmbeddingMatrix, matched: &[bool]) -> Option<(f64, f64)> {
    let mut n    = 0u64;
    let mut mean = 0.0f64;
    let mut m2   = 0.0f64;

    for (i, _) in matched.iter().enumerate().filter(|(_, m)| **m) {
        for &v in matrix.row(i) {
            n += 1;
            let x     = f64::from(v);
            let delta = x - mean;
            mean += delta / n as f64;
            m2   += delta * (x - mean);
        }
    }

    if n == 0 {
        return None;
    }
    let std = (m2 / n as f64).sqrt();
    (std.is_finite() && std > 0.0 && mean.is_finite()).then_some((mean, std))
}
