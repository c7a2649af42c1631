// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `preprocess` and `inspect`, and
// their flags. Flags given to `preprocess` override the matching
// keys of the config file.

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::config::PreprocessConfig;
use crate::domain::record::Split;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the worddict, indexed splits and embedding matrix
    Preprocess(PreprocessArgs),

    /// Validate a preprocessed directory and print a summary
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// JSON file describing the run
    #[arg(long, default_value = "config/preprocessing/quora_preprocessing.json")]
    pub config: PathBuf,

    /// Directory holding the train / dev / test files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Pretrained word vectors (GloVe or word2vec text format)
    #[arg(long)]
    pub embeddings_file: Option<PathBuf>,

    /// Where the artifacts are written
    #[arg(long)]
    pub target_dir: Option<PathBuf>,

    /// Seed for rows of words missing from the vectors file
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PreprocessArgs {
    /// Load the config file and apply the command-line overrides.
    /// Override paths are taken relative to the working directory.
    pub fn into_config(self) -> anyhow::Result<PreprocessConfig> {
        let mut config = PreprocessConfig::from_file(&self.config)?;

        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(file) = self.embeddings_file {
            config.embeddings_file = file;
        }
        if let Some(dir) = self.target_dir {
            config.target_dir = dir;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory written by `preprocess`
    #[arg(long)]
    pub target_dir: PathBuf,

    /// Decode this record (0-based) back to tokens
    #[arg(long)]
    pub record: Option<usize>,

    /// Split the record is taken from
    #[arg(long, value_enum, default_value_t = SplitArg::Train)]
    pub split: SplitArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitArg {
    Train,
    Dev,
    Test,
}

impl From<SplitArg> for Split {
    fn from(s: SplitArg) -> Self {
        match s {
            SplitArg::Train => Split::Train,
            SplitArg::Dev   => Split::Dev,
            SplitArg::Test  => Split::Test,
        }
    }
}
