// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands the work to the
// use cases in Layer 2. Only this layer prints to stdout.
//
//   nli-preprocess preprocess --config config/preprocessing/quora_preprocessing.json
//   nli-preprocess inspect --target-dir data/preprocessed/quora --record 0 --split dev

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, PreprocessArgs};

use crate::application::{
    inspect_use_case::InspectUseCase,
    preprocess_use_case::PreprocessUseCase,
};
use crate::domain::record::Split;

#[derive(Parser, Debug)]
#[command(
    name = "nli-preprocess",
    version,
    about = "Turn sentence-pair corpora into indexed records and an aligned embedding matrix."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Preprocess(args) => run_preprocess(args),
            Commands::Inspect(args)    => run_inspect(args),
        }
    }
}

fn run_preprocess(args: PreprocessArgs) -> Result<()> {
    tracing::info!("Loading config from '{}'", args.config.display());
    let config  = args.into_config()?;
    let summary = PreprocessUseCase::new(config).execute()?;

    println!("Artifacts written to {}", summary.target_dir.display());
    println!(
        "  worddict: {} entries, labels: [{}]",
        summary.vocabulary_size,
        summary.labels.join(", ")
    );
    for s in &summary.splits {
        println!(
            "  {:<5} {:>8} records  {:>10} tokens  OOV {:.2}%",
            s.split,
            s.records,
            s.tokens,
            s.oov_rate() * 100.0
        );
    }
    println!(
        "  embeddings: {} x {}, {} matched, {} missed",
        summary.vocabulary_size,
        summary.embedding_dim,
        summary.embedding.matched,
        summary.embedding.missed
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let use_case = InspectUseCase::open(&args.target_dir)?;
    let summary  = use_case.summarize()?;

    println!("{}: artifacts are consistent", summary.target_dir.display());
    println!(
        "  worddict: {} entries, embeddings: {} x {}",
        summary.vocabulary_size,
        summary.embedding_shape[0],
        summary.embedding_shape[1]
    );
    println!("  labels: [{}]", summary.labels.join(", "));
    if let Some(e) = summary.embedding {
        println!("  vectors: {} matched, {} missed", e.matched, e.missed);
    }
    for s in &summary.splits {
        println!(
            "  {:<5} {:>8} records ({} labelled), longest sentence {}",
            s.stats.split,
            s.stats.records,
            s.labelled,
            s.longest_sentence
        );
    }

    if let Some(n) = args.record {
        let split: Split = args.split.into();
        let record = use_case.decode(split, n)?;
        println!("\n{} record #{} (id {})", split, n, record.id);
        println!("  premise:    {}", record.premise.join(" "));
        println!("  hypothesis: {}", record.hypothesis.join(" "));
        println!("  label:      {}", record.label.as_deref().unwrap_or("<hidden>"));
    }
    Ok(())
}
