use anyhow::Result;
use clap::Parser;
use nli_preprocess::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nli_preprocess=info".parse()?),
        )
        .init();

    Cli::parse().run()
}
