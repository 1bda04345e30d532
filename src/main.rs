use clap::Parser;
use pmp_llm_bench::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => cli::run::run(args).await,
        Command::Reports(args) => cli::reports::run(args).await,
    }
}
