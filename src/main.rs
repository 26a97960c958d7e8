use clap::Parser;
use cssprite::cli::{Cli, Commands};
use cssprite::output::{init_logging, Printer};
use log::LevelFilter;
use miette::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new();

    if cli.verbose {
        init_logging(LevelFilter::Debug);
    }

    match cli.command {
        Commands::Build(args) => cssprite::cli::build::run(args, &printer).await?,
        Commands::Init(args) => cssprite::cli::init::run(args, &printer)?,
        Commands::Completions(args) => cssprite::cli::completions::run(args)?,
    }

    Ok(())
}
