pub mod build;
pub mod completions;
pub mod init;

use clap::{Parser, Subcommand};

/// cssprite - PNG sprite map and stylesheet generator
#[derive(Parser, Debug)]
#[command(name = "cssprite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print renderer and I/O diagnostics
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the sprite map and stylesheet
    Build(build::BuildArgs),

    /// Write a starter sprites.yaml
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
