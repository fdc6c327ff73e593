use std::error::Error;

use clap::{Parser, Subcommand};
use cw_sim::commands::{
    classes::{self, ClassesArgs},
    evaluate::{self, EvaluateArgs},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cw-sim", about = "Chern-Weil characteristic class CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the predefined characteristic classes as canonical JSON.
    Classes(ClassesArgs),
    /// Evaluate a characteristic class on the connection described by a YAML problem.
    Evaluate(EvaluateArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Classes(args) => classes::run(&args),
        Command::Evaluate(args) => evaluate::run(&args),
    }
}
