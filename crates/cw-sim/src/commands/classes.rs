use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use cw_charclass::{PredefinedClass, PredefinedSummary};
use cw_forms::to_canonical_json_bytes;

#[derive(Args, Debug)]
pub struct ClassesArgs {
    /// Write the listing to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Predefined classes in listing order.
pub fn registry() -> Vec<PredefinedSummary> {
    PredefinedClass::ALL.iter().map(PredefinedClass::summary).collect()
}

pub fn run(args: &ClassesArgs) -> Result<(), Box<dyn Error>> {
    let json = to_canonical_json_bytes(&registry())?;
    match &args.out {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", String::from_utf8(json)?),
    }
    Ok(())
}
