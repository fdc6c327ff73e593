use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use cw_charclass::{build_report, CharClassConfig, ClassReport};
use cw_forms::{stable_hash_string, to_canonical_json_bytes};
use tracing::info;

use crate::problem::Problem;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// YAML problem: manifold, bundle, frames, connection and class.
    #[arg(long)]
    pub input: PathBuf,
    /// Output directory for the report and its hash.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML evaluation settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>) -> Result<CharClassConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(CharClassConfig::from_yaml_str(&fs::read_to_string(path)?)?),
        None => Ok(CharClassConfig::default()),
    }
}

/// Builds the problem, computes the form and returns the report.
pub fn evaluate(problem: &Problem, config: CharClassConfig) -> Result<ClassReport, Box<dyn Error>> {
    let assembled = problem.assemble(config)?;
    let form = assembled.class.get_form(
        &assembled.arena,
        assembled.connection,
        assembled.curvature.as_ref(),
    )?;
    Ok(build_report(
        &assembled.class,
        &form,
        assembled.connection_name.as_deref(),
    )?)
}

pub fn run(args: &EvaluateArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let config = load_config(args.config.as_deref())?;
    let problem = Problem::from_yaml_str(&fs::read_to_string(&args.input)?)?;

    let report = evaluate(&problem, config)?;
    let hash = stable_hash_string(&report)?;
    fs::write(
        args.out.join("class_form.json"),
        to_canonical_json_bytes(&report)?,
    )?;
    fs::write(args.out.join("class_form.hash"), format!("{hash}\n"))?;

    info!(
        class = report.class.name.as_deref().unwrap_or("unnamed"),
        out = %args.out.display(),
        hash = %hash,
        "wrote characteristic form report"
    );
    println!("{}", report.display);
    Ok(())
}
