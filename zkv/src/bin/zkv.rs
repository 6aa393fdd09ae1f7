use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use proof_codec::{FormattedProofBundle, ProofOptions, ProofSystem, RawProofBundle};
use serde_json::{Deserializer, Value};
use tracing::info;
use tracing::level_filters::LevelFilter;
use zkv_common::convert_fee_to_token;

#[path = "zkv/cli.rs"]
mod cli;

use self::cli::{Cli, Command, ProofArgs};

/// Reads a proof artifact. Files that are not JSON are taken as a bare
/// string, which is how most provers ship hex blobs.
fn read_artifact(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&contents)
        .unwrap_or_else(|_| Value::String(contents.trim().to_owned())))
}

fn proof_options(args: &ProofArgs) -> Result<ProofOptions> {
    Ok(ProofOptions::parse(
        &args.proof_type,
        args.library.as_deref(),
        args.curve.as_deref(),
        args.proof_version.as_deref(),
    )?)
}

fn main() -> Result<()> {
    zkv::env::load_dotenv();
    zkv::tracing::init(LevelFilter::WARN);

    let args = Cli::parse();
    match args.command {
        Command::Format {
            proof_args,
            proof,
            public_signals,
            verification_key,
            registered_vk,
            output,
        } => {
            let options = proof_options(&proof_args)?;
            let raw = RawProofBundle::new(
                read_artifact(&proof)?,
                read_artifact(&public_signals)?,
                read_artifact(&verification_key)?,
            );
            let formatted = proof_codec::format(&options, &raw, registered_vk)?;
            let rendered = serde_json::to_string_pretty(&formatted)?;
            match output {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Formatted {} bundle written to {}", options.proof_system, path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Command::Encode {
            proof_type,
            bundle,
            domain_id,
        } => {
            let proof_system: ProofSystem = proof_type.parse()?;
            let file = File::open(&bundle)
                .with_context(|| format!("Failed to open {}", bundle.display()))?;
            let des = &mut Deserializer::from_reader(BufReader::new(file));
            let formatted: FormattedProofBundle = serde_path_to_error::deserialize(des)
                .context("Failed to parse the formatted bundle")?;
            let call = zkv::build_call(proof_system, &formatted, domain_id)?;
            println!("{}", zkv::to_hex(&call)?);
        }
        Command::Decode { hex } => {
            let call = zkv::from_hex(&hex)?;
            println!("{}", serde_json::to_string_pretty(&call.to_json())?);
        }
        Command::Fee { fee, decimals } => {
            println!("{}", convert_fee_to_token(&fee, decimals)?);
        }
    }

    Ok(())
}
