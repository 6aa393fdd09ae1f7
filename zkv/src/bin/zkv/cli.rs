use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};
use zkv_common::TOKEN_DECIMALS;

#[derive(Parser)]
#[command(version, about = "Offline tooling for the proof verification network")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Selects the proof system and, where it needs them, its companion
/// options.
#[derive(Args)]
pub(crate) struct ProofArgs {
    /// Proof system: fflonk, groth16, risc0, ultraplonk, proofofsql, sp1 or
    /// plonky2
    #[arg(short = 't', long, env = "ZKV_PROOF_TYPE")]
    pub(crate) proof_type: String,
    /// Prover library (groth16 only)
    #[arg(long, env = "ZKV_LIBRARY")]
    pub(crate) library: Option<String>,
    /// Curve (groth16 only)
    #[arg(long, env = "ZKV_CURVE")]
    pub(crate) curve: Option<String>,
    /// Proof format version (risc0 only)
    #[arg(long, env = "ZKV_PROOF_VERSION")]
    pub(crate) proof_version: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Normalizes proof, public signals and verification key into the wire
    /// format
    Format {
        #[command(flatten)]
        proof_args: ProofArgs,
        /// File with the proof (JSON, or a bare hex string)
        #[arg(long, value_hint = ValueHint::FilePath)]
        proof: PathBuf,
        /// File with the public signals (JSON, or a bare hex string)
        #[arg(long, value_hint = ValueHint::FilePath)]
        public_signals: PathBuf,
        /// File with the verification key, or with the hash of a registered
        /// key when `--registered-vk` is set
        #[arg(long, value_hint = ValueHint::FilePath)]
        verification_key: PathBuf,
        #[arg(long)]
        registered_vk: bool,
        /// Write the formatted bundle here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Builds a `submitProof` call from a formatted bundle and prints its hex
    /// encoding
    Encode {
        /// Proof system of the bundle
        #[arg(short = 't', long, env = "ZKV_PROOF_TYPE")]
        proof_type: String,
        /// Formatted bundle, as written by `format`
        #[arg(value_hint = ValueHint::FilePath)]
        bundle: PathBuf,
        #[arg(long, env = "ZKV_DOMAIN_ID")]
        domain_id: Option<u32>,
    },
    /// Decodes a call from its hex encoding
    Decode {
        /// `0x`-prefixed call encoding
        hex: String,
    },
    /// Converts a fee in the smallest unit to tokens
    Fee {
        fee: String,
        #[arg(long, default_value_t = TOKEN_DECIMALS)]
        decimals: u32,
    },
}
