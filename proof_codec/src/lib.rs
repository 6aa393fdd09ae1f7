//! Proof format codecs for the verification network.
//!
//! Provers emit proofs, verification keys and public inputs in whatever shape
//! their library prefers. This crate normalizes them into the encoding the
//! settlement pallets accept:
//!
//! ```rust
//! # use proof_codec::{format, ProofOptions, ProofSystem, RawProofBundle};
//! # use serde_json::json;
//! let options = ProofOptions::new(ProofSystem::Sp1);
//! let raw = RawProofBundle::new(
//!     json!("0xab"),
//!     json!("0x01"),
//!     json!(format!("0x{}", "00".repeat(32))),
//! );
//! let formatted = format(&options, &raw, false).unwrap();
//! assert_eq!(formatted.formatted_proof, json!("0xab"));
//! ```
//!
//! Codecs only convert formats. They never check that a proof verifies.

pub mod bundle;
pub mod codecs;
pub mod error;
pub mod numeric;
pub mod registry;
pub mod system;

use ethereum_types::H256;
use serde_json::Value;
use tracing::debug;

pub use crate::bundle::{FormattedProofBundle, RawProofBundle, Vk};
pub use crate::error::{CodecError, FormatError, InputField};
pub use crate::registry::{resolve, route, route_by_name, Route};
pub use crate::system::{Curve, Endianness, Library, ProofOptions, ProofSystem, Risc0Version};

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn require(system: ProofSystem, field: InputField, value: &Value) -> Result<(), FormatError> {
    if is_missing(value) {
        return Err(FormatError::MissingInput { system, field });
    }
    Ok(())
}

/// Formats a full bundle for submission.
///
/// When `registered_vk` is set the verification key input must be the
/// 32-byte hash of a key already registered on-chain; it is carried as
/// [`Vk::Hash`] without going through the codec.
pub fn format(
    options: &ProofOptions,
    raw: &RawProofBundle,
    registered_vk: bool,
) -> Result<FormattedProofBundle, FormatError> {
    let system = options.proof_system;
    require(system, InputField::Proof, &raw.proof)?;
    require(system, InputField::PublicSignals, &raw.public_signals)?;
    require(system, InputField::VerificationKey, &raw.verification_key)?;

    let route = resolve(options)?;
    debug!(%system, pallet = route.pallet, registered_vk, "formatting proof bundle");

    let formatted_proof = route
        .codec
        .format_proof(&raw.proof, options)
        .map_err(|cause| FormatError::format(system, InputField::Proof, cause, &raw.proof))?;
    let formatted_public_signals = route
        .codec
        .format_public_signals(&raw.public_signals, options)
        .map_err(|cause| {
            FormatError::format(system, InputField::PublicSignals, cause, &raw.public_signals)
        })?;
    let formatted_verification_key = if registered_vk {
        Vk::Hash(registered_vk_hash(system, &raw.verification_key)?)
    } else {
        Vk::Vk(format_with(&route, options, &raw.verification_key)?)
    };

    Ok(FormattedProofBundle {
        formatted_proof,
        formatted_public_signals,
        formatted_verification_key,
    })
}

/// Formats a verification key on its own, as needed to register it.
pub fn format_verification_key(
    options: &ProofOptions,
    verification_key: &Value,
) -> Result<Value, FormatError> {
    require(
        options.proof_system,
        InputField::VerificationKey,
        verification_key,
    )?;
    let route = resolve(options)?;
    format_with(&route, options, verification_key)
}

fn format_with(
    route: &Route,
    options: &ProofOptions,
    verification_key: &Value,
) -> Result<Value, FormatError> {
    route
        .codec
        .format_verification_key(verification_key, options)
        .map_err(|cause| {
            FormatError::format(
                route.system,
                InputField::VerificationKey,
                cause,
                verification_key,
            )
        })
}

fn registered_vk_hash(system: ProofSystem, value: &Value) -> Result<H256, FormatError> {
    let hex = codecs::expect_hex_bytes(value, zkv_common::HASH_LEN)
        .map_err(|cause| FormatError::format(system, InputField::VerificationKey, cause, value))?;
    zkv_common::decode_prefixed_hex(&hex)
        .map(|bytes| H256::from_slice(&bytes))
        .map_err(|_| {
            FormatError::format(
                system,
                InputField::VerificationKey,
                CodecError::InvalidHex(hex.clone()),
                value,
            )
        })
}
