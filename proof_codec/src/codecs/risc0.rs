use serde_json::{json, Value};

use super::{expect_hex, expect_hex_bytes, ProofCodec};
use crate::error::CodecError;
use crate::system::ProofOptions;

/// Length in bytes of a risc0 image id.
const IMAGE_ID_LEN: usize = 32;

/// risc0 receipts. The verifier pallet accepts several receipt encodings, so
/// the proof is wrapped in an envelope keyed by the version tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct Risc0Codec;

impl ProofCodec for Risc0Codec {
    fn format_proof(&self, proof: &Value, options: &ProofOptions) -> Result<Value, CodecError> {
        let version = options.risc0_version()?;
        Ok(json!({ version.tag(): expect_hex(proof)? }))
    }

    fn format_public_signals(
        &self,
        public_signals: &Value,
        _options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        expect_hex(public_signals).map(Value::String)
    }

    fn format_verification_key(
        &self,
        verification_key: &Value,
        _options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        expect_hex_bytes(verification_key, IMAGE_ID_LEN).map(Value::String)
    }
}
