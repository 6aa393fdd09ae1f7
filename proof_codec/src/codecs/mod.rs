//! One codec per proof system.

use serde_json::Value;
use zkv_common::is_prefixed_hex;

use crate::error::CodecError;
use crate::system::{ProofOptions, ProofSystem};

mod blob;
mod fflonk;
mod groth16;
mod risc0;

pub use blob::{HexBlobCodec, PublicSignalsShape};
pub use fflonk::{FflonkCodec, FFLONK_PROOF_ELEMENTS, FFLONK_PROOF_HEX_LEN};
pub use groth16::Groth16Codec;
pub use risc0::Risc0Codec;

/// Converts one proof system's native artifacts into wire form.
pub trait ProofCodec: Send + Sync {
    fn format_proof(&self, proof: &Value, options: &ProofOptions) -> Result<Value, CodecError>;

    fn format_public_signals(
        &self,
        public_signals: &Value,
        options: &ProofOptions,
    ) -> Result<Value, CodecError>;

    fn format_verification_key(
        &self,
        verification_key: &Value,
        options: &ProofOptions,
    ) -> Result<Value, CodecError>;
}

static FFLONK: FflonkCodec = FflonkCodec;
static GROTH16: Groth16Codec = Groth16Codec;
static RISC0: Risc0Codec = Risc0Codec;
static ULTRAPLONK: HexBlobCodec = HexBlobCodec {
    vk_len: None,
    public_signals: PublicSignalsShape::Words32,
};
static PROOF_OF_SQL: HexBlobCodec = HexBlobCodec {
    vk_len: None,
    public_signals: PublicSignalsShape::Blob,
};
static SP1: HexBlobCodec = HexBlobCodec {
    vk_len: Some(32),
    public_signals: PublicSignalsShape::Blob,
};
static PLONKY2: HexBlobCodec = HexBlobCodec {
    vk_len: None,
    public_signals: PublicSignalsShape::Blob,
};

/// The codec bound to `system`.
pub fn codec_for(system: ProofSystem) -> &'static dyn ProofCodec {
    match system {
        ProofSystem::Fflonk => &FFLONK,
        ProofSystem::Groth16 => &GROTH16,
        ProofSystem::Risc0 => &RISC0,
        ProofSystem::Ultraplonk => &ULTRAPLONK,
        ProofSystem::ProofOfSql => &PROOF_OF_SQL,
        ProofSystem::Sp1 => &SP1,
        ProofSystem::Plonky2 => &PLONKY2,
    }
}

/// Checks that `value` is a `0x`-prefixed hex string and returns it
/// lowercased.
pub(crate) fn expect_hex(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::String(s) if is_prefixed_hex(s) => Ok(s.to_ascii_lowercase()),
        Value::String(s) => Err(CodecError::InvalidHex(s.clone())),
        other => Err(CodecError::InvalidHex(other.to_string())),
    }
}

/// Like [`expect_hex`], additionally requiring exactly `len` bytes.
pub(crate) fn expect_hex_bytes(value: &Value, len: usize) -> Result<String, CodecError> {
    let hex = expect_hex(value)?;
    let actual = (hex.len() - 2) / 2;
    if actual != len {
        return Err(CodecError::InvalidByteLength {
            expected: len,
            actual,
        });
    }
    Ok(hex)
}
