use serde_json::Value;

use super::{expect_hex, expect_hex_bytes, ProofCodec};
use crate::error::CodecError;
use crate::system::ProofOptions;

const WORD_LEN: usize = 32;

/// How a hex-blob proof system lays out its public inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PublicSignalsShape {
    /// One opaque hex blob.
    Blob,
    /// A list of 32-byte words. A single blob whose length is a multiple of
    /// 32 bytes is split into words.
    Words32,
}

/// Proof systems whose artifacts are already serialized by the prover and
/// only need their hex validated.
#[derive(Clone, Copy, Debug)]
pub struct HexBlobCodec {
    /// Exact verification key length in bytes, when the system fixes one.
    pub vk_len: Option<usize>,
    pub public_signals: PublicSignalsShape,
}

impl HexBlobCodec {
    fn words(public_signals: &Value) -> Result<Value, CodecError> {
        match public_signals {
            Value::Array(items) => items
                .iter()
                .map(|item| expect_hex_bytes(item, WORD_LEN).map(Value::String))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => {
                let hex = expect_hex(single)?;
                let digits = &hex[2..];
                if digits.len() % (WORD_LEN * 2) != 0 {
                    return Err(CodecError::InvalidByteLength {
                        expected: (digits.len() / (WORD_LEN * 2) + 1) * WORD_LEN,
                        actual: digits.len() / 2,
                    });
                }
                Ok(Value::Array(
                    digits
                        .as_bytes()
                        .chunks(WORD_LEN * 2)
                        .map(|word| {
                            Value::String(format!("0x{}", String::from_utf8_lossy(word)))
                        })
                        .collect(),
                ))
            }
        }
    }
}

impl ProofCodec for HexBlobCodec {
    fn format_proof(&self, proof: &Value, _options: &ProofOptions) -> Result<Value, CodecError> {
        expect_hex(proof).map(Value::String)
    }

    fn format_public_signals(
        &self,
        public_signals: &Value,
        _options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        match self.public_signals {
            PublicSignalsShape::Blob => expect_hex(public_signals).map(Value::String),
            PublicSignalsShape::Words32 => Self::words(public_signals),
        }
    }

    fn format_verification_key(
        &self,
        verification_key: &Value,
        _options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        match self.vk_len {
            Some(len) => expect_hex_bytes(verification_key, len),
            None => expect_hex(verification_key),
        }
        .map(Value::String)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::system::ProofSystem;

    const WORDS: HexBlobCodec = HexBlobCodec {
        vk_len: None,
        public_signals: PublicSignalsShape::Words32,
    };

    fn options() -> ProofOptions {
        ProofOptions::new(ProofSystem::Ultraplonk)
    }

    #[test]
    fn passes_valid_hex_through() {
        assert_eq!(
            WORDS.format_proof(&json!("0xDEADbeef"), &options()).unwrap(),
            json!("0xdeadbeef")
        );
        assert_eq!(
            WORDS.format_proof(&json!("deadbeef"), &options()).unwrap_err(),
            CodecError::InvalidHex("deadbeef".into())
        );
    }

    #[test]
    fn validates_public_signals_element_wise() {
        let good = format!("0x{}", "01".repeat(32));
        assert_eq!(
            WORDS
                .format_public_signals(&json!([good, good]), &options())
                .unwrap(),
            json!([good, good])
        );
        assert_eq!(
            WORDS
                .format_public_signals(&json!([good, "0x01"]), &options())
                .unwrap_err(),
            CodecError::InvalidByteLength {
                expected: 32,
                actual: 1
            }
        );
        assert!(WORDS
            .format_public_signals(&json!([good, "nothex"]), &options())
            .is_err());
    }

    #[test]
    fn splits_concatenated_words() {
        let blob = format!("0x{}{}", "01".repeat(32), "02".repeat(32));
        assert_eq!(
            WORDS.format_public_signals(&json!(blob), &options()).unwrap(),
            json!([
                format!("0x{}", "01".repeat(32)),
                format!("0x{}", "02".repeat(32))
            ])
        );
        assert!(WORDS
            .format_public_signals(&json!("0x0102"), &options())
            .is_err());
    }

    #[test]
    fn fixed_vk_length() {
        let codec = HexBlobCodec {
            vk_len: Some(32),
            public_signals: PublicSignalsShape::Blob,
        };
        assert!(codec
            .format_verification_key(&json!(format!("0x{}", "aa".repeat(32))), &options())
            .is_ok());
        assert!(codec
            .format_verification_key(&json!("0xaa"), &options())
            .is_err());
    }
}
