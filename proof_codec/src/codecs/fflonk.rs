use num_bigint::BigUint;
use serde_json::{json, Value};

use super::{expect_hex, ProofCodec};
use crate::error::CodecError;
use crate::numeric::{to_fixed_bytes, to_fixed_hex, Numeric, G1, G2};
use crate::system::{Endianness, ProofOptions};

/// Number of 32-byte field elements in a serialized fflonk proof.
pub const FFLONK_PROOF_ELEMENTS: usize = 24;

/// Hex length (without `0x`) of a serialized fflonk proof.
pub const FFLONK_PROOF_HEX_LEN: usize = FFLONK_PROOF_ELEMENTS * ELEMENT_LEN * 2;

const ELEMENT_LEN: usize = 32;

const COMMITMENTS: [&str; 4] = ["C1", "C2", "W1", "W2"];

const EVALUATIONS: [&str; 16] = [
    "ql", "qr", "qm", "qo", "qc", "s1", "s2", "s3", "a", "b", "c", "z", "zw", "t1w", "t2w", "inv",
];

const VK_SCALARS: [&str; 8] = ["power", "k1", "k2", "w", "w3", "w4", "w8", "wr"];

/// fflonk over bn254. Every element is a 32-byte big-endian word.
#[derive(Clone, Copy, Debug, Default)]
pub struct FflonkCodec;

impl FflonkCodec {
    fn proof_elements(proof: &Numeric) -> Result<Vec<BigUint>, CodecError> {
        if let Numeric::List(items) = proof {
            return items.iter().map(|item| item.scalar().cloned()).collect();
        }

        let polynomials = proof.field("polynomials")?;
        let evaluations = proof.field("evaluations")?;
        let mut elements = Vec::with_capacity(FFLONK_PROOF_ELEMENTS);
        for name in COMMITMENTS {
            let point = G1::from_coordinates(polynomials.field(name)?)?;
            elements.push(point.x);
            elements.push(point.y);
        }
        for name in EVALUATIONS {
            elements.push(evaluations.field(name)?.scalar()?.clone());
        }
        Ok(elements)
    }
}

impl ProofCodec for FflonkCodec {
    fn format_proof(&self, proof: &Value, _options: &ProofOptions) -> Result<Value, CodecError> {
        if proof.is_string() {
            let hex = expect_hex(proof)?;
            let actual = hex.len() - 2;
            if actual != FFLONK_PROOF_HEX_LEN {
                return Err(CodecError::LengthMismatch {
                    expected: FFLONK_PROOF_HEX_LEN,
                    actual,
                    unit: "hex characters",
                });
            }
            return Ok(Value::String(hex));
        }

        let elements = Self::proof_elements(&Numeric::from_json(proof))?;
        if elements.len() != FFLONK_PROOF_ELEMENTS {
            return Err(CodecError::LengthMismatch {
                expected: FFLONK_PROOF_ELEMENTS,
                actual: elements.len(),
                unit: "field elements",
            });
        }

        let mut bytes = Vec::with_capacity(FFLONK_PROOF_ELEMENTS * ELEMENT_LEN);
        for element in &elements {
            bytes.extend(to_fixed_bytes(element, ELEMENT_LEN, Endianness::Big)?);
        }
        Ok(Value::String(format!("0x{}", hex::encode(bytes))))
    }

    fn format_public_signals(
        &self,
        public_signals: &Value,
        _options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        let signals = Numeric::from_json(public_signals);
        let signal = match &signals {
            Numeric::List(items) if items.len() == 1 => &items[0],
            Numeric::List(items) => {
                return Err(CodecError::LengthMismatch {
                    expected: 1,
                    actual: items.len(),
                    unit: "public signals",
                })
            }
            single => single,
        };
        Ok(Value::String(to_fixed_hex(
            signal.scalar()?,
            ELEMENT_LEN,
            Endianness::Big,
        )?))
    }

    fn format_verification_key(
        &self,
        verification_key: &Value,
        _options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        let vk = Numeric::from_json(verification_key);

        let mut formatted = serde_json::Map::new();
        for name in VK_SCALARS {
            let value = vk.field(name)?.scalar()?;
            let value = if name == "power" {
                json!(u8::try_from(value).map_err(|_| CodecError::ValueTooLarge(1))?)
            } else {
                json!(value.to_string())
            };
            formatted.insert(name.to_owned(), value);
        }
        let x2 = G2::from_coordinates(vk.field("X_2")?)?;
        let c0 = G1::from_coordinates(vk.field("C0")?)?;
        formatted.insert(
            "x2".to_owned(),
            json!(x2.to_hex(ELEMENT_LEN, Endianness::Big)?),
        );
        formatted.insert(
            "c0".to_owned(),
            json!(c0.to_hex(ELEMENT_LEN, Endianness::Big)?),
        );
        Ok(Value::Object(formatted))
    }
}
