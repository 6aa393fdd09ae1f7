//! Groth16 over bn254 or bls12-381.
//!
//! Each supported prover library lays its artifacts out differently; the
//! per-library modules only parse into [`Groth16Proof`] and [`Groth16Vk`],
//! and serialization is shared.

use serde_json::{json, Value};

use super::ProofCodec;
use crate::error::CodecError;
use crate::numeric::{to_fixed_hex, Numeric, G1, G2};
use crate::system::{Curve, Library, ProofOptions};

mod arkworks;
mod gnark;
mod snarkjs;

#[derive(Clone, Debug, PartialEq)]
pub struct Groth16Proof {
    pub a: G1,
    pub b: G2,
    pub c: G1,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Groth16Vk {
    pub alpha_g1: G1,
    pub beta_g2: G2,
    pub gamma_g2: G2,
    pub delta_g2: G2,
    pub gamma_abc_g1: Vec<G1>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Groth16Codec;

fn curve(options: &ProofOptions) -> Result<Curve, CodecError> {
    options
        .curve
        .ok_or_else(|| CodecError::UnsupportedCurve("<none>".to_owned()))
}

fn library(options: &ProofOptions) -> Result<Library, CodecError> {
    options
        .library
        .ok_or_else(|| CodecError::MissingField("library".to_owned()))
}

fn g1_hex(point: &G1, curve: Curve) -> Result<String, CodecError> {
    point.to_hex(curve.coordinate_len(), curve.endianness())
}

fn g2_hex(point: &G2, curve: Curve) -> Result<String, CodecError> {
    point.to_hex(curve.coordinate_len(), curve.endianness())
}

impl ProofCodec for Groth16Codec {
    fn format_proof(&self, proof: &Value, options: &ProofOptions) -> Result<Value, CodecError> {
        let curve = curve(options)?;
        let proof = Numeric::from_json(proof);
        let parsed = match library(options)? {
            Library::Snarkjs => snarkjs::proof(&proof)?,
            Library::Gnark => gnark::proof(&proof)?,
            Library::Arkworks => arkworks::proof(&proof)?,
        };
        Ok(json!({
            "curve": curve.wire_name(),
            "proof": {
                "a": g1_hex(&parsed.a, curve)?,
                "b": g2_hex(&parsed.b, curve)?,
                "c": g1_hex(&parsed.c, curve)?,
            }
        }))
    }

    fn format_public_signals(
        &self,
        public_signals: &Value,
        options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        let curve = curve(options)?;
        let signals = match Numeric::from_json(public_signals) {
            Numeric::List(items) => items,
            single => vec![single],
        };
        signals
            .iter()
            .map(|signal| {
                to_fixed_hex(signal.scalar()?, curve.scalar_len(), curve.endianness())
                    .map(Value::String)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn format_verification_key(
        &self,
        verification_key: &Value,
        options: &ProofOptions,
    ) -> Result<Value, CodecError> {
        let curve = curve(options)?;
        let vk = Numeric::from_json(verification_key);
        let parsed = match library(options)? {
            Library::Snarkjs => snarkjs::verification_key(&vk)?,
            Library::Gnark => gnark::verification_key(&vk)?,
            Library::Arkworks => arkworks::verification_key(&vk)?,
        };
        let gamma_abc_g1 = parsed
            .gamma_abc_g1
            .iter()
            .map(|point| g1_hex(point, curve))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "curve": curve.wire_name(),
            "alphaG1": g1_hex(&parsed.alpha_g1, curve)?,
            "betaG2": g2_hex(&parsed.beta_g2, curve)?,
            "gammaG2": g2_hex(&parsed.gamma_g2, curve)?,
            "deltaG2": g2_hex(&parsed.delta_g2, curve)?,
            "gammaAbcG1": gamma_abc_g1,
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::system::ProofSystem;

    fn options(library: Library, curve: Curve) -> ProofOptions {
        ProofOptions::new(ProofSystem::Groth16)
            .with_library(library)
            .with_curve(curve)
    }

    fn snarkjs_proof() -> Value {
        json!({
            "pi_a": ["1", "2", "1"],
            "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "pi_c": ["7", "8", "1"],
            "protocol": "groth16",
            "curve": "bn128"
        })
    }

    fn le(n: u32, width: usize) -> String {
        let mut bytes = vec![0u8; width];
        bytes[..4].copy_from_slice(&n.to_le_bytes());
        hex::encode(bytes)
    }

    fn be(n: u32, width: usize) -> String {
        let mut bytes = vec![0u8; width];
        bytes[width - 4..].copy_from_slice(&n.to_be_bytes());
        hex::encode(bytes)
    }

    #[test]
    fn bn254_points_are_little_endian() {
        for curve in [Curve::Bn128, Curve::Bn254] {
            let formatted = Groth16Codec
                .format_proof(&snarkjs_proof(), &options(Library::Snarkjs, curve))
                .unwrap();
            assert_eq!(formatted["curve"], json!("Bn254"));
            assert_eq!(
                formatted["proof"]["a"],
                json!(format!("0x{}{}", le(1, 32), le(2, 32)))
            );
            assert_eq!(
                formatted["proof"]["b"],
                json!(format!(
                    "0x{}{}{}{}",
                    le(3, 32),
                    le(4, 32),
                    le(5, 32),
                    le(6, 32)
                ))
            );
        }
    }

    #[test]
    fn bls12_381_points_are_big_endian_48_bytes() {
        let formatted = Groth16Codec
            .format_proof(&snarkjs_proof(), &options(Library::Snarkjs, Curve::Bls12_381))
            .unwrap();
        assert_eq!(formatted["curve"], json!("Bls12_381"));
        let a = formatted["proof"]["a"].as_str().unwrap();
        assert_eq!(a.len(), 2 + 2 * 48 * 2);
        assert_eq!(a, format!("0x{}{}", be(1, 48), be(2, 48)));
        assert_eq!(
            formatted["proof"]["b"],
            json!(format!(
                "0x{}{}{}{}",
                be(4, 48),
                be(3, 48),
                be(6, 48),
                be(5, 48)
            ))
        );
    }

    #[test]
    fn public_signals_follow_curve_endianness() {
        let pubs = json!(["1", "0x02"]);
        assert_eq!(
            Groth16Codec
                .format_public_signals(&pubs, &options(Library::Snarkjs, Curve::Bn254))
                .unwrap(),
            json!([format!("0x{}", le(1, 32)), format!("0x{}", le(2, 32))])
        );
        assert_eq!(
            Groth16Codec
                .format_public_signals(&pubs, &options(Library::Snarkjs, Curve::Bls12_381))
                .unwrap(),
            json!([format!("0x{}", be(1, 32)), format!("0x{}", be(2, 32))])
        );
    }

    #[test]
    fn libraries_agree_on_the_same_proof() {
        let gnark = json!({
            "Ar": {"X": "1", "Y": "2"},
            "Bs": {"X": {"A0": "3", "A1": "4"}, "Y": {"A0": "5", "A1": "6"}},
            "Krs": {"X": "7", "Y": "8"}
        });
        let arkworks = json!({
            "a": ["0x1", "0x2"],
            "b": [["0x3", "0x4"], ["0x5", "0x6"]],
            "c": ["0x7", "0x8"]
        });
        let reference = Groth16Codec
            .format_proof(&snarkjs_proof(), &options(Library::Snarkjs, Curve::Bn254))
            .unwrap();
        assert_eq!(
            Groth16Codec
                .format_proof(&gnark, &options(Library::Gnark, Curve::Bn254))
                .unwrap(),
            reference
        );
        assert_eq!(
            Groth16Codec
                .format_proof(&arkworks, &options(Library::Arkworks, Curve::Bn254))
                .unwrap(),
            reference
        );
    }

    #[test]
    fn snarkjs_verification_key() {
        let vk = json!({
            "protocol": "groth16",
            "curve": "bn128",
            "nPublic": 1,
            "vk_alpha_1": ["1", "2", "1"],
            "vk_beta_2": [["3", "4"], ["5", "6"], ["1", "0"]],
            "vk_gamma_2": [["7", "8"], ["9", "10"], ["1", "0"]],
            "vk_delta_2": [["11", "12"], ["13", "14"], ["1", "0"]],
            "IC": [["15", "16", "1"], ["17", "18", "1"]]
        });
        let formatted = Groth16Codec
            .format_verification_key(&vk, &options(Library::Snarkjs, Curve::Bn254))
            .unwrap();
        assert_eq!(formatted["curve"], json!("Bn254"));
        assert_eq!(formatted["gammaAbcG1"].as_array().unwrap().len(), 2);
        assert_eq!(
            formatted["gammaAbcG1"][1],
            json!(format!("0x{}{}", le(17, 32), le(18, 32)))
        );
    }

    #[test]
    fn oversized_coordinate_is_rejected() {
        let mut proof = snarkjs_proof();
        proof["pi_a"][0] = json!(format!("0x01{}", "00".repeat(32)));
        assert_eq!(
            Groth16Codec
                .format_proof(&proof, &options(Library::Snarkjs, Curve::Bn254))
                .unwrap_err(),
            CodecError::ValueTooLarge(32)
        );
    }
}
