use enum_as_inner::EnumAsInner;
use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Proof material as produced by a prover, in whatever shape the prover
/// library emits.
///
/// A missing field is represented by [`Value::Null`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProofBundle {
    #[serde(default)]
    pub proof: Value,
    #[serde(default)]
    pub public_signals: Value,
    #[serde(default)]
    pub verification_key: Value,
}

impl RawProofBundle {
    pub fn new(proof: Value, public_signals: Value, verification_key: Value) -> Self {
        Self {
            proof,
            public_signals,
            verification_key,
        }
    }
}

/// A verification key as carried by a submission: either inline, or a
/// reference to a key previously registered on-chain.
#[derive(Clone, Debug, EnumAsInner, PartialEq, Deserialize, Serialize)]
pub enum Vk {
    Vk(Value),
    Hash(H256),
}

/// Proof material in canonical wire form.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedProofBundle {
    pub formatted_proof: Value,
    pub formatted_public_signals: Value,
    pub formatted_verification_key: Vk,
}
