//! Extrinsic construction and its hex transport encoding.
//!
//! A [`SubmittableCall`] is RLP encoded as the list
//! `[pallet, method, params]`, where `params` is the JSON encoding of the
//! method parameters.

use enum_as_inner::EnumAsInner;
use proof_codec::{FormattedProofBundle, ProofSystem, Vk};
use rlp::{Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;
use zkv_common::{decode_prefixed_hex, encode_prefixed_hex};

use crate::transaction::TransactionType;

const SUBMIT_PROOF: &str = "submitProof";
const REGISTER_VK: &str = "registerVk";

/// Construction errors. Each carries the proof system and a pretty-printed
/// dump of the parameters involved.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CallError {
    #[error("Error building {system} call: {reason}\nParams: {params}")]
    Build {
        system: String,
        reason: String,
        params: String,
    },

    #[error("Error encoding {system} call: {reason}\nParams: {params}")]
    Encode {
        system: String,
        reason: String,
        params: String,
    },

    #[error("Error decoding {system} call from hex: {reason}\nParams: {params}")]
    Decode {
        system: String,
        reason: String,
        params: String,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofParams {
    pub vk_or_hash: Vk,
    pub proof: Value,
    pub pubs: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVkParams {
    pub vk: Value,
}

#[derive(Clone, Debug, EnumAsInner, PartialEq)]
pub enum CallMethod {
    SubmitProof(SubmitProofParams),
    RegisterVk(RegisterVkParams),
}

impl CallMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CallMethod::SubmitProof(_) => SUBMIT_PROOF,
            CallMethod::RegisterVk(_) => REGISTER_VK,
        }
    }

    fn params(&self) -> Result<Value, serde_json::Error> {
        match self {
            CallMethod::SubmitProof(params) => serde_json::to_value(params),
            CallMethod::RegisterVk(params) => serde_json::to_value(params),
        }
    }
}

/// A call to one of the settlement pallets, ready to be signed.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmittableCall {
    pub proof_system: ProofSystem,
    pub method: CallMethod,
}

impl SubmittableCall {
    pub fn pallet(&self) -> &'static str {
        self.proof_system.pallet()
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self.method {
            CallMethod::SubmitProof(_) => TransactionType::Verify,
            CallMethod::RegisterVk(_) => TransactionType::VkRegistration,
        }
    }

    /// `{pallet, method, params}` view of the call, for display.
    pub fn to_json(&self) -> Value {
        json!({
            "pallet": self.pallet(),
            "method": self.method.name(),
            "params": self.method.params().unwrap_or(Value::Null),
        })
    }

    fn params_dump(&self) -> String {
        pretty(&self.method.params().unwrap_or(Value::Null))
    }
}

impl Encodable for SubmittableCall {
    fn rlp_append(&self, s: &mut RlpStream) {
        // `to_hex` checks that the parameters serialize before encoding.
        let params = self
            .method
            .params()
            .ok()
            .and_then(|params| serde_json::to_vec(&params).ok())
            .unwrap_or_default();
        s.begin_list(3);
        s.append(&self.pallet().to_owned());
        s.append(&self.method.name().to_owned());
        s.append(&params);
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Builds a `submitProof` call from a formatted bundle.
pub fn build_call(
    proof_system: ProofSystem,
    bundle: &FormattedProofBundle,
    domain_id: Option<u32>,
) -> Result<SubmittableCall, CallError> {
    let params = SubmitProofParams {
        vk_or_hash: bundle.formatted_verification_key.clone(),
        proof: bundle.formatted_proof.clone(),
        pubs: bundle.formatted_public_signals.clone(),
        domain_id,
    };
    let call = SubmittableCall {
        proof_system,
        method: CallMethod::SubmitProof(params),
    };

    let missing = [
        ("proof", &bundle.formatted_proof),
        ("public signals", &bundle.formatted_public_signals),
    ]
    .into_iter()
    .chain(
        bundle
            .formatted_verification_key
            .as_vk()
            .map(|vk| ("verification key", vk)),
    )
    .find(|(_, value)| is_empty(value));
    if let Some((field, _)) = missing {
        return Err(CallError::Build {
            system: proof_system.to_string(),
            reason: format!("formatted {field} is empty"),
            params: call.params_dump(),
        });
    }

    debug!(%proof_system, pallet = call.pallet(), ?domain_id, "built submitProof call");
    Ok(call)
}

/// Builds a `registerVk` call from a formatted verification key.
pub fn build_register_vk_call(
    proof_system: ProofSystem,
    verification_key: Value,
) -> Result<SubmittableCall, CallError> {
    let call = SubmittableCall {
        proof_system,
        method: CallMethod::RegisterVk(RegisterVkParams {
            vk: verification_key,
        }),
    };
    if call
        .method
        .as_register_vk()
        .is_some_and(|params| is_empty(&params.vk))
    {
        return Err(CallError::Build {
            system: proof_system.to_string(),
            reason: "formatted verification key is empty".to_owned(),
            params: call.params_dump(),
        });
    }
    Ok(call)
}

/// `0x`-prefixed hex of the call's encoding.
pub fn to_hex(call: &SubmittableCall) -> Result<String, CallError> {
    let encode_error = |reason: String| CallError::Encode {
        system: call.proof_system.to_string(),
        reason,
        params: call.params_dump(),
    };
    let params = call
        .method
        .params()
        .map_err(|e| encode_error(e.to_string()))?;
    serde_json::to_vec(&params).map_err(|e| encode_error(e.to_string()))?;

    Ok(encode_prefixed_hex(rlp::encode(call)))
}

/// Reconstructs a call from the output of [`to_hex`].
pub fn from_hex(hex: &str) -> Result<SubmittableCall, CallError> {
    let decode_error = |system: Option<ProofSystem>, reason: String, params: &str| {
        CallError::Decode {
            system: system.map_or_else(|| "unknown".to_owned(), |s| s.to_string()),
            reason,
            params: params.to_owned(),
        }
    };

    let bytes = decode_prefixed_hex(hex.trim())
        .map_err(|e| decode_error(None, format!("invalid hex: {e}"), hex))?;
    let rlp = Rlp::new(&bytes);
    let rlp_error = |e: rlp::DecoderError| decode_error(None, format!("invalid encoding: {e}"), hex);
    if rlp.item_count().map_err(rlp_error)? != 3 {
        return Err(decode_error(
            None,
            "expected a [pallet, method, params] list".to_owned(),
            hex,
        ));
    }
    let pallet: String = rlp.val_at(0).map_err(rlp_error)?;
    let method: String = rlp.val_at(1).map_err(rlp_error)?;
    let params: Vec<u8> = rlp.val_at(2).map_err(rlp_error)?;

    let params_text = match serde_json::from_slice::<Value>(&params) {
        Ok(value) => pretty(&value),
        Err(_) => String::from_utf8_lossy(&params).into_owned(),
    };
    let proof_system = ProofSystem::from_pallet(&pallet).ok_or_else(|| {
        decode_error(None, format!("unknown pallet `{pallet}`"), &params_text)
    })?;
    let deserializer = &mut serde_json::Deserializer::from_slice(&params);
    let method = match method.as_str() {
        SUBMIT_PROOF => serde_path_to_error::deserialize(deserializer).map(CallMethod::SubmitProof),
        REGISTER_VK => serde_path_to_error::deserialize(deserializer).map(CallMethod::RegisterVk),
        other => {
            return Err(decode_error(
                Some(proof_system),
                format!("unknown method `{other}`"),
                &params_text,
            ))
        }
    }
    .map_err(|e| decode_error(Some(proof_system), e.to_string(), &params_text))?;

    Ok(SubmittableCall {
        proof_system,
        method,
    })
}

#[cfg(test)]
mod tests {
    use ethereum_types::H256;

    use super::*;

    fn bundle(vk: Vk) -> FormattedProofBundle {
        FormattedProofBundle {
            formatted_proof: json!("0xabcd"),
            formatted_public_signals: json!(["0x01", "0x02"]),
            formatted_verification_key: vk,
        }
    }

    #[test]
    fn submit_proof_call_targets_the_system_pallet() {
        let call = build_call(ProofSystem::Sp1, &bundle(Vk::Vk(json!("0xff"))), Some(1)).unwrap();
        assert_eq!(call.pallet(), "settlementSp1Pallet");
        assert_eq!(call.transaction_type(), TransactionType::Verify);
        assert_eq!(
            call.to_json(),
            json!({
                "pallet": "settlementSp1Pallet",
                "method": "submitProof",
                "params": {
                    "vkOrHash": {"Vk": "0xff"},
                    "proof": "0xabcd",
                    "pubs": ["0x01", "0x02"],
                    "domainId": 1
                }
            })
        );
    }

    #[test]
    fn empty_fields_are_rejected_with_a_dump() {
        let mut empty = bundle(Vk::Vk(json!("0xff")));
        empty.formatted_proof = Value::Null;
        let err = build_call(ProofSystem::Plonky2, &empty, None).unwrap_err();
        let message = err.to_string();
        assert!(
            message.starts_with("Error building plonky2 call: formatted proof is empty"),
            "{message}"
        );
        assert!(message.contains("\"vkOrHash\""), "{message}");

        assert!(build_call(ProofSystem::Plonky2, &bundle(Vk::Vk(json!(""))), None).is_err());
        assert!(build_register_vk_call(ProofSystem::Plonky2, Value::Null).is_err());
    }

    #[test]
    fn registered_key_is_carried_by_hash() {
        let hash = H256::repeat_byte(0x11);
        let call = build_call(ProofSystem::Groth16, &bundle(Vk::Hash(hash)), None).unwrap();
        let decoded = from_hex(&to_hex(&call).unwrap()).unwrap();
        assert_eq!(
            decoded
                .method
                .as_submit_proof()
                .unwrap()
                .vk_or_hash
                .as_hash(),
            Some(&hash)
        );
    }

    #[test]
    fn register_vk_round_trips() {
        let call =
            build_register_vk_call(ProofSystem::Risc0, json!(format!("0x{}", "22".repeat(32))))
                .unwrap();
        assert_eq!(call.transaction_type(), TransactionType::VkRegistration);
        assert_eq!(from_hex(&to_hex(&call).unwrap()).unwrap(), call);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(matches!(
            from_hex("not hex"),
            Err(CallError::Decode { system, .. }) if system == "unknown"
        ));
        assert!(from_hex("0x").is_err());

        let mut stream = RlpStream::new_list(3);
        stream.append(&"settlementFooPallet".to_owned());
        stream.append(&SUBMIT_PROOF.to_owned());
        stream.append(&b"{}".to_vec());
        let err = from_hex(&encode_prefixed_hex(stream.out())).unwrap_err();
        assert!(err.to_string().contains("unknown pallet"), "{err}");
    }

    #[test]
    fn decode_errors_name_the_offending_path() {
        let mut stream = RlpStream::new_list(3);
        stream.append(&"settlementFFlonkPallet".to_owned());
        stream.append(&SUBMIT_PROOF.to_owned());
        stream.append(&br#"{"vkOrHash":{"Hash":"0x12"},"proof":"0x","pubs":"0x"}"#.to_vec());
        let err = from_hex(&encode_prefixed_hex(stream.out())).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Error decoding fflonk call from hex: vkOrHash"), "{message}");
        assert!(message.contains("\nParams: {\n"), "{message}");
        assert!(
            message.contains("  \"vkOrHash\": {\n    \"Hash\": \"0x12\"\n  }"),
            "{message}"
        );
    }
}
