//! arkworks artifacts exported as JSON: affine coordinate arrays under
//! snake_case names, usually hex encoded.

use super::{Groth16Proof, Groth16Vk};
use crate::error::CodecError;
use crate::numeric::{Numeric, G1, G2};

pub(super) fn proof(proof: &Numeric) -> Result<Groth16Proof, CodecError> {
    Ok(Groth16Proof {
        a: G1::from_coordinates(proof.field("a")?)?,
        b: G2::from_coordinates(proof.field("b")?)?,
        c: G1::from_coordinates(proof.field("c")?)?,
    })
}

pub(super) fn verification_key(vk: &Numeric) -> Result<Groth16Vk, CodecError> {
    Ok(Groth16Vk {
        alpha_g1: G1::from_coordinates(vk.field("alpha_g1")?)?,
        beta_g2: G2::from_coordinates(vk.field("beta_g2")?)?,
        gamma_g2: G2::from_coordinates(vk.field("gamma_g2")?)?,
        delta_g2: G2::from_coordinates(vk.field("delta_g2")?)?,
        gamma_abc_g1: vk
            .field("gamma_abc_g1")?
            .list()?
            .iter()
            .map(G1::from_coordinates)
            .collect::<Result<_, _>>()?,
    })
}
