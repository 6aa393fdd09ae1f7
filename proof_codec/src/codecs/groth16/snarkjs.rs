//! snarkjs emits projective coordinates as decimal strings:
//! `pi_a: [x, y, z]`, `pi_b: [[x0, x1], [y0, y1], [z0, z1]]`.

use super::{Groth16Proof, Groth16Vk};
use crate::error::CodecError;
use crate::numeric::{Numeric, G1, G2};

pub(super) fn proof(proof: &Numeric) -> Result<Groth16Proof, CodecError> {
    Ok(Groth16Proof {
        a: G1::from_coordinates(proof.field("pi_a")?)?,
        b: G2::from_coordinates(proof.field("pi_b")?)?,
        c: G1::from_coordinates(proof.field("pi_c")?)?,
    })
}

pub(super) fn verification_key(vk: &Numeric) -> Result<Groth16Vk, CodecError> {
    Ok(Groth16Vk {
        alpha_g1: G1::from_coordinates(vk.field("vk_alpha_1")?)?,
        beta_g2: G2::from_coordinates(vk.field("vk_beta_2")?)?,
        gamma_g2: G2::from_coordinates(vk.field("vk_gamma_2")?)?,
        delta_g2: G2::from_coordinates(vk.field("vk_delta_2")?)?,
        gamma_abc_g1: vk
            .field("IC")?
            .list()?
            .iter()
            .map(G1::from_coordinates)
            .collect::<Result<_, _>>()?,
    })
}
