//! gnark's JSON export names points `{X, Y}` and extension field elements
//! `{A0, A1}`.

use num_bigint::BigUint;

use super::{Groth16Proof, Groth16Vk};
use crate::error::CodecError;
use crate::numeric::{Numeric, G1, G2};

fn g1(point: &Numeric) -> Result<G1, CodecError> {
    Ok(G1 {
        x: point.field("X")?.scalar()?.clone(),
        y: point.field("Y")?.scalar()?.clone(),
    })
}

fn fq2(element: &Numeric) -> Result<[BigUint; 2], CodecError> {
    Ok([
        element.field("A0")?.scalar()?.clone(),
        element.field("A1")?.scalar()?.clone(),
    ])
}

fn g2(point: &Numeric) -> Result<G2, CodecError> {
    Ok(G2 {
        x: fq2(point.field("X")?)?,
        y: fq2(point.field("Y")?)?,
    })
}

pub(super) fn proof(proof: &Numeric) -> Result<Groth16Proof, CodecError> {
    Ok(Groth16Proof {
        a: g1(proof.field("Ar")?)?,
        b: g2(proof.field("Bs")?)?,
        c: g1(proof.field("Krs")?)?,
    })
}

pub(super) fn verification_key(vk: &Numeric) -> Result<Groth16Vk, CodecError> {
    let g1_section = vk.field("G1")?;
    let g2_section = vk.field("G2")?;
    Ok(Groth16Vk {
        alpha_g1: g1(g1_section.field("Alpha")?)?,
        beta_g2: g2(g2_section.field("Beta")?)?,
        gamma_g2: g2(g2_section.field("Gamma")?)?,
        delta_g2: g2(g2_section.field("Delta")?)?,
        gamma_abc_g1: g1_section
            .field("K")?
            .list()?
            .iter()
            .map(g1)
            .collect::<Result<_, _>>()?,
    })
}
