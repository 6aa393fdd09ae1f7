//! Proof system identifiers and the companion options selecting a codec
//! variant.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, FormatError};

/// Every proof system the network verifies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofSystem {
    Fflonk,
    Groth16,
    Risc0,
    Ultraplonk,
    #[serde(rename = "proofofsql")]
    ProofOfSql,
    Sp1,
    Plonky2,
}

impl ProofSystem {
    pub const ALL: [ProofSystem; 7] = [
        ProofSystem::Fflonk,
        ProofSystem::Groth16,
        ProofSystem::Risc0,
        ProofSystem::Ultraplonk,
        ProofSystem::ProofOfSql,
        ProofSystem::Sp1,
        ProofSystem::Plonky2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProofSystem::Fflonk => "fflonk",
            ProofSystem::Groth16 => "groth16",
            ProofSystem::Risc0 => "risc0",
            ProofSystem::Ultraplonk => "ultraplonk",
            ProofSystem::ProofOfSql => "proofofsql",
            ProofSystem::Sp1 => "sp1",
            ProofSystem::Plonky2 => "plonky2",
        }
    }

    /// Name of the pallet that verifies proofs of this system.
    pub fn pallet(&self) -> &'static str {
        match self {
            ProofSystem::Fflonk => "settlementFFlonkPallet",
            ProofSystem::Groth16 => "settlementGroth16Pallet",
            ProofSystem::Risc0 => "settlementRisc0Pallet",
            ProofSystem::Ultraplonk => "settlementUltraplonkPallet",
            ProofSystem::ProofOfSql => "settlementProofOfSqlPallet",
            ProofSystem::Sp1 => "settlementSp1Pallet",
            ProofSystem::Plonky2 => "settlementPlonky2Pallet",
        }
    }

    pub fn from_pallet(pallet: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|system| system.pallet() == pallet)
    }

    pub fn requires_library(&self) -> bool {
        matches!(self, ProofSystem::Groth16)
    }

    pub fn requires_curve(&self) -> bool {
        matches!(self, ProofSystem::Groth16)
    }

    pub fn requires_version(&self) -> bool {
        matches!(self, ProofSystem::Risc0)
    }
}

impl Display for ProofSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProofSystem {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|system| system.name() == wanted)
            .ok_or_else(|| FormatError::UnsupportedProofType(s.to_owned()))
    }
}

/// Prover library that produced a pairing-based proof, which fixes the JSON
/// layout of its artifacts.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    Snarkjs,
    Gnark,
    Arkworks,
}

impl Library {
    pub fn name(&self) -> &'static str {
        match self {
            Library::Snarkjs => "snarkjs",
            Library::Gnark => "gnark",
            Library::Arkworks => "arkworks",
        }
    }
}

impl Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Library {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snarkjs" => Ok(Library::Snarkjs),
            "gnark" => Ok(Library::Gnark),
            "arkworks" => Ok(Library::Arkworks),
            _ => Err(format!("unsupported library `{s}`")),
        }
    }
}

/// Pairing-friendly curve of a pairing-based proof.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Curve {
    #[serde(rename = "bn128")]
    Bn128,
    #[serde(rename = "bn254")]
    Bn254,
    #[serde(rename = "bls12381")]
    Bls12_381,
}

/// Byte order of serialized field elements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endianness {
    Big,
    Little,
}

impl Curve {
    /// The name the chain uses for this curve. `bn128` is an alias of
    /// `bn254`.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Curve::Bn128 | Curve::Bn254 => "Bn254",
            Curve::Bls12_381 => "Bls12_381",
        }
    }

    pub fn endianness(&self) -> Endianness {
        match self {
            Curve::Bn128 | Curve::Bn254 => Endianness::Little,
            Curve::Bls12_381 => Endianness::Big,
        }
    }

    /// Width in bytes of one base field coordinate.
    pub fn coordinate_len(&self) -> usize {
        match self.endianness() {
            Endianness::Little => 32,
            Endianness::Big => 48,
        }
    }

    /// Width in bytes of one scalar field element (public input).
    pub fn scalar_len(&self) -> usize {
        32
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Curve::Bn128 => "bn128",
            Curve::Bn254 => "bn254",
            Curve::Bls12_381 => "bls12381",
        })
    }
}

impl FromStr for Curve {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bn128" => Ok(Curve::Bn128),
            "bn254" => Ok(Curve::Bn254),
            "bls12381" | "bls12_381" => Ok(Curve::Bls12_381),
            _ => Err(CodecError::UnsupportedCurve(s.to_owned())),
        }
    }
}

/// On-chain proof format versions of the risc0 verifier.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Risc0Version {
    V1_0,
    V1_1,
    V1_2,
    V2_0,
}

impl Risc0Version {
    pub fn tag(&self) -> &'static str {
        match self {
            Risc0Version::V1_0 => "V1_0",
            Risc0Version::V1_1 => "V1_1",
            Risc0Version::V1_2 => "V1_2",
            Risc0Version::V2_0 => "V2_0",
        }
    }
}

impl FromStr for Risc0Version {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "V1_0" => Ok(Risc0Version::V1_0),
            "V1_1" => Ok(Risc0Version::V1_1),
            "V1_2" => Ok(Risc0Version::V1_2),
            "V2_0" => Ok(Risc0Version::V2_0),
            _ => Err(CodecError::InvalidVersion(s.to_owned())),
        }
    }
}

/// Selects the codec and route for one submission.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ProofOptions {
    pub proof_system: ProofSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<Library>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<Curve>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ProofOptions {
    pub fn new(proof_system: ProofSystem) -> Self {
        Self {
            proof_system,
            library: None,
            curve: None,
            version: None,
        }
    }

    pub fn with_library(mut self, library: Library) -> Self {
        self.library = Some(library);
        self
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builds options from loosely typed identifiers, as they arrive from a
    /// CLI or a config file.
    pub fn parse(
        proof_system: &str,
        library: Option<&str>,
        curve: Option<&str>,
        version: Option<&str>,
    ) -> Result<Self, FormatError> {
        let proof_system = proof_system.parse::<ProofSystem>()?;
        let invalid = |reason: String| FormatError::InvalidOptions {
            system: proof_system,
            reason,
        };
        let library = library
            .map(str::parse::<Library>)
            .transpose()
            .map_err(invalid)?;
        let curve = curve
            .map(str::parse::<Curve>)
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            proof_system,
            library,
            curve,
            version: version.map(str::to_owned),
        })
    }

    /// Version of a version-gated proof system.
    pub fn risc0_version(&self) -> Result<Risc0Version, CodecError> {
        self.version
            .as_deref()
            .ok_or(CodecError::MissingVersion)?
            .parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_system_by_name() {
        for system in ProofSystem::ALL {
            assert_eq!(system.name().parse::<ProofSystem>().unwrap(), system);
            assert_eq!(ProofSystem::from_pallet(system.pallet()), Some(system));
        }
        assert_eq!("Groth16".parse::<ProofSystem>().unwrap(), ProofSystem::Groth16);
    }

    #[test]
    fn rejects_unknown_system() {
        assert_eq!(
            "stark9000".parse::<ProofSystem>().unwrap_err(),
            FormatError::UnsupportedProofType("stark9000".into())
        );
    }

    #[test]
    fn bn128_is_an_alias_of_bn254() {
        assert_eq!(Curve::Bn128.wire_name(), Curve::Bn254.wire_name());
        assert_eq!(Curve::Bn128.endianness(), Endianness::Little);
        assert_eq!(Curve::Bls12_381.endianness(), Endianness::Big);
        assert_eq!(Curve::Bls12_381.coordinate_len(), 48);
    }

    #[test]
    fn rejects_unknown_curve() {
        assert_eq!(
            "secp256k1".parse::<Curve>().unwrap_err(),
            CodecError::UnsupportedCurve("secp256k1".into())
        );
        assert!(matches!(
            ProofOptions::parse("groth16", Some("snarkjs"), Some("pallas"), None),
            Err(FormatError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn risc0_versions() {
        let options = ProofOptions::new(ProofSystem::Risc0).with_version("v1_2");
        assert_eq!(options.risc0_version().unwrap(), Risc0Version::V1_2);
        assert_eq!(
            ProofOptions::new(ProofSystem::Risc0).risc0_version(),
            Err(CodecError::MissingVersion)
        );
        assert_eq!(
            "V9_9".parse::<Risc0Version>(),
            Err(CodecError::InvalidVersion("V9_9".into()))
        );
    }

    #[test]
    fn options_round_trip_through_json() {
        let options = ProofOptions::new(ProofSystem::Groth16)
            .with_library(Library::Gnark)
            .with_curve(Curve::Bls12_381);
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "proof_system": "groth16",
                "library": "gnark",
                "curve": "bls12381",
            })
        );
    }
}
