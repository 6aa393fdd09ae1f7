//! Maps a proof system to its codec and the pallet that verifies it.

use tracing::warn;

use crate::codecs::{codec_for, ProofCodec};
use crate::error::FormatError;
use crate::system::{ProofOptions, ProofSystem};

/// Where proofs of one system go and how they are encoded.
#[derive(Clone, Copy)]
pub struct Route {
    pub system: ProofSystem,
    pub pallet: &'static str,
    pub codec: &'static dyn ProofCodec,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("system", &self.system)
            .field("pallet", &self.pallet)
            .finish_non_exhaustive()
    }
}

pub fn route(system: ProofSystem) -> Route {
    Route {
        system,
        pallet: system.pallet(),
        codec: codec_for(system),
    }
}

/// Looks up a route by proof system name.
pub fn route_by_name(name: &str) -> Result<Route, FormatError> {
    Ok(route(name.parse()?))
}

/// Checks that the companion options are exactly those the proof system
/// needs, then returns its route.
pub fn resolve(options: &ProofOptions) -> Result<Route, FormatError> {
    validate_options(options)?;
    Ok(route(options.proof_system))
}

pub fn validate_options(options: &ProofOptions) -> Result<(), FormatError> {
    let system = options.proof_system;
    let invalid = |reason: String| Err(FormatError::InvalidOptions { system, reason });

    match (system.requires_library(), options.library) {
        (true, None) => return invalid("a library must be specified".to_owned()),
        (false, Some(library)) => {
            return invalid(format!("library `{library}` is not supported by {system}"))
        }
        _ => {}
    }

    match (system.requires_curve(), options.curve) {
        (true, None) => return invalid("a curve must be specified".to_owned()),
        (false, Some(curve)) => {
            return invalid(format!("curve `{curve}` is not supported by {system}"))
        }
        _ => {}
    }

    if system.requires_version() {
        if let Err(e) = options.risc0_version() {
            return invalid(e.to_string());
        }
    } else if let Some(version) = &options.version {
        warn!("ignoring version `{version}`: {system} proofs are not versioned");
    }

    Ok(())
}
