//! Client SDK for the proof verification network.
//!
//! Proof material is normalized by [`proof_codec`], wrapped into a
//! [`SubmittableCall`](call::SubmittableCall), submitted through a
//! [`ChainClient`](chain::ChainClient) and tracked by the
//! [`lifecycle`] state machine until it is finalized and, optionally,
//! included in a published attestation.

use std::time::Duration;

use proof_codec::FormatError;
use thiserror::Error;

pub mod attestation;
pub mod call;
pub mod chain;
pub mod dispatch_error;
pub mod env;
pub mod events;
pub mod lifecycle;
pub mod session;
pub mod tracing;
pub mod transaction;

pub use crate::call::{build_call, build_register_vk_call, from_hex, to_hex, SubmittableCall};
pub use crate::chain::{ChainClient, ChainError};
pub use crate::lifecycle::{submit_and_track, TrackOptions, TrackedTransaction};
pub use crate::session::Session;
pub use crate::transaction::{TransactionInfo, TransactionStatus, TransactionType};

#[derive(Debug, Error)]
pub enum ZkvError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Call(#[from] call::CallError),

    /// The runtime rejected the call. Carries the decoded dispatch error.
    #[error("{0}")]
    Dispatch(String),

    #[error(transparent)]
    Transport(#[from] ChainError),

    #[error("transaction finalized without a {0}")]
    MissingIdentifier(&'static str),

    #[error("transaction is invalid")]
    Invalid,

    #[error("transaction abandoned: {0}")]
    Abandoned(String),

    #[error("transaction not finalized within {0:?}")]
    Timeout(Duration),

    #[error("session is read-only, {0} needs an account")]
    ReadOnly(&'static str),

    #[error("attestation correlation failed: {0}")]
    Correlation(String),

    #[error("tracking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
