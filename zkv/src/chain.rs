//! The chain collaborator: everything the SDK needs from a node connection.
//!
//! Implementations own the wire client (connection, retry, metadata-driven
//! decoding). The SDK only talks to them through [`ChainClient`], so the
//! lifecycle tracker and the attestation correlator can be exercised against
//! a scripted chain.

use std::fmt::{self, Display};
use std::future::Future;

use enum_as_inner::EnumAsInner;
use ethereum_types::{H256, U256};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::call::SubmittableCall;

/// A failure of the underlying connection, RPC or subscription.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ChainError {
    #[error("rpc request failed: {0}")]
    Rpc(String),

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("could not sign or submit the extrinsic: {0}")]
    Submission(String),
}

/// Stream of status updates for one submitted extrinsic.
pub type StatusStream = BoxStream<'static, Result<SubmissionUpdate, ChainError>>;

/// Stream of the events of every newly finalized block.
pub type EventStream = BoxStream<'static, Result<Vec<RuntimeEvent>, ChainError>>;

/// Transaction pool status, as reported by `author_submitAndWatchExtrinsic`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChainTxStatus {
    Future,
    Ready,
    Broadcast,
    InBlock(H256),
    Retracted(H256),
    FinalityTimeout(H256),
    Finalized(H256),
    Usurped(H256),
    Dropped,
    Invalid,
}

impl Display for ChainTxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainTxStatus::Future => write!(f, "future"),
            ChainTxStatus::Ready => write!(f, "ready"),
            ChainTxStatus::Broadcast => write!(f, "broadcast"),
            ChainTxStatus::InBlock(h) => write!(f, "in block {h:?}"),
            ChainTxStatus::Retracted(h) => write!(f, "retracted from {h:?}"),
            ChainTxStatus::FinalityTimeout(h) => write!(f, "finality timeout in {h:?}"),
            ChainTxStatus::Finalized(h) => write!(f, "finalized in {h:?}"),
            ChainTxStatus::Usurped(h) => write!(f, "usurped by {h:?}"),
            ChainTxStatus::Dropped => write!(f, "dropped"),
            ChainTxStatus::Invalid => write!(f, "invalid"),
        }
    }
}

/// One notification from the status stream of a submitted extrinsic.
///
/// For `InBlock` and `Finalized` the client fills in the position of the
/// extrinsic and the events it emitted in that block.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionUpdate {
    pub status: ChainTxStatus,
    pub tx_hash: H256,
    pub tx_index: Option<u32>,
    pub events: Vec<RuntimeEvent>,
}

impl SubmissionUpdate {
    pub fn new(status: ChainTxStatus, tx_hash: H256) -> Self {
        Self {
            status,
            tx_hash,
            tx_index: None,
            events: Vec::new(),
        }
    }

    pub fn with_events(mut self, tx_index: u32, events: Vec<RuntimeEvent>) -> Self {
        self.tx_index = Some(tx_index);
        self.events = events;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    pub ref_time: u64,
    pub proof_size: u64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchClass {
    #[default]
    Normal,
    Operational,
    Mandatory,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DispatchInfo {
    pub weight: Weight,
    pub class: DispatchClass,
    pub pays_fee: bool,
}

/// A pallet error, identified by the pallet index and the encoded error
/// variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModuleError {
    pub index: u8,
    pub error: [u8; 4],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenError {
    FundsUnavailable,
    OnlyProvider,
    BelowMinimum,
    CannotCreate,
    UnknownAsset,
    Frozen,
    Unsupported,
    CannotCreateHold,
    NotExpendable,
    Blocked,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithmeticError {
    Underflow,
    Overflow,
    DivisionByZero,
}

/// Why the runtime rejected a dispatched call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchError {
    Other(String),
    CannotLookup,
    BadOrigin,
    Module(ModuleError),
    ConsumerRemaining,
    NoProviders,
    TooManyConsumers,
    Token(TokenError),
    Arithmetic(ArithmeticError),
    Exhausted,
    Corruption,
    Unavailable,
}

/// A published aggregation: the Merkle root over a batch of verified
/// statements.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationEvent {
    pub id: u64,
    pub attestation_root: H256,
}

/// The subset of runtime events the SDK reacts to. Clients decode anything
/// else into [`RuntimeEvent::Other`].
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
pub enum RuntimeEvent {
    /// `transactionPayment.TransactionFeePaid`
    TransactionFeePaid {
        who: String,
        actual_fee: U256,
        tip: U256,
    },
    /// `system.ExtrinsicSuccess`
    ExtrinsicSuccess { dispatch_info: DispatchInfo },
    /// `system.ExtrinsicFailed`
    ExtrinsicFailed {
        dispatch_error: DispatchError,
        dispatch_info: DispatchInfo,
    },
    /// `poe.NewElement`, emitted when a verified statement is queued for the
    /// next attestation.
    NewElement { value: H256, attestation_id: u64 },
    /// `poe.NewAttestation`
    NewAttestation { id: u64, attestation: H256 },
    /// `<settlement pallet>.VkRegistered`
    VkRegistered { hash: H256 },
    Other { pallet: String, name: String },
}

impl RuntimeEvent {
    pub fn attestation(&self) -> Option<AttestationEvent> {
        match self {
            RuntimeEvent::NewAttestation { id, attestation } => Some(AttestationEvent {
                id: *id,
                attestation_root: *attestation,
            }),
            _ => None,
        }
    }
}

/// Merkle path of one leaf in a published attestation.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub root: H256,
    pub proof: Vec<H256>,
    pub number_of_leaves: u64,
    pub leaf_index: u64,
    pub leaf: H256,
}

/// Documentation of a pallet error, as found in the runtime metadata.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorDetails {
    pub section: String,
    pub name: String,
    pub docs: Vec<String>,
}

/// Resolves pallet errors against the runtime metadata.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorMetadata {
    fn module_error(&self, error: &ModuleError) -> Option<ErrorDetails>;
}

/// Node connection used by the SDK.
///
/// Every method may fail with a [`ChainError`]; callers propagate it rather
/// than retry.
pub trait ChainClient: ErrorMetadata + Send + Sync + 'static {
    /// Account able to sign extrinsics.
    type Signer: Clone + Send + Sync + 'static;

    /// Signs `call`, submits it and watches its pool status.
    fn submit_and_watch(
        &self,
        call: &SubmittableCall,
        signer: &Self::Signer,
    ) -> impl Future<Output = Result<StatusStream, ChainError>> + Send;

    /// Subscribes to the events of finalized blocks. Dropping the stream
    /// unsubscribes.
    fn subscribe_events(&self) -> impl Future<Output = Result<EventStream, ChainError>> + Send;

    fn finalized_head(&self) -> impl Future<Output = Result<H256, ChainError>> + Send;

    /// Parent of `block`, or `None` for the genesis block.
    fn parent_hash(
        &self,
        block: H256,
    ) -> impl Future<Output = Result<Option<H256>, ChainError>> + Send;

    fn events_at(
        &self,
        block: H256,
    ) -> impl Future<Output = Result<Vec<RuntimeEvent>, ChainError>> + Send;

    /// Proof of existence of `leaf_digest` in attestation `attestation_id`,
    /// queried at block `at` or at the best block.
    fn proof_path(
        &self,
        attestation_id: u64,
        leaf_digest: H256,
        at: Option<H256>,
    ) -> impl Future<Output = Result<MerkleProof, ChainError>> + Send;
}
