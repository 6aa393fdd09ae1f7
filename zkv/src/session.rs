//! Fluent entry point tying the codecs, the call builder and the trackers
//! to one chain connection.
//!
//! ```rust,ignore
//! let session = Session::new(client, account);
//! let tracked = session
//!     .verify(ProofOptions::new(ProofSystem::Fflonk))
//!     .wait_for_attestation()
//!     .execute(&raw_bundle)?;
//! let info = tracked.finish().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use ethereum_types::H256;
use proof_codec::{FormattedProofBundle, ProofOptions, RawProofBundle};
use serde_json::Value;
use tracing::debug;

use crate::attestation::{self, AttestationSubscription, CorrelatorConfig, SubscriptionHandle};
use crate::call::{build_call, build_register_vk_call, SubmittableCall};
use crate::chain::{AttestationEvent, ChainClient, MerkleProof};
use crate::lifecycle::{submit_and_track, TrackOptions, TrackedTransaction};
use crate::ZkvError;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SessionConfig {
    pub correlator: CorrelatorConfig,
    pub finalization_timeout: Option<Duration>,
}

/// A chain connection, with or without an account.
///
/// Read-only sessions can format proofs, subscribe to attestations and query
/// proofs of existence, but refuse anything that submits a transaction.
pub struct Session<C: ChainClient> {
    client: Arc<C>,
    signer: Option<C::Signer>,
    config: SessionConfig,
}

impl<C: ChainClient> Session<C> {
    pub fn new(client: Arc<C>, signer: C::Signer) -> Self {
        Self {
            client,
            signer: Some(signer),
            config: SessionConfig::default(),
        }
    }

    pub fn read_only(client: Arc<C>) -> Self {
        Self {
            client,
            signer: None,
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn is_read_only(&self) -> bool {
        self.signer.is_none()
    }

    fn signer(&self, operation: &'static str) -> Result<C::Signer, ZkvError> {
        self.signer.clone().ok_or(ZkvError::ReadOnly(operation))
    }

    fn track_options(&self, wait_for_attestation: bool) -> TrackOptions {
        TrackOptions {
            wait_for_attestation,
            finalization_timeout: self.config.finalization_timeout,
            correlator: self.config.correlator,
        }
    }

    /// Starts a proof submission.
    pub fn verify(&self, options: ProofOptions) -> VerifyBuilder<'_, C> {
        VerifyBuilder {
            session: self,
            options,
            registered_vk: false,
            wait_for_attestation: false,
            domain_id: None,
        }
    }

    /// Formats `verification_key` and registers it on-chain. The resulting
    /// [`TransactionInfo`](crate::TransactionInfo) carries the statement
    /// hash to use with [`VerifyBuilder::registered_vk`].
    pub fn register_verification_key(
        &self,
        options: &ProofOptions,
        verification_key: &Value,
    ) -> Result<TrackedTransaction, ZkvError> {
        let signer = self.signer("registering a verification key")?;
        let formatted = proof_codec::format_verification_key(options, verification_key)?;
        let call = build_register_vk_call(options.proof_system, formatted)?;
        Ok(submit_and_track(
            self.client.clone(),
            call,
            signer,
            self.track_options(false),
        ))
    }

    /// Subscribes to published attestations. See [`attestation`] for how
    /// `expected_id` is matched.
    pub fn subscribe<F>(&self, expected_id: Option<u64>, callback: F) -> AttestationSubscription
    where
        F: FnMut(&AttestationEvent, &SubscriptionHandle) + Send + 'static,
    {
        attestation::subscribe(
            self.client.clone(),
            expected_id,
            self.config.correlator,
            callback,
        )
    }

    /// Merkle path proving that `leaf_digest` is part of attestation
    /// `attestation_id`.
    pub async fn poe(
        &self,
        attestation_id: u64,
        leaf_digest: H256,
        at: Option<H256>,
    ) -> Result<MerkleProof, ZkvError> {
        debug!(attestation_id, leaf = ?leaf_digest, "querying proof of existence");
        Ok(self
            .client
            .proof_path(attestation_id, leaf_digest, at)
            .await?)
    }
}

/// Options of one proof submission.
pub struct VerifyBuilder<'a, C: ChainClient> {
    session: &'a Session<C>,
    options: ProofOptions,
    registered_vk: bool,
    wait_for_attestation: bool,
    domain_id: Option<u32>,
}

impl<C: ChainClient> VerifyBuilder<'_, C> {
    /// The verification key input is the hash of a registered key.
    pub fn registered_vk(mut self) -> Self {
        self.registered_vk = true;
        self
    }

    /// Resolve only once the attestation including the proof is published.
    pub fn wait_for_attestation(mut self) -> Self {
        self.wait_for_attestation = true;
        self
    }

    /// Aggregation domain the statement is submitted to.
    pub fn domain(mut self, domain_id: u32) -> Self {
        self.domain_id = Some(domain_id);
        self
    }

    /// Formats `raw` without submitting it.
    pub fn format(&self, raw: &RawProofBundle) -> Result<FormattedProofBundle, ZkvError> {
        Ok(proof_codec::format(&self.options, raw, self.registered_vk)?)
    }

    /// Formats `raw`, builds the call and submits it.
    pub fn execute(self, raw: &RawProofBundle) -> Result<TrackedTransaction, ZkvError> {
        let signer = self.session.signer("submitting a proof")?;
        let formatted = self.format(raw)?;
        let call = build_call(self.options.proof_system, &formatted, self.domain_id)?;
        Ok(self.submit(call, signer))
    }

    /// Submits a call built elsewhere, e.g. decoded with
    /// [`from_hex`](crate::call::from_hex).
    pub fn execute_call(self, call: SubmittableCall) -> Result<TrackedTransaction, ZkvError> {
        let signer = self.session.signer("submitting a proof")?;
        Ok(self.submit(call, signer))
    }

    fn submit(self, call: SubmittableCall, signer: C::Signer) -> TrackedTransaction {
        submit_and_track(
            self.session.client.clone(),
            call,
            signer,
            self.session.track_options(self.wait_for_attestation),
        )
    }
}
