//! Drives one submitted call from submission to finalization, and
//! optionally to its attestation.
//!
//! ```text
//! pending ─▶ broadcast ─▶ inBlock ─▶ finalized ─▶ (attestation)
//!    │           │           │
//!    └───────────┴───────────┴─▶ invalid | dropped | error
//! ```
//!
//! The spawned tracking task is the only writer of the call's
//! [`TransactionInfo`]. Every failure is emitted as
//! [`TransactionEvent::Error`] before the task resolves with it.

use std::sync::Arc;
use std::time::Duration;

use ethereum_types::H256;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zkv_common::{convert_fee_to_token, TOKEN_DECIMALS};

use crate::attestation::{self, CorrelationOutcome, CorrelatorConfig};
use crate::call::SubmittableCall;
use crate::chain::{ChainClient, ChainTxStatus, RuntimeEvent, SubmissionUpdate};
use crate::dispatch_error::decode_dispatch_error;
use crate::events::{AttestationNotification, Notifier, TransactionEvent};
use crate::transaction::{
    TransactionInfo, TransactionRecord, TransactionStatus, TransactionType, Update,
};
use crate::ZkvError;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TrackOptions {
    /// After finalization of a verification call, wait for the attestation
    /// that includes it.
    pub wait_for_attestation: bool,
    /// Give up if the call is not finalized in time. No deadline by default.
    pub finalization_timeout: Option<Duration>,
    pub correlator: CorrelatorConfig,
}

/// Handle on a call being tracked.
pub struct TrackedTransaction {
    pub events: mpsc::UnboundedReceiver<TransactionEvent>,
    pub result: JoinHandle<Result<TransactionInfo, ZkvError>>,
}

impl TrackedTransaction {
    /// Waits for the call to resolve, dropping the notifications.
    pub async fn finish(self) -> Result<TransactionInfo, ZkvError> {
        self.result.await?
    }
}

/// Submits `call` and tracks it on a new task. Must be called from within a
/// tokio runtime.
pub fn submit_and_track<C: ChainClient>(
    client: Arc<C>,
    call: SubmittableCall,
    signer: C::Signer,
    options: TrackOptions,
) -> TrackedTransaction {
    let (notifier, events) = Notifier::channel();
    let tracker = Tracker {
        record: TransactionRecord::new(call.transaction_type(), call.proof_system),
        client,
        notifier,
        dispatch_error: None,
    };
    let result = tokio::spawn(tracker.run(call, signer, options));
    TrackedTransaction { events, result }
}

struct Tracker<C> {
    client: Arc<C>,
    record: TransactionRecord,
    notifier: Notifier<TransactionEvent>,
    /// Decoded failure of the call, captured when it is included. It is
    /// emitted at capture time and surfaced again on finalization.
    dispatch_error: Option<String>,
}

impl<C: ChainClient> Tracker<C> {
    async fn run(
        mut self,
        call: SubmittableCall,
        signer: C::Signer,
        options: TrackOptions,
    ) -> Result<TransactionInfo, ZkvError> {
        info!(
            proof_system = %call.proof_system,
            pallet = call.pallet(),
            method = call.method.name(),
            "submitting call"
        );

        let finalized = match options.finalization_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.drive(&call, &signer))
                .await
                .unwrap_or(Err(ZkvError::Timeout(timeout))),
            None => self.drive(&call, &signer).await,
        };
        let info = match finalized {
            Ok(info) => info,
            Err(e) => return Err(self.fail(e)),
        };

        if !options.wait_for_attestation || info.transaction_type != TransactionType::Verify {
            return Ok(info);
        }
        match self.await_attestation(info, options.correlator).await {
            Ok(info) => Ok(info),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn drive(
        &mut self,
        call: &SubmittableCall,
        signer: &C::Signer,
    ) -> Result<TransactionInfo, ZkvError> {
        let mut updates = self.client.submit_and_watch(call, signer).await?;

        while let Some(update) = updates.next().await {
            let update = update?;
            debug!(status = %update.status, tx = ?update.tx_hash, "transaction status");

            match update.status {
                ChainTxStatus::Future | ChainTxStatus::Ready => {
                    self.record.apply(Update::Submitted {
                        tx_hash: update.tx_hash,
                    });
                }
                ChainTxStatus::Broadcast => {
                    self.record.apply(Update::Submitted {
                        tx_hash: update.tx_hash,
                    });
                    self.record
                        .apply(Update::Status(TransactionStatus::Broadcast));
                    self.notifier.emit(TransactionEvent::Broadcast {
                        proof_system: self.record.info().proof_system,
                        tx_hash: update.tx_hash,
                    });
                }
                ChainTxStatus::InBlock(block) => self.on_in_block(block, &update),
                ChainTxStatus::Retracted(block) => {
                    warn!("transaction retracted from block {block:?}, waiting for re-inclusion")
                }
                ChainTxStatus::FinalityTimeout(block) => {
                    warn!("finality timeout for block {block:?}, still waiting")
                }
                ChainTxStatus::Finalized(block) => return self.on_finalized(block, &update),
                ChainTxStatus::Usurped(_) | ChainTxStatus::Dropped => {
                    return Err(ZkvError::Abandoned(update.status.to_string()))
                }
                ChainTxStatus::Invalid => return Err(ZkvError::Invalid),
            }
        }

        Err(ZkvError::Abandoned(
            "status stream ended before finalization".to_owned(),
        ))
    }

    fn on_in_block(&mut self, block: H256, update: &SubmissionUpdate) {
        if let Some(previous) = self.record.info().block_hash.filter(|h| *h != block) {
            info!(?previous, ?block, "transaction re-included, discarding the previous block");
            self.record.apply(Update::Reincluded);
            self.dispatch_error = None;
        }
        info!(?block, tx = ?update.tx_hash, "transaction included in block");
        self.record.apply(Update::Included {
            block_hash: block,
            tx_hash: update.tx_hash,
            tx_index: update.tx_index,
        });
        for event in &update.events {
            self.on_event(event);
        }
        self.notifier
            .emit(TransactionEvent::IncludedInBlock(self.record.snapshot()));
    }

    fn on_event(&mut self, event: &RuntimeEvent) {
        let transaction_type = self.record.info().transaction_type;
        match event {
            RuntimeEvent::TransactionFeePaid {
                who,
                actual_fee,
                tip,
            } => {
                let fee_in_tokens = convert_fee_to_token(&actual_fee.to_string(), TOKEN_DECIMALS)
                    .inspect_err(|e| warn!("could not convert fee: {e}"))
                    .ok();
                self.record.apply(Update::Fee {
                    who: who.clone(),
                    actual_fee: *actual_fee,
                    tip: *tip,
                    fee_in_tokens,
                });
            }
            RuntimeEvent::ExtrinsicSuccess { dispatch_info } => {
                self.record.apply(Update::Dispatch(*dispatch_info));
            }
            RuntimeEvent::ExtrinsicFailed {
                dispatch_error,
                dispatch_info,
            } => {
                self.record.apply(Update::Dispatch(*dispatch_info));
                let message = decode_dispatch_error(&*self.client, dispatch_error);
                if self.dispatch_error.as_deref() != Some(message.as_str()) {
                    error!("transaction failed: {message}");
                    self.notifier.emit(TransactionEvent::Error(message.clone()));
                    self.dispatch_error = Some(message);
                }
            }
            RuntimeEvent::NewElement {
                value,
                attestation_id,
            } if transaction_type == TransactionType::Verify => {
                debug!(attestation_id, leaf = ?value, "statement queued for attestation");
                self.record.apply(Update::Aggregation {
                    aggregation_id: *attestation_id,
                    leaf_digest: *value,
                });
            }
            RuntimeEvent::VkRegistered { hash } if transaction_type == TransactionType::VkRegistration => {
                debug!(statement = ?hash, "verification key registered");
                self.record.apply(Update::Statement(*hash));
            }
            _ => {}
        }
    }

    fn on_finalized(
        &mut self,
        block: H256,
        update: &SubmissionUpdate,
    ) -> Result<TransactionInfo, ZkvError> {
        // Inclusion may not have been reported, or reported in another block.
        if self.record.info().block_hash != Some(block) {
            self.on_in_block(block, update);
        }

        if let Some(message) = &self.dispatch_error {
            return Err(ZkvError::Dispatch(message.clone()));
        }
        let info = self.record.info();
        if !info.has_identifier() {
            return Err(ZkvError::MissingIdentifier(info.identifier_name()));
        }

        self.record
            .apply(Update::Status(TransactionStatus::Finalized));
        info!(?block, "transaction finalized");
        let snapshot = self.record.snapshot();
        self.notifier
            .emit(TransactionEvent::Finalized(snapshot.clone()));
        Ok(snapshot)
    }

    async fn await_attestation(
        &mut self,
        mut info: TransactionInfo,
        config: CorrelatorConfig,
    ) -> Result<TransactionInfo, ZkvError> {
        let Some(expected_id) = info.aggregation_id else {
            return Err(ZkvError::MissingIdentifier(info.identifier_name()));
        };
        info!(expected_id, "waiting for attestation");

        let mut subscription =
            attestation::subscribe(self.client.clone(), Some(expected_id), config, |_, _| {});
        let mut failure = None;
        while let Some(notification) = subscription.notifications.recv().await {
            self.notifier
                .emit(TransactionEvent::Attestation(notification.clone()));
            match notification {
                AttestationNotification::Unsubscribed => break,
                AttestationNotification::Error(reason) => {
                    failure = Some(reason);
                    break;
                }
                _ => {}
            }
        }
        if let Some(reason) = failure {
            subscription.unsubscribe();
            return Err(ZkvError::Correlation(reason));
        }

        match subscription.outcome.await? {
            CorrelationOutcome::Confirmed(event) | CorrelationOutcome::Recovered(event) => {
                info.attestation_event = Some(event);
                info.attestation_confirmed = true;
            }
            CorrelationOutcome::Missed { .. } | CorrelationOutcome::Unsubscribed => {}
            CorrelationOutcome::Closed(reason) => return Err(ZkvError::Correlation(reason)),
        }
        Ok(info)
    }

    /// Records `error` as the terminal state and emits it, unless it was
    /// already emitted when captured.
    fn fail(&mut self, error: ZkvError) -> ZkvError {
        let status = match &error {
            ZkvError::Invalid => TransactionStatus::Invalid,
            ZkvError::Abandoned(_) => TransactionStatus::Dropped,
            _ => TransactionStatus::Error,
        };
        self.record.apply(Update::Status(status));

        let already_emitted = matches!(
            (&error, &self.dispatch_error),
            (ZkvError::Dispatch(message), Some(captured)) if message == captured
        );
        if !already_emitted {
            error!("tracking failed: {error}");
            self.notifier.emit(TransactionEvent::Error(error.to_string()));
        }
        error
    }
}
