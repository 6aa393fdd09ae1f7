//! Notifications emitted while a call is tracked or an attestation
//! subscription is live.
//!
//! Each tracked call and each subscription owns its own channel; nothing is
//! shared between them.

use ethereum_types::H256;
use proof_codec::ProofSystem;
use tokio::sync::mpsc;
use tracing::trace;

use crate::chain::AttestationEvent;
use crate::transaction::TransactionInfo;

#[derive(Clone, Debug, PartialEq)]
pub enum AttestationNotification {
    /// The expected attestation was published.
    Confirmed(AttestationEvent),
    /// An attestation older than the expected one arrived; still waiting.
    BeforeExpected { expected_id: u64, received_id: u64 },
    /// The expected attestation was not seen and will not be.
    Missed { expected_id: u64, received_id: u64 },
    Error(String),
    Unsubscribed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransactionEvent {
    Broadcast {
        proof_system: ProofSystem,
        tx_hash: H256,
    },
    IncludedInBlock(TransactionInfo),
    Finalized(TransactionInfo),
    Error(String),
    /// Progress of the attestation wait that follows finalization.
    Attestation(AttestationNotification),
}

/// Sending half of a notification channel.
///
/// Nobody is required to listen: emitting to a dropped receiver is a no-op.
#[derive(Debug)]
pub struct Notifier<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: std::fmt::Debug> Notifier<T> {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: T) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            trace!(?event, "no listener for notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitting_without_listener_is_harmless() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.emit(AttestationNotification::Unsubscribed);
    }

    #[test]
    fn clones_share_the_channel() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.clone().emit(TransactionEvent::Error("boom".into()));
        notifier.emit(TransactionEvent::Attestation(
            AttestationNotification::Unsubscribed,
        ));
        assert_eq!(rx.try_recv(), Ok(TransactionEvent::Error("boom".into())));
        assert_eq!(
            rx.try_recv(),
            Ok(TransactionEvent::Attestation(
                AttestationNotification::Unsubscribed
            ))
        );
    }
}
