//! Matches published attestations against the one a verified statement was
//! queued for.
//!
//! Attestation ids are assigned densely and in order, but a subscriber can
//! still observe them out of order (reconnects, late subscription). The
//! correlator decides, per received id, whether the expected attestation
//! is confirmed, still to come, or missed:
//!
//! | received            | outcome                                                  |
//! |---------------------|----------------------------------------------------------|
//! | `< expected`        | `BeforeExpected`, keep listening                         |
//! | `== expected`       | callback, `Confirmed`, unsubscribe                       |
//! | `== expected + 1`   | scan recent finalized blocks; `Missed` if not found, unsubscribe |
//! | `> expected + 1`    | `Missed`, unsubscribe                                    |
//!
//! Without an expected id every attestation goes to the callback until the
//! caller unsubscribes.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chain::{AttestationEvent, ChainClient, ChainError, EventStream, RuntimeEvent};
use crate::events::{AttestationNotification, Notifier};

/// Number of finalized blocks searched backwards for a skipped attestation.
pub const DEFAULT_SCAN_DEPTH: u32 = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CorrelatorConfig {
    pub scan_depth: u32,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            scan_depth: DEFAULT_SCAN_DEPTH,
        }
    }
}

/// How a subscription ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CorrelationOutcome {
    Confirmed(AttestationEvent),
    /// The expected attestation was skipped by the subscription but found in
    /// recent history.
    Recovered(AttestationEvent),
    Missed { expected_id: u64, received_id: u64 },
    Unsubscribed,
    /// The event subscription could not be opened or was closed by the
    /// chain.
    Closed(String),
}

/// Cancels a subscription.
///
/// Clones share the subscription. Unsubscribing is idempotent and may be
/// done from within the callback.
#[derive(Clone, Debug)]
pub struct SubscriptionHandle {
    cancel: Arc<watch::Sender<bool>>,
    notifier: Notifier<AttestationNotification>,
}

impl SubscriptionHandle {
    fn new(notifier: Notifier<AttestationNotification>) -> (Self, watch::Receiver<bool>) {
        let (cancel, cancelled) = watch::channel(false);
        (
            Self {
                cancel: Arc::new(cancel),
                notifier,
            },
            cancelled,
        )
    }

    /// Closes the subscription. Only the first call emits
    /// [`AttestationNotification::Unsubscribed`].
    pub fn unsubscribe(&self) {
        let first = self.cancel.send_if_modified(|cancelled| {
            let first = !*cancelled;
            *cancelled = true;
            first
        });
        if first {
            debug!("unsubscribed from attestations");
            self.notifier.emit(AttestationNotification::Unsubscribed);
        }
    }

    pub fn is_unsubscribed(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// A live attestation subscription.
pub struct AttestationSubscription {
    pub notifications: mpsc::UnboundedReceiver<AttestationNotification>,
    pub handle: SubscriptionHandle,
    pub outcome: JoinHandle<CorrelationOutcome>,
}

impl AttestationSubscription {
    pub fn unsubscribe(&self) {
        self.handle.unsubscribe();
    }
}

/// Subscribes to attestations, correlating them with `expected_id` when
/// given. `callback` receives the expected attestation, or every
/// attestation when there is no expected id.
pub fn subscribe<C, F>(
    client: Arc<C>,
    expected_id: Option<u64>,
    config: CorrelatorConfig,
    callback: F,
) -> AttestationSubscription
where
    C: ChainClient,
    F: FnMut(&AttestationEvent, &SubscriptionHandle) + Send + 'static,
{
    let (notifier, notifications) = Notifier::channel();
    let (handle, cancelled) = SubscriptionHandle::new(notifier.clone());
    let correlator = Correlator {
        client,
        expected_id,
        config,
        notifier,
        handle: handle.clone(),
        callback,
    };
    let outcome = tokio::spawn(correlator.run(cancelled));
    AttestationSubscription {
        notifications,
        handle,
        outcome,
    }
}

struct Correlator<C, F> {
    client: Arc<C>,
    expected_id: Option<u64>,
    config: CorrelatorConfig,
    notifier: Notifier<AttestationNotification>,
    handle: SubscriptionHandle,
    callback: F,
}

impl<C, F> Correlator<C, F>
where
    C: ChainClient,
    F: FnMut(&AttestationEvent, &SubscriptionHandle) + Send + 'static,
{
    async fn run(mut self, mut cancelled: watch::Receiver<bool>) -> CorrelationOutcome {
        let events = match self.client.subscribe_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!("could not subscribe to attestations: {e}");
                self.notifier
                    .emit(AttestationNotification::Error(e.to_string()));
                return CorrelationOutcome::Closed(e.to_string());
            }
        };
        debug!(expected_id = ?self.expected_id, "subscribed to attestations");

        let attestations = attestations(events);
        tokio::pin!(attestations);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled.changed() => return CorrelationOutcome::Unsubscribed,
                next = attestations.next() => next,
            };
            match next {
                Some(Ok(event)) => {
                    if let Some(outcome) = self.on_attestation(event).await {
                        self.handle.unsubscribe();
                        return outcome;
                    }
                }
                Some(Err(e)) => {
                    warn!("attestation subscription error: {e}");
                    self.notifier
                        .emit(AttestationNotification::Error(e.to_string()));
                }
                None => {
                    let reason = "attestation subscription closed by the chain".to_owned();
                    warn!("{reason}");
                    self.notifier
                        .emit(AttestationNotification::Error(reason.clone()));
                    return CorrelationOutcome::Closed(reason);
                }
            }
        }
    }

    /// Returns the outcome when `event` ends the correlation.
    async fn on_attestation(&mut self, event: AttestationEvent) -> Option<CorrelationOutcome> {
        let Some(expected_id) = self.expected_id else {
            (self.callback)(&event, &self.handle);
            return None;
        };
        let received_id = event.id;

        match received_id.cmp(&expected_id) {
            Ordering::Less => {
                debug!(expected_id, received_id, "attestation before the expected one");
                self.notifier.emit(AttestationNotification::BeforeExpected {
                    expected_id,
                    received_id,
                });
                None
            }
            Ordering::Equal => {
                info!(id = received_id, "attestation confirmed");
                (self.callback)(&event, &self.handle);
                self.notifier
                    .emit(AttestationNotification::Confirmed(event));
                Some(CorrelationOutcome::Confirmed(event))
            }
            Ordering::Greater if expected_id.checked_add(1) == Some(received_id) => {
                debug!(
                    expected_id,
                    received_id, "expected attestation skipped, scanning recent blocks"
                );
                match scan_history(&*self.client, expected_id, self.config.scan_depth).await {
                    Some(found) => {
                        info!(id = found.id, "attestation found in recent blocks");
                        Some(CorrelationOutcome::Recovered(found))
                    }
                    None => Some(self.missed(expected_id, received_id)),
                }
            }
            Ordering::Greater => Some(self.missed(expected_id, received_id)),
        }
    }

    fn missed(&self, expected_id: u64, received_id: u64) -> CorrelationOutcome {
        warn!(expected_id, received_id, "attestation missed");
        self.notifier.emit(AttestationNotification::Missed {
            expected_id,
            received_id,
        });
        CorrelationOutcome::Missed {
            expected_id,
            received_id,
        }
    }
}

/// Flattens event batches into the attestations they contain.
fn attestations(
    events: EventStream,
) -> impl Stream<Item = Result<AttestationEvent, ChainError>> + Send {
    async_stream::stream! {
        for await batch in events {
            match batch {
                Ok(batch) => {
                    for attestation in batch.iter().filter_map(RuntimeEvent::attestation) {
                        yield Ok(attestation);
                    }
                }
                Err(e) => yield Err(e),
            }
        }
    }
}

/// Walks back from the finalized head, at most `depth` blocks, looking for
/// attestation `id`.
///
/// Stops at genesis. RPC failures end the scan as "not found".
pub async fn scan_history<C: ChainClient>(
    client: &C,
    id: u64,
    depth: u32,
) -> Option<AttestationEvent> {
    let mut block = match client.finalized_head().await {
        Ok(head) => head,
        Err(e) => {
            warn!("could not fetch the finalized head: {e}");
            return None;
        }
    };

    for scanned in 0..depth {
        match client.events_at(block).await {
            Ok(events) => {
                if let Some(found) = events
                    .iter()
                    .filter_map(RuntimeEvent::attestation)
                    .find(|attestation| attestation.id == id)
                {
                    return Some(found);
                }
            }
            Err(e) => {
                warn!("could not fetch events of block {block:?}: {e}");
                return None;
            }
        }

        // The last iteration does not need a parent.
        if scanned + 1 == depth {
            break;
        }
        block = match client.parent_hash(block).await {
            Ok(Some(parent)) => parent,
            Ok(None) => {
                debug!("reached genesis after {} blocks", scanned + 1);
                return None;
            }
            Err(e) => {
                warn!("could not fetch the parent of block {block:?}: {e}");
                return None;
            }
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubscribe_is_idempotent() {
        let (notifier, mut notifications) = Notifier::channel();
        let (handle, cancelled) = SubscriptionHandle::new(notifier);
        assert!(!handle.is_unsubscribed());

        handle.unsubscribe();
        handle.clone().unsubscribe();

        assert!(handle.is_unsubscribed());
        assert!(*cancelled.borrow());
        assert_eq!(
            notifications.try_recv(),
            Ok(AttestationNotification::Unsubscribed)
        );
        assert!(notifications.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_without_listeners() {
        let (notifier, notifications) = Notifier::channel();
        drop(notifications);
        let (handle, _cancelled) = SubscriptionHandle::new(notifier);
        handle.unsubscribe();
        handle.unsubscribe();
    }

    #[test]
    fn default_scan_depth() {
        assert_eq!(CorrelatorConfig::default().scan_depth, 20);
    }
}
