#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use ethereum_types::{H256, U256};
use futures::StreamExt;
use proof_codec::{FormattedProofBundle, ProofSystem, Vk};
use serde_json::json;
use tokio::sync::mpsc;
use zkv::call::{build_call, SubmittableCall};
use zkv::chain::{
    ChainClient, ChainError, ChainTxStatus, DispatchClass, DispatchError, DispatchInfo,
    ErrorDetails, ErrorMetadata, EventStream, MerkleProof, ModuleError, RuntimeEvent,
    StatusStream, SubmissionUpdate, Weight,
};

pub type EventBatch = Result<Vec<RuntimeEvent>, ChainError>;

/// In-memory chain whose responses are scripted by the test.
pub struct FakeChain {
    statuses: Mutex<Vec<Result<SubmissionUpdate, ChainError>>>,
    keep_status_stream_open: bool,
    submit_error: Option<ChainError>,
    submitted: Mutex<Vec<(SubmittableCall, String)>>,

    event_tx: Mutex<Option<mpsc::UnboundedSender<EventBatch>>>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<EventBatch>>>,
    fail_subscription: bool,

    head: H256,
    blocks: HashMap<H256, (Option<H256>, Vec<RuntimeEvent>)>,
    failing_blocks: Vec<H256>,
    module_errors: HashMap<u8, ErrorDetails>,
    proofs: HashMap<(u64, H256), MerkleProof>,
}

impl FakeChain {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            statuses: Mutex::new(Vec::new()),
            keep_status_stream_open: false,
            submit_error: None,
            submitted: Mutex::new(Vec::new()),
            event_tx: Mutex::new(Some(tx)),
            event_rx: Mutex::new(Some(rx)),
            fail_subscription: false,
            head: H256::zero(),
            blocks: HashMap::new(),
            failing_blocks: Vec::new(),
            module_errors: HashMap::new(),
            proofs: HashMap::new(),
        }
    }

    pub fn status(self, update: SubmissionUpdate) -> Self {
        self.statuses.lock().unwrap().push(Ok(update));
        self
    }

    pub fn status_error(self, error: ChainError) -> Self {
        self.statuses.lock().unwrap().push(Err(error));
        self
    }

    pub fn keep_status_stream_open(mut self) -> Self {
        self.keep_status_stream_open = true;
        self
    }

    pub fn reject_submission(mut self, error: ChainError) -> Self {
        self.submit_error = Some(error);
        self
    }

    pub fn fail_subscription(mut self) -> Self {
        self.fail_subscription = true;
        self
    }

    pub fn module_error(mut self, index: u8, section: &str, name: &str, docs: &str) -> Self {
        self.module_errors.insert(
            index,
            ErrorDetails {
                section: section.to_owned(),
                name: name.to_owned(),
                docs: vec![docs.to_owned()],
            },
        );
        self
    }

    /// Adds a finalized block. The last block added becomes the head.
    pub fn block(mut self, hash: H256, parent: Option<H256>, events: Vec<RuntimeEvent>) -> Self {
        self.blocks.insert(hash, (parent, events));
        self.head = hash;
        self
    }

    pub fn failing_block(mut self, hash: H256) -> Self {
        self.failing_blocks.push(hash);
        self
    }

    pub fn proof(mut self, attestation_id: u64, proof: MerkleProof) -> Self {
        self.proofs.insert((attestation_id, proof.leaf), proof);
        self
    }

    /// Delivers a batch of finalized events to the subscriber.
    pub fn push_events(&self, events: Vec<RuntimeEvent>) {
        if let Some(tx) = self.event_tx.lock().unwrap().as_ref() {
            let _ = tx.send(Ok(events));
        }
    }

    pub fn push_event_error(&self, error: ChainError) {
        if let Some(tx) = self.event_tx.lock().unwrap().as_ref() {
            let _ = tx.send(Err(error));
        }
    }

    /// Ends the event subscription from the chain side.
    pub fn close_events(&self) {
        self.event_tx.lock().unwrap().take();
    }

    pub fn submitted(&self) -> Vec<(SubmittableCall, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

impl ErrorMetadata for FakeChain {
    fn module_error(&self, error: &ModuleError) -> Option<ErrorDetails> {
        self.module_errors.get(&error.index).cloned()
    }
}

impl ChainClient for FakeChain {
    type Signer = String;

    async fn submit_and_watch(
        &self,
        call: &SubmittableCall,
        signer: &String,
    ) -> Result<StatusStream, ChainError> {
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }
        self.submitted
            .lock()
            .unwrap()
            .push((call.clone(), signer.clone()));

        let updates = std::mem::take(&mut *self.statuses.lock().unwrap());
        let scripted = futures::stream::iter(updates);
        if self.keep_status_stream_open {
            Ok(scripted.chain(futures::stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }

    async fn subscribe_events(&self) -> Result<EventStream, ChainError> {
        if self.fail_subscription {
            return Err(ChainError::Subscription("connection refused".to_owned()));
        }
        let mut rx = self
            .event_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ChainError::Subscription("already subscribed".to_owned()))?;
        Ok(async_stream::stream! {
            while let Some(batch) = rx.recv().await {
                yield batch;
            }
        }
        .boxed())
    }

    async fn finalized_head(&self) -> Result<H256, ChainError> {
        Ok(self.head)
    }

    async fn parent_hash(&self, block: H256) -> Result<Option<H256>, ChainError> {
        self.blocks
            .get(&block)
            .map(|(parent, _)| *parent)
            .ok_or_else(|| ChainError::Rpc(format!("unknown block {block:?}")))
    }

    async fn events_at(&self, block: H256) -> Result<Vec<RuntimeEvent>, ChainError> {
        if self.failing_blocks.contains(&block) {
            return Err(ChainError::Rpc("state discarded".to_owned()));
        }
        self.blocks
            .get(&block)
            .map(|(_, events)| events.clone())
            .ok_or_else(|| ChainError::Rpc(format!("unknown block {block:?}")))
    }

    async fn proof_path(
        &self,
        attestation_id: u64,
        leaf_digest: H256,
        _at: Option<H256>,
    ) -> Result<MerkleProof, ChainError> {
        self.proofs
            .get(&(attestation_id, leaf_digest))
            .cloned()
            .ok_or_else(|| ChainError::Rpc("leaf not found".to_owned()))
    }
}

pub fn hash(n: u8) -> H256 {
    H256::repeat_byte(n)
}

pub const TX_HASH: u8 = 0xee;

pub fn update(status: ChainTxStatus) -> SubmissionUpdate {
    SubmissionUpdate::new(status, hash(TX_HASH))
}

pub fn included(block: H256, events: Vec<RuntimeEvent>) -> SubmissionUpdate {
    update(ChainTxStatus::InBlock(block)).with_events(2, events)
}

pub fn dispatch_info() -> DispatchInfo {
    DispatchInfo {
        weight: Weight {
            ref_time: 1_500_000_000,
            proof_size: 4_096,
        },
        class: DispatchClass::Normal,
        pays_fee: true,
    }
}

pub fn fee_paid(fee: u64) -> RuntimeEvent {
    RuntimeEvent::TransactionFeePaid {
        who: "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".to_owned(),
        actual_fee: U256::from(fee),
        tip: U256::zero(),
    }
}

pub fn success() -> RuntimeEvent {
    RuntimeEvent::ExtrinsicSuccess {
        dispatch_info: dispatch_info(),
    }
}

pub fn failed(index: u8) -> RuntimeEvent {
    RuntimeEvent::ExtrinsicFailed {
        dispatch_error: DispatchError::Module(ModuleError {
            index,
            error: [3, 0, 0, 0],
        }),
        dispatch_info: dispatch_info(),
    }
}

pub fn new_element(attestation_id: u64) -> RuntimeEvent {
    RuntimeEvent::NewElement {
        value: hash(0x1e),
        attestation_id,
    }
}

pub fn new_attestation(id: u64) -> RuntimeEvent {
    RuntimeEvent::NewAttestation {
        id,
        attestation: attestation_root(id),
    }
}

pub fn attestation_root(id: u64) -> H256 {
    H256::from_low_u64_be(0xa77e_0000 + id)
}

pub fn verify_call() -> SubmittableCall {
    let bundle = FormattedProofBundle {
        formatted_proof: json!("0xabcdef"),
        formatted_public_signals: json!("0x0102"),
        formatted_verification_key: Vk::Vk(json!(format!("0x{}", "11".repeat(32)))),
    };
    build_call(ProofSystem::Sp1, &bundle, None).unwrap()
}

/// Receives the next notification, failing the test instead of hanging.
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("notification channel closed")
}

/// Everything still buffered in a closed channel.
pub async fn drain<T>(mut rx: mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(Some(item)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        out.push(item);
    }
    out
}
