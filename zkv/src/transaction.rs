//! The record accumulated while a submitted call moves through the chain.

use ethereum_types::{H256, U256};
use proof_codec::ProofSystem;
use serde::Serialize;
use tracing::warn;

use crate::chain::{AttestationEvent, DispatchClass, DispatchInfo, Weight};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Pending,
    Broadcast,
    InBlock,
    Finalized,
    Invalid,
    Dropped,
    Error,
}

impl TransactionStatus {
    /// Once terminal, a [`TransactionInfo`] is never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Finalized
                | TransactionStatus::Invalid
                | TransactionStatus::Dropped
                | TransactionStatus::Error
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    Verify,
    VkRegistration,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub transaction_type: TransactionType,
    pub proof_system: ProofSystem,
    pub status: TransactionStatus,
    pub block_hash: Option<H256>,
    pub tx_hash: Option<H256>,
    pub tx_index: Option<u32>,
    pub fee_payer: Option<String>,
    pub fee: Option<U256>,
    pub tip: Option<U256>,
    /// `fee` in whole tokens, with every decimal spelled out.
    pub fee_in_tokens: Option<String>,
    pub weight: Option<Weight>,
    pub class: Option<DispatchClass>,
    pub pays_fee: Option<bool>,
    /// Verification calls: attestation the statement was queued for.
    pub aggregation_id: Option<u64>,
    /// Verification calls: leaf digest of the verified statement.
    pub leaf_digest: Option<H256>,
    /// Key registration calls: hash referencing the registered key.
    pub statement_hash: Option<H256>,
    pub attestation_event: Option<AttestationEvent>,
    pub attestation_confirmed: bool,
}

impl TransactionInfo {
    pub fn new(transaction_type: TransactionType, proof_system: ProofSystem) -> Self {
        Self {
            transaction_type,
            proof_system,
            status: TransactionStatus::Pending,
            block_hash: None,
            tx_hash: None,
            tx_index: None,
            fee_payer: None,
            fee: None,
            tip: None,
            fee_in_tokens: None,
            weight: None,
            class: None,
            pays_fee: None,
            aggregation_id: None,
            leaf_digest: None,
            statement_hash: None,
            attestation_event: None,
            attestation_confirmed: false,
        }
    }

    /// Whether the identifier this kind of call is expected to produce has
    /// been captured.
    pub fn has_identifier(&self) -> bool {
        match self.transaction_type {
            TransactionType::Verify => self.aggregation_id.is_some(),
            TransactionType::VkRegistration => self.statement_hash.is_some(),
        }
    }

    pub(crate) fn identifier_name(&self) -> &'static str {
        match self.transaction_type {
            TransactionType::Verify => "aggregation id",
            TransactionType::VkRegistration => "statement hash",
        }
    }
}

/// A single change to a [`TransactionInfo`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Update {
    Status(TransactionStatus),
    Submitted {
        tx_hash: H256,
    },
    Included {
        block_hash: H256,
        tx_hash: H256,
        tx_index: Option<u32>,
    },
    Fee {
        who: String,
        actual_fee: U256,
        tip: U256,
        fee_in_tokens: Option<String>,
    },
    Dispatch(DispatchInfo),
    Aggregation {
        aggregation_id: u64,
        leaf_digest: H256,
    },
    Statement(H256),
    /// The block the call was included in was retracted. Drops everything
    /// read from it.
    Reincluded,
}

/// Sole owner of a [`TransactionInfo`] while its call is tracked. Every
/// mutation goes through [`TransactionRecord::apply`].
#[derive(Debug)]
pub(crate) struct TransactionRecord {
    info: TransactionInfo,
}

impl TransactionRecord {
    pub(crate) fn new(transaction_type: TransactionType, proof_system: ProofSystem) -> Self {
        Self {
            info: TransactionInfo::new(transaction_type, proof_system),
        }
    }

    pub(crate) fn info(&self) -> &TransactionInfo {
        &self.info
    }

    pub(crate) fn snapshot(&self) -> TransactionInfo {
        self.info.clone()
    }

    /// Applies `update`, unless the record already reached a terminal
    /// status. Returns whether the update was applied.
    pub(crate) fn apply(&mut self, update: Update) -> bool {
        if self.info.status.is_terminal() {
            warn!(
                status = ?self.info.status,
                ?update,
                "ignoring update to a transaction in a terminal state"
            );
            return false;
        }

        let info = &mut self.info;
        match update {
            Update::Status(status) => info.status = status,
            Update::Submitted { tx_hash } => info.tx_hash = Some(tx_hash),
            Update::Included {
                block_hash,
                tx_hash,
                tx_index,
            } => {
                info.block_hash = Some(block_hash);
                info.tx_hash = Some(tx_hash);
                info.tx_index = tx_index;
                info.status = TransactionStatus::InBlock;
            }
            Update::Fee {
                who,
                actual_fee,
                tip,
                fee_in_tokens,
            } => {
                info.fee_payer = Some(who);
                info.fee = Some(actual_fee);
                info.tip = Some(tip);
                info.fee_in_tokens = fee_in_tokens;
            }
            Update::Dispatch(dispatch_info) => {
                info.weight = Some(dispatch_info.weight);
                info.class = Some(dispatch_info.class);
                info.pays_fee = Some(dispatch_info.pays_fee);
            }
            Update::Aggregation {
                aggregation_id,
                leaf_digest,
            } => {
                info.aggregation_id = Some(aggregation_id);
                info.leaf_digest = Some(leaf_digest);
            }
            Update::Statement(hash) => info.statement_hash = Some(hash),
            Update::Reincluded => {
                *info = TransactionInfo {
                    status: TransactionStatus::Broadcast,
                    tx_hash: info.tx_hash,
                    ..TransactionInfo::new(info.transaction_type, info.proof_system)
                };
            }
        }
        true
    }
}
