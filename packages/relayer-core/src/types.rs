use serde::{Deserialize, Serialize};

/// A cross-chain event observed on the source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainEvent {
    pub source_height: u64,
    pub payload: Vec<u8>,
    /// Originating transaction, only used for log correlation.
    pub source_tx_id: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndorsedProof {
    pub digest: [u8; 32],
    /// One DER signature per relayer key, in key order.
    pub signatures: Vec<Vec<u8>>,
    pub trust_chain_bytes: Vec<u8>,
}

/// Terminal or pending state of one event after a processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Accepted by the hub chain.
    Committed { hub_tx: String },
    /// Not committed yet, the block is held and retried next tick.
    Retry { reason: String },
    /// Given up on; logged for manual reconciliation.
    Dropped { reason: String },
}

/// Result of processing one source block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Every event reached a terminal state; the cursor may advance.
    Completed { committed: usize, dropped: usize },
    /// Some events still need another attempt.
    Pending { retry: usize },
    /// Events could not be fetched.
    FetchFailed,
}
