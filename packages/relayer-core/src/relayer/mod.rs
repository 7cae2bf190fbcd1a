use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    chain_adapter::{HubChain, SourceChain},
    config::Config,
    endorse::payload_digest,
    types::{BlockOutcome, CrossChainEvent, EventOutcome},
};

pub mod cursor;
pub mod state;
pub mod submitter;

pub use cursor::HeightCursor;
pub use state::RelayerState;
pub use submitter::Submitter;

/// Loop tuning taken from the config.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Attempts of one block before its failing events are dropped.
    pub max_block_attempts: u32,
    pub header_sync_contract: String,
    pub default_start_height: u64,
}

impl From<&Config> for MonitorConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.relayer.poll_interval(),
            max_block_attempts: config.relayer.max_retries,
            header_sync_contract: config.hub.header_sync_contract.clone(),
            default_start_height: config.hub.default_start_height,
        }
    }
}

/// Identifies an event across refetches of the same block: originating
/// transaction plus payload digest.
type EventKey = (Vec<u8>, [u8; 32]);

fn event_key(event: &CrossChainEvent) -> EventKey {
    (event.source_tx_id.clone(), payload_digest(&event.payload))
}

/// A block that has been attempted but not fully accounted for.
#[derive(Debug)]
struct PendingBlock {
    height: u64,
    attempts: u32,
    /// Events already settled, skipped on later attempts.
    committed: HashSet<EventKey>,
    dropped: HashSet<EventKey>,
}

impl PendingBlock {
    fn new(height: u64) -> Self {
        Self {
            height,
            attempts: 0,
            committed: HashSet::new(),
            dropped: HashSet::new(),
        }
    }
}

/// Polls the source chain and relays confirmed events to the hub, one block
/// at a time in height order.
pub struct ChainMonitor {
    state: RelayerState,
    source: Arc<dyn SourceChain>,
    hub: Arc<dyn HubChain>,
    submitter: Submitter,
    config: MonitorConfig,
    pending: Option<PendingBlock>,
}

impl ChainMonitor {
    pub fn new(
        state: RelayerState,
        source: Arc<dyn SourceChain>,
        hub: Arc<dyn HubChain>,
        config: MonitorConfig,
    ) -> Self {
        let submitter = Submitter::new(hub.clone(), state.source_chain_id, state.hub_account.clone());
        Self {
            state,
            source,
            hub,
            submitter,
            config: MonitorConfig {
                max_block_attempts: config.max_block_attempts.max(1),
                ..config
            },
            pending: None,
        }
    }

    pub fn current_height(&self) -> u64 {
        self.state.cursor.current()
    }

    pub fn state(&self) -> &RelayerState {
        &self.state
    }

    /// Seeds the cursor from the hub's synced height. Only called once.
    pub async fn init(&mut self) -> u64 {
        let start = HeightCursor::find_start_height(
            self.hub.as_ref(),
            &self.config.header_sync_contract,
            self.state.source_chain_id,
            self.config.default_start_height,
        )
        .await;
        info!("init - latest synced height: {}", start);
        self.state.cursor = HeightCursor::new(start);
        self.pending = None;
        start
    }

    /// Runs ticks until `cancel` fires. Cancellation is observed between
    /// ticks, never in the middle of a block.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Monitoring source chain {} from height {}",
            self.state.source_chain_id,
            self.current_height()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Chain monitor cancelled at height {}", self.current_height());
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One polling pass. Returns how many blocks the cursor advanced.
    pub async fn tick(&mut self) -> u64 {
        let head = match self.source.latest_height().await {
            Ok(head) => head,
            Err(e) => {
                error!("MonitorChain - cannot get node height, err: {}", e);
                return 0;
            }
        };

        let depth = self.state.confirmation_depth;
        if head.saturating_sub(self.current_height()) <= depth {
            return 0;
        }
        info!("MonitorChain - source height is {}", head);

        let confirmed = head - depth;
        let mut advanced = 0;
        while self.current_height() < confirmed {
            let height = self.state.cursor.next();
            match self.handle_new_block(height).await {
                BlockOutcome::Completed { committed, dropped } => {
                    if committed + dropped > 0 {
                        info!(
                            "Block {} done: {} committed, {} dropped",
                            height, committed, dropped
                        );
                    }
                    self.state.cursor.advance();
                    advanced += 1;
                }
                BlockOutcome::Pending { retry } => {
                    warn!("Block {} has {} events to retry next tick", height, retry);
                    break;
                }
                BlockOutcome::FetchFailed => break,
            }
        }
        advanced
    }

    async fn handle_new_block(&mut self, height: u64) -> BlockOutcome {
        let events = match self.source.fetch_events(height).await {
            Ok(events) => events,
            Err(e) => {
                error!("get cross chain event at height {} err: {}", height, e);
                return BlockOutcome::FetchFailed;
            }
        };

        let mut pending = match self.pending.take() {
            Some(p) if p.height == height => p,
            _ => PendingBlock::new(height),
        };
        pending.attempts += 1;
        let last_attempt = pending.attempts >= self.config.max_block_attempts;

        let mut retry = 0;
        for event in &events {
            let key = event_key(event);
            if pending.committed.contains(&key) || pending.dropped.contains(&key) {
                continue;
            }
            match self.commit_event(event, last_attempt).await {
                EventOutcome::Committed { .. } => {
                    pending.committed.insert(key);
                }
                EventOutcome::Dropped { .. } => {
                    pending.dropped.insert(key);
                }
                EventOutcome::Retry { .. } => retry += 1,
            }
        }

        if retry > 0 {
            self.pending = Some(pending);
            BlockOutcome::Pending { retry }
        } else {
            BlockOutcome::Completed {
                committed: pending.committed.len(),
                dropped: pending.dropped.len(),
            }
        }
    }

    /// Endorses and submits one event, classifying the result.
    async fn commit_event(&self, event: &CrossChainEvent, last_attempt: bool) -> EventOutcome {
        let result = match self.state.endorser.endorse(&event.payload) {
            Ok(proof) => self.submitter.submit(event, &proof).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(hub_tx) => {
                info!(
                    "commitProof - send transaction to hub chain: ( hub_txhash: {}, source_txhash: {}, height: {} )",
                    hub_tx,
                    hex::encode(&event.source_tx_id),
                    event.source_height
                );
                EventOutcome::Committed { hub_tx }
            }
            Err(e) if !e.is_retryable() || last_attempt => {
                error!(
                    "Dropping event at height {} (payload sha256: {}, source_txhash: {}): {}",
                    event.source_height,
                    hex::encode(payload_digest(&event.payload)),
                    hex::encode(&event.source_tx_id),
                    e
                );
                EventOutcome::Dropped {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!(
                    "commitProof err at height {} (source_txhash: {}): {}",
                    event.source_height,
                    hex::encode(&event.source_tx_id),
                    e
                );
                EventOutcome::Retry {
                    reason: e.to_string(),
                }
            }
        }
    }
}
