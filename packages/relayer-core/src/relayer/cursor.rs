use log::{error, info, warn};

use crate::chain_adapter::HubChain;

/// Prefix of the hub's header-sync storage key for a side chain's height.
pub const CURRENT_HEADER_HEIGHT: &str = "currentHeaderHeight";

pub fn height_storage_key(source_chain_id: u64) -> Vec<u8> {
    let mut key = CURRENT_HEADER_HEIGHT.as_bytes().to_vec();
    key.extend_from_slice(&source_chain_id.to_le_bytes());
    key
}

/// In-memory record of the last fully processed source height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightCursor {
    current: u64,
}

impl HeightCursor {
    pub fn new(start: u64) -> Self {
        Self { current: start }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// The next height to process.
    pub fn next(&self) -> u64 {
        self.current + 1
    }

    /// Marks the next height as processed.
    pub fn advance(&mut self) {
        self.current += 1;
    }

    /// Reads the hub's last synced height for `source_chain_id`, falling back
    /// to `default_height` when the slot is unreadable, absent or malformed.
    pub async fn find_start_height(
        hub: &dyn HubChain,
        contract: &str,
        source_chain_id: u64,
        default_height: u64,
    ) -> u64 {
        let key = height_storage_key(source_chain_id);
        match hub.get_storage(contract, &key).await {
            Err(e) => {
                error!("find latest height err: {}", e);
                default_height
            }
            Ok(None) => default_height,
            Ok(Some(value)) if value.is_empty() => default_height,
            Ok(Some(value)) if value.len() < 8 => {
                warn!(
                    "Stored height for chain {} is {} bytes, using default {}",
                    source_chain_id,
                    value.len(),
                    default_height
                );
                default_height
            }
            Ok(Some(value)) => {
                let mut le = [0u8; 8];
                le.copy_from_slice(&value[..8]);
                let height = u64::from_le_bytes(le);
                info!("Hub synced height for chain {} is {}", source_chain_id, height);
                height
            }
        }
    }
}
