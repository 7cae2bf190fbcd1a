use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{types::CrossChainEvent, Error};

/// Read access to the monitored source chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceChain: Send + Sync {
    /// Current head height of the source chain.
    async fn latest_height(&self) -> Result<u64, Error>;

    /// Cross-chain events emitted at `height`, in block order.
    async fn fetch_events(&self, height: u64) -> Result<Vec<CrossChainEvent>, Error>;
}

/// Fields of an `ImportOuterTransfer` call on the hub's cross-chain manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OuterTransfer {
    pub source_chain_id: u64,
    pub payload: Vec<u8>,
    pub source_height: u32,
    pub signatures: Vec<Vec<u8>>,
    pub relayer_address: Vec<u8>,
    pub trust_chain_bytes: Vec<u8>,
}

/// Identity that pays for and authorizes hub transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubAccount {
    pub address: Vec<u8>,
}

impl HubAccount {
    pub fn from_hex(address: &str) -> Result<Self, Error> {
        let address = hex::decode(address.trim_start_matches("0x"))
            .map_err(|e| Error::Config(format!("Invalid hub signer address: {}", e)))?;
        if address.is_empty() {
            return Err(Error::Config("Hub signer address is empty".to_string()));
        }
        Ok(Self { address })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.address)
    }
}

/// Hub chain capabilities used by the relayer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HubChain: Send + Sync {
    /// Raw storage value of `contract` at `key`, `None` when absent.
    async fn get_storage(&self, contract: &str, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Broadcasts the transfer signed by `signer` and returns the hub tx hash.
    async fn import_outer_transfer(
        &self,
        transfer: &OuterTransfer,
        signer: &HubAccount,
    ) -> Result<String, Error>;
}

pub mod hub;
pub mod rpc;
pub mod source;

pub use hub::HttpHubClient;
pub use source::HttpSourceClient;
