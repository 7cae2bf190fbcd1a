use std::sync::Arc;

use log::debug;

use crate::chain_adapter::{HubAccount, HubChain, OuterTransfer};
use crate::types::{CrossChainEvent, EndorsedProof};
use crate::Error;

/// Sends endorsed proofs to the hub's cross-chain manager.
pub struct Submitter {
    hub: Arc<dyn HubChain>,
    source_chain_id: u64,
    account: HubAccount,
}

impl Submitter {
    pub fn new(hub: Arc<dyn HubChain>, source_chain_id: u64, account: HubAccount) -> Self {
        Self {
            hub,
            source_chain_id,
            account,
        }
    }

    /// Builds the `ImportOuterTransfer` call for `event` and returns the hub
    /// transaction hash.
    pub async fn submit(&self, event: &CrossChainEvent, proof: &EndorsedProof) -> Result<String, Error> {
        // The hub records heights as u32.
        let source_height = u32::try_from(event.source_height).map_err(|_| {
            Error::Serialization(format!(
                "source height {} does not fit the hub's 32-bit height field",
                event.source_height
            ))
        })?;

        debug!(
            "commit proof, height: {}, value: {}, txhash: {}",
            source_height,
            hex::encode(&event.payload),
            hex::encode(&event.source_tx_id)
        );

        let transfer = OuterTransfer {
            source_chain_id: self.source_chain_id,
            payload: event.payload.clone(),
            source_height,
            signatures: proof.signatures.clone(),
            relayer_address: self.account.address.clone(),
            trust_chain_bytes: proof.trust_chain_bytes.clone(),
        };

        self.hub.import_outer_transfer(&transfer, &self.account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_adapter::MockHubChain;

    fn event(height: u64) -> CrossChainEvent {
        CrossChainEvent {
            source_height: height,
            payload: vec![1, 2, 3],
            source_tx_id: vec![0xee],
        }
    }

    fn proof() -> EndorsedProof {
        EndorsedProof {
            digest: [0u8; 32],
            signatures: vec![vec![0xa0], vec![0xb0]],
            trust_chain_bytes: vec![0x01, 0x01, 0x00],
        }
    }

    #[tokio::test]
    async fn test_submit_carries_fields_verbatim() {
        let mut hub = MockHubChain::new();
        hub.expect_import_outer_transfer()
            .withf(|transfer, signer| {
                transfer.source_chain_id == 9
                    && transfer.payload == vec![1, 2, 3]
                    && transfer.source_height == 101
                    && transfer.signatures == vec![vec![0xa0], vec![0xb0]]
                    && transfer.relayer_address == vec![0x11, 0x22]
                    && transfer.trust_chain_bytes == vec![0x01, 0x01, 0x00]
                    && signer.address == vec![0x11, 0x22]
            })
            .times(1)
            .returning(|_, _| Ok("hub-tx".to_string()));

        let submitter = Submitter::new(
            Arc::new(hub),
            9,
            HubAccount {
                address: vec![0x11, 0x22],
            },
        );

        assert_eq!(submitter.submit(&event(101), &proof()).await.unwrap(), "hub-tx");
    }

    #[tokio::test]
    async fn test_height_overflow_is_not_sent() {
        let mut hub = MockHubChain::new();
        hub.expect_import_outer_transfer().times(0);

        let submitter = Submitter::new(Arc::new(hub), 9, HubAccount { address: vec![1] });
        let result = submitter.submit(&event(u32::MAX as u64 + 1), &proof()).await;

        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
