use log::{error, info};

use super::cursor::HeightCursor;
use crate::chain_adapter::HubAccount;
use crate::config::Config;
use crate::endorse::{check_key_cert_binding, load_signing_keys, ProofEndorser, RelayerKey};
use crate::trust_chain::MultiCertTrustChain;
use crate::Error;

/// Everything the relayer holds for its lifetime. Keys and certificates
/// never change after construction; only the cursor moves.
pub struct RelayerState {
    pub source_chain_id: u64,
    pub confirmation_depth: u64,
    pub cursor: HeightCursor,
    pub hub_account: HubAccount,
    pub trust_chain: MultiCertTrustChain,
    pub endorser: ProofEndorser,
}

impl RelayerState {
    /// Validates that every key matches its trust chain's leaf and encodes
    /// the trust chain once.
    pub fn new(
        source_chain_id: u64,
        confirmation_depth: u64,
        hub_account: HubAccount,
        keys: Vec<Box<dyn RelayerKey>>,
        trust_chain: MultiCertTrustChain,
    ) -> Result<Self, Error> {
        check_key_cert_binding(&keys, &trust_chain)?;
        let endorser = ProofEndorser::new(keys, trust_chain.encode())?;
        Ok(Self {
            source_chain_id,
            confirmation_depth,
            cursor: HeightCursor::new(0),
            hub_account,
            trust_chain,
            endorser,
        })
    }

    /// Loads key material named by the config. Any failure here is fatal.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        if !config.hub.wallet_file.is_file() {
            error!("Hub wallet file {} not found", config.hub.wallet_file.display());
            return Err(Error::Config(format!(
                "wallet file {} not found",
                config.hub.wallet_file.display()
            )));
        }
        let hub_account = HubAccount::from_hex(&config.hub.signer_address)?;
        let trust_chain = MultiCertTrustChain::load(&config.relayer.trust_chain_files)?;
        let keys = load_signing_keys(&config.relayer.private_key_files)?;

        let state = Self::new(
            config.source.chain_id,
            config.source.confirmations,
            hub_account,
            keys,
            trust_chain,
        )?;
        info!("Hub user address: {}", state.hub_account.to_hex());
        Ok(state)
    }
}
