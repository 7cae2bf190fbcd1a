use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::Error;

pub const DEFAULT_START_HEIGHT: u64 = 3;
pub const DEFAULT_HEADER_SYNC_CONTRACT: &str = "0000000000000000000000000000000000000001";

fn default_start_height() -> u64 {
    DEFAULT_START_HEIGHT
}

fn default_header_sync_contract() -> String {
    DEFAULT_HEADER_SYNC_CONTRACT.to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    /// Identifier of the source chain on the hub.
    pub chain_id: u64,
    pub rpc_url: String,
    /// Blocks held back from the head before processing.
    pub confirmations: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HubConfig {
    pub rpc_url: String,
    /// Hex address of the relayer's hub account.
    pub signer_address: String,
    pub wallet_file: PathBuf,
    #[serde(default = "default_header_sync_contract")]
    pub header_sync_contract: String,
    #[serde(default = "default_start_height")]
    pub default_start_height: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayerConfig {
    /// Seconds between polling ticks.
    pub poll_interval: u64,
    /// Attempts per block before failing events are dropped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay in seconds for adapter-level retries.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    pub trust_chain_files: Vec<Vec<PathBuf>>,
    pub private_key_files: Vec<PathBuf>,
}

impl RelayerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub hub: HubConfig,
    pub relayer: RelayerConfig,
}

impl Config {
    /// Loads a JSON config, or TOML when the file ends in `.toml`.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self, Error> {
        let path = config_path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = if path.extension().map_or(false, |ext| ext == "toml") {
            toml::from_str(&config_str)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?
        } else {
            serde_json::from_str(&config_str)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.source.rpc_url.is_empty() {
            return Err(Error::Config("Source rpc_url must be set".to_string()));
        }
        if self.hub.rpc_url.is_empty() {
            return Err(Error::Config("Hub rpc_url must be set".to_string()));
        }

        if hex::decode(self.hub.signer_address.trim_start_matches("0x")).is_err() {
            return Err(Error::Config(format!("Invalid signer address: {}", self.hub.signer_address)));
        }
        if hex::decode(&self.hub.header_sync_contract).is_err() {
            return Err(Error::Config(format!(
                "Invalid header sync contract: {}",
                self.hub.header_sync_contract
            )));
        }

        if self.relayer.poll_interval == 0 {
            return Err(Error::Config("Relayer poll interval must be greater than 0".to_string()));
        }
        if self.relayer.max_retries == 0 {
            return Err(Error::Config("Relayer max retries must be greater than 0".to_string()));
        }

        if self.relayer.private_key_files.is_empty() {
            return Err(Error::Config("At least one private key file is required".to_string()));
        }
        if self.relayer.private_key_files.len() != self.relayer.trust_chain_files.len() {
            return Err(Error::Config(format!(
                "Got {} private keys but {} trust chains",
                self.relayer.private_key_files.len(),
                self.relayer.trust_chain_files.len()
            )));
        }
        for (i, files) in self.relayer.trust_chain_files.iter().enumerate() {
            if files.is_empty() {
                return Err(Error::Config(format!("Trust chain #{} lists no certificates", i)));
            }
        }

        Ok(())
    }

    /// Storage key holding the hub's last synced height for this source chain.
    pub fn height_storage_key(&self) -> Vec<u8> {
        crate::relayer::cursor::height_storage_key(self.source.chain_id)
    }
}
