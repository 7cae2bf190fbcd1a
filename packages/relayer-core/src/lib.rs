pub mod chain_adapter;
pub mod codec;
pub mod config;
pub mod endorse;
pub mod relayer;
pub mod trust_chain;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use types::{BlockOutcome, CrossChainEvent, EndorsedProof, EventOutcome};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The remote side answered with something that is not a valid reply.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Key material error: {0}")]
    KeyMaterial(String),
}

impl Error {
    /// Whether the same operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Chain(_) | Error::Network(_) | Error::InvalidResponse(_) | Error::Crypto(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
