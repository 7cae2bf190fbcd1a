//! Multi-key endorsement of cross-chain payloads.
//!
//! Every event payload is hashed with SHA-256 and the digest is signed by
//! each relayer key in configuration order. The hub chain checks the
//! signatures positionally against the trust chains, so the order of the
//! output must always match the order of the keys.

use std::path::Path;

use log::{debug, error, info};
use p256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::trust_chain::MultiCertTrustChain;
use crate::types::EndorsedProof;
use crate::Error;

/// A relayer signing key.
pub trait RelayerKey: Send + Sync {
    /// Signs a 32-byte digest and returns the DER-encoded signature.
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, Error>;

    fn verifying_key(&self) -> VerifyingKey;
}

/// ECDSA P-256 key loaded from a PKCS#8 PEM file.
pub struct EcdsaKey {
    inner: SigningKey,
}

impl EcdsaKey {
    pub fn new(inner: SigningKey) -> Self {
        Self { inner }
    }

    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, Error> {
        let inner = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::KeyMaterial(format!("invalid PKCS#8 EC private key: {}", e)))?;
        Ok(Self { inner })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let pem = std::fs::read_to_string(path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            Error::KeyMaterial(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_pkcs8_pem(&pem).map_err(|e| {
            error!("Failed to parse {} to private key: {}", path.display(), e);
            e
        })
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl RelayerKey for EcdsaKey {
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, Error> {
        let sig: Signature = self
            .inner
            .sign_prehash_with_rng(&mut OsRng, digest)
            .map_err(|e| Error::Crypto(e.to_string()))?;
        Ok(sig.to_der().as_bytes().to_vec())
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.inner.verifying_key().clone()
    }
}

/// Loads the PKCS#8 keys in the given order.
pub fn load_signing_keys<P: AsRef<Path>>(files: &[P]) -> Result<Vec<Box<dyn RelayerKey>>, Error> {
    files
        .iter()
        .map(|f| EcdsaKey::load(f.as_ref()).map(|k| Box::new(k) as Box<dyn RelayerKey>))
        .collect()
}

/// Checks that key `i` is the key certified by the leaf of trust chain `i`.
pub fn check_key_cert_binding(
    keys: &[Box<dyn RelayerKey>],
    trust_chain: &MultiCertTrustChain,
) -> Result<(), Error> {
    if keys.is_empty() {
        return Err(Error::KeyMaterial("no signing keys configured".to_string()));
    }
    if keys.len() != trust_chain.len() {
        return Err(Error::KeyMaterial(format!(
            "{} signing keys but {} trust chains",
            keys.len(),
            trust_chain.len()
        )));
    }
    for (i, (key, chain)) in keys.iter().zip(&trust_chain.chains).enumerate() {
        let leaf = chain
            .leaf()
            .ok_or_else(|| Error::KeyMaterial(format!("trust chain #{} is empty", i)))?;
        let certified = leaf.verifying_key().map_err(|e| {
            Error::KeyMaterial(format!("leaf certificate of trust chain #{}: {}", i, e))
        })?;
        if key.verifying_key() != certified {
            return Err(Error::KeyMaterial(format!(
                "signing key #{} does not match the leaf certificate of trust chain #{}",
                i, i
            )));
        }
    }
    Ok(())
}

pub fn payload_digest(payload: &[u8]) -> [u8; 32] {
    Sha256::digest(payload).into()
}

/// Produces endorsed proofs with the relayer's full key set.
pub struct ProofEndorser {
    keys: Vec<Box<dyn RelayerKey>>,
    trust_chain_bytes: Vec<u8>,
}

impl ProofEndorser {
    pub fn new(keys: Vec<Box<dyn RelayerKey>>, trust_chain_bytes: Vec<u8>) -> Result<Self, Error> {
        if keys.is_empty() {
            return Err(Error::KeyMaterial("no signing keys configured".to_string()));
        }
        info!("Proof endorser ready with {} keys", keys.len());
        Ok(Self {
            keys,
            trust_chain_bytes,
        })
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn trust_chain_bytes(&self) -> &[u8] {
        &self.trust_chain_bytes
    }

    /// Signs the payload digest with every key. A single failing key fails
    /// the whole endorsement.
    pub fn endorse(&self, payload: &[u8]) -> Result<EndorsedProof, Error> {
        let digest = payload_digest(payload);
        debug!("Endorsing payload digest {}", hex::encode(digest));

        let mut signatures = Vec::with_capacity(self.keys.len());
        for (i, key) in self.keys.iter().enumerate() {
            let sig = key.sign_digest(&digest).map_err(|e| {
                error!("No.{} key failed to sign: {}", i, e);
                e
            })?;
            signatures.push(sig);
        }

        Ok(EndorsedProof {
            digest,
            signatures,
            trust_chain_bytes: self.trust_chain_bytes.clone(),
        })
    }
}
