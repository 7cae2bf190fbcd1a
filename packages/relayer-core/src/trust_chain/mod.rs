//! Certificate trust chains presented to the hub chain with every proof.
//!
//! A relayer holds one chain per signing key, ordered from its operational
//! (leaf) certificate up to an anchor the hub chain recognises. The hub
//! expects the whole collection in one canonical encoding:
//!
//! ```text
//! var_uint(chain_count)
//!   var_uint(cert_count)
//!     var_bytes(cert_der) ...
//! ```

use std::path::Path;

use log::{debug, error};
use p256::ecdsa::VerifyingKey;
use p256::pkcs8::der::pem;
use x509_cert::der::{Decode, Encode};
use x509_cert::spki::{DecodePublicKey, ObjectIdentifier};

use crate::codec::{Sink, Source};
use crate::Error;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// id-ecPublicKey (RFC 5480).
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// A parsed X.509 certificate carrying an EC public key. The original DER is
/// kept so the hub receives the exact bytes that were loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    raw: Vec<u8>,
    public_key_info: Vec<u8>,
}

impl Certificate {
    pub fn from_der(raw: Vec<u8>) -> Result<Self, Error> {
        let cert = x509_cert::Certificate::from_der(&raw)
            .map_err(|e| Error::KeyMaterial(format!("invalid X.509 certificate: {}", e)))?;
        let spki = &cert.tbs_certificate.subject_public_key_info;
        if spki.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(Error::KeyMaterial(format!(
                "certificate of {} is not an EC certificate (key algorithm {})",
                cert.tbs_certificate.subject, spki.algorithm.oid
            )));
        }
        let public_key_info = spki
            .to_der()
            .map_err(|e| Error::KeyMaterial(format!("invalid subject public key: {}", e)))?;
        Ok(Self {
            raw,
            public_key_info,
        })
    }

    /// Parses the first PEM block of `pem_data`, which must be a certificate.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let (label, der) = pem::decode_vec(pem_data)
            .map_err(|e| Error::KeyMaterial(format!("invalid PEM: {}", e)))?;
        if label != CERTIFICATE_LABEL {
            return Err(Error::KeyMaterial(format!(
                "expected a {} PEM block, found {}",
                CERTIFICATE_LABEL, label
            )));
        }
        Self::from_der(der)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The P-256 key in the certificate's SubjectPublicKeyInfo.
    pub fn verifying_key(&self) -> Result<VerifyingKey, Error> {
        VerifyingKey::from_public_key_der(&self.public_key_info)
            .map_err(|e| Error::KeyMaterial(format!("certificate key is not a P-256 key: {}", e)))
    }
}

/// One leaf-to-anchor certificate path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertTrustChain {
    pub certs: Vec<Certificate>,
}

impl CertTrustChain {
    pub fn new(certs: Vec<Certificate>) -> Self {
        Self { certs }
    }

    pub fn leaf(&self) -> Option<&Certificate> {
        self.certs.first()
    }

    fn serialize(&self, sink: &mut Sink) {
        sink.write_var_uint(self.certs.len() as u64);
        for cert in &self.certs {
            sink.write_var_bytes(cert.raw());
        }
    }

    fn deserialize(source: &mut Source<'_>) -> Result<Self, Error> {
        let count = source.read_var_uint()?;
        let mut certs = Vec::new();
        for _ in 0..count {
            certs.push(Certificate::from_der(source.read_var_bytes()?.to_vec())?);
        }
        Ok(Self { certs })
    }
}

/// The ordered set of trust chains, positionally matching the signing keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiCertTrustChain {
    pub chains: Vec<CertTrustChain>,
}

impl MultiCertTrustChain {
    pub fn new(chains: Vec<CertTrustChain>) -> Self {
        Self { chains }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut sink = Sink::new();
        sink.write_var_uint(self.chains.len() as u64);
        for chain in &self.chains {
            chain.serialize(&mut sink);
        }
        sink.into_bytes()
    }

    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let mut source = Source::new(data);
        let count = source.read_var_uint()?;
        let mut chains = Vec::new();
        for _ in 0..count {
            chains.push(CertTrustChain::deserialize(&mut source)?);
        }
        source.finish()?;
        Ok(Self { chains })
    }

    /// Loads every group of PEM files, keeping group and file order.
    pub fn load<P: AsRef<Path>>(groups: &[Vec<P>]) -> Result<Self, Error> {
        let mut chains = Vec::with_capacity(groups.len());
        for (i, files) in groups.iter().enumerate() {
            if files.is_empty() {
                return Err(Error::KeyMaterial(format!("trust chain #{} has no certificates", i)));
            }
            let mut certs = Vec::with_capacity(files.len());
            for file in files {
                certs.push(load_certificate(file.as_ref())?);
            }
            debug!("Loaded trust chain #{} with {} certificates", i, certs.len());
            chains.push(CertTrustChain::new(certs));
        }
        Ok(Self { chains })
    }
}

fn load_certificate(path: &Path) -> Result<Certificate, Error> {
    let raw = std::fs::read(path).map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        Error::KeyMaterial(format!("failed to read {}: {}", path.display(), e))
    })?;
    Certificate::from_pem(&raw).map_err(|e| {
        error!("Failed to parse {} to cert: {}", path.display(), e);
        Error::KeyMaterial(format!("{}: {}", path.display(), e))
    })
}
