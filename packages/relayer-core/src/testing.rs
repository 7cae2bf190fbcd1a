//! Fixture key material for unit tests.
//!
//! `testdata/` holds a P-256 root and two relayer leaves issued by it, the
//! matching PKCS#8 keys, and a self-signed RSA certificate.

use std::path::{Path, PathBuf};

use crate::endorse::EcdsaKey;
use crate::trust_chain::{CertTrustChain, Certificate};

pub const ROOT_PEM: &str = include_str!("../testdata/root.pem");
pub const RSA_PEM: &str = include_str!("../testdata/rsa.pem");
const RELAYER_PEMS: [&str; 2] = [
    include_str!("../testdata/relayer1.pem"),
    include_str!("../testdata/relayer2.pem"),
];
const RELAYER_KEYS: [&str; 2] = [
    include_str!("../testdata/relayer1.key"),
    include_str!("../testdata/relayer2.key"),
];

pub const RELAYER_COUNT: usize = RELAYER_PEMS.len();

pub fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

pub fn root_cert() -> Certificate {
    Certificate::from_pem(ROOT_PEM.as_bytes()).unwrap()
}

pub fn relayer_cert(i: usize) -> Certificate {
    Certificate::from_pem(RELAYER_PEMS[i].as_bytes()).unwrap()
}

pub fn relayer_key(i: usize) -> EcdsaKey {
    EcdsaKey::from_pkcs8_pem(RELAYER_KEYS[i]).unwrap()
}

/// Leaf `i` followed by the root.
pub fn relayer_chain(i: usize) -> CertTrustChain {
    CertTrustChain::new(vec![relayer_cert(i), root_cert()])
}
