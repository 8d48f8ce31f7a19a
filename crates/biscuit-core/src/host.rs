//! Primitives offered to comparers by their host.
//!
//! Logging goes through the `log` facade under the `biscuit::script` target.
//! RSA decryption is not provided here: hosts that need it override
//! [`Host::rsa_decrypt`].

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

pub const SCRIPT_LOG_TARGET: &str = "biscuit::script";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),
}

pub trait Host: Send + Sync {
    fn info(&self, message: &str) {
        log::info!(target: SCRIPT_LOG_TARGET, "{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!(target: SCRIPT_LOG_TARGET, "{message}");
    }

    /// Decodes standard-alphabet, padded base64. Surrounding whitespace is
    /// ignored.
    fn base64_decode(&self, input: &str) -> Result<Vec<u8>, HostError> {
        Ok(STANDARD.decode(input.trim())?)
    }

    /// Decrypts base64 ciphertext with a PKCS#1 PEM private key.
    fn rsa_decrypt(&self, _pem_private_key: &str, _ciphertext: &str) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unsupported("RSA decryption"))
    }

    fn env(&self, key: &str) -> Option<&str>;
}

/// Host backed by the `log` facade and a fixed environment map.
#[derive(Debug, Clone, Default)]
pub struct DefaultHost {
    env: BTreeMap<String, String>,
}

impl DefaultHost {
    pub fn new(env: BTreeMap<String, String>) -> Self {
        Self { env }
    }
}

impl Host for DefaultHost {
    fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }
}
