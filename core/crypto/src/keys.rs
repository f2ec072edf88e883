//! Key types with secure memory handling.
//!
//! Keys zeroize their memory on drop so derived material does not linger
//! after an operation completes.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use encrypto_common::{Error, Result};

/// Length of derived keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the printable key token (padded base64url of 32 bytes).
pub const KEY_TOKEN_LENGTH: usize = 44;

/// Symmetric key derived from a password.
///
/// The first half signs and the second half encrypts when used as a Fernet
/// key; the AEAD cipher uses all 32 bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Parse a 44-character base64url key token.
    ///
    /// # Errors
    /// - [`Error::Key`] if the token is not valid base64url or does not
    ///   decode to exactly 32 bytes
    pub fn from_token(token: &str) -> Result<Self> {
        let decoded = URL_SAFE
            .decode(token.trim())
            .map_err(|e| Error::Key(format!("Invalid key encoding: {}", e)))?;
        let key: [u8; KEY_LENGTH] = decoded.as_slice().try_into().map_err(|_| {
            Error::Key(format!(
                "Invalid key length: expected {}, got {}",
                KEY_LENGTH,
                decoded.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Render the key as its 44-character base64url token.
    ///
    /// The token is secret-equivalent; it is not meant to be persisted.
    pub fn to_token(&self) -> String {
        URL_SAFE.encode(self.key)
    }

    /// HMAC half of the key.
    pub(crate) fn signing_key(&self) -> &[u8] {
        &self.key[..KEY_LENGTH / 2]
    }

    /// Block cipher half of the key.
    pub(crate) fn encryption_key(&self) -> &[u8] {
        &self.key[KEY_LENGTH / 2..]
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}
