//! Password-level encryption service.
//!
//! Callers hand over bytes and a password; the key is derived per call and
//! dropped (zeroized) when the call returns. Every cipher kind emits a
//! printable, URL-safe token that carries its own IV/nonce and tag.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::kdf::derive_key;
use crate::keys::DerivedKey;
use crate::{aead, fernet};
use encrypto_common::{Error, Result};

/// Symmetric cipher used to seal payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherKind {
    /// AES-128-CBC + HMAC-SHA256 Fernet tokens.
    #[default]
    #[serde(rename = "fernet")]
    Fernet,
    /// XChaCha20-Poly1305, nonce || ciphertext || tag in unpadded base64url.
    #[serde(rename = "xchacha20poly1305")]
    XChaCha20Poly1305,
}

impl CipherKind {
    /// Seal plaintext under an already derived key.
    pub fn seal(self, key: &DerivedKey, plaintext: &[u8]) -> Result<CipherPayload> {
        let token = match self {
            CipherKind::Fernet => fernet::encrypt(key, plaintext)?,
            CipherKind::XChaCha20Poly1305 => {
                URL_SAFE_NO_PAD.encode(aead::encrypt(key, plaintext)?).into_bytes()
            }
        };
        Ok(CipherPayload(token))
    }

    /// Open a payload sealed by [`CipherKind::seal`] with the same kind.
    pub fn open(self, key: &DerivedKey, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            CipherKind::Fernet => fernet::decrypt(key, payload),
            CipherKind::XChaCha20Poly1305 => {
                let raw = URL_SAFE_NO_PAD
                    .decode(payload.trim_ascii())
                    .map_err(|_| Error::Authentication)?;
                aead::decrypt(key, &raw)
            }
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            CipherKind::Fernet => "AES (Fernet)",
            CipherKind::XChaCha20Poly1305 => "XChaCha20-Poly1305",
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Encrypted, self-describing token. Always printable ASCII.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherPayload(Vec<u8>);

impl CipherPayload {
    /// Wrap token bytes read from a file or an image.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the token bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CipherPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherPayload({} bytes)", self.0.len())
    }
}

/// Encrypt bytes with a password.
///
/// # Errors
/// - [`Error::EmptyPassword`] if the password is empty
/// - [`Error::Key`] if the derived key cannot build a cipher
pub fn encrypt(kind: CipherKind, plaintext: &[u8], password: &str) -> Result<CipherPayload> {
    let key = derive_key(password)?;
    debug!(cipher = %kind, size = plaintext.len(), "Encrypting payload");
    kind.seal(&key, plaintext)
}

/// Decrypt a payload with a password.
///
/// # Errors
/// - [`Error::EmptyPassword`] if the password is empty
/// - [`Error::Authentication`] on a wrong password or corrupted payload;
///   the two cases are deliberately indistinguishable
pub fn decrypt(kind: CipherKind, payload: &[u8], password: &str) -> Result<Vec<u8>> {
    let key = derive_key(password)?;
    debug!(cipher = %kind, size = payload.len(), "Decrypting payload");
    kind.open(&key, payload)
}

/// Encrypt text into a copy-pasteable token.
pub fn encrypt_text(kind: CipherKind, plaintext: &str, password: &str) -> Result<String> {
    let payload = encrypt(kind, plaintext.as_bytes(), password)?;
    String::from_utf8(payload.into_bytes()).map_err(|_| Error::Crypto("Token is not text".to_string()))
}

/// Decrypt a token back into text.
///
/// # Errors
/// - as [`decrypt`], plus [`Error::InvalidUtf8`] if the plaintext is not text
pub fn decrypt_text(kind: CipherKind, token: &str, password: &str) -> Result<String> {
    let plaintext = decrypt(kind, token.as_bytes(), password)?;
    String::from_utf8(plaintext).map_err(|_| Error::InvalidUtf8)
}
