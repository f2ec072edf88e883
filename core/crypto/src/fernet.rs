//! Fernet tokens: AES-128-CBC with an HMAC-SHA256 tag.
//!
//! Token layout before base64url encoding:
//!
//! ```text
//! [1 byte  ] version (0x80)
//! [8 bytes ] issue time, seconds since the Unix epoch (big-endian)
//! [16 bytes] CBC IV
//! [N bytes ] AES-128-CBC ciphertext, PKCS#7 padded (N multiple of 16)
//! [32 bytes] HMAC-SHA256 over everything above
//! ```
//!
//! The signing key is the first half of the [`DerivedKey`] and the
//! encryption key the second half. Tokens are interchangeable with other
//! Fernet implementations.

use aes::Aes128;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::keys::DerivedKey;
use encrypto_common::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Token format version byte.
pub const VERSION: u8 = 0x80;

/// IV size for AES-CBC (16 bytes).
pub const IV_SIZE: usize = 16;

/// HMAC-SHA256 tag size (32 bytes).
pub const HMAC_SIZE: usize = 32;

const BLOCK_SIZE: usize = 16;
const HEADER_SIZE: usize = 1 + 8 + IV_SIZE;

/// Encrypt plaintext into a Fernet token with a fresh IV and the current time.
///
/// # Postconditions
/// - Returns printable base64url token bytes
/// - Two calls with the same inputs return different tokens
///
/// # Errors
/// - [`Error::Key`] if the key halves are rejected by the primitives
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    let timestamp = Utc::now().timestamp().max(0) as u64;

    encrypt_with_parts(key, plaintext, timestamp, &iv)
}

/// Encrypt with an explicit timestamp and IV.
///
/// # Warning
/// Reusing an IV under the same key leaks plaintext structure. Only use this
/// to reproduce known tokens.
pub fn encrypt_with_parts(
    key: &DerivedKey,
    plaintext: &[u8],
    timestamp: u64,
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>> {
    let ciphertext = Aes128CbcEnc::new_from_slices(key.encryption_key(), iv)
        .map_err(|e| Error::Key(format!("Invalid encryption key: {}", e)))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token = Vec::with_capacity(HEADER_SIZE + ciphertext.len() + HMAC_SIZE);
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = signer(key)?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(URL_SAFE.encode(token).into_bytes())
}

/// Verify and decrypt a Fernet token.
///
/// The tag is checked in constant time before any decryption happens.
///
/// # Errors
/// - [`Error::Authentication`] for every malformed, tampered, or
///   wrong-key token
/// - [`Error::Key`] if the key halves are rejected by the primitives
pub fn decrypt(key: &DerivedKey, token: &[u8]) -> Result<Vec<u8>> {
    let raw = decode(token)?;
    let (signed, tag) = raw.split_at(raw.len() - HMAC_SIZE);

    let mut mac = signer(key)?;
    mac.update(signed);
    mac.verify_slice(tag).map_err(|_| Error::Authentication)?;

    let iv = &signed[1 + 8..HEADER_SIZE];
    let ciphertext = &signed[HEADER_SIZE..];

    Aes128CbcDec::new_from_slices(key.encryption_key(), iv)
        .map_err(|e| Error::Key(format!("Invalid encryption key: {}", e)))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Authentication)
}

/// Issue time recorded in a token, read without verifying it.
///
/// # Errors
/// - [`Error::Authentication`] if the token is structurally invalid
pub fn token_timestamp(token: &[u8]) -> Result<DateTime<Utc>> {
    let raw = decode(token)?;
    let mut seconds = [0u8; 8];
    seconds.copy_from_slice(&raw[1..9]);
    let seconds = i64::try_from(u64::from_be_bytes(seconds)).map_err(|_| Error::Authentication)?;

    DateTime::from_timestamp(seconds, 0).ok_or(Error::Authentication)
}

/// Base64-decode a token and check its framing.
fn decode(token: &[u8]) -> Result<Vec<u8>> {
    let raw = URL_SAFE
        .decode(token.trim_ascii())
        .map_err(|_| Error::Authentication)?;

    let body_len = raw.len().saturating_sub(HEADER_SIZE + HMAC_SIZE);
    if raw.len() < HEADER_SIZE + BLOCK_SIZE + HMAC_SIZE
        || raw[0] != VERSION
        || body_len % BLOCK_SIZE != 0
    {
        return Err(Error::Authentication);
    }
    Ok(raw)
}

fn signer(key: &DerivedKey) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key.signing_key())
        .map_err(|e| Error::Key(format!("Invalid signing key: {}", e)))
}
