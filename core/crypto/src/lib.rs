//! Cryptographic primitives for Encrypto.
//!
//! This module provides:
//! - Deterministic key derivation from a password using scrypt, with the
//!   salt regenerated from the password itself (see [`seed`])
//! - Fernet tokens (AES-128-CBC + HMAC-SHA256), the default cipher
//! - XChaCha20-Poly1305 as the alternate authenticated cipher
//! - A password-level service that derives, seals, and opens in one call
//!
//! # Security Guarantees
//! - Derived keys are zeroized on drop
//! - No plaintext or key material is ever logged
//! - Decryption failures never reveal whether the key or the data was wrong

pub mod aead;
pub mod cipher;
pub mod fernet;
pub mod kdf;
pub mod keys;
pub mod seed;

pub use cipher::{decrypt, decrypt_text, encrypt, encrypt_text, CipherKind, CipherPayload};
pub use kdf::{derive_key, derive_key_with, KdfParams};
pub use keys::{DerivedKey, KEY_LENGTH, KEY_TOKEN_LENGTH};
