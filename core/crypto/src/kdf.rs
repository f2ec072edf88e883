//! Key derivation using scrypt.
//!
//! scrypt is a memory-hard password hashing function. The salt is not stored
//! anywhere: it is regenerated from the password by [`crate::seed`], which
//! makes derivation a pure function of the password.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keys::{DerivedKey, KEY_LENGTH};
use crate::seed::salt_for;
use encrypto_common::{Error, Result};

/// Parameters for scrypt key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Base-2 logarithm of the CPU/memory cost `N`.
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Degree of parallelism.
    pub p: u32,
}

impl KdfParams {
    /// N=16384, r=8, p=1.
    ///
    /// Any other setting produces different keys for the same password, so
    /// ciphertext created with these parameters is only readable with them.
    pub const STANDARD: Self = Self {
        log_n: 14,
        r: 8,
        p: 1,
    };

    /// The cost parameter `N`.
    pub fn n(&self) -> u64 {
        1u64 << self.log_n
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Derive the symmetric key for a password with the standard parameters.
///
/// # Preconditions
/// - `password` must not be empty
///
/// # Postconditions
/// - Identical passwords yield identical keys on every machine
///
/// # Errors
/// - [`Error::EmptyPassword`] if the password is empty
pub fn derive_key(password: &str) -> Result<DerivedKey> {
    derive_key_with(password, &KdfParams::STANDARD)
}

/// Derive a key with explicit scrypt parameters.
///
/// # Errors
/// - [`Error::EmptyPassword`] if the password is empty
/// - [`Error::Crypto`] if the parameters are rejected by scrypt
pub fn derive_key_with(password: &str, params: &KdfParams) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(Error::EmptyPassword);
    }

    let salt = salt_for(password);
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LENGTH)
        .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {}", e)))?;

    debug!(log_n = params.log_n, r = params.r, p = params.p, "Deriving key");

    let mut key_bytes = [0u8; KEY_LENGTH];
    scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &scrypt_params, &mut key_bytes)
        .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;

    let key = DerivedKey::from_bytes(key_bytes);
    zeroize::Zeroize::zeroize(&mut key_bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_answer_vectors() {
        let vectors = [
            ("dummypass", "RAzHZIDCy9ouWCV7_uo2w8Jk9Lrf4q-VXDmYT2uGS9o="),
            ("wrongpass", "6AUdeFDyDcPlsHiGz8qJieEtxVApXQgZcWUa7mksDbI="),
            ("a", "-VKrrq2i5eg7cZnFUPaPMu4dzDfODTyZf55944Uoddo="),
            ("pässwörd 🔑", "lYLDNuml9Hg7EfZVvidj2IwHEo1FNU7HgU3Y9Bs8UJk="),
        ];
        for (password, expected) in vectors {
            let key = derive_key(password).unwrap();
            assert_eq!(key.to_token(), expected, "password {password:?}");
        }
    }

    #[test]
    fn test_derive_key_deterministic() {
        let key1 = derive_key("test-password-123").unwrap();
        let key2 = derive_key("test-password-123").unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_deterministic_across_threads() {
        let handle = std::thread::spawn(|| derive_key("shared-secret").unwrap().to_token());
        let here = derive_key("shared-secret").unwrap().to_token();

        assert_eq!(handle.join().unwrap(), here);
    }

    #[test]
    fn test_derive_key_different_password() {
        let key1 = derive_key("password1").unwrap();
        let key2 = derive_key("password2").unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_token_length() {
        assert_eq!(derive_key("x").unwrap().to_token().len(), 44);
    }

    #[test]
    fn test_derive_key_empty_password_fails() {
        assert!(matches!(derive_key(""), Err(Error::EmptyPassword)));
    }

    #[test]
    fn test_params_change_key() {
        let cheap = KdfParams {
            log_n: 10,
            r: 8,
            p: 1,
        };
        let key1 = derive_key_with("dummypass", &cheap).unwrap();
        let key2 = derive_key("dummypass").unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = KdfParams {
            log_n: 64,
            r: 8,
            p: 1,
        };
        assert!(matches!(
            derive_key_with("dummypass", &bad),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_standard_cost() {
        assert_eq!(KdfParams::default().n(), 16384);
    }
}
