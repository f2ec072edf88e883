//! Common error types for Encrypto.

use std::path::PathBuf;
use thiserror::Error;

/// How far an error should propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation produced nothing usable; abort it.
    Fatal,
    /// The operation was refused before touching any data; report and continue.
    Mild,
}

/// Top-level error type for Encrypto operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A password is required and none was given.
    #[error("Please enter a password")]
    EmptyPassword,

    /// The derived key could not be turned into a cipher instance.
    #[error("Key error: {0}")]
    Key(String),

    /// Cryptographic operation failed for a reason other than authentication.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Integrity check failed. Wrong password and corrupted data are
    /// deliberately indistinguishable.
    #[error("Either the key or the input data is wrong")]
    Authentication,

    /// Not enough bits to decode a payload frame.
    #[error("Truncated frame: {available} bits available, {required} required")]
    TruncatedFrame { available: usize, required: usize },

    /// The pixel channel cannot carry the framed payload.
    #[error("Secret needs {required} bits but the image only holds {available}")]
    Capacity { required: usize, available: usize },

    /// Input file exceeds the processing limit.
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// The file name already carries the encrypted marker.
    #[error("File is already encrypted: {}", .0.display())]
    AlreadyEncrypted(PathBuf),

    /// The file name does not carry the encrypted marker.
    #[error("File is not an encrypted file: {}", .0.display())]
    NotEncrypted(PathBuf),

    /// Input file does not exist.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Decrypted bytes are not valid UTF-8 text.
    #[error("Decrypted data is not valid UTF-8 text")]
    InvalidUtf8,

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Classify the error for callers deciding whether to abort.
    pub fn severity(&self) -> Severity {
        match self {
            Error::AlreadyEncrypted(_) | Error::NotEncrypted(_) => Severity::Mild,
            _ => Severity::Fatal,
        }
    }

    /// Shorthand for `severity() == Severity::Mild`.
    pub fn is_mild(&self) -> bool {
        self.severity() == Severity::Mild
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
