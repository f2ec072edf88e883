//! File-level guards for encryption state.
//!
//! Encrypted files are recognised purely by name: `<name>.encrypto`. A file
//! whose name legitimately ends in the same suffix is indistinguishable from
//! ciphertext; that collision is accepted.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{ENCRYPTED_MARKER, MAX_FILE_SIZE};
use encrypto_common::{Error, Result};

/// Gatekeeper for file encryption and decryption.
///
/// Enforces [`MAX_FILE_SIZE`] and the [`ENCRYPTED_MARKER`] naming rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCryptoState;

impl FileCryptoState {
    pub fn new() -> Self {
        Self
    }

    /// Stat a file and enforce the size limit without reading it.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the file does not exist
    /// - [`Error::FileTooLarge`] if it exceeds the limit
    pub fn check_size(&self, path: &Path) -> Result<u64> {
        let size = fs::metadata(path).map_err(|e| io_error(path, e))?.len();
        if size > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge {
                size,
                limit: MAX_FILE_SIZE,
            });
        }
        Ok(size)
    }

    /// Read a file for encryption or decryption.
    ///
    /// The size is checked before any byte is read.
    ///
    /// # Errors
    /// - [`Error::NotFound`], [`Error::FileTooLarge`], or [`Error::Io`]
    pub fn open_for_processing(&self, path: &Path) -> Result<Vec<u8>> {
        let size = self.check_size(path)?;
        debug!(path = %path.display(), size, "Reading file");
        fs::read(path).map_err(|e| io_error(path, e))
    }

    /// Whether the file name carries the encrypted marker.
    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked_stem(path).is_some()
    }

    /// Output path for the ciphertext of `original`: `<name>.encrypto`.
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] if the path has no file name
    pub fn mark_encrypted(&self, original: &Path) -> Result<PathBuf> {
        let name = original
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("{} is not a file", original.display())))?;

        let mut marked = OsString::from(name);
        marked.push(".");
        marked.push(ENCRYPTED_MARKER);
        Ok(original.with_file_name(marked))
    }

    /// Inverse of [`Self::mark_encrypted`].
    ///
    /// # Errors
    /// - [`Error::NotEncrypted`] if the name does not carry the marker
    pub fn unmark_encrypted(&self, encrypted: &Path) -> Result<PathBuf> {
        let stem = self
            .marked_stem(encrypted)
            .ok_or_else(|| Error::NotEncrypted(encrypted.to_path_buf()))?;
        Ok(encrypted.with_file_name(stem))
    }

    /// Refuse to encrypt a file that already carries the marker.
    ///
    /// # Errors
    /// - [`Error::AlreadyEncrypted`] (mild)
    pub fn assert_not_already_encrypted(&self, path: &Path) -> Result<()> {
        if self.is_marked(path) {
            warn!(path = %path.display(), "File is already encrypted");
            return Err(Error::AlreadyEncrypted(path.to_path_buf()));
        }
        Ok(())
    }

    /// Refuse to decrypt a file that does not carry the marker.
    ///
    /// Without the marker the decrypted output path would be the input path.
    ///
    /// # Errors
    /// - [`Error::NotEncrypted`] (mild)
    pub fn assert_is_encrypted(&self, path: &Path) -> Result<()> {
        if !self.is_marked(path) {
            warn!(path = %path.display(), "File does not carry the encrypted marker");
            return Err(Error::NotEncrypted(path.to_path_buf()));
        }
        Ok(())
    }

    /// The file name with `.<marker>` removed, if it ends with it and
    /// something remains.
    ///
    /// Compared on encoded bytes so names that are not valid UTF-8 still
    /// round-trip through [`Self::mark_encrypted`].
    fn marked_stem<'a>(&self, path: &'a Path) -> Option<&'a OsStr> {
        let name = path.file_name()?.as_encoded_bytes();
        let stem = name
            .strip_suffix(ENCRYPTED_MARKER.as_bytes())?
            .strip_suffix(b".")?;
        if stem.is_empty() {
            return None;
        }
        // SAFETY: `stem` is `name` with an ASCII suffix removed, so it ends on
        // a boundary that `from_encoded_bytes_unchecked` accepts.
        Some(unsafe { OsStr::from_encoded_bytes_unchecked(stem) })
    }
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::Io(err),
    }
}
