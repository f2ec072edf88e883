//! Service configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use encrypto_common::{Error, Result};
use encrypto_crypto::CipherKind;
use encrypto_stego::{ChannelKind, DEFAULT_OUTPUT_FILENAME};

/// Hard ceiling for file-mode operations (1 GiB).
pub const MAX_FILE_SIZE: u64 = 1_073_741_824;

/// Marker appended to encrypted file names: `<name>.encrypto`.
pub const ENCRYPTED_MARKER: &str = "encrypto";

/// Options for an [`crate::Orchestrator`].
///
/// Key-derivation parameters and the file size limit are deliberately not
/// configurable: changing either breaks compatibility with existing files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Cipher used to seal text, files, and image secrets.
    pub cipher: CipherKind,
    /// Steganographic method label.
    pub channel: ChannelKind,
    /// Directory receiving steganographic output images.
    pub output_dir: PathBuf,
    /// File name of steganographic output images. Must be a PNG name.
    pub stego_filename: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cipher: CipherKind::default(),
            channel: ChannelKind::default(),
            output_dir: PathBuf::from("."),
            stego_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Check the configuration for values that would break output.
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] if the stego filename is empty, contains a
    ///   path separator, or does not end in `.png`
    pub fn validate(&self) -> Result<()> {
        let name = self.stego_filename.as_str();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Error::InvalidInput(format!(
                "Invalid stego file name: {:?}",
                name
            )));
        }
        if !name.to_ascii_lowercase().ends_with(".png") {
            return Err(Error::InvalidInput(format!(
                "Stego output must be lossless PNG, got {:?}",
                name
            )));
        }
        Ok(())
    }

    /// Full path of the steganographic output image.
    pub fn stego_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.stego_filename)
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();

        assert_eq!(config.cipher, CipherKind::Fernet);
        assert_eq!(config.channel, ChannelKind::Lsb);
        assert_eq!(config.stego_output_path(), PathBuf::from("./encrypto.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = ServiceConfig {
            cipher: CipherKind::XChaCha20Poly1305,
            channel: ChannelKind::Dct,
            output_dir: PathBuf::from("/tmp/out"),
            stego_filename: "hidden.png".to_string(),
        };

        let json = config.to_json().unwrap();
        assert!(json.contains("\"xchacha20poly1305\""));
        assert!(json.contains("\"dct\""));

        let restored = ServiceConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ServiceConfig::from_json(r#"{ "channel": "dct" }"#).unwrap();

        assert_eq!(config.channel, ChannelKind::Dct);
        assert_eq!(config.cipher, CipherKind::Fernet);
        assert_eq!(config.stego_filename, "encrypto.png");
    }

    #[test]
    fn test_lossy_output_rejected() {
        let result = ServiceConfig::from_json(r#"{ "stego_filename": "out.jpg" }"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_separator_in_filename_rejected() {
        let config = ServiceConfig {
            stego_filename: "../escape.png".to_string(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ServiceConfig::from_json("{ not json"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = ServiceConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
