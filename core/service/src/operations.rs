//! Text, file, and image operations composed from cipher and channel.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::files::FileCryptoState;
use encrypto_common::{Error, Result};
use encrypto_crypto::{decrypt, decrypt_text, encrypt, encrypt_text};
use encrypto_stego::{frame, load, save_png, unframe, Capacity};

/// Direction of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

/// What an operation acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Plaintext on encrypt, a token on decrypt.
    Text(String),
    /// A file on disk.
    File(PathBuf),
    /// A cover image on encrypt, a stego image on decrypt.
    ///
    /// `secret` is required to encrypt and ignored when decrypting.
    Image {
        path: PathBuf,
        secret: Option<String>,
    },
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Token or recovered plaintext.
    Text(String),
    /// Path of the written output file.
    File(PathBuf),
    /// Path of the written stego image.
    Image(PathBuf),
}

/// Stateless composition of key derivation, cipher, framing, and channel.
///
/// Every call derives its own key and owns its buffers, so one orchestrator
/// can be shared across threads. Concurrent calls must not write the same
/// output path.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: ServiceConfig,
    files: FileCryptoState,
}

impl Orchestrator {
    /// Create an orchestrator from a validated configuration.
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] if the configuration is invalid
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            files: FileCryptoState::new(),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Dispatch an operation on a target.
    ///
    /// # Errors
    /// - Whatever the dispatched operation returns; mild errors
    ///   ([`Error::is_mild`]) mean the input was refused and nothing was written
    pub fn process(&self, operation: Operation, target: Target, password: &str) -> Result<Outcome> {
        match (operation, target) {
            (Operation::Encrypt, Target::Text(text)) => {
                self.encrypt_text(&text, password).map(Outcome::Text)
            }
            (Operation::Decrypt, Target::Text(token)) => {
                self.decrypt_text(&token, password).map(Outcome::Text)
            }
            (Operation::Encrypt, Target::File(path)) => {
                self.encrypt_file(&path, password).map(Outcome::File)
            }
            (Operation::Decrypt, Target::File(path)) => {
                self.decrypt_file(&path, password).map(Outcome::File)
            }
            (Operation::Encrypt, Target::Image { path, secret }) => {
                let secret = secret.ok_or_else(|| {
                    Error::InvalidInput("No secret given to hide in the image".to_string())
                })?;
                self.encrypt_image(&path, &secret, password)
                    .map(Outcome::Image)
            }
            (Operation::Decrypt, Target::Image { path, .. }) => {
                self.decrypt_image(&path, password).map(Outcome::Text)
            }
        }
    }

    /// Encrypt text into a token.
    pub fn encrypt_text(&self, text: &str, password: &str) -> Result<String> {
        encrypt_text(self.config.cipher, text, password)
    }

    /// Decrypt a token back into text.
    pub fn decrypt_text(&self, token: &str, password: &str) -> Result<String> {
        decrypt_text(self.config.cipher, token, password)
    }

    /// Encrypt a file to `<name>.encrypto` beside it.
    ///
    /// # Errors
    /// - [`Error::AlreadyEncrypted`] (mild) if the file carries the marker
    /// - [`Error::FileTooLarge`] if it exceeds 1 GiB
    /// - [`Error::EmptyPassword`], [`Error::NotFound`], [`Error::Io`]
    pub fn encrypt_file(&self, path: &Path, password: &str) -> Result<PathBuf> {
        self.files.assert_not_already_encrypted(path)?;
        require_password(password)?;
        let output = self.files.mark_encrypted(path)?;
        let plaintext = self.files.open_for_processing(path)?;

        let payload = encrypt(self.config.cipher, &plaintext, password)?;
        write_output(&output, payload.as_bytes())?;

        info!(
            input = %path.display(),
            output = %output.display(),
            size = plaintext.len(),
            "File encrypted"
        );
        Ok(output)
    }

    /// Decrypt a `<name>.encrypto` file back to `<name>` beside it.
    ///
    /// The size limit also applies to the encrypted file. Fernet tokens are
    /// about 1.37 times the plaintext size, so plaintexts above roughly 780 MiB
    /// encrypt successfully but their output is refused here.
    ///
    /// # Errors
    /// - [`Error::NotEncrypted`] (mild) if the file lacks the marker
    /// - [`Error::Authentication`] on a wrong password or corrupted file
    /// - [`Error::FileTooLarge`], [`Error::NotFound`], [`Error::Io`]
    pub fn decrypt_file(&self, path: &Path, password: &str) -> Result<PathBuf> {
        self.files.assert_is_encrypted(path)?;
        require_password(password)?;
        let output = self.files.unmark_encrypted(path)?;
        let payload = self.files.open_for_processing(path)?;

        let plaintext = decrypt(self.config.cipher, &payload, password)?;
        write_output(&output, &plaintext)?;

        info!(
            input = %path.display(),
            output = %output.display(),
            size = plaintext.len(),
            "File decrypted"
        );
        Ok(output)
    }

    /// Encrypt a secret and hide it in a cover image.
    ///
    /// The stego image is written to the configured output path as PNG.
    ///
    /// # Errors
    /// - [`Error::Capacity`] if the framed token does not fit the cover
    /// - [`Error::EmptyPassword`], [`Error::NotFound`], [`Error::Image`]
    pub fn encrypt_image(&self, cover: &Path, secret: &str, password: &str) -> Result<PathBuf> {
        require_password(password)?;
        let channel = load(cover)?;
        let token = encrypt(self.config.cipher, secret.as_bytes(), password)?;
        let bits = frame(token.as_bytes())?;

        debug!(
            channel = %self.config.channel,
            bits = bits.len(),
            capacity = channel.capacity_bits(),
            "Embedding secret"
        );
        let stego = self.config.channel.embed(channel, &bits)?;

        let output = self.config.stego_output_path();
        save_png(stego, &output)?;

        info!(cover = %cover.display(), output = %output.display(), "Secret hidden in image");
        Ok(output)
    }

    /// Recover and decrypt a secret hidden in an image.
    ///
    /// # Errors
    /// - [`Error::TruncatedFrame`] if the image holds no complete frame
    /// - [`Error::Authentication`] on a wrong password or damaged image
    /// - [`Error::InvalidUtf8`] if the secret is not text
    pub fn decrypt_image(&self, stego: &Path, password: &str) -> Result<String> {
        require_password(password)?;
        let channel = load(stego)?;
        let bits = self.config.channel.extract(&channel);
        let token = unframe(&bits)?;

        debug!(
            channel = %self.config.channel,
            token_len = token.len(),
            "Extracted secret"
        );
        let plaintext = decrypt(self.config.cipher, &token, password)?;
        String::from_utf8(plaintext).map_err(|_| Error::InvalidUtf8)
    }

    /// Capacity report for a cover image.
    pub fn image_capacity(&self, path: &Path) -> Result<Capacity> {
        Ok(Capacity::of(&load(path)?))
    }
}

/// Reject an empty password before any file or image is read.
fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::EmptyPassword);
    }
    Ok(())
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data)?;
    debug!(path = %path.display(), size = data.len(), "Wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encrypto_crypto::CipherKind;
    use tempfile::TempDir;

    fn orchestrator(dir: &TempDir) -> Orchestrator {
        Orchestrator::new(ServiceConfig {
            output_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    fn write_cover(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 13) as u8, ((x + y) * 3) as u8])
        })
        .save(&path)
        .unwrap();
        path
    }

    #[test]
    fn test_text_roundtrip() {
        let orch = Orchestrator::default();
        let token = orch.encrypt_text("dummytext", "dummypass").unwrap();

        assert_eq!(orch.decrypt_text(&token, "dummypass").unwrap(), "dummytext");
        assert!(matches!(
            orch.decrypt_text(&token, "wrongpass"),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_empty_password() {
        let orch = Orchestrator::default();
        assert!(matches!(
            orch.encrypt_text("dummytext", ""),
            Err(Error::EmptyPassword)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ServiceConfig {
            stego_filename: "out.jpg".to_string(),
            ..ServiceConfig::default()
        };
        assert!(Orchestrator::new(config).is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let source = dir.path().join("sample.txt");
        fs::write(&source, b"Sample file content").unwrap();

        let encrypted = orch.encrypt_file(&source, "dummypass").unwrap();
        assert_eq!(encrypted, dir.path().join("sample.txt.encrypto"));
        assert_ne!(fs::read(&encrypted).unwrap(), b"Sample file content");

        fs::remove_file(&source).unwrap();
        let decrypted = orch.decrypt_file(&encrypted, "dummypass").unwrap();
        assert_eq!(decrypted, source);
        assert_eq!(fs::read(&source).unwrap(), b"Sample file content");
    }

    #[test]
    fn test_file_wrong_password_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let source = dir.path().join("secret.bin");
        fs::write(&source, [0u8, 1, 2, 3]).unwrap();

        let encrypted = orch.encrypt_file(&source, "dummypass").unwrap();
        fs::remove_file(&source).unwrap();

        assert!(matches!(
            orch.decrypt_file(&encrypted, "wrongpass"),
            Err(Error::Authentication)
        ));
        assert!(!source.exists());
    }

    #[test]
    fn test_encrypting_marked_file_is_mild() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let marked = dir.path().join("done.txt.encrypto");
        fs::write(&marked, b"token").unwrap();

        let err = orch.encrypt_file(&marked, "dummypass").unwrap_err();
        assert!(err.is_mild());
        assert!(!dir.path().join("done.txt.encrypto.encrypto").exists());
    }

    #[test]
    fn test_decrypting_unmarked_file_is_mild() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let plain = dir.path().join("plain.txt");
        fs::write(&plain, b"not a token").unwrap();

        let err = orch.decrypt_file(&plain, "dummypass").unwrap_err();
        assert!(matches!(err, Error::NotEncrypted(_)));
        assert_eq!(fs::read(&plain).unwrap(), b"not a token");
    }

    #[test]
    fn test_image_roundtrip() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let cover = write_cover(&dir, "cover.png", 64, 64);

        let output = orch.encrypt_image(&cover, "dummytext", "dummypass").unwrap();
        assert_eq!(output, dir.path().join("encrypto.png"));
        assert_eq!(orch.decrypt_image(&output, "dummypass").unwrap(), "dummytext");
    }

    #[test]
    fn test_image_too_small() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let cover = write_cover(&dir, "tiny.png", 4, 4);

        assert!(matches!(
            orch.encrypt_image(&cover, "dummytext", "dummypass"),
            Err(Error::Capacity { available: 48, .. })
        ));
        assert!(!orch.config().stego_output_path().exists());
    }

    #[test]
    fn test_process_dispatch() {
        let dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(ServiceConfig {
            cipher: CipherKind::XChaCha20Poly1305,
            output_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        })
        .unwrap();

        let Outcome::Text(token) = orch
            .process(Operation::Encrypt, Target::Text("hello".into()), "pw")
            .unwrap()
        else {
            panic!("expected text outcome");
        };
        assert_eq!(
            orch.process(Operation::Decrypt, Target::Text(token), "pw")
                .unwrap(),
            Outcome::Text("hello".into())
        );
    }

    #[test]
    fn test_process_image_without_secret() {
        let orch = Orchestrator::default();
        let target = Target::Image {
            path: PathBuf::from("cover.png"),
            secret: None,
        };

        assert!(matches!(
            orch.process(Operation::Encrypt, target, "pw"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_image_capacity() {
        let dir = TempDir::new().unwrap();
        let cover = write_cover(&dir, "cover.png", 10, 10);
        let capacity = Orchestrator::default().image_capacity(&cover).unwrap();

        assert_eq!(capacity.capacity_bits, 300);
        assert_eq!(capacity.max_payload_bytes, 32);
    }

    #[test]
    fn test_empty_password_checked_before_reading() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let oversized = dir.path().join("big.bin");
        fs::File::create(&oversized)
            .unwrap()
            .set_len(crate::MAX_FILE_SIZE + 1)
            .unwrap();

        assert!(matches!(
            orch.encrypt_file(&oversized, ""),
            Err(Error::EmptyPassword)
        ));
        assert!(matches!(
            orch.decrypt_file(&dir.path().join("missing.txt.encrypto"), ""),
            Err(Error::EmptyPassword)
        ));
        assert!(matches!(
            orch.encrypt_image(&dir.path().join("missing.png"), "secret", ""),
            Err(Error::EmptyPassword)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_roundtrip_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let source = dir.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
        fs::write(&source, b"latin-1 name").unwrap();

        let encrypted = orch.encrypt_file(&source, "dummypass").unwrap();
        assert!(orch.encrypt_file(&encrypted, "dummypass").unwrap_err().is_mild());

        fs::remove_file(&source).unwrap();
        assert_eq!(orch.decrypt_file(&encrypted, "dummypass").unwrap(), source);
        assert_eq!(fs::read(&source).unwrap(), b"latin-1 name");
    }
}
