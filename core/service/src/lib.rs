//! Operation layer for Encrypto.
//!
//! This module provides:
//! - Text, file, and image encryption and decryption
//! - File guards: size limit and the `.encrypto` marker
//! - Service configuration with JSON persistence
//!
//! # Architecture
//! The [`Orchestrator`] owns no state beyond its configuration. Each call
//! derives a fresh key, so operations on distinct paths can run in parallel.
//! Errors are split by [`encrypto_common::Severity`]: mild errors refuse an
//! input without writing anything and callers may continue with the next one.

pub mod config;
pub mod files;
pub mod operations;

pub use config::{ServiceConfig, ENCRYPTED_MARKER, MAX_FILE_SIZE};
pub use files::FileCryptoState;
pub use operations::{Operation, Orchestrator, Outcome, Target};
