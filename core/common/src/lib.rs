//! Common error types shared across Encrypto crates.
//!
//! Every fatal condition surfaces as its own [`Error`] variant so callers can
//! react differently (re-prompt for a password, skip a file, abort the run).

pub mod error;

pub use error::{Error, Result, Severity};
