//! Steganographic payload channel for Encrypto.
//!
//! This module provides:
//! - Length-prefixed, marker-terminated framing of arbitrary secrets
//! - LSB embedding and extraction over flattened RGB samples
//! - Image loading and lossless (PNG) persistence
//!
//! Typical flow: `frame` → `embed` → `save_png`, and back with
//! `load` → `extract` → `unframe`.

pub mod channel;
pub mod frame;
pub mod image_io;

pub use channel::{embed, extract, Capacity, ChannelKind, PixelChannel};
pub use frame::{frame, framed_bit_len, unframe};
pub use image_io::{load, save_png, DEFAULT_OUTPUT_FILENAME};
