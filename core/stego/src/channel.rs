//! Least-significant-bit channel over flattened RGB samples.
//!
//! A [`PixelChannel`] is an image's pixel bytes in row-major RGB order. Each
//! sample carries one bit in its LSB, so capacity in bits equals the sample
//! count.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::frame::{framed_bit_len, FRAME_OVERHEAD_BITS};
use encrypto_common::{Error, Result};

/// Samples per pixel in the channel layout.
pub const SAMPLES_PER_PIXEL: usize = 3;

/// Embedding method selected by the caller.
///
/// Both variants run the same LSB algorithm over the same flattened samples.
/// `Dct` is a label only: no frequency-domain transform is performed, and an
/// image written with one variant is readable with the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Direct LSB embedding into RGB samples.
    #[default]
    Lsb,
    /// Nominal "frequency domain" method; identical LSB embedding.
    Dct,
}

impl ChannelKind {
    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            ChannelKind::Lsb => "LSB",
            ChannelKind::Dct => "DCT",
        }
    }

    /// Embed `bits` into `channel`.
    pub fn embed(self, channel: PixelChannel, bits: &[u8]) -> Result<PixelChannel> {
        debug!(method = self.label(), "Embedding into pixel channel");
        embed(channel, bits)
    }

    /// Read every LSB in `channel`.
    pub fn extract(self, channel: &PixelChannel) -> Vec<u8> {
        debug!(method = self.label(), "Extracting from pixel channel");
        extract(channel)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flattened RGB samples of an image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelChannel {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl PixelChannel {
    /// Wrap row-major RGB samples.
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] if `samples.len() != width * height * 3`
    pub fn from_rgb(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(SAMPLES_PER_PIXEL));
        if expected != Some(samples.len()) {
            return Err(Error::InvalidInput(format!(
                "{}x{} RGB image needs {:?} samples, got {}",
                width,
                height,
                expected,
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample values in channel order.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Consume into the raw samples.
    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Number of bits the channel can carry.
    pub fn capacity_bits(&self) -> usize {
        self.samples.len()
    }
}

impl fmt::Debug for PixelChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelChannel")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples", &self.samples.len())
            .finish()
    }
}

/// Overwrite the LSB of the first `bits.len()` samples.
///
/// Higher-order bits and all samples past the last embedded bit are left
/// untouched.
///
/// # Errors
/// - [`Error::Capacity`] if there are more bits than samples
pub fn embed(mut channel: PixelChannel, bits: &[u8]) -> Result<PixelChannel> {
    let available = channel.capacity_bits();
    if bits.len() > available {
        return Err(Error::Capacity {
            required: bits.len(),
            available,
        });
    }

    for (sample, bit) in channel.samples.iter_mut().zip(bits) {
        *sample = (*sample & 0xFE) | (bit & 1);
    }

    debug!(bits = bits.len(), capacity = available, "Embedded bits");
    Ok(channel)
}

/// Read the LSB of every sample, in channel order.
pub fn extract(channel: &PixelChannel) -> Vec<u8> {
    channel.samples.iter().map(|sample| sample & 1).collect()
}

/// Steganographic capacity of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub width: u32,
    pub height: u32,
    /// One bit per sample.
    pub capacity_bits: usize,
    /// Largest payload that fits after framing overhead.
    pub max_payload_bytes: usize,
}

impl Capacity {
    /// Capacity of a channel.
    pub fn of(channel: &PixelChannel) -> Self {
        let capacity_bits = channel.capacity_bits();
        Self {
            width: channel.width,
            height: channel.height,
            capacity_bits,
            max_payload_bytes: capacity_bits.saturating_sub(FRAME_OVERHEAD_BITS) / 8,
        }
    }

    /// Whether a payload of `payload_len` bytes fits once framed.
    pub fn fits(&self, payload_len: usize) -> bool {
        framed_bit_len(payload_len) <= self.capacity_bits
    }
}
