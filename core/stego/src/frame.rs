//! Payload frame construction and parsing.
//!
//! The frame wraps a variable-length secret so it can be recovered from a
//! fixed-capacity bit channel:
//!
//! ```text
//! [32 bits] payload length in bytes (big-endian u32)
//! [N bytes] payload
//! [8 bits ] end marker, 0xFF
//! ```
//!
//! Bits are emitted most significant first, one bit per `u8` (0 or 1).
//!
//! The length header is the only source of truth when decoding. The end
//! marker is written so every frame has the same shape, but it is never
//! checked, and anything after the declared length is ignored.

use encrypto_common::{Error, Result};

/// Bits taken by the length header.
pub const LENGTH_HEADER_BITS: usize = 32;

/// End-of-data marker byte.
pub const END_MARKER: u8 = 0xFF;

/// Bits taken by the end marker.
pub const END_MARKER_BITS: usize = 8;

/// Fixed overhead: header(32) + marker(8) = 40 bits.
pub const FRAME_OVERHEAD_BITS: usize = LENGTH_HEADER_BITS + END_MARKER_BITS;

/// Number of bits a frame around `payload_len` bytes occupies.
pub fn framed_bit_len(payload_len: usize) -> usize {
    FRAME_OVERHEAD_BITS + payload_len * 8
}

/// Build the frame for `payload` as a bit sequence.
///
/// # Errors
/// - [`Error::InvalidInput`] if the payload does not fit a u32 length header
pub fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        Error::InvalidInput(format!("Payload of {} bytes is too long to frame", payload.len()))
    })?;

    let mut bits = Vec::with_capacity(framed_bit_len(payload.len()));
    push_byte_bits(&mut bits, &len.to_be_bytes());
    push_byte_bits(&mut bits, payload);
    push_byte_bits(&mut bits, &[END_MARKER]);
    Ok(bits)
}

/// Recover the payload from a bit sequence that starts with a frame.
///
/// # Errors
/// - [`Error::TruncatedFrame`] if fewer than 32 bits are available, or fewer
///   than the declared payload needs
pub fn unframe(bits: &[u8]) -> Result<Vec<u8>> {
    let header = bits.get(..LENGTH_HEADER_BITS).ok_or(Error::TruncatedFrame {
        available: bits.len(),
        required: LENGTH_HEADER_BITS,
    })?;
    let declared = u32::from_be_bytes(array_from_bits(header)) as usize;

    let required = declared
        .checked_mul(8)
        .and_then(|payload_bits| payload_bits.checked_add(LENGTH_HEADER_BITS))
        .unwrap_or(usize::MAX);
    let body = bits
        .get(LENGTH_HEADER_BITS..required)
        .ok_or(Error::TruncatedFrame {
            available: bits.len(),
            required,
        })?;

    Ok(body.chunks_exact(8).map(byte_from_bits).collect())
}

fn push_byte_bits(bits: &mut Vec<u8>, bytes: &[u8]) {
    for byte in bytes {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
}

fn byte_from_bits(bits: &[u8]) -> u8 {
    bits.iter().fold(0u8, |acc, bit| (acc << 1) | (bit & 1))
}

fn array_from_bits(bits: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (slot, chunk) in out.iter_mut().zip(bits.chunks_exact(8)) {
        *slot = byte_from_bits(chunk);
    }
    out
}
