//! Password-seeded pseudo-random generator used to produce the KDF salt.
//!
//! The generator is MT19937 seeded from text exactly the way earlier releases
//! of the tool seeded it: the seed integer is the big-endian number formed by
//! `utf8(password) || SHA-512(utf8(password))`, fed to `init_by_array` as
//! little-endian 32-bit words. Only IEEE 754 double arithmetic and wrapping
//! 32-bit integer math are involved, so the drawn value is identical on every
//! platform.
//!
//! This makes the salt a pure function of the password. That is weaker than a
//! random stored salt, but it is what lets a password alone re-derive the same
//! key on any machine.

use sha2::{Digest, Sha512};

const STATE_WORDS: usize = 624;
const SHIFT_WORDS: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// MT19937 generator seeded from a password.
pub struct SeededRng {
    state: [u32; STATE_WORDS],
    index: usize,
}

impl SeededRng {
    /// Seed the generator from password text.
    pub fn from_password(password: &str) -> Self {
        Self::from_key(&seed_words(password.as_bytes()))
    }

    /// Seed the generator with the reference `init_by_array` routine.
    pub fn from_key(key: &[u32]) -> Self {
        let key: &[u32] = if key.is_empty() { &[0] } else { key };
        let mut rng = Self::from_u32(19_650_218);
        let state = &mut rng.state;

        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..STATE_WORDS.max(key.len()) {
            let prev = state[i - 1];
            state[i] = (state[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= STATE_WORDS {
                state[0] = state[STATE_WORDS - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..STATE_WORDS - 1 {
            let prev = state[i - 1];
            state[i] = (state[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= STATE_WORDS {
                state[0] = state[STATE_WORDS - 1];
                i = 1;
            }
        }
        // MSB is 1, assuring a non-zero initial state.
        state[0] = UPPER_MASK;
        rng
    }

    fn from_u32(seed: u32) -> Self {
        let mut state = [0u32; STATE_WORDS];
        state[0] = seed;
        for i in 1..STATE_WORDS {
            let prev = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            index: STATE_WORDS,
        }
    }

    fn twist(&mut self) {
        for k in 0..STATE_WORDS {
            let y = (self.state[k] & UPPER_MASK) | (self.state[(k + 1) % STATE_WORDS] & LOWER_MASK);
            let mut next = self.state[(k + SHIFT_WORDS) % STATE_WORDS] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[k] = next;
        }
        self.index = 0;
    }

    /// Next tempered 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        if self.index >= STATE_WORDS {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    /// Uniform double in `[0, 1)` with 53 bits of precision.
    pub fn next_f64(&mut self) -> f64 {
        let a = (self.next_u32() >> 5) as f64;
        let b = (self.next_u32() >> 6) as f64;
        (a * 67_108_864.0 + b) * (1.0 / 9_007_199_254_740_992.0)
    }
}

/// Split `bytes || SHA-512(bytes)`, read as a big-endian integer, into
/// 32-bit words ordered least significant first.
fn seed_words(bytes: &[u8]) -> Vec<u32> {
    let mut material = Vec::with_capacity(bytes.len() + 64);
    material.extend_from_slice(bytes);
    material.extend_from_slice(&Sha512::digest(bytes));

    let mut words: Vec<u32> = material
        .rchunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[4 - chunk.len()..].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .collect();
    while words.len() > 1 && words.last() == Some(&0) {
        words.pop();
    }
    words
}

/// Format a generator draw as salt text.
///
/// Fixed notation is used for decimal exponents in `-4..16`, scientific
/// notation with a signed two-digit exponent otherwise, and integral values
/// keep a trailing `.0` (`0.25`, `1e-05`, `3.0`, `1e+16`). Digits come from
/// Rust's shortest round-trip formatting, which only matches the salt text
/// of existing tokens for values in `[0, 1)`; large magnitudes may differ in
/// the last digit.
fn format_shortest(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "2.5e-1".
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or_default();
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exponent) {
        let fraction = if digits.len() > 1 {
            format!(".{}", &digits[1..])
        } else {
            String::new()
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{sign}{}{fraction}e{exp_sign}{:02}",
            &digits[..1],
            exponent.abs()
        )
    } else if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("{sign}0.{zeros}{digits}")
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            let zeros = "0".repeat(int_len - digits.len());
            format!("{sign}{digits}{zeros}.0")
        } else {
            format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
        }
    }
}

/// Salt text for a password: the first generator draw, formatted.
///
/// The salt is a function of the password alone, so equal passwords always
/// yield equal keys. Keys stay reproducible on any machine, at the cost of
/// offering no protection against precomputed tables.
pub fn salt_for(password: &str) -> String {
    format_shortest(SeededRng::from_password(password).next_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_u32_outputs() {
        let mut rng = SeededRng::from_password("dummypass");
        assert_eq!(rng.next_u32(), 1_195_180_268);
        assert_eq!(rng.next_u32(), 2_588_793_232);
        assert_eq!(rng.next_u32(), 705_961_129);
    }

    #[test]
    fn test_known_f64_outputs() {
        let mut rng = SeededRng::from_password("dummypass");
        assert_eq!(rng.next_f64(), 0.27827459277771704);
        assert_eq!(rng.next_f64(), 0.16436938404364343);
        assert_eq!(rng.next_f64(), 0.8449849459228246);
    }

    #[test]
    fn test_salt_vectors() {
        assert_eq!(salt_for("dummypass"), "0.27827459277771704");
        assert_eq!(salt_for("wrongpass"), "0.19126178390791382");
        assert_eq!(salt_for("a"), "0.2720295377534757");
        assert_eq!(salt_for("pässwörd 🔑"), "0.08427539272166651");
    }

    #[test]
    fn test_seed_words_layout() {
        // 9 password bytes + 64 digest bytes = 73 bytes -> 19 words.
        let words = seed_words(b"dummypass");
        assert_eq!(words.len(), 19);
        // Most significant word holds the lone leading byte 'd'.
        assert_eq!(*words.last().unwrap(), u32::from(b'd'));
    }

    #[test]
    fn test_empty_key_is_seeded_as_zero() {
        let mut a = SeededRng::from_key(&[]);
        let mut b = SeededRng::from_key(&[0]);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_f64_in_unit_interval() {
        let mut rng = SeededRng::from_password("range");
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_format_shortest() {
        assert_eq!(format_shortest(0.0), "0.0");
        assert_eq!(format_shortest(0.5), "0.5");
        assert_eq!(format_shortest(1e-5), "1e-05");
        assert_eq!(format_shortest(0.0001), "0.0001");
        assert_eq!(format_shortest(0.00012345678), "0.00012345678");
        assert_eq!(format_shortest(1.25e-7), "1.25e-07");
        assert_eq!(format_shortest(5e-324), "5e-324");
        assert_eq!(format_shortest(3.0), "3.0");
        assert_eq!(format_shortest(123.456), "123.456");
        assert_eq!(format_shortest(1e16), "1e+16");
        assert_eq!(format_shortest(-0.75), "-0.75");
    }

    #[test]
    fn test_unit_interval_draws_format_exactly() {
        let mut rng = SeededRng::from_password("dummypass");
        let texts: Vec<String> = (0..3).map(|_| format_shortest(rng.next_f64())).collect();
        assert_eq!(
            texts,
            ["0.27827459277771704", "0.16436938404364343", "0.8449849459228246"]
        );

        let mut rng = SeededRng::from_password("correct horse battery staple");
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert_eq!(format_shortest(x).parse::<f64>().unwrap(), x);
        }
    }
}
