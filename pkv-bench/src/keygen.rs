//! # Key Generator
//!
//! Random, URL-safe keys of an exact length. Only the length is
//! deterministic; content comes from the injected random source.
//!
//! A buffer of `(3L + 1) / 4` bytes always encodes to at least `L`
//! characters: unpadded base64 of `n` bytes is `ceil(4n / 3)` long, and
//! `4 * floor((3L + 1) / 4) >= 3L - 2` gives `ceil(4n / 3) >= L`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{BenchError, BenchResult};

/// Random bytes needed to encode a key of `key_len` characters.
#[inline]
pub fn buffer_len(key_len: usize) -> usize {
    (key_len.saturating_mul(3) + 1) / 4
}

/// Generates keys from a caller-provided random source.
///
/// Pass `&mut rng` to borrow a source the caller keeps using afterwards.
pub struct KeyGenerator<R> {
    rng: R,
    buf: Vec<u8>,
}

impl KeyGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible generator, for tests and `--seed` runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> KeyGenerator<R> {
    pub fn new(rng: R) -> Self {
        KeyGenerator {
            rng,
            buf: Vec::new(),
        }
    }

    /// Returns a key of exactly `len` characters from `[A-Za-z0-9_-]`.
    ///
    /// # Errors
    /// `InvalidKeyLength` for `len == 0`, `RandomSource` when the source
    /// cannot fill the buffer.
    pub fn generate(&mut self, len: usize) -> BenchResult<String> {
        if len == 0 {
            return Err(BenchError::InvalidKeyLength);
        }

        self.buf.clear();
        self.buf.resize(buffer_len(len), 0);
        self.rng.try_fill_bytes(&mut self.buf)?;

        let mut key = URL_SAFE_NO_PAD.encode(&self.buf);
        debug_assert!(key.len() >= len, "{} bytes encode to {}", self.buf.len(), key.len());
        key.truncate(len);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_safe(key: &str) -> bool {
        key.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    #[test]
    fn exact_length_for_every_small_len() {
        let mut keygen = KeyGenerator::seeded(7);
        for len in 1..=512 {
            let key = keygen.generate(len).unwrap();
            assert_eq!(key.len(), len, "len {len}");
            assert!(url_safe(&key), "{key}");
        }
    }

    #[test]
    fn buffer_is_never_too_small() {
        for len in 1..=10_000usize {
            let encoded = (buffer_len(len) * 4).div_ceil(3);
            assert!(encoded >= len, "len {len}: {encoded}");
        }
    }

    #[test]
    fn hundred_short_keys() {
        let mut keygen = KeyGenerator::from_entropy();
        let keys: Vec<String> = (0..100).map(|_| keygen.generate(4).unwrap()).collect();
        assert_eq!(keys.len(), 100);
        assert!(keys.iter().all(|key| key.len() == 4 && url_safe(key)));
    }

    #[test]
    fn successive_draws_differ() {
        let mut keygen = KeyGenerator::seeded(1);
        let first = keygen.generate(32).unwrap();
        let second = keygen.generate(32).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn same_seed_reproduces_keys() {
        let mut a = KeyGenerator::seeded(42);
        let mut b = KeyGenerator::seeded(42);
        assert_eq!(a.generate(100).unwrap(), b.generate(100).unwrap());
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut keygen = KeyGenerator::seeded(0);
        assert!(matches!(keygen.generate(0), Err(BenchError::InvalidKeyLength)));
    }

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "source exhausted",
            )))
        }
    }

    #[test]
    fn exhausted_source_is_reported() {
        let mut keygen = KeyGenerator::new(FailingRng);
        assert!(matches!(keygen.generate(8), Err(BenchError::RandomSource(_))));
    }
}
