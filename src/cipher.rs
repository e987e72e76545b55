/// Positional XOR cipher
///
/// The demodisk hides its loader and ramdisk behind a XOR key schedule that
/// restarts at every 512-byte segment. XOR is its own inverse, so the same
/// call enciphers and deciphers.

use crate::error::{DemodiskError, Result};
use crate::format::constants::{CIPHER_SEGMENT_SIZE, DEMODISK_XOR_KEY};

/// A stateless XOR key schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherKey {
    key: Vec<u8>,
    /// Key position resets every `segment_size` bytes; `None` repeats the key forever
    segment_size: Option<usize>,
}

impl CipherKey {
    /// Create a key schedule
    ///
    /// The schedule is validated when it is used, see [`transform`].
    pub fn new<K: Into<Vec<u8>>>(key: K, segment_size: Option<usize>) -> Self {
        Self {
            key: key.into(),
            segment_size,
        }
    }

    /// A plain repeating key
    pub fn repeating<K: Into<Vec<u8>>>(key: K) -> Self {
        Self::new(key, None)
    }

    /// The key schedule used on the demodisk and its extension files
    pub fn demodisk() -> Self {
        Self::new(DEMODISK_XOR_KEY.to_vec(), Some(CIPHER_SEGMENT_SIZE))
    }

    /// Get the key bytes
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Check that the schedule can produce key bytes
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(DemodiskError::config("cipher key is empty"));
        }
        if self.segment_size == Some(0) {
            return Err(DemodiskError::config("cipher segment size is zero"));
        }
        Ok(())
    }

    /// Key byte applied at `position` of the cipher stream
    #[inline]
    fn byte_at(&self, position: usize) -> u8 {
        let within = match self.segment_size {
            Some(segment) => position % segment,
            None => position,
        };
        self.key[within % self.key.len()]
    }
}

impl Default for CipherKey {
    fn default() -> Self {
        Self::demodisk()
    }
}

/// Apply the key schedule to `data`, starting at stream position 0
pub fn transform(data: &[u8], key: &CipherKey) -> Result<Vec<u8>> {
    transform_at(data, key, 0)
}

/// Apply the key schedule to `data` whose first byte sits at `origin` in the cipher stream
///
/// Deciphering two adjacent slices at their own origins gives the same bytes
/// as deciphering their concatenation at the first origin.
pub fn transform_at(data: &[u8], key: &CipherKey, origin: usize) -> Result<Vec<u8>> {
    key.validate()?;

    Ok(data
        .iter()
        .enumerate()
        .map(|(i, &byte)| byte ^ key.byte_at(origin + i))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_inverse() {
        let key = CipherKey::demodisk();
        let data: Vec<u8> = (0..2000).map(|i| (i * 7 % 256) as u8).collect();

        let ciphered = transform(&data, &key).unwrap();
        assert_ne!(ciphered, data);
        assert_eq!(transform(&ciphered, &key).unwrap(), data);
    }

    #[test]
    fn test_zero_bytes_reveal_key() {
        let key = CipherKey::demodisk();
        let out = transform(&[0u8; 36], &key).unwrap();
        assert_eq!(out, DEMODISK_XOR_KEY);
    }

    #[test]
    fn test_schedule_restarts_each_segment() {
        let key = CipherKey::demodisk();
        let out = transform(&vec![0u8; 1024], &key).unwrap();

        // 512 is not a multiple of 36, so the restart is visible
        assert_eq!(out[512..548], DEMODISK_XOR_KEY);
        assert_eq!(out[..512], out[512..]);
    }

    #[test]
    fn test_repeating_key_does_not_restart() {
        let key = CipherKey::repeating(vec![1, 2, 3]);
        let out = transform(&[0u8; 7], &key).unwrap();
        assert_eq!(out, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_split_at_origin_matches_whole() {
        let key = CipherKey::demodisk();
        let data: Vec<u8> = (0..3000).map(|i| (i % 251) as u8).collect();
        let whole = transform(&data, &key).unwrap();

        let mut pieces = transform_at(&data[..1234], &key, 0).unwrap();
        pieces.extend(transform_at(&data[1234..], &key, 1234).unwrap());
        assert_eq!(pieces, whole);
    }

    #[test]
    fn test_empty_key_is_config_error() {
        let key = CipherKey::repeating(Vec::new());
        let result = transform(b"abc", &key);
        assert!(matches!(result, Err(DemodiskError::Config(_))));
    }

    #[test]
    fn test_zero_segment_is_config_error() {
        let key = CipherKey::new(vec![1], Some(0));
        assert!(matches!(transform(b"abc", &key), Err(DemodiskError::Config(_))));
    }

    #[test]
    fn test_input_untouched() {
        let key = CipherKey::demodisk();
        let data = vec![0xAAu8; 10];
        let _ = transform(&data, &key).unwrap();
        assert_eq!(data, vec![0xAA; 10]);
    }
}
