//! Base-62 codec for store-assigned sequential identifiers.
//!
//! The alphabet is ordered digits first, then uppercase, then lowercase, so
//! `encode` of increasing ids yields keys that sort the same way within a
//! fixed length.

use crate::error::CoreError;

/// The 62 symbols in numeral order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = 62;
const INVALID: u8 = u8::MAX;

// 62^11 > u64::MAX, so eleven symbols hold any id.
const MAX_ENCODED_LEN: usize = 11;

const REVERSE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encodes `id` most-significant symbol first, without leading zeros.
///
/// ```
/// use snip_core::base62;
///
/// assert_eq!(base62::encode(0), "0");
/// assert_eq!(base62::encode(61), "z");
/// assert_eq!(base62::encode(62), "10");
/// ```
pub fn encode(mut id: u64) -> String {
    if id == 0 {
        return "0".to_string();
    }

    let mut buf = [0u8; MAX_ENCODED_LEN];
    let mut pos = buf.len();
    while id > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(id % BASE) as usize];
        id /= BASE;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decodes a base-62 key back into its identifier.
///
/// Fails with [`CoreError::InvalidKey`] on empty input, on any symbol outside
/// [`ALPHABET`], and when the value does not fit in a `u64`.
pub fn decode(key: &str) -> Result<u64, CoreError> {
    if key.is_empty() {
        return Err(CoreError::InvalidKey("key is empty".to_string()));
    }

    key.bytes().try_fold(0u64, |acc, byte| {
        let digit = digit_of(byte).ok_or_else(|| {
            CoreError::InvalidKey(format!(
                "invalid character {:?} in key '{}'",
                byte as char, key
            ))
        })?;

        acc.checked_mul(BASE)
            .and_then(|acc| acc.checked_add(u64::from(digit)))
            .ok_or_else(|| CoreError::InvalidKey(format!("key '{}' overflows 64 bits", key)))
    })
}

/// Returns whether `byte` is one of the 62 symbols.
pub fn is_symbol(byte: u8) -> bool {
    digit_of(byte).is_some()
}

fn digit_of(byte: u8) -> Option<u8> {
    match REVERSE[byte as usize] {
        INVALID => None,
        digit => Some(digit),
    }
}
