//! CashAddr base32 encoding with the 40-bit polymod checksum.
//!
//! Uses the same 32-character alphabet as Bech32 but a different
//! checksum: 8 characters produced by a 5-generator polymod over the
//! expanded prefix and payload. The two schemes are not compatible.
//!
//! Reference: bitcoincashorg/bitcoincash.org spec/cashaddr.md

use thiserror::Error;

/// Base32 alphabet shared with Bech32.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Checksum length in 5-bit groups (40 bits).
const CHECKSUM_LEN: usize = 8;

/// Polymod generator polynomials.
const GENERATORS: [u64; 5] = [
    0x98f2bc8e61,
    0x79b76d99e2,
    0xf33e5fb3c4,
    0xae2eabe2a8,
    0x1e4f43e470,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CashBech32Error {
    #[error("invalid character '{0}' at position {1}")]
    InvalidCharacter(char, usize),

    #[error("mixed-case string")]
    MixedCase,

    #[error("missing prefix separator")]
    MissingSeparator,

    #[error("payload too short ({0} groups, checksum alone is 8)")]
    TooShort(usize),

    #[error("checksum mismatch")]
    ChecksumMismatch,
}

/// Build the reverse alphabet lookup table at compile time.
const fn build_reverse_charset() -> [i8; 128] {
    let mut table = [-1i8; 128];
    let mut i = 0;
    while i < 32 {
        table[CHARSET[i] as usize] = i as i8;
        i += 1;
    }
    table
}

static REVERSE_CHARSET: [i8; 128] = build_reverse_charset();

/// Expand the prefix for checksum input: the low 5 bits of each
/// character followed by a zero separator.
fn expand_prefix(prefix: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + 1);
    for byte in prefix.bytes() {
        out.push(byte & 0x1f);
    }
    out.push(0);
    out
}

/// CashAddr polymod over a sequence of 5-bit values.
fn polymod(values: &[u8]) -> u64 {
    let mut c: u64 = 1;
    for &d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if c0 & (1 << i) != 0 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

/// Encode a 5-bit payload under `prefix`, appending the checksum.
///
/// Payload values must already be valid 5-bit groups (< 32).
pub fn encode(prefix: &str, payload: &[u8]) -> String {
    let mut checksum_input = expand_prefix(prefix);
    checksum_input.extend_from_slice(payload);
    checksum_input.extend_from_slice(&[0u8; CHECKSUM_LEN]);
    let checksum = polymod(&checksum_input);

    let mut out = String::with_capacity(prefix.len() + 1 + payload.len() + CHECKSUM_LEN);
    out.push_str(prefix);
    out.push(':');
    for &value in payload {
        out.push(CHARSET[value as usize] as char);
    }
    for i in 0..CHECKSUM_LEN {
        let group = ((checksum >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f) as usize;
        out.push(CHARSET[group] as char);
    }
    out
}

/// Decode a `prefix:payload` string, verifying the checksum.
///
/// Returns the lowercased prefix and the 5-bit payload with the
/// checksum groups removed.
pub fn decode(s: &str) -> Result<(String, Vec<u8>), CashBech32Error> {
    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(CashBech32Error::MixedCase);
    }
    let s = s.to_ascii_lowercase();

    let (prefix, data) = s
        .split_once(':')
        .ok_or(CashBech32Error::MissingSeparator)?;

    let mut values = Vec::with_capacity(data.len());
    for (i, ch) in data.chars().enumerate() {
        let index = if (ch as u32) < 128 {
            REVERSE_CHARSET[ch as usize]
        } else {
            -1
        };
        if index < 0 {
            return Err(CashBech32Error::InvalidCharacter(ch, i));
        }
        values.push(index as u8);
    }

    if values.len() <= CHECKSUM_LEN {
        return Err(CashBech32Error::TooShort(values.len()));
    }

    let mut checksum_input = expand_prefix(prefix);
    checksum_input.extend_from_slice(&values);
    if polymod(&checksum_input) != 0 {
        return Err(CashBech32Error::ChecksumMismatch);
    }

    values.truncate(values.len() - CHECKSUM_LEN);
    Ok((prefix.to_string(), values))
}
