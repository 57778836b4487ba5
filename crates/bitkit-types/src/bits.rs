//! Bit-group conversion between 5-bit and 8-bit encodings.
//!
//! Both address codecs are built on one regrouping routine: addresses
//! encode with `convert_bits(data, 8, 5, true)` and decode with
//! `convert_bits(payload, 5, 8, false)`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitConversionError {
    #[error("value {value} does not fit in {width} bits")]
    ValueOutOfRange { value: u32, width: u32 },

    #[error("invalid padding in bit stream")]
    InvalidPadding,
}

/// Regroup a stream of `from_bits`-wide values into `to_bits`-wide
/// values, most significant bit first.
///
/// With `pad` set, any leftover bits are left-shifted to fill one final
/// group. Without it (the strict decode direction), leftover bits must
/// total fewer than `from_bits` and must all be zero.
pub fn convert_bits(
    input: &[u8],
    from_bits: u32,
    to_bits: u32,
    pad: bool,
) -> Result<Vec<u8>, BitConversionError> {
    let max_value: u32 = (1 << to_bits) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut output =
        Vec::with_capacity((input.len() * from_bits as usize).div_ceil(to_bits as usize));

    for &value in input {
        if u32::from(value) >> from_bits != 0 {
            return Err(BitConversionError::ValueOutOfRange {
                value: value.into(),
                width: from_bits,
            });
        }
        acc = (acc << from_bits) | u32::from(value);
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            output.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            output.push(((acc << (to_bits - bits)) & max_value) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & max_value) != 0 {
        return Err(BitConversionError::InvalidPadding);
    }

    Ok(output)
}
