//! CashAddr version-byte address codec.
//!
//! A CashAddr payload is one version byte followed by the hash. The
//! version byte packs the address type into bits 3-7 and the hash size
//! into bits 0-2 (sizes 20/24/28/32 bytes, doubled when bit 2 is set).

use crate::address::{Address, AddressCodec, AddressError};
use crate::bits::convert_bits;
use crate::cashbech32;
use crate::constants::{AddressType, ScriptType};

pub struct CashAddrCodec;

impl AddressCodec for CashAddrCodec {
    fn decode(&self, hrp: &str, string: &str) -> Result<Address, AddressError> {
        let has_lower = string.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = string.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(cashbech32::CashBech32Error::MixedCase.into());
        }
        let string = string.to_ascii_lowercase();

        // Bare payloads are read under the expected prefix.
        let prefixed = if string.contains(':') {
            string
        } else {
            format!("{}:{}", hrp, string)
        };

        let (prefix, payload) = cashbech32::decode(&prefixed)?;
        if prefix != hrp {
            return Err(AddressError::HrpMismatch {
                expected: hrp.to_string(),
                got: prefix,
            });
        }
        if payload.is_empty() {
            return Err(AddressError::EmptyPayload);
        }

        let extra_bits = payload.len() * 5 % 8;
        if extra_bits >= 5 {
            return Err(AddressError::ExcessPadding(extra_bits));
        }
        let data = convert_bits(&payload, 5, 8, false)?;

        let version = data[0];
        if version & 0x80 != 0 {
            return Err(AddressError::ReservedVersionBit(version));
        }
        let address_type = match (version >> 3) & 0x1f {
            0 => AddressType::P2pkh,
            1 => AddressType::P2sh,
            bits => return Err(AddressError::UnknownAddressType(bits)),
        };

        let mut hash_size = 20 + 4 * usize::from(version & 0x03);
        if version & 0x04 != 0 {
            hash_size *= 2;
        }
        if data.len() != hash_size + 1 {
            return Err(AddressError::HashLengthMismatch {
                expected: hash_size,
                got: data.len() - 1,
            });
        }

        Ok(Address::CashAddr {
            string: cashbech32::encode(hrp, &payload),
            hash: data[1..].to_vec(),
            address_type,
        })
    }

    fn encode(
        &self,
        hrp: &str,
        hash: &[u8],
        script_type: ScriptType,
    ) -> Result<Address, AddressError> {
        let (address_type, type_bits) = match script_type {
            ScriptType::P2pkh | ScriptType::P2pk => (AddressType::P2pkh, 0u8),
            ScriptType::P2sh => (AddressType::P2sh, 1u8),
            other => return Err(AddressError::InvalidScriptType(other)),
        };

        let encoded_size: u8 = match hash.len() * 8 {
            160 => 0,
            192 => 1,
            224 => 2,
            256 => 3,
            320 => 4,
            384 => 5,
            448 => 6,
            512 => 7,
            _ => return Err(AddressError::InvalidAddressLength(hash.len())),
        };

        let version = (type_bits << 3) | encoded_size;
        let mut data = Vec::with_capacity(hash.len() + 1);
        data.push(version);
        data.extend_from_slice(hash);

        let payload = convert_bits(&data, 8, 5, true)?;
        debug_assert_eq!(payload.len(), (data.len() * 8 + 4) / 5);

        Ok(Address::CashAddr {
            string: cashbech32::encode(hrp, &payload),
            hash: hash.to_vec(),
            address_type,
        })
    }
}
