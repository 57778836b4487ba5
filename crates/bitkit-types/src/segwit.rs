//! SegWit witness-program address codec (BIP-173/BIP-350).
//!
//! The bech32 crate supplies the checksummed base32 layer; this module
//! handles witness-version mapping, program extraction, and the 5/8-bit
//! regrouping on top of it.

use bech32::{self, u5, Variant};

use crate::address::{Address, AddressCodec, AddressError};
use crate::bits::convert_bits;
use crate::constants::ScriptType;

pub struct SegwitCodec;

impl AddressCodec for SegwitCodec {
    fn decode(&self, hrp: &str, string: &str) -> Result<Address, AddressError> {
        let (decoded_hrp, payload, variant) = bech32::decode(string)?;
        if decoded_hrp != hrp {
            return Err(AddressError::HrpMismatch {
                expected: hrp.to_string(),
                got: decoded_hrp,
            });
        }

        let (version_group, program_groups) =
            payload.split_first().ok_or(AddressError::EmptyPayload)?;
        let version = version_group.to_u8();
        if version > 16 {
            return Err(AddressError::InvalidWitnessVersion(version));
        }
        match (version, variant) {
            (0, Variant::Bech32) | (1..=16, Variant::Bech32m) => {}
            _ => return Err(AddressError::ChecksumVariantMismatch(version)),
        }

        let groups: Vec<u8> = program_groups.iter().map(|group| group.to_u8()).collect();
        let program = convert_bits(&groups, 5, 8, false)?;
        if version == 0 && program.len() != 20 && program.len() != 32 {
            return Err(AddressError::InvalidProgramLength(program.len()));
        }

        // Re-encode for the canonical (lowercase) string form.
        let string = bech32::encode(hrp, &payload, variant)?;
        Ok(Address::Segwit {
            string,
            program,
            version,
        })
    }

    fn encode(
        &self,
        hrp: &str,
        script: &[u8],
        script_type: ScriptType,
    ) -> Result<Address, AddressError> {
        if script_type != ScriptType::P2wpkh && script_type != ScriptType::P2wsh {
            return Err(AddressError::InvalidScriptType(script_type));
        }

        let (version, program) = parse_witness_script(script)?;
        if version == 0 {
            let derived = match program.len() {
                20 => ScriptType::P2wpkh,
                32 => ScriptType::P2wsh,
                len => return Err(AddressError::InvalidProgramLength(len)),
            };
            if derived != script_type {
                return Err(AddressError::InvalidScriptType(script_type));
            }
        }

        let mut payload = vec![u5::try_from_u8(version)?];
        for group in convert_bits(program, 8, 5, true)? {
            payload.push(u5::try_from_u8(group)?);
        }
        let variant = if version == 0 {
            Variant::Bech32
        } else {
            Variant::Bech32m
        };
        let string = bech32::encode(hrp, &payload, variant)?;
        Ok(Address::Segwit {
            string,
            program: program.to_vec(),
            version,
        })
    }
}

/// Read the witness version opcode and the program push from a locking
/// script. OP_0 maps to version 0, OP_1 through OP_16 to versions 1-16.
fn parse_witness_script(script: &[u8]) -> Result<(u8, &[u8]), AddressError> {
    let (&opcode, rest) = script
        .split_first()
        .ok_or(AddressError::MissingWitnessProgram)?;
    let version = match opcode {
        0x00 => 0,
        0x51..=0x60 => opcode - 0x50,
        other => return Err(AddressError::InvalidWitnessVersion(other)),
    };

    let (&push_len, data) = rest
        .split_first()
        .ok_or(AddressError::MissingWitnessProgram)?;
    let push_len = push_len as usize;
    if push_len == 0 || push_len > 0x4b || data.len() < push_len {
        return Err(AddressError::MissingWitnessProgram);
    }
    Ok((version, &data[..push_len]))
}
