//! Address model, error type, and the codec dispatch layer.
//!
//! An [`Address`] is a tagged union over the formats the wallet can
//! target. The string form and the raw hash/program bytes are always
//! mutually derivable. [`AddressConverter`] picks the codec for a
//! network and is the only entry point the transaction layer uses.

use thiserror::Error;

use crate::bits::BitConversionError;
use crate::cashaddr::CashAddrCodec;
use crate::cashbech32::CashBech32Error;
use crate::constants::{AddressScheme, AddressType, Network, ScriptType};
use crate::segwit::SegwitCodec;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("expected prefix {expected:?}, got {got:?}")]
    HrpMismatch { expected: String, got: String },

    #[error("empty address payload")]
    EmptyPayload,

    #[error("payload leaves {0} slack bits, more than one nibble")]
    ExcessPadding(usize),

    #[error("version byte 0x{0:02x} has the reserved bit set")]
    ReservedVersionBit(u8),

    #[error("unknown address type bits {0}")]
    UnknownAddressType(u8),

    #[error("payload carries {got} hash bytes, version byte declares {expected}")]
    HashLengthMismatch { expected: usize, got: usize },

    #[error("no version byte encoding for a {0}-byte hash")]
    InvalidAddressLength(usize),

    #[error("script type {0:?} cannot be encoded by this codec")]
    InvalidScriptType(ScriptType),

    #[error("invalid witness version 0x{0:02x}")]
    InvalidWitnessVersion(u8),

    #[error("witness program missing from locking script")]
    MissingWitnessProgram,

    #[error("witness program is {0} bytes, version 0 requires 20 or 32")]
    InvalidProgramLength(usize),

    #[error("checksum variant does not match witness version {0}")]
    ChecksumVariantMismatch(u8),

    #[error("legacy base58 addresses are handled by a separate converter")]
    UnsupportedLegacy,

    #[error("bech32 error: {0}")]
    Bech32(#[from] bech32::Error),

    #[error("cashaddr error: {0}")]
    CashBech32(#[from] CashBech32Error),

    #[error("bit conversion error: {0}")]
    Bits(#[from] BitConversionError),
}

/// A parsed or constructed wallet address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Base58Check address. Carried for completeness; encoding and
    /// decoding live in a sibling converter outside this crate.
    Legacy {
        string: String,
        hash: Vec<u8>,
        address_type: AddressType,
    },
    /// Bech32/Bech32m witness-program address.
    Segwit {
        string: String,
        program: Vec<u8>,
        version: u8,
    },
    /// CashAddr version-byte address.
    CashAddr {
        string: String,
        hash: Vec<u8>,
        address_type: AddressType,
    },
}

impl Address {
    /// Canonical string representation.
    pub fn string(&self) -> &str {
        match self {
            Address::Legacy { string, .. }
            | Address::Segwit { string, .. }
            | Address::CashAddr { string, .. } => string,
        }
    }

    /// Raw hash or witness program bytes.
    pub fn hash(&self) -> &[u8] {
        match self {
            Address::Legacy { hash, .. } | Address::CashAddr { hash, .. } => hash,
            Address::Segwit { program, .. } => program,
        }
    }

    pub fn address_type(&self) -> AddressType {
        match self {
            Address::Legacy { address_type, .. } | Address::CashAddr { address_type, .. } => {
                *address_type
            }
            Address::Segwit { .. } => AddressType::Witness,
        }
    }

    /// Script type of the locking script this address stands for.
    pub fn script_type(&self) -> ScriptType {
        match self {
            Address::Legacy { address_type, .. } | Address::CashAddr { address_type, .. } => {
                match address_type {
                    AddressType::P2pkh => ScriptType::P2pkh,
                    AddressType::P2sh => ScriptType::P2sh,
                    AddressType::Witness => ScriptType::Unknown,
                }
            }
            Address::Segwit {
                version, program, ..
            } => match (version, program.len()) {
                (0, 20) => ScriptType::P2wpkh,
                (0, 32) => ScriptType::P2wsh,
                _ => ScriptType::Unknown,
            },
        }
    }

    /// Witness version for SegWit addresses.
    pub fn witness_version(&self) -> Option<u8> {
        match self {
            Address::Segwit { version, .. } => Some(*version),
            _ => None,
        }
    }
}

/// Address codec capability: one implementation per address format,
/// selected by network configuration.
pub trait AddressCodec {
    /// Parse and validate an address string under the expected prefix.
    fn decode(&self, hrp: &str, string: &str) -> Result<Address, AddressError>;

    /// Encode raw bytes (a hash, or a witness locking script) as an
    /// address of the given script type.
    fn encode(&self, hrp: &str, bytes: &[u8], script_type: ScriptType)
        -> Result<Address, AddressError>;
}

/// Dispatches address conversion to the codec of a network.
#[derive(Debug, Clone, Copy)]
pub struct AddressConverter {
    network: Network,
}

impl AddressConverter {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Parse an address string.
    pub fn convert(&self, string: &str) -> Result<Address, AddressError> {
        let hrp = self.network.hrp();
        match self.network.scheme() {
            AddressScheme::Segwit => SegwitCodec.decode(hrp, string),
            AddressScheme::CashAddr => CashAddrCodec.decode(hrp, string),
        }
    }

    /// Build an address from a raw hash and the script type it should
    /// lock to.
    pub fn convert_hash(
        &self,
        hash: &[u8],
        script_type: ScriptType,
    ) -> Result<Address, AddressError> {
        let hrp = self.network.hrp();
        match self.network.scheme() {
            AddressScheme::Segwit => match script_type {
                ScriptType::P2wpkh | ScriptType::P2wsh => {
                    let script = witness_script(0, hash);
                    SegwitCodec.encode(hrp, &script, script_type)
                }
                _ => Err(AddressError::UnsupportedLegacy),
            },
            AddressScheme::CashAddr => CashAddrCodec.encode(hrp, hash, script_type),
        }
    }
}

/// Witness locking script: version opcode followed by a direct push of
/// the program.
pub fn witness_script(version: u8, program: &[u8]) -> Vec<u8> {
    let opcode = if version == 0 { 0x00 } else { 0x50 + version };
    let mut script = Vec::with_capacity(program.len() + 2);
    script.push(opcode);
    script.push(program.len() as u8);
    script.extend_from_slice(program);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_segwit_string() {
        let converter = AddressConverter::new(Network::Bitcoin);
        let address = converter
            .convert("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
            .unwrap();
        assert_eq!(address.address_type(), AddressType::Witness);
        assert_eq!(address.script_type(), ScriptType::P2wpkh);
        assert_eq!(address.witness_version(), Some(0));
    }

    #[test]
    fn test_convert_cashaddr_string() {
        let converter = AddressConverter::new(Network::BitcoinCash);
        let address = converter
            .convert("bitcoincash:qr6m7j9njldwwzlg9v7v53unlr4jkmx6eylep8ekg2")
            .unwrap();
        assert_eq!(address.address_type(), AddressType::P2pkh);
        assert_eq!(address.script_type(), ScriptType::P2pkh);
    }

    #[test]
    fn test_convert_hash_segwit() {
        let converter = AddressConverter::new(Network::Bitcoin);
        let hash = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let address = converter.convert_hash(&hash, ScriptType::P2wpkh).unwrap();
        assert_eq!(address.string(), "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(address.hash(), hash.as_slice());
    }

    #[test]
    fn test_convert_hash_cashaddr() {
        let converter = AddressConverter::new(Network::BitcoinCash);
        let hash = vec![0x11; 20];
        let address = converter.convert_hash(&hash, ScriptType::P2pkh).unwrap();
        assert_eq!(address.address_type(), AddressType::P2pkh);
        assert_eq!(address.hash(), hash.as_slice());

        let back = converter.convert(address.string()).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn test_convert_hash_legacy_unsupported() {
        let converter = AddressConverter::new(Network::Bitcoin);
        let result = converter.convert_hash(&[0x22; 20], ScriptType::P2pkh);
        assert!(matches!(result, Err(AddressError::UnsupportedLegacy)));
    }

    #[test]
    fn test_witness_script_layout() {
        let script = witness_script(0, &[0xAB; 20]);
        assert_eq!(script[0], 0x00);
        assert_eq!(script[1], 20);
        assert_eq!(&script[2..], &[0xAB; 20]);

        let script = witness_script(1, &[0xCD; 32]);
        assert_eq!(script[0], 0x51);
        assert_eq!(script[1], 32);
    }
}
