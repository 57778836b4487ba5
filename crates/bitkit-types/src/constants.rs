//! Network, script-type, and address-type definitions.

use serde::{Deserialize, Serialize};

/// Network type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Bitcoin,
    BitcoinTestnet,
    BitcoinCash,
    BitcoinCashTestnet,
}

/// Address encoding scheme used on a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressScheme {
    /// Bech32/Bech32m witness-program addresses (bc1..., tb1...).
    Segwit,
    /// CashAddr version-byte addresses (bitcoincash:..., bchtest:...).
    CashAddr,
}

impl Network {
    /// Human-readable address prefix for this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Bitcoin => "bc",
            Network::BitcoinTestnet => "tb",
            Network::BitcoinCash => "bitcoincash",
            Network::BitcoinCashTestnet => "bchtest",
        }
    }

    /// Address encoding scheme used on this network.
    pub fn scheme(&self) -> AddressScheme {
        match self {
            Network::Bitcoin | Network::BitcoinTestnet => AddressScheme::Segwit,
            Network::BitcoinCash | Network::BitcoinCashTestnet => AddressScheme::CashAddr,
        }
    }

    /// Look up the network carrying the given address prefix.
    pub fn from_hrp(hrp: &str) -> Option<Network> {
        [
            Network::Bitcoin,
            Network::BitcoinTestnet,
            Network::BitcoinCash,
            Network::BitcoinCashTestnet,
        ]
        .into_iter()
        .find(|network| network.hrp() == hrp)
    }
}

/// Script type of a locking script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    P2pkh,
    P2pk,
    P2sh,
    P2wpkh,
    P2wsh,
    Unknown,
}

/// High-level address type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    P2pkh,
    P2sh,
    Witness,
}
