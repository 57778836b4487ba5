//! Core types for the bitkit wallet transaction layer.
//!
//! Provides the foundational pieces shared across the bitkit crates:
//! network and script-type definitions, the bit-group conversion
//! primitive, and the Bech32-family address codecs (SegWit witness
//! programs and CashAddr version-byte addresses).

pub mod constants;
pub mod bits;
pub mod cashbech32;
pub mod segwit;
pub mod cashaddr;
pub mod address;

pub use address::{Address, AddressCodec, AddressConverter, AddressError};
pub use cashaddr::CashAddrCodec;
pub use constants::{AddressScheme, AddressType, Network, ScriptType};
pub use segwit::SegwitCodec;
