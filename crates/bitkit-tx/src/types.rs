//! Transaction entity types and wire serialization.
//!
//! Entities are created fresh per build and mutated only while the
//! builder assembles them. The input's link back to the spent output is
//! the outpoint (previous transaction hash + output index), a key into
//! the external UTXO store rather than an owning reference.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use bitkit_types::ScriptType;

/// Lifecycle status of a transaction record. Assembly only ever
/// produces `New`; later states belong to the broadcast layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    New,
    Relayed,
    Invalid,
}

/// Input sequence with no relative locktime semantics.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

#[derive(Debug, Clone)]
pub struct Transaction {
    pub version: i32,
    pub lock_time: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub status: TransactionStatus,
    pub is_mine: bool,
    /// Double-SHA256 of the serialized form, set when the build finalizes.
    pub hash: Vec<u8>,
    pub reversed_hash_hex: String,
}

impl Transaction {
    pub fn new(version: i32, lock_time: u32) -> Self {
        Self {
            version,
            lock_time,
            inputs: Vec::new(),
            outputs: Vec::new(),
            status: TransactionStatus::New,
            is_mine: false,
            hash: Vec::new(),
            reversed_hash_hex: String::new(),
        }
    }

    /// Serialize in the legacy wire format (no witness data).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(10 + self.inputs.len() * 150 + self.outputs.len() * 40);
        buf.extend_from_slice(&self.version.to_le_bytes());

        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(&input.previous_output_hash);
            buf.extend_from_slice(&input.previous_output_index.to_le_bytes());
            write_varint(&mut buf, input.sig_script.len() as u64);
            buf.extend_from_slice(&input.sig_script);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_varint(&mut buf, output.locking_script.len() as u64);
            buf.extend_from_slice(&output.locking_script);
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// Transaction id: double SHA-256 over the serialized form.
    pub fn compute_hash(&self) -> Vec<u8> {
        Sha256::digest(Sha256::digest(self.serialize())).to_vec()
    }
}

#[derive(Debug, Clone)]
pub struct TransactionInput {
    /// Hash of the transaction that created the spent output. Together
    /// with `previous_output_index` this is the outpoint key into the
    /// UTXO store.
    pub previous_output_hash: Vec<u8>,
    pub previous_output_hash_reversed_hex: String,
    pub previous_output_index: u32,
    /// Unlocking script, empty until signing.
    pub sig_script: Vec<u8>,
    pub sequence: u32,
}

#[derive(Debug, Clone)]
pub struct TransactionOutput {
    /// Value in base currency units.
    pub value: u64,
    /// Position of this output within its transaction.
    pub index: u32,
    pub locking_script: Vec<u8>,
    pub script_type: ScriptType,
    pub address: String,
    pub key_hash: Vec<u8>,
    /// Set only on change outputs, for ownership tracking and later
    /// signing bookkeeping.
    pub public_key: Option<PublicKey>,
}

/// Wallet-owned public key material; only the hash is needed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub key_hash: Vec<u8>,
}

/// A spendable output previously received by the wallet.
#[derive(Debug, Clone)]
pub struct UnspentOutput {
    pub output: TransactionOutput,
    /// Hash of the owning transaction; `None` marks a store-integrity
    /// fault and aborts any build that selects this output.
    pub transaction_hash: Option<Vec<u8>>,
}

impl UnspentOutput {
    pub fn value(&self) -> u64 {
        self.output.value
    }
}

/// Render a transaction hash in the conventional reversed-hex form.
pub fn reversed_hex(hash: &[u8]) -> String {
    let reversed: Vec<u8> = hash.iter().rev().copied().collect();
    hex::encode(reversed)
}

/// Write a Bitcoin-style variable-length integer.
pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}
