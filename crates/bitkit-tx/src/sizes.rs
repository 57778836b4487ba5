//! Structural size accounting for fee math.

use bitkit_types::ScriptType;

/// Estimates the serialized byte cost of transaction pieces.
pub trait TransactionSizeCalculator {
    /// Serialized size of one output locking to `script_type`,
    /// including the value field and the script length prefix.
    fn output_size(&self, script_type: ScriptType) -> usize;
}

/// Standard sizes for the common script templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSizeCalculator;

impl TransactionSizeCalculator for StandardSizeCalculator {
    fn output_size(&self, script_type: ScriptType) -> usize {
        // value(8) + script length varint(1) + script.
        match script_type {
            // OP_DUP OP_HASH160 push(20) OP_EQUALVERIFY OP_CHECKSIG = 25.
            ScriptType::P2pkh => 34,
            // push(33) OP_CHECKSIG = 35.
            ScriptType::P2pk => 44,
            // OP_HASH160 push(20) OP_EQUAL = 23.
            ScriptType::P2sh => 32,
            // OP_0 push(20) = 22.
            ScriptType::P2wpkh => 31,
            // OP_0 push(32) = 34.
            ScriptType::P2wsh => 43,
            // Fall back to the P2PKH cost.
            ScriptType::Unknown => 34,
        }
    }
}
