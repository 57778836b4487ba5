//! Signing and script-building interfaces.
//!
//! Signature computation and script templates are external concerns.
//! The builder hands the in-progress transaction to the signer one
//! input at a time and splices the returned script back in.

use bitkit_types::Address;

use crate::types::Transaction;
use crate::TxError;

/// Ordered script chunks produced by a signer for one input, typically
/// a signature followed by a public key.
#[derive(Debug, Clone, Default)]
pub struct SigScriptData {
    pub chunks: Vec<Vec<u8>>,
}

/// Produces the unlocking-script data for one input of an in-progress
/// transaction. The signer derives the previous-output script and value
/// context on its own from the outpoint.
pub trait InputSigner {
    fn sig_script_data(
        &self,
        transaction: &Transaction,
        input_index: usize,
    ) -> Result<SigScriptData, TxError>;
}

/// Builds locking and unlocking scripts.
pub trait ScriptBuilder {
    fn locking_script(&self, address: &Address) -> Result<Vec<u8>, TxError>;
    fn unlocking_script(&self, data: &SigScriptData) -> Vec<u8>;
}
