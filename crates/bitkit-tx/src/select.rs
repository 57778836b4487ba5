//! Unspent-output selection interfaces.
//!
//! Selection heuristics are an external concern; the builder consumes a
//! finished selection and trusts its aggregates.

use bitkit_types::ScriptType;

use crate::types::UnspentOutput;
use crate::TxError;

/// Result of an unspent-output selection.
#[derive(Debug, Clone)]
pub struct SelectedOutputsInfo {
    /// Selected outputs, in the order they become transaction inputs.
    pub outputs: Vec<UnspentOutput>,
    /// Estimated fee for spending the selection.
    pub fee: u64,
    /// Sum of the selected outputs' values.
    pub total_value: u64,
}

/// Supplies the wallet's current spendable outputs.
///
/// If the provider is shared across concurrent builds it is responsible
/// for serializing access; the builder takes no locks.
pub trait UnspentOutputProvider {
    fn all_unspent_outputs(&self) -> Vec<UnspentOutput>;
}

/// Chooses outputs covering `value` plus fees at `fee_rate`.
///
/// A valid selection satisfies `total_value >= value + fee`; that is
/// the selector's contract and is not re-checked by the builder.
pub trait UnspentOutputSelector {
    fn select(
        &self,
        value: u64,
        fee_rate: u64,
        output_script_type: ScriptType,
        sender_pay: bool,
        unspent_outputs: Vec<UnspentOutput>,
    ) -> Result<SelectedOutputsInfo, TxError>;
}
