//! Transaction assembly for the bitkit wallet core.
//!
//! Provides the transaction entity types, the collaborator interfaces
//! (unspent-output selection, input signing, script building, size
//! accounting) and the [`TransactionBuilder`] that turns a spend request
//! into a fully signed transaction. Selection heuristics and signature
//! computation live behind the interfaces; this crate only orchestrates.

pub mod types;
pub mod select;
pub mod sign;
pub mod sizes;
pub mod builder;

pub use builder::TransactionBuilder;
pub use select::{SelectedOutputsInfo, UnspentOutputProvider, UnspentOutputSelector};
pub use sign::{InputSigner, ScriptBuilder, SigScriptData};
pub use sizes::{StandardSizeCalculator, TransactionSizeCalculator};
pub use types::{
    PublicKey, Transaction, TransactionInput, TransactionOutput, TransactionStatus, UnspentOutput,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("address error: {0}")]
    Address(#[from] bitkit_types::AddressError),

    #[error("unspent output {0} has no previous transaction record")]
    NoPreviousTransaction(String),

    #[error("fee {fee} would consume the sent value {value}")]
    FeeMoreThanValue { fee: u64, value: u64 },

    #[error("unspent output selection failed: {0}")]
    Selection(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("script building failed: {0}")]
    Script(String),
}
