//! Transaction builder.
//!
//! Orchestrates unspent-output selection, output construction, the
//! change-output decision, and input signing into a finished
//! transaction. A build either returns a fully signed transaction or a
//! typed error; partial transactions are never handed out.

use log::debug;

use bitkit_types::{AddressConverter, ScriptType};

use crate::select::{UnspentOutputProvider, UnspentOutputSelector};
use crate::sign::{InputSigner, ScriptBuilder};
use crate::sizes::TransactionSizeCalculator;
use crate::types::{
    reversed_hex, PublicKey, Transaction, TransactionInput, TransactionOutput, TransactionStatus,
    SEQUENCE_FINAL,
};
use crate::TxError;

pub struct TransactionBuilder<'a> {
    converter: AddressConverter,
    selector: &'a dyn UnspentOutputSelector,
    provider: &'a dyn UnspentOutputProvider,
    signer: &'a dyn InputSigner,
    scripts: &'a dyn ScriptBuilder,
    sizes: &'a dyn TransactionSizeCalculator,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(
        converter: AddressConverter,
        selector: &'a dyn UnspentOutputSelector,
        provider: &'a dyn UnspentOutputProvider,
        signer: &'a dyn InputSigner,
        scripts: &'a dyn ScriptBuilder,
        sizes: &'a dyn TransactionSizeCalculator,
    ) -> Self {
        Self {
            converter,
            selector,
            provider,
            signer,
            scripts,
            sizes,
        }
    }

    /// Quote the fee for sending `value` at `fee_rate`.
    ///
    /// With `sender_pay`, the quote includes the byte cost of a change
    /// output whenever the selection leaves room for one; a selection
    /// with no room for change is quoted at the selector's raw fee. The
    /// change output is assumed to be P2PKH since the caller has not
    /// committed to a change script type yet.
    pub fn fee(
        &self,
        value: u64,
        fee_rate: u64,
        sender_pay: bool,
        address: Option<&str>,
    ) -> Result<u64, TxError> {
        let output_type = match address {
            Some(string) => self.converter.convert(string)?.script_type(),
            None => ScriptType::P2pkh,
        };
        let selection = self.selector.select(
            value,
            fee_rate,
            output_type,
            sender_pay,
            self.provider.all_unspent_outputs(),
        )?;

        let fee_with_change = if sender_pay {
            selection.fee + self.change_output_fee(ScriptType::P2pkh, fee_rate)
        } else {
            0
        };
        if selection.total_value > value + fee_with_change {
            Ok(fee_with_change)
        } else {
            Ok(selection.fee)
        }
    }

    /// Assemble and sign a transaction sending `value` to `to_address`.
    ///
    /// With `sender_pay` the fee is added on top of `value`; otherwise
    /// it is deducted from the amount the recipient receives. Leftover
    /// input value goes to a change output derived from
    /// `change_pub_key`, unless it is too small to pay for the change
    /// output's own bytes, in which case it is absorbed into the fee.
    pub fn build_transaction(
        &self,
        value: u64,
        to_address: &str,
        fee_rate: u64,
        sender_pay: bool,
        change_pub_key: &PublicKey,
        change_script_type: ScriptType,
    ) -> Result<Transaction, TxError> {
        let address = self.converter.convert(to_address)?;
        let selection = self.selector.select(
            value,
            fee_rate,
            address.script_type(),
            sender_pay,
            self.provider.all_unspent_outputs(),
        )?;
        debug!(
            "selected {} outputs totaling {} (fee {})",
            selection.outputs.len(),
            selection.total_value,
            selection.fee
        );

        let mut transaction = Transaction::new(1, 0);

        for utxo in &selection.outputs {
            let hash = utxo
                .transaction_hash
                .clone()
                .ok_or_else(|| TxError::NoPreviousTransaction(utxo.output.address.clone()))?;
            transaction.inputs.push(TransactionInput {
                previous_output_hash_reversed_hex: reversed_hex(&hash),
                previous_output_hash: hash,
                previous_output_index: utxo.output.index,
                sig_script: Vec::new(),
                sequence: SEQUENCE_FINAL,
            });
        }

        transaction.outputs.push(TransactionOutput {
            value: 0,
            index: 0,
            locking_script: self.scripts.locking_script(&address)?,
            script_type: address.script_type(),
            address: address.string().to_string(),
            key_hash: address.hash().to_vec(),
            public_key: None,
        });

        // A receiver-pays fee may not consume the whole sent value.
        if !sender_pay && selection.fee >= value {
            return Err(TxError::FeeMoreThanValue {
                fee: selection.fee,
                value,
            });
        }

        let received_value = if sender_pay {
            value
        } else {
            value - selection.fee
        };
        let sent_value = if sender_pay {
            value + selection.fee
        } else {
            value
        };
        transaction.outputs[0].value = received_value;

        let change_fee = self.change_output_fee(change_script_type, fee_rate);
        if selection.total_value > sent_value + change_fee {
            let change_address = self
                .converter
                .convert_hash(&change_pub_key.key_hash, change_script_type)?;
            let change_value = selection.total_value - sent_value - change_fee;
            debug!(
                "change output of {} to {}",
                change_value,
                change_address.string()
            );
            transaction.outputs.push(TransactionOutput {
                value: change_value,
                index: 1,
                locking_script: self.scripts.locking_script(&change_address)?,
                script_type: change_script_type,
                address: change_address.string().to_string(),
                key_hash: change_address.hash().to_vec(),
                public_key: Some(change_pub_key.clone()),
            });
        } else {
            debug!(
                "leftover {} below change-output cost {}, absorbed into fee",
                selection.total_value - sent_value,
                change_fee
            );
        }

        for index in 0..transaction.inputs.len() {
            let data = self.signer.sig_script_data(&transaction, index)?;
            transaction.inputs[index].sig_script = self.scripts.unlocking_script(&data);
        }

        transaction.status = TransactionStatus::New;
        transaction.is_mine = true;
        transaction.hash = transaction.compute_hash();
        transaction.reversed_hash_hex = reversed_hex(&transaction.hash);
        Ok(transaction)
    }

    /// Byte cost of adding a change output of `script_type` at
    /// `fee_rate`. Both the fee quote and the build use this.
    fn change_output_fee(&self, script_type: ScriptType, fee_rate: u64) -> u64 {
        self.sizes.output_size(script_type) as u64 * fee_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use bitkit_types::{Address, Network};

    use crate::select::SelectedOutputsInfo;
    use crate::sign::SigScriptData;
    use crate::sizes::StandardSizeCalculator;
    use crate::types::UnspentOutput;

    struct MockSelector {
        fee: u64,
        last_script_type: RefCell<Option<ScriptType>>,
    }

    impl MockSelector {
        fn new(fee: u64) -> Self {
            Self {
                fee,
                last_script_type: RefCell::new(None),
            }
        }
    }

    impl UnspentOutputSelector for MockSelector {
        fn select(
            &self,
            _value: u64,
            _fee_rate: u64,
            output_script_type: ScriptType,
            _sender_pay: bool,
            unspent_outputs: Vec<UnspentOutput>,
        ) -> Result<SelectedOutputsInfo, TxError> {
            *self.last_script_type.borrow_mut() = Some(output_script_type);
            let total_value = unspent_outputs.iter().map(|utxo| utxo.value()).sum();
            Ok(SelectedOutputsInfo {
                outputs: unspent_outputs,
                fee: self.fee,
                total_value,
            })
        }
    }

    struct MockProvider {
        utxos: Vec<UnspentOutput>,
    }

    impl UnspentOutputProvider for MockProvider {
        fn all_unspent_outputs(&self) -> Vec<UnspentOutput> {
            self.utxos.clone()
        }
    }

    struct MockSigner;

    impl InputSigner for MockSigner {
        fn sig_script_data(
            &self,
            _transaction: &Transaction,
            _input_index: usize,
        ) -> Result<SigScriptData, TxError> {
            Ok(SigScriptData {
                chunks: vec![vec![0x30; 71], vec![0x02; 33]],
            })
        }
    }

    struct MockScriptBuilder;

    impl ScriptBuilder for MockScriptBuilder {
        fn locking_script(&self, address: &Address) -> Result<Vec<u8>, TxError> {
            let hash = address.hash();
            let mut script = match address.script_type() {
                ScriptType::P2pkh => vec![0x76, 0xa9, hash.len() as u8],
                ScriptType::P2sh => vec![0xa9, hash.len() as u8],
                _ => vec![0x00, hash.len() as u8],
            };
            script.extend_from_slice(hash);
            if address.script_type() == ScriptType::P2pkh {
                script.extend_from_slice(&[0x88, 0xac]);
            }
            Ok(script)
        }

        fn unlocking_script(&self, data: &SigScriptData) -> Vec<u8> {
            let mut script = Vec::new();
            for chunk in &data.chunks {
                script.push(chunk.len() as u8);
                script.extend_from_slice(chunk);
            }
            script
        }
    }

    fn make_utxo(value: u64, index: u32) -> UnspentOutput {
        UnspentOutput {
            output: TransactionOutput {
                value,
                index,
                locking_script: vec![0x76, 0xa9, 0x14],
                script_type: ScriptType::P2pkh,
                address: format!("utxo_{}", index),
                key_hash: vec![0x01; 20],
                public_key: None,
            },
            transaction_hash: Some(vec![0xAB; 32]),
        }
    }

    fn change_key() -> PublicKey {
        PublicKey {
            key_hash: vec![0x77; 20],
        }
    }

    fn destination(converter: &AddressConverter) -> String {
        converter
            .convert_hash(&[0x99; 20], ScriptType::P2pkh)
            .unwrap()
            .string()
            .to_string()
    }

    struct Harness {
        converter: AddressConverter,
        selector: MockSelector,
        provider: MockProvider,
        signer: MockSigner,
        scripts: MockScriptBuilder,
        sizes: StandardSizeCalculator,
    }

    impl Harness {
        fn new(fee: u64, utxos: Vec<UnspentOutput>) -> Self {
            Self {
                converter: AddressConverter::new(Network::BitcoinCash),
                selector: MockSelector::new(fee),
                provider: MockProvider { utxos },
                signer: MockSigner,
                scripts: MockScriptBuilder,
                sizes: StandardSizeCalculator,
            }
        }

        fn builder(&self) -> TransactionBuilder<'_> {
            TransactionBuilder::new(
                self.converter,
                &self.selector,
                &self.provider,
                &self.signer,
                &self.scripts,
                &self.sizes,
            )
        }
    }

    #[test]
    fn test_fee_sender_pay_with_change() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        // Change output cost: 34 bytes * 10 = 340.
        let fee = harness.builder().fee(10_000, 10, true, None).unwrap();
        assert_eq!(fee, 1_340);
    }

    #[test]
    fn test_fee_sender_pay_without_change() {
        let harness = Harness::new(1_000, vec![make_utxo(11_000, 0)]);
        // 11_000 is not strictly above 10_000 + 1_340, so no change
        // output would be created and the raw fee is quoted.
        let fee = harness.builder().fee(10_000, 10, true, None).unwrap();
        assert_eq!(fee, 1_000);
    }

    #[test]
    fn test_fee_receiver_pay() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        // Receiver pays out of the sent value; nothing extra is quoted.
        let fee = harness.builder().fee(10_000, 10, false, None).unwrap();
        assert_eq!(fee, 0);
    }

    #[test]
    fn test_fee_defaults_to_p2pkh_without_address() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        harness.builder().fee(10_000, 10, true, None).unwrap();
        assert_eq!(
            *harness.selector.last_script_type.borrow(),
            Some(ScriptType::P2pkh)
        );
    }

    #[test]
    fn test_fee_resolves_address_script_type() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        let address = harness
            .converter
            .convert_hash(&[0x42; 20], ScriptType::P2sh)
            .unwrap();
        harness
            .builder()
            .fee(10_000, 10, true, Some(address.string()))
            .unwrap();
        assert_eq!(
            *harness.selector.last_script_type.borrow(),
            Some(ScriptType::P2sh)
        );
    }

    #[test]
    fn test_build_fee_more_than_value() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        let destination = destination(&harness.converter);
        let result = harness.builder().build_transaction(
            1_000,
            &destination,
            10,
            false,
            &change_key(),
            ScriptType::P2pkh,
        );
        assert!(matches!(
            result,
            Err(TxError::FeeMoreThanValue {
                fee: 1_000,
                value: 1_000
            })
        ));
    }

    #[test]
    fn test_build_appends_change_output() {
        // total 100_000 against sent 50_000 + change cost 340.
        let harness = Harness::new(1_000, vec![make_utxo(60_000, 0), make_utxo(40_000, 1)]);
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(49_000, &destination, 10, true, &change_key(), ScriptType::P2pkh)
            .unwrap();

        assert_eq!(transaction.outputs.len(), 2);
        assert_eq!(transaction.outputs[0].value, 49_000);
        let change = &transaction.outputs[1];
        assert_eq!(change.index, 1);
        assert_eq!(change.value, 49_660);
        assert_eq!(change.public_key, Some(change_key()));
        assert_eq!(change.key_hash, vec![0x77; 20]);
    }

    #[test]
    fn test_build_absorbs_dust_leftover() {
        // total 50_200 is not strictly above sent 50_000 + change cost
        // 340; the 200 leftover goes to the fee instead of a change
        // output.
        let harness = Harness::new(1_000, vec![make_utxo(50_200, 0)]);
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(49_000, &destination, 10, true, &change_key(), ScriptType::P2pkh)
            .unwrap();

        assert_eq!(transaction.outputs.len(), 1);
        assert_eq!(transaction.outputs[0].value, 49_000);
    }

    #[test]
    fn test_build_receiver_pays_deducts_fee() {
        let harness = Harness::new(400, vec![make_utxo(10_000, 0)]);
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(10_000, &destination, 10, false, &change_key(), ScriptType::P2pkh)
            .unwrap();

        // received = value - fee; sent = value = total, so no change.
        assert_eq!(transaction.outputs.len(), 1);
        assert_eq!(transaction.outputs[0].value, 9_600);
    }

    #[test]
    fn test_build_inputs_reference_outpoints() {
        let harness = Harness::new(1_000, vec![make_utxo(60_000, 2), make_utxo(40_000, 5)]);
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(30_000, &destination, 10, true, &change_key(), ScriptType::P2pkh)
            .unwrap();

        assert_eq!(transaction.inputs.len(), 2);
        assert_eq!(transaction.inputs[0].previous_output_hash, vec![0xAB; 32]);
        assert_eq!(
            transaction.inputs[0].previous_output_hash_reversed_hex,
            reversed_hex(&[0xAB; 32])
        );
        assert_eq!(transaction.inputs[0].previous_output_index, 2);
        assert_eq!(transaction.inputs[1].previous_output_index, 5);
        assert_eq!(transaction.inputs[0].sequence, SEQUENCE_FINAL);
    }

    #[test]
    fn test_build_fails_without_previous_transaction() {
        let mut utxo = make_utxo(100_000, 0);
        utxo.transaction_hash = None;
        let harness = Harness::new(1_000, vec![utxo]);
        let destination = destination(&harness.converter);
        let result = harness.builder().build_transaction(
            10_000,
            &destination,
            10,
            true,
            &change_key(),
            ScriptType::P2pkh,
        );
        assert!(matches!(result, Err(TxError::NoPreviousTransaction(_))));
    }

    #[test]
    fn test_build_signs_every_input() {
        let harness = Harness::new(
            1_000,
            vec![make_utxo(30_000, 0), make_utxo(30_000, 1), make_utxo(40_000, 2)],
        );
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(20_000, &destination, 10, true, &change_key(), ScriptType::P2pkh)
            .unwrap();

        assert_eq!(transaction.inputs.len(), 3);
        for input in &transaction.inputs {
            assert!(!input.sig_script.is_empty());
            // signature push + pubkey push from the mock signer.
            assert_eq!(input.sig_script.len(), 1 + 71 + 1 + 33);
        }
    }

    #[test]
    fn test_build_finalizes_transaction() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(10_000, &destination, 10, true, &change_key(), ScriptType::P2pkh)
            .unwrap();

        assert_eq!(transaction.version, 1);
        assert_eq!(transaction.lock_time, 0);
        assert_eq!(transaction.status, TransactionStatus::New);
        assert!(transaction.is_mine);
        assert_eq!(transaction.hash, transaction.compute_hash());
        assert_eq!(
            transaction.reversed_hash_hex,
            reversed_hex(&transaction.hash)
        );
    }

    #[test]
    fn test_build_conserves_value() {
        let harness = Harness::new(1_000, vec![make_utxo(100_000, 0)]);
        let destination = destination(&harness.converter);
        let transaction = harness
            .builder()
            .build_transaction(49_000, &destination, 10, true, &change_key(), ScriptType::P2pkh)
            .unwrap();

        let outputs_total: u64 = transaction.outputs.iter().map(|output| output.value).sum();
        // Inputs minus outputs covers the selector fee plus the change
        // output's own byte cost, the quote `fee()` would have given.
        assert_eq!(100_000 - outputs_total, 1_000 + 340);
    }
}
