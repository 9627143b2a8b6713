//! Nonced transaction builder
//!
//! Builds unsigned transactions that use a durable nonce instead of a
//! recent blockhash. The subsidizer pays fees, authorizes the nonce advance
//! and always occupies account index 0.

use tracing::{debug, info, warn};

use crate::authority::Authority;
use crate::programs::AdvanceNonce;
use crate::solana::{Hash, Instruction, Message, PublicKey, Transaction};
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::plan_nonced_instructions;

/// Builds nonced transactions for a fixed subsidizer.
///
/// Holds only the subsidizer key, so one builder can be shared across
/// threads, and tests can run side by side with different subsidizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoncedTransactionBuilder {
    subsidizer: PublicKey,
}

impl NoncedTransactionBuilder {
    pub fn new(subsidizer: PublicKey) -> Self {
        Self { subsidizer }
    }

    pub fn from_authority<A: Authority + ?Sized>(authority: &A) -> Self {
        Self::new(authority.public_key())
    }

    pub fn subsidizer(&self) -> &PublicKey {
        &self.subsidizer
    }

    /// Build an unsigned transaction that advances `nonce_account` and then
    /// runs `instructions`.
    ///
    /// The message's recent blockhash slot holds `nonce_value`, and the
    /// transaction has one zeroed signature slot per required signer.
    /// Caller instructions are kept as given, including advances of other
    /// nonce accounts.
    ///
    /// # Errors
    ///
    /// - `NoInstructions` if `instructions` is empty
    /// - `Compile` if the combined instruction list cannot be compiled
    pub fn make_nonced_transaction(
        &self,
        nonce_account: &PublicKey,
        nonce_value: Hash,
        instructions: &[Instruction],
    ) -> Result<Transaction, TransactionBuilderError> {
        let plan = plan_nonced_instructions(nonce_account, &self.subsidizer, instructions)?;

        let message = Message::compile(&self.subsidizer, &plan.instructions, nonce_value)?;
        let tx = Transaction::from_message(message);

        info!(
            subsidizer = %self.subsidizer,
            nonce_account = %nonce_account,
            nonce_value = %nonce_value,
            instructions = plan.caller_instruction_count(),
            signers = tx.signatures.len(),
            "Built nonced transaction"
        );

        Ok(tx)
    }

    /// Check that `tx` is a nonced transaction this builder could have
    /// produced for `nonce_account` and `nonce_value`.
    ///
    /// # Errors
    ///
    /// - `Verification` if the fee payer, nonce value, nonce advance or
    ///   signature slots do not match
    /// - `Decompile` if instruction 0 is not a valid nonce advance
    /// - `InvalidInstructionOrder` if a later instruction advances the same
    ///   nonce account
    pub fn verify_nonced_transaction(
        &self,
        tx: &Transaction,
        nonce_account: &PublicKey,
        nonce_value: &Hash,
    ) -> Result<(), TransactionBuilderError> {
        let result = self.check_nonced_transaction(tx, nonce_account, nonce_value);
        if let Err(ref e) = result {
            warn!(
                subsidizer = %self.subsidizer,
                nonce_account = %nonce_account,
                category = e.category(),
                error = %e,
                "Nonced transaction failed verification"
            );
        }
        result
    }

    fn check_nonced_transaction(
        &self,
        tx: &Transaction,
        nonce_account: &PublicKey,
        nonce_value: &Hash,
    ) -> Result<(), TransactionBuilderError> {
        let message = &tx.message;

        match message.fee_payer() {
            Some(payer) if *payer == self.subsidizer => {}
            Some(payer) => {
                return Err(TransactionBuilderError::verification(format!(
                    "fee payer {} is not the subsidizer",
                    payer
                )))
            }
            None => return Err(TransactionBuilderError::verification("message has no accounts")),
        }

        if message.recent_blockhash != *nonce_value {
            return Err(TransactionBuilderError::verification(format!(
                "recent blockhash {} does not match nonce value {}",
                message.recent_blockhash, nonce_value
            )));
        }

        if message.instructions.len() < 2 {
            return Err(TransactionBuilderError::NoInstructions);
        }

        let advance = AdvanceNonce::decompile(message, 0)?;
        if advance.nonce != *nonce_account {
            return Err(TransactionBuilderError::verification(format!(
                "advances nonce {} instead of {}",
                advance.nonce, nonce_account
            )));
        }
        if advance.authority != self.subsidizer {
            return Err(TransactionBuilderError::verification(format!(
                "nonce authority {} is not the subsidizer",
                advance.authority
            )));
        }

        // Advancing the same nonce twice fails on chain
        for index in 1..message.instructions.len() {
            match AdvanceNonce::decompile(message, index) {
                Ok(again) if again.nonce == *nonce_account => {
                    return Err(TransactionBuilderError::invalid_order(format!(
                        "Nonce account {} advanced again at position {}",
                        nonce_account, index
                    )))
                }
                _ => {}
            }
        }

        let required = message.header.num_required_signatures as usize;
        if tx.signatures.len() != required {
            return Err(TransactionBuilderError::verification(format!(
                "{} signature slots for {} required signers",
                tx.signatures.len(),
                required
            )));
        }

        debug!(nonce_account = %nonce_account, "Nonced transaction verified");
        Ok(())
    }
}
