//! Instruction planning and ordering validation
//!
//! Durable nonce transactions are laid out as:
//! 1. advance_nonce_account (authorized by the subsidizer)
//! 2. caller instructions, in the caller's order
//!
//! The runtime only treats a transaction as nonced when the advance is the
//! first instruction. `sanity_check_ix_order` is a stricter standalone
//! check for callers that want exactly one advance; the builder does not
//! apply it.

use crate::programs::AdvanceNonce;
use crate::solana::{Instruction, PublicKey};
use crate::tx_builder::errors::TransactionBuilderError;

/// Ordered instructions for a nonced transaction, not yet compiled.
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    /// The ordered list of instructions for the transaction
    pub instructions: Vec<Instruction>,
}

impl InstructionPlan {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of caller instructions, excluding the nonce advance
    pub fn caller_instruction_count(&self) -> usize {
        self.instructions.len().saturating_sub(1)
    }
}

/// Prepend the nonce advance to `instructions`.
///
/// # Errors
///
/// `TransactionBuilderError::NoInstructions` if `instructions` is empty.
pub fn plan_nonced_instructions(
    nonce_account: &PublicKey,
    nonce_authority: &PublicKey,
    instructions: &[Instruction],
) -> Result<InstructionPlan, TransactionBuilderError> {
    if instructions.is_empty() {
        return Err(TransactionBuilderError::NoInstructions);
    }

    let mut planned = Vec::with_capacity(instructions.len() + 1);
    planned.push(
        AdvanceNonce {
            nonce: *nonce_account,
            authority: *nonce_authority,
        }
        .instruction(),
    );
    planned.extend_from_slice(instructions);

    Ok(InstructionPlan::new(planned))
}

/// Validate durable nonce instruction ordering.
///
/// # Errors
///
/// `TransactionBuilderError::InvalidInstructionOrder` if:
/// - the list is empty
/// - the first instruction is not advance_nonce_account
/// - advance_nonce_account appears again after the first position
pub fn sanity_check_ix_order(instructions: &[Instruction]) -> Result<(), TransactionBuilderError> {
    let first = instructions
        .first()
        .ok_or_else(|| TransactionBuilderError::invalid_order("Instruction list is empty"))?;

    if !AdvanceNonce::matches(first) {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Durable nonce transaction must start with advance_nonce_account, got program: {}",
            first.program
        )));
    }

    if let Some(idx) = instructions
        .iter()
        .skip(1)
        .position(AdvanceNonce::matches)
        .map(|p| p + 1)
    {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Multiple advance_nonce_account instructions found (at position {}). Only one allowed at position 0",
            idx
        )));
    }

    Ok(())
}
