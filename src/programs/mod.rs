//! Typed instruction codecs for well-known programs
//!
//! Each supported operation has a parameter struct with an `instruction()`
//! encoder and a `decompile(message, index)` decoder. Each program also has
//! a tagged enum whose `decompile` reads the discriminator and dispatches to
//! the matching variant.
//!
//! Decoding checks, in order: the instruction exists, its program index
//! resolves, the program matches, the discriminator matches, the data length
//! is exact, the account count is exact, every account index resolves.

pub mod compute_budget;
pub mod system;
pub mod token;

use thiserror::Error;

use crate::solana::{CompiledInstruction, Message, PublicKey};

pub use compute_budget::{ComputeBudgetInstruction, SetComputeUnitLimit, SetComputeUnitPrice};
pub use system::{AdvanceNonce, SystemInstruction, SystemTransfer};
pub use token::{TokenInstruction, TokenTransfer};

/// Errors raised while decoding a compiled instruction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompileError {
    #[error("No instruction at index {index} (message has {len})")]
    MissingInstruction { index: usize, len: usize },

    #[error("Incorrect program: expected {expected}, got {actual}")]
    WrongProgram {
        expected: PublicKey,
        actual: PublicKey,
    },

    #[error("Incorrect instruction variant: expected {expected}, got tag {actual}")]
    WrongVariant { expected: &'static str, actual: u32 },

    #[error("Malformed instruction: {0}")]
    Malformed(String),

    #[error("Account index {index} out of range ({len} account keys)")]
    AccountIndexOutOfRange { index: usize, len: usize },
}

impl DecompileError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

/// A compiled instruction together with its resolved keys.
///
/// Produced once the instruction is known to exist and to target `program`.
pub(crate) struct ResolvedInstruction<'a> {
    pub instruction: &'a CompiledInstruction,
    message: &'a Message,
}

impl<'a> ResolvedInstruction<'a> {
    /// Resolve instruction `index` and check that it targets `program`.
    pub fn resolve(
        message: &'a Message,
        index: usize,
        program: &PublicKey,
    ) -> Result<Self, DecompileError> {
        let instruction = message
            .instructions
            .get(index)
            .ok_or(DecompileError::MissingInstruction {
                index,
                len: message.instructions.len(),
            })?;

        let actual = key_at(message, instruction.program_index as usize)?;
        if actual != *program {
            return Err(DecompileError::WrongProgram {
                expected: *program,
                actual,
            });
        }

        Ok(Self {
            instruction,
            message,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        &self.instruction.data
    }

    /// Resolve every account index, requiring exactly `expected` of them.
    pub fn accounts<const N: usize>(&self) -> Result<[PublicKey; N], DecompileError> {
        let indices = &self.instruction.accounts;
        if indices.len() != N {
            return Err(DecompileError::malformed(format!(
                "expected {} accounts, got {}",
                N,
                indices.len()
            )));
        }
        let mut keys = [PublicKey::default(); N];
        for (slot, &index) in keys.iter_mut().zip(indices) {
            *slot = key_at(self.message, index as usize)?;
        }
        Ok(keys)
    }
}

fn key_at(message: &Message, index: usize) -> Result<PublicKey, DecompileError> {
    message
        .account_keys
        .get(index)
        .copied()
        .ok_or(DecompileError::AccountIndexOutOfRange {
            index,
            len: message.account_keys.len(),
        })
}

/// Require `data` to be exactly `len` bytes long.
pub(crate) fn expect_len(data: &[u8], len: usize, what: &str) -> Result<(), DecompileError> {
    if data.len() != len {
        return Err(DecompileError::malformed(format!(
            "{} data must be {} bytes, got {}",
            what,
            len,
            data.len()
        )));
    }
    Ok(())
}

/// Any instruction this crate knows how to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownInstruction {
    System(SystemInstruction),
    Token(TokenInstruction),
    ComputeBudget(ComputeBudgetInstruction),
}

/// Decode instruction `index` by dispatching on its program key.
pub fn decompile(message: &Message, index: usize) -> Result<KnownInstruction, DecompileError> {
    let instruction = message
        .instructions
        .get(index)
        .ok_or(DecompileError::MissingInstruction {
            index,
            len: message.instructions.len(),
        })?;
    let program = key_at(message, instruction.program_index as usize)?;

    if program == system::PROGRAM_ID {
        SystemInstruction::decompile(message, index).map(KnownInstruction::System)
    } else if program == token::PROGRAM_ID {
        TokenInstruction::decompile(message, index).map(KnownInstruction::Token)
    } else if program == compute_budget::PROGRAM_ID {
        ComputeBudgetInstruction::decompile(message, index).map(KnownInstruction::ComputeBudget)
    } else {
        Err(DecompileError::WrongProgram {
            expected: system::PROGRAM_ID,
            actual: program,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::{Hash, Instruction};

    fn key(n: u8) -> PublicKey {
        PublicKey::new([n; 32])
    }

    #[test]
    fn test_dispatch_by_program() {
        let ixs = vec![
            SetComputeUnitLimit { units: 200_000 }.instruction(),
            SystemTransfer {
                from: key(1),
                to: key(2),
                lamports: 5,
            }
            .instruction(),
            TokenTransfer {
                source: key(3),
                destination: key(4),
                owner: key(1),
                amount: 6,
            }
            .instruction(),
        ];
        let message = Message::compile(&key(1), &ixs, Hash::default()).unwrap();

        assert!(matches!(
            decompile(&message, 0),
            Ok(KnownInstruction::ComputeBudget(
                ComputeBudgetInstruction::SetComputeUnitLimit(SetComputeUnitLimit { units: 200_000 })
            ))
        ));
        assert!(matches!(
            decompile(&message, 1),
            Ok(KnownInstruction::System(SystemInstruction::Transfer(t))) if t.lamports == 5
        ));
        assert!(matches!(
            decompile(&message, 2),
            Ok(KnownInstruction::Token(TokenInstruction::Transfer(t))) if t.amount == 6
        ));
        assert_eq!(
            decompile(&message, 3),
            Err(DecompileError::MissingInstruction { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_unknown_program() {
        let ix = Instruction::new(key(77), vec![], vec![1, 2]);
        let message = Message::compile(&key(1), &[ix], Hash::default()).unwrap();
        assert!(matches!(
            decompile(&message, 0),
            Err(DecompileError::WrongProgram { actual, .. }) if actual == key(77)
        ));
    }

    #[test]
    fn test_out_of_range_program_index() {
        let ix = Instruction::new(key(77), vec![], vec![]);
        let mut message = Message::compile(&key(1), &[ix], Hash::default()).unwrap();
        message.instructions[0].program_index = 200;
        assert_eq!(
            decompile(&message, 0),
            Err(DecompileError::AccountIndexOutOfRange { index: 200, len: 2 })
        );
    }
}
