//! SPL Token program transfers
//!
//! Instruction data starts with a single-byte discriminator.

use super::{expect_len, DecompileError, ResolvedInstruction};
use crate::solana::wire::Reader;
use crate::solana::{AccountMeta, Instruction, Message, PublicKey};

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const PROGRAM_ID: PublicKey = PublicKey::new([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133, 237,
    95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

const TAG_TRANSFER: u8 = 3;

fn read_tag(data: &[u8]) -> Result<u8, DecompileError> {
    data.first()
        .copied()
        .ok_or_else(|| DecompileError::malformed("missing token instruction discriminator"))
}

/// Move `amount` base units from `source` to `destination`.
///
/// Accounts: `[source (writable), destination (writable), owner (signer)]`.
/// Data: `[3] ++ amount as u64 LE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub source: PublicKey,
    pub destination: PublicKey,
    pub owner: PublicKey,
    pub amount: u64,
}

impl TokenTransfer {
    pub fn instruction(&self) -> Instruction {
        let mut data = Vec::with_capacity(9);
        data.push(TAG_TRANSFER);
        data.extend_from_slice(&self.amount.to_le_bytes());
        Instruction::new(
            PROGRAM_ID,
            vec![
                AccountMeta::new(self.source, false),
                AccountMeta::new(self.destination, false),
                AccountMeta::new_readonly(self.owner, true),
            ],
            data,
        )
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        let data = resolved.data();

        let tag = read_tag(data)?;
        if tag != TAG_TRANSFER {
            return Err(DecompileError::WrongVariant {
                expected: "Transfer",
                actual: tag as u32,
            });
        }
        expect_len(data, 9, "Transfer")?;

        let amount = Reader::new(&data[1..])
            .read_u64_le()
            .map_err(|e| DecompileError::malformed(e.to_string()))?;
        let [source, destination, owner] = resolved.accounts::<3>()?;

        Ok(Self {
            source,
            destination,
            owner,
            amount,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenInstruction {
    Transfer(TokenTransfer),
}

impl TokenInstruction {
    pub fn instruction(&self) -> Instruction {
        match self {
            Self::Transfer(ix) => ix.instruction(),
        }
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        match read_tag(resolved.data())? {
            TAG_TRANSFER => TokenTransfer::decompile(message, index).map(Self::Transfer),
            actual => Err(DecompileError::WrongVariant {
                expected: "Transfer",
                actual: actual as u32,
            }),
        }
    }
}
