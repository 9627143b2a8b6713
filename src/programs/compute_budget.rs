//! Compute budget program
//!
//! Single-byte discriminator, no accounts.

use super::{expect_len, DecompileError, ResolvedInstruction};
use crate::solana::wire::Reader;
use crate::solana::{Instruction, Message, PublicKey};

/// `ComputeBudget111111111111111111111111111111`
pub const PROGRAM_ID: PublicKey = PublicKey::new([
    3, 6, 70, 111, 229, 33, 23, 50, 255, 236, 173, 186, 114, 195, 155, 231, 188, 140, 229, 187,
    197, 247, 18, 107, 44, 67, 155, 58, 64, 0, 0, 0,
]);

const TAG_SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const TAG_SET_COMPUTE_UNIT_PRICE: u8 = 3;

fn read_tag(data: &[u8]) -> Result<u8, DecompileError> {
    data.first()
        .copied()
        .ok_or_else(|| DecompileError::malformed("missing compute budget discriminator"))
}

fn expect_tag(data: &[u8], tag: u8, name: &'static str) -> Result<(), DecompileError> {
    let actual = read_tag(data)?;
    if actual != tag {
        return Err(DecompileError::WrongVariant {
            expected: name,
            actual: actual as u32,
        });
    }
    Ok(())
}

fn malformed(e: impl ToString) -> DecompileError {
    DecompileError::malformed(e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetComputeUnitLimit {
    pub units: u32,
}

impl SetComputeUnitLimit {
    pub fn instruction(&self) -> Instruction {
        let mut data = Vec::with_capacity(5);
        data.push(TAG_SET_COMPUTE_UNIT_LIMIT);
        data.extend_from_slice(&self.units.to_le_bytes());
        Instruction::new(PROGRAM_ID, vec![], data)
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        let data = resolved.data();
        expect_tag(data, TAG_SET_COMPUTE_UNIT_LIMIT, "SetComputeUnitLimit")?;
        expect_len(data, 5, "SetComputeUnitLimit")?;
        resolved.accounts::<0>()?;

        let units = Reader::new(&data[1..]).read_u32_le().map_err(malformed)?;
        Ok(Self { units })
    }
}

/// Priority fee in micro-lamports per compute unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetComputeUnitPrice {
    pub micro_lamports: u64,
}

impl SetComputeUnitPrice {
    pub fn instruction(&self) -> Instruction {
        let mut data = Vec::with_capacity(9);
        data.push(TAG_SET_COMPUTE_UNIT_PRICE);
        data.extend_from_slice(&self.micro_lamports.to_le_bytes());
        Instruction::new(PROGRAM_ID, vec![], data)
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        let data = resolved.data();
        expect_tag(data, TAG_SET_COMPUTE_UNIT_PRICE, "SetComputeUnitPrice")?;
        expect_len(data, 9, "SetComputeUnitPrice")?;
        resolved.accounts::<0>()?;

        let micro_lamports = Reader::new(&data[1..]).read_u64_le().map_err(malformed)?;
        Ok(Self { micro_lamports })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBudgetInstruction {
    SetComputeUnitLimit(SetComputeUnitLimit),
    SetComputeUnitPrice(SetComputeUnitPrice),
}

impl ComputeBudgetInstruction {
    pub fn instruction(&self) -> Instruction {
        match self {
            Self::SetComputeUnitLimit(ix) => ix.instruction(),
            Self::SetComputeUnitPrice(ix) => ix.instruction(),
        }
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        match read_tag(resolved.data())? {
            TAG_SET_COMPUTE_UNIT_LIMIT => {
                SetComputeUnitLimit::decompile(message, index).map(Self::SetComputeUnitLimit)
            }
            TAG_SET_COMPUTE_UNIT_PRICE => {
                SetComputeUnitPrice::decompile(message, index).map(Self::SetComputeUnitPrice)
            }
            actual => Err(DecompileError::WrongVariant {
                expected: "SetComputeUnitLimit or SetComputeUnitPrice",
                actual: actual as u32,
            }),
        }
    }
}
