//! Uncompiled and compiled instruction types

use super::key::PublicKey;

/// An account reference as requested by a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountMeta {
    pub public_key: PublicKey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// Writable account reference.
    pub fn new(public_key: PublicKey, is_signer: bool) -> Self {
        Self {
            public_key,
            is_signer,
            is_writable: true,
        }
    }

    /// Read-only account reference.
    pub fn new_readonly(public_key: PublicKey, is_signer: bool) -> Self {
        Self {
            public_key,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before compilation.
///
/// The order of `accounts` is defined by the target program and is
/// preserved through compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program: PublicKey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program: PublicKey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program,
            accounts,
            data,
        }
    }
}

/// An instruction whose program and accounts are indices into the
/// message account table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledInstruction {
    pub program_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}
