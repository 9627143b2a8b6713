//! Account table construction
//!
//! Every key referenced by a message (fee payer, programs, instruction
//! accounts) appears exactly once in the table. Access flags are the union
//! of every request for that key. Ordering:
//!
//! ```text
//! [0]  fee payer (always signer + writable)
//! ...  signer + writable
//! ...  signer + read-only
//! ...  non-signer + writable
//! ...  non-signer + read-only
//! ```
//!
//! Within each group keys keep the order in which they were first seen.
//! For each instruction the program key is seen before its account metas.

use std::collections::HashMap;

use super::errors::{CompileError, MAX_ACCOUNTS};
use super::instruction::Instruction;
use super::key::PublicKey;
use super::message::MessageHeader;

/// A table entry with its merged access flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub public_key: PublicKey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl Account {
    // signer+writable < signer+readonly < writable < readonly
    fn group(&self) -> u8 {
        match (self.is_signer, self.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

/// Ordered, deduplicated account table for one message.
#[derive(Debug, Clone)]
pub struct AccountTable {
    accounts: Vec<Account>,
    indices: HashMap<PublicKey, u8>,
}

// Always holds at least the fee payer
#[allow(clippy::len_without_is_empty)]
impl AccountTable {
    /// Build the table for `fee_payer` and `instructions`.
    ///
    /// # Errors
    ///
    /// `CompileError::TooManyAccounts` if more than 255 distinct keys are
    /// referenced.
    pub fn build(fee_payer: &PublicKey, instructions: &[Instruction]) -> Result<Self, CompileError> {
        let mut accounts = vec![Account {
            public_key: *fee_payer,
            is_signer: true,
            is_writable: true,
        }];
        let mut positions: HashMap<PublicKey, usize> = HashMap::new();
        positions.insert(*fee_payer, 0);

        let mut merge = |key: PublicKey, is_signer: bool, is_writable: bool| match positions.get(&key) {
            Some(&pos) => {
                let entry = &mut accounts[pos];
                entry.is_signer |= is_signer;
                entry.is_writable |= is_writable;
            }
            None => {
                positions.insert(key, accounts.len());
                accounts.push(Account {
                    public_key: key,
                    is_signer,
                    is_writable,
                });
            }
        };

        for ix in instructions {
            merge(ix.program, false, false);
            for meta in &ix.accounts {
                merge(meta.public_key, meta.is_signer, meta.is_writable);
            }
        }

        if accounts.len() > MAX_ACCOUNTS {
            return Err(CompileError::TooManyAccounts {
                count: accounts.len(),
                max: MAX_ACCOUNTS,
            });
        }

        // Stable sort keeps first-appearance order inside each group. The fee
        // payer is excluded so it stays at index 0.
        accounts[1..].sort_by_key(Account::group);

        let indices = accounts
            .iter()
            .enumerate()
            .map(|(i, account)| (account.public_key, i as u8))
            .collect();

        Ok(Self { accounts, indices })
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn index_of(&self, key: &PublicKey) -> Option<u8> {
        self.indices.get(key).copied()
    }

    pub fn keys(&self) -> Vec<PublicKey> {
        self.accounts.iter().map(|a| a.public_key).collect()
    }

    /// Header counts derived from the merged flags.
    pub fn header(&self) -> MessageHeader {
        let mut header = MessageHeader::default();
        for account in &self.accounts {
            match (account.is_signer, account.is_writable) {
                (true, true) => header.num_required_signatures += 1,
                (true, false) => {
                    header.num_required_signatures += 1;
                    header.num_readonly_signed_accounts += 1;
                }
                (false, true) => {}
                (false, false) => header.num_readonly_unsigned_accounts += 1,
            }
        }
        header
    }
}
