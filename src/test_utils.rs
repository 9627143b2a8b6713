//! Test Utilities Module
//!
//! Random keys, nonce fixtures and sample instructions for tests and
//! benches.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use rand::Rng;

use crate::programs::{SystemTransfer, TokenTransfer};
use crate::solana::{Hash, Instruction, PublicKey};
use crate::tx_builder::NoncedTransactionBuilder;

/// Random public key
pub fn new_random_key() -> PublicKey {
    PublicKey::new(rand::thread_rng().gen())
}

/// Random 32-byte hash, usable as a nonce value
pub fn new_random_hash() -> Hash {
    Hash::new(rand::thread_rng().gen())
}

/// A nonce account and its current stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestNonce {
    pub account: PublicKey,
    pub value: Hash,
}

impl TestNonce {
    pub fn new() -> Self {
        Self {
            account: new_random_key(),
            value: new_random_hash(),
        }
    }

    /// Value after an on-chain advance
    pub fn advance(&mut self) {
        self.value = new_random_hash();
    }
}

impl Default for TestNonce {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder with a random subsidizer
pub fn random_builder() -> NoncedTransactionBuilder {
    NoncedTransactionBuilder::new(new_random_key())
}

/// Token transfer between random accounts
pub fn random_token_transfer(amount: u64) -> TokenTransfer {
    TokenTransfer {
        source: new_random_key(),
        destination: new_random_key(),
        owner: new_random_key(),
        amount,
    }
}

pub fn random_system_transfer(lamports: u64) -> SystemTransfer {
    SystemTransfer {
        from: new_random_key(),
        to: new_random_key(),
        lamports,
    }
}

/// `count` token transfers with amounts 1..=count
pub fn token_transfers(count: usize) -> Vec<Instruction> {
    (1..=count as u64)
        .map(|amount| random_token_transfer(amount).instruction())
        .collect()
}
