//! Nonced transaction builder library
//!
//! This library exposes the Solana legacy message compiler, a small
//! instruction codec for the programs a subsidizer service touches, and
//! the builder that wraps caller instructions in a durable nonce advance.

pub mod authority;
pub mod config;
pub mod programs;
pub mod solana;
pub mod structured_logging;
pub mod tx_builder;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use authority::{Authority, KeypairAuthority};
pub use config::Config;
pub use solana::{Hash, Instruction, Message, PublicKey, Transaction};
pub use tx_builder::{NoncedTransactionBuilder, TransactionBuilderError};
