//! Nonced Transaction Builder
//!
//! Assembles unsigned transactions that substitute a durable nonce for a
//! recent blockhash.
//!
//! ## Architecture
//!
//! - **errors**: builder error taxonomy
//! - **instructions**: instruction planning and ordering validation
//! - **builder**: `NoncedTransactionBuilder`, compile and verify
//!
//! ## Durable Nonce Layout
//!
//! ```text
//! account 0        subsidizer (fee payer, signer, writable)
//! instruction 0    advance_nonce_account(nonce, authority = subsidizer)
//! instruction 1..  caller instructions, in order
//! recent value     current durable nonce value
//! signatures       zeroed, one per required signer
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use nonced_tx::programs::TokenTransfer;
//! use nonced_tx::solana::{Hash, PublicKey};
//! use nonced_tx::tx_builder::NoncedTransactionBuilder;
//!
//! # fn example() -> Result<(), nonced_tx::tx_builder::TransactionBuilderError> {
//! let builder = NoncedTransactionBuilder::new(PublicKey::new([1u8; 32]));
//! let transfer = TokenTransfer {
//!     source: PublicKey::new([2u8; 32]),
//!     destination: PublicKey::new([3u8; 32]),
//!     owner: PublicKey::new([4u8; 32]),
//!     amount: 10,
//! };
//!
//! let tx = builder.make_nonced_transaction(
//!     &PublicKey::new([5u8; 32]),
//!     Hash::new([6u8; 32]),
//!     &[transfer.instruction()],
//! )?;
//! assert_eq!(tx.message.instructions.len(), 2);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod errors;
pub use errors::TransactionBuilderError;

mod builder;
mod instructions;

pub use builder::NoncedTransactionBuilder;
pub use instructions::{plan_nonced_instructions, sanity_check_ix_order, InstructionPlan};
