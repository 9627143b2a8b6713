//! Error types for the nonced transaction builder
//!
//! Every failure is deterministic in its inputs: the same call fails the
//! same way on retry, so nothing here is retried internally.

use thiserror::Error;

use crate::programs::DecompileError;
use crate::solana::CompileError;

/// Errors from building or verifying a nonced transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionBuilderError {
    /// The caller supplied no instructions besides the nonce advancement
    #[error("A nonced transaction needs at least one instruction besides the nonce advance")]
    NoInstructions,

    /// Message compilation failed
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// A compiled instruction could not be decoded
    #[error("Decompile error: {0}")]
    Decompile(#[from] DecompileError),

    /// Instructions violate the durable nonce ordering rules:
    /// 1. advance_nonce_account first
    /// 2. no other advance_nonce_account anywhere
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// A transaction does not match the expected subsidizer or nonce
    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransactionBuilderError {
    /// Stable label for log fields
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoInstructions => "input",
            Self::Compile(_) => "compile",
            Self::Decompile(_) => "decompile",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::Verification(_) => "verification",
            Self::Configuration(_) => "config",
        }
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }

    pub fn verification(reason: impl Into<String>) -> Self {
        Self::Verification(reason.into())
    }
}
