//! Error types for message compilation and wire parsing

use thiserror::Error;

/// Maximum number of entries in a message account table.
///
/// Compiled instructions reference accounts by a single byte.
pub const MAX_ACCOUNTS: usize = u8::MAX as usize;

/// Errors raised while compiling instructions into a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A message must contain at least one instruction
    #[error("Cannot compile a message with no instructions")]
    EmptyInstructions,

    /// The deduplicated account table does not fit single-byte indices
    #[error("Too many accounts: {count} exceeds the maximum of {max}")]
    TooManyAccounts { count: usize, max: usize },

    /// More instructions than a compact-u16 count can describe
    #[error("Too many instructions: {count} exceeds the maximum of {max}")]
    TooManyInstructions { count: usize, max: usize },

    /// An instruction has more account references or data bytes than a
    /// compact-u16 length can describe
    #[error("Instruction {index} has too many {field}: {len}")]
    InstructionTooLarge {
        index: usize,
        field: &'static str,
        len: usize,
    },
}

/// Errors raised while parsing or sanitizing wire bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Invalid compact-u16 length prefix")]
    InvalidCompactLength,

    #[error("{0} trailing bytes after end of input")]
    TrailingBytes(usize),

    /// An array is too long for its compact-u16 length prefix
    #[error("Array length {0} exceeds the compact-u16 maximum")]
    LengthOverflow(usize),

    /// Structurally parseable but violates a message invariant
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl WireError {
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage(reason.into())
    }
}
