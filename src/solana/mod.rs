//! Solana legacy message model and wire format
//!
//! - **key**: fixed-size identities (`PublicKey`, `Hash`, `Signature`)
//! - **wire**: compact-u16 lengths and a bounds-checked reader
//! - **instruction**: uncompiled and compiled instruction types
//! - **accounts**: deduplicated, ordered account table
//! - **message**: message compilation and (un)marshalling
//! - **transaction**: signature slots plus message

pub mod accounts;
pub mod errors;
pub mod instruction;
pub mod key;
pub mod message;
pub mod transaction;
pub mod wire;

pub use accounts::{Account, AccountTable};
pub use errors::{CompileError, WireError, MAX_ACCOUNTS};
pub use instruction::{AccountMeta, CompiledInstruction, Instruction};
pub use key::{Hash, ParseKeyError, PublicKey, Signature};
pub use message::{Message, MessageHeader};
pub use transaction::Transaction;
