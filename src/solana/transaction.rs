//! Transactions: a message plus its signature slots
//!
//! ```text
//! Transaction:
//!   signatures   compact-u16 count, 64 bytes each
//!   message      see `message.rs`
//! ```

use super::errors::{CompileError, WireError};
use super::instruction::Instruction;
use super::key::{Hash, PublicKey, Signature, SIGNATURE_LEN};
use super::message::Message;
use super::wire::{encode_array_len, Reader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Compile an unsigned transaction with a zero recent blockhash.
    pub fn new(fee_payer: &PublicKey, instructions: &[Instruction]) -> Result<Self, CompileError> {
        Message::compile(fee_payer, instructions, Hash::default()).map(Self::from_message)
    }

    /// Wrap a message with one empty signature slot per required signer.
    pub fn from_message(message: Message) -> Self {
        let signatures = vec![Signature::default(); message.header.num_required_signatures as usize];
        Self {
            signatures,
            message,
        }
    }

    /// The fee payer's signature slot, which also identifies the transaction.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }

    pub fn set_recent_blockhash(&mut self, blockhash: Hash) {
        self.message.recent_blockhash = blockhash;
    }

    /// The bytes an external signer signs.
    pub fn message_bytes(&self) -> Vec<u8> {
        self.message.marshal()
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.iter().all(|s| !s.is_empty())
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_LEN + 256);
        encode_array_len(&mut buf, self.signatures.len());
        for sig in &self.signatures {
            buf.extend_from_slice(sig.as_bytes());
        }
        self.message.marshal_into(&mut buf);
        buf
    }

    /// Parse a transaction and check its signature count matches the header.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(bytes);

        let num_signatures = reader.read_compact_len()?;
        let signatures = (0..num_signatures)
            .map(|_| reader.read_array::<SIGNATURE_LEN>().map(Signature::new))
            .collect::<Result<Vec<_>, _>>()?;

        let message = Message::read(&mut reader)?;
        reader.finish()?;

        if signatures.len() != message.header.num_required_signatures as usize {
            return Err(WireError::invalid_message(format!(
                "{} signatures for {} required signers",
                signatures.len(),
                message.header.num_required_signatures
            )));
        }

        Ok(Self {
            signatures,
            message,
        })
    }
}
