//! Message compilation and the message wire format
//!
//! ```text
//! Message:
//!   num_required_signatures         u8
//!   num_readonly_signed_accounts    u8
//!   num_readonly_unsigned_accounts  u8
//!   account_keys                    compact-u16 count, 32 bytes each
//!   recent_blockhash                32 bytes
//!   instructions                    compact-u16 count, then each:
//!     program_index                 u8
//!     accounts                      compact-u16 count, u8 each
//!     data                          compact-u16 count, u8 each
//! ```

use std::collections::HashSet;

use tracing::debug;

use super::accounts::AccountTable;
use super::errors::{CompileError, WireError};
use super::instruction::{CompiledInstruction, Instruction};
use super::key::{Hash, PublicKey};
use super::wire::{check_array_len, encode_array_len, Reader};

/// Counts that let a verifier derive each key's access flags from its
/// position in the account list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// A compiled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<PublicKey>,
    /// Blockhash, or the durable nonce value for nonced transactions
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile `instructions` with `fee_payer` at account index 0.
    ///
    /// `recent_blockhash` is copied into the message as-is.
    ///
    /// # Errors
    ///
    /// - `CompileError::EmptyInstructions` if `instructions` is empty
    /// - `CompileError::TooManyInstructions` if there are more than 65535
    /// - `CompileError::TooManyAccounts` if more than 255 distinct keys are used
    /// - `CompileError::InstructionTooLarge` if an instruction's account list
    ///   or data cannot be length-prefixed
    pub fn compile(
        fee_payer: &PublicKey,
        instructions: &[Instruction],
        recent_blockhash: Hash,
    ) -> Result<Self, CompileError> {
        if instructions.is_empty() {
            return Err(CompileError::EmptyInstructions);
        }
        if instructions.len() > u16::MAX as usize {
            return Err(CompileError::TooManyInstructions {
                count: instructions.len(),
                max: u16::MAX as usize,
            });
        }

        for (index, ix) in instructions.iter().enumerate() {
            for (field, len) in [("accounts", ix.accounts.len()), ("data bytes", ix.data.len())] {
                if len > u16::MAX as usize {
                    return Err(CompileError::InstructionTooLarge { index, field, len });
                }
            }
        }

        let table = AccountTable::build(fee_payer, instructions)?;
        let header = table.header();

        // Every key was inserted by the table build, so lookups cannot miss
        let lookup = |key: &PublicKey| table.index_of(key).unwrap_or_default();

        let compiled = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_index: lookup(&ix.program),
                accounts: ix.accounts.iter().map(|m| lookup(&m.public_key)).collect(),
                data: ix.data.clone(),
            })
            .collect::<Vec<_>>();

        debug!(
            fee_payer = %fee_payer,
            accounts = table.len(),
            instructions = compiled.len(),
            required_signatures = header.num_required_signatures,
            readonly_signed = header.num_readonly_signed_accounts,
            readonly_unsigned = header.num_readonly_unsigned_accounts,
            "Compiled message"
        );

        Ok(Self {
            header,
            account_keys: table.keys(),
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// The fee payer, always at index 0.
    pub fn fee_payer(&self) -> Option<&PublicKey> {
        self.account_keys.first()
    }

    /// Keys that must sign, in signature-slot order.
    pub fn signers(&self) -> &[PublicKey] {
        let n = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    pub fn is_signer(&self, index: usize) -> bool {
        index < self.account_keys.len() && index < self.header.num_required_signatures as usize
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let num_signed = self.header.num_required_signatures as usize;
        if index >= self.account_keys.len() {
            return false;
        }
        if index < num_signed {
            index < num_signed.saturating_sub(self.header.num_readonly_signed_accounts as usize)
        } else {
            let num_unsigned = self.account_keys.len() - num_signed;
            let writable_unsigned =
                num_unsigned.saturating_sub(self.header.num_readonly_unsigned_accounts as usize);
            index - num_signed < writable_unsigned
        }
    }

    /// Serialize to the wire format.
    ///
    /// Hand-built messages should pass `sanitize` first.
    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(3 + 3 + self.account_keys.len() * 32 + 32 + 64);
        self.marshal_into(&mut buf);
        buf
    }

    pub(crate) fn marshal_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed_accounts);
        buf.push(self.header.num_readonly_unsigned_accounts);

        encode_array_len(buf, self.account_keys.len());
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(self.recent_blockhash.as_bytes());

        encode_array_len(buf, self.instructions.len());
        for ix in &self.instructions {
            buf.push(ix.program_index);
            encode_array_len(buf, ix.accounts.len());
            buf.extend_from_slice(&ix.accounts);
            encode_array_len(buf, ix.data.len());
            buf.extend_from_slice(&ix.data);
        }
    }

    /// Parse a message from its wire bytes and sanitize it.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(bytes);
        let message = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        let header = MessageHeader {
            num_required_signatures: reader.read_u8()?,
            num_readonly_signed_accounts: reader.read_u8()?,
            num_readonly_unsigned_accounts: reader.read_u8()?,
        };

        let num_keys = reader.read_compact_len()?;
        let account_keys = (0..num_keys)
            .map(|_| reader.read_key().map(PublicKey::new))
            .collect::<Result<Vec<_>, _>>()?;

        let recent_blockhash = Hash::new(reader.read_key()?);

        let num_instructions = reader.read_compact_len()?;
        let mut instructions = Vec::with_capacity(num_instructions.min(reader.remaining()));
        for _ in 0..num_instructions {
            let program_index = reader.read_u8()?;
            let num_accounts = reader.read_compact_len()?;
            let accounts = reader.read_bytes(num_accounts)?.to_vec();
            let data_len = reader.read_compact_len()?;
            let data = reader.read_bytes(data_len)?.to_vec();
            instructions.push(CompiledInstruction {
                program_index,
                accounts,
                data,
            });
        }

        let message = Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        };
        message.sanitize()?;
        Ok(message)
    }

    /// Check the structural invariants a verifier relies on.
    pub fn sanitize(&self) -> Result<(), WireError> {
        let num_keys = self.account_keys.len();
        let header = &self.header;

        if header.num_required_signatures == 0 {
            return Err(WireError::invalid_message("no required signatures"));
        }
        if header.num_required_signatures as usize + header.num_readonly_unsigned_accounts as usize
            > num_keys
        {
            return Err(WireError::invalid_message(format!(
                "header counts exceed {} account keys",
                num_keys
            )));
        }
        if header.num_readonly_signed_accounts >= header.num_required_signatures {
            return Err(WireError::invalid_message(
                "fee payer must be a writable signer",
            ));
        }

        check_array_len(num_keys)?;
        check_array_len(self.instructions.len())?;
        for ix in &self.instructions {
            check_array_len(ix.accounts.len())?;
            check_array_len(ix.data.len())?;
        }

        let mut seen = HashSet::with_capacity(num_keys);
        if let Some(dup) = self.account_keys.iter().find(|k| !seen.insert(**k)) {
            return Err(WireError::invalid_message(format!("duplicate account key {}", dup)));
        }

        for (i, ix) in self.instructions.iter().enumerate() {
            let program = ix.program_index as usize;
            if program == 0 || program >= num_keys {
                return Err(WireError::invalid_message(format!(
                    "instruction {} has invalid program index {}",
                    i, program
                )));
            }
            if let Some(bad) = ix.accounts.iter().find(|&&a| a as usize >= num_keys) {
                return Err(WireError::invalid_message(format!(
                    "instruction {} references account index {} of {}",
                    i, bad, num_keys
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::instruction::AccountMeta;

    fn key(n: u8) -> PublicKey {
        PublicKey::new([n; 32])
    }

    fn sample_instructions() -> Vec<Instruction> {
        vec![
            Instruction::new(
                key(20),
                vec![AccountMeta::new(key(2), false), AccountMeta::new_readonly(key(3), true)],
                vec![1, 2, 3],
            ),
            Instruction::new(key(21), vec![AccountMeta::new_readonly(key(2), false)], vec![]),
        ]
    }

    #[test]
    fn test_compile_rejects_empty() {
        let err = Message::compile(&key(1), &[], Hash::default()).unwrap_err();
        assert_eq!(err, CompileError::EmptyInstructions);
    }

    #[test]
    fn test_compile_maps_indices() {
        let blockhash = Hash::new([7u8; 32]);
        let message = Message::compile(&key(1), &sample_instructions(), blockhash).unwrap();

        // payer, key3 (signer ro), key2 (w), program 20, program 21
        assert_eq!(message.account_keys, vec![key(1), key(3), key(2), key(20), key(21)]);
        assert_eq!(
            message.header,
            MessageHeader {
                num_required_signatures: 2,
                num_readonly_signed_accounts: 1,
                num_readonly_unsigned_accounts: 2,
            }
        );
        assert_eq!(message.recent_blockhash, blockhash);
        assert_eq!(
            message.instructions,
            vec![
                CompiledInstruction {
                    program_index: 3,
                    accounts: vec![2, 1],
                    data: vec![1, 2, 3],
                },
                CompiledInstruction {
                    program_index: 4,
                    accounts: vec![2],
                    data: vec![],
                },
            ]
        );
        assert_eq!(message.signers(), &[key(1), key(3)]);
    }

    #[test]
    fn test_access_flags_from_header() {
        let message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        let flags: Vec<_> = (0..message.account_keys.len())
            .map(|i| (message.is_signer(i), message.is_writable(i)))
            .collect();
        assert_eq!(
            flags,
            vec![(true, true), (true, false), (false, true), (false, false), (false, false)]
        );
        assert!(!message.is_writable(99));
    }

    #[test]
    fn test_compile_rejects_oversized_data() {
        let ix = Instruction::new(key(2), vec![], vec![0u8; u16::MAX as usize + 1]);
        let err = Message::compile(&key(1), &[ix], Hash::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InstructionTooLarge {
                index: 0,
                field: "data bytes",
                ..
            }
        ));
    }

    #[test]
    fn test_compile_rejects_too_many_instructions() {
        let ix = Instruction::new(key(2), vec![], vec![]);
        let ixs = vec![ix; u16::MAX as usize + 1];
        let err = Message::compile(&key(1), &ixs, Hash::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::TooManyInstructions {
                count: 65536,
                max: 65535
            }
        );

        let message = Message::compile(&key(1), &ixs[1..], Hash::default()).unwrap();
        let parsed = Message::unmarshal(&message.marshal()).unwrap();
        assert_eq!(parsed.instructions.len(), 65535);
    }

    #[test]
    fn test_sanitize_rejects_oversized_arrays() {
        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.instructions[0].data = vec![0u8; u16::MAX as usize + 1];
        assert_eq!(message.sanitize(), Err(WireError::LengthOverflow(65536)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds compact-u16")]
    fn test_marshal_oversized_message_panics_in_debug() {
        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        let extra = message.instructions[1].clone();
        message.instructions.resize(u16::MAX as usize + 1, extra);
        message.marshal();
    }

    #[test]
    fn test_is_signer_bounded_by_keys() {
        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.header.num_required_signatures = 200;
        assert!(message.is_signer(4));
        assert!(!message.is_signer(5));
        assert!(!message.is_signer(199));
    }

    #[test]
    fn test_marshal_layout() {
        let ix = Instruction::new(key(2), vec![AccountMeta::new(key(3), false)], vec![9, 8]);
        let message = Message::compile(&key(1), &[ix], Hash::new([5u8; 32])).unwrap();
        let bytes = message.marshal();

        let mut expected = vec![1, 0, 1, 3];
        expected.extend_from_slice(&[1u8; 32]);
        expected.extend_from_slice(&[3u8; 32]);
        expected.extend_from_slice(&[2u8; 32]);
        expected.extend_from_slice(&[5u8; 32]);
        expected.extend_from_slice(&[1, 2, 1, 1, 2, 9, 8]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_unmarshal_roundtrip() {
        let message = Message::compile(&key(1), &sample_instructions(), Hash::new([4u8; 32])).unwrap();
        let parsed = Message::unmarshal(&message.marshal()).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_unmarshal_rejects_truncated_and_trailing() {
        let bytes = Message::compile(&key(1), &sample_instructions(), Hash::default())
            .unwrap()
            .marshal();
        assert_eq!(
            Message::unmarshal(&bytes[..bytes.len() - 1]),
            Err(WireError::UnexpectedEof)
        );
        let mut extra = bytes.clone();
        extra.push(0);
        assert_eq!(Message::unmarshal(&extra), Err(WireError::TrailingBytes(1)));
    }

    #[test]
    fn test_sanitize_rejects_bad_indices() {
        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.instructions[0].accounts.push(42);
        assert!(matches!(message.sanitize(), Err(WireError::InvalidMessage(_))));

        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.instructions[1].program_index = 0;
        assert!(matches!(message.sanitize(), Err(WireError::InvalidMessage(_))));
    }

    #[test]
    fn test_sanitize_rejects_bad_header() {
        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.header.num_readonly_signed_accounts = 2;
        assert!(message.sanitize().is_err());

        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.header.num_readonly_unsigned_accounts = 9;
        assert!(message.sanitize().is_err());

        let mut message = Message::compile(&key(1), &sample_instructions(), Hash::default()).unwrap();
        message.account_keys[4] = key(2);
        assert!(message.sanitize().is_err());
    }
}
