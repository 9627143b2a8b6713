//! System program: durable nonce advancement and lamport transfers
//!
//! Instruction data starts with a little-endian `u32` discriminator.

use super::{expect_len, DecompileError, ResolvedInstruction};
use crate::solana::wire::Reader;
use crate::solana::{AccountMeta, Instruction, Message, PublicKey};

/// `11111111111111111111111111111111`
pub const PROGRAM_ID: PublicKey = PublicKey::new([0u8; 32]);

/// `SysvarRecentB1ockHashes11111111111111111111`
pub const RECENT_BLOCKHASHES_SYSVAR: PublicKey = PublicKey::new([
    6, 167, 213, 23, 25, 44, 86, 142, 224, 138, 132, 95, 115, 210, 151, 136, 207, 3, 92, 49, 69,
    178, 26, 179, 68, 216, 6, 46, 169, 64, 0, 0,
]);

const TAG_TRANSFER: u32 = 2;
const TAG_ADVANCE_NONCE: u32 = 4;

fn read_tag(data: &[u8]) -> Result<u32, DecompileError> {
    Reader::new(data)
        .read_u32_le()
        .map_err(|_| DecompileError::malformed("missing system instruction discriminator"))
}

fn expect_tag(data: &[u8], tag: u32, name: &'static str) -> Result<(), DecompileError> {
    let actual = read_tag(data)?;
    if actual != tag {
        return Err(DecompileError::WrongVariant {
            expected: name,
            actual,
        });
    }
    Ok(())
}

/// Advance a durable nonce account, replacing its stored value.
///
/// Accounts: `[nonce (writable), RecentBlockhashes sysvar, authority (signer)]`.
/// Data: `[4, 0, 0, 0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceNonce {
    pub nonce: PublicKey,
    pub authority: PublicKey,
}

impl AdvanceNonce {
    pub fn instruction(&self) -> Instruction {
        Instruction::new(
            PROGRAM_ID,
            vec![
                AccountMeta::new(self.nonce, false),
                AccountMeta::new_readonly(RECENT_BLOCKHASHES_SYSVAR, false),
                AccountMeta::new_readonly(self.authority, true),
            ],
            TAG_ADVANCE_NONCE.to_le_bytes().to_vec(),
        )
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        let data = resolved.data();
        expect_tag(data, TAG_ADVANCE_NONCE, "AdvanceNonceAccount")?;
        expect_len(data, 4, "AdvanceNonceAccount")?;

        let [nonce, sysvar, authority] = resolved.accounts::<3>()?;
        if sysvar != RECENT_BLOCKHASHES_SYSVAR {
            return Err(DecompileError::malformed(format!(
                "expected RecentBlockhashes sysvar, got {}",
                sysvar
            )));
        }

        Ok(Self { nonce, authority })
    }

    /// Cheap check on an uncompiled instruction.
    pub fn matches(ix: &Instruction) -> bool {
        ix.program == PROGRAM_ID && read_tag(&ix.data).ok() == Some(TAG_ADVANCE_NONCE)
    }
}

/// Move lamports between two system accounts.
///
/// Accounts: `[from (signer, writable), to (writable)]`.
/// Data: `[2, 0, 0, 0] ++ lamports as u64 LE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTransfer {
    pub from: PublicKey,
    pub to: PublicKey,
    pub lamports: u64,
}

impl SystemTransfer {
    pub fn instruction(&self) -> Instruction {
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&TAG_TRANSFER.to_le_bytes());
        data.extend_from_slice(&self.lamports.to_le_bytes());
        Instruction::new(
            PROGRAM_ID,
            vec![AccountMeta::new(self.from, true), AccountMeta::new(self.to, false)],
            data,
        )
    }

    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        let data = resolved.data();
        expect_tag(data, TAG_TRANSFER, "Transfer")?;
        expect_len(data, 12, "Transfer")?;

        let mut reader = Reader::new(&data[4..]);
        let lamports = reader
            .read_u64_le()
            .map_err(|e| DecompileError::malformed(e.to_string()))?;
        let [from, to] = resolved.accounts::<2>()?;

        Ok(Self { from, to, lamports })
    }
}

/// The system program operations this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemInstruction {
    AdvanceNonceAccount(AdvanceNonce),
    Transfer(SystemTransfer),
}

impl SystemInstruction {
    pub fn instruction(&self) -> Instruction {
        match self {
            Self::AdvanceNonceAccount(ix) => ix.instruction(),
            Self::Transfer(ix) => ix.instruction(),
        }
    }

    /// Decode by reading the discriminator.
    pub fn decompile(message: &Message, index: usize) -> Result<Self, DecompileError> {
        let resolved = ResolvedInstruction::resolve(message, index, &PROGRAM_ID)?;
        match read_tag(resolved.data())? {
            TAG_ADVANCE_NONCE => AdvanceNonce::decompile(message, index).map(Self::AdvanceNonceAccount),
            TAG_TRANSFER => SystemTransfer::decompile(message, index).map(Self::Transfer),
            actual => Err(DecompileError::WrongVariant {
                expected: "AdvanceNonceAccount or Transfer",
                actual,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::Hash;
    use proptest::prelude::*;

    fn key(n: u8) -> PublicKey {
        PublicKey::new([n; 32])
    }

    #[test]
    fn test_sysvar_address() {
        assert_eq!(
            RECENT_BLOCKHASHES_SYSVAR.to_string(),
            "SysvarRecentB1ockHashes11111111111111111111"
        );
    }

    #[test]
    fn test_advance_nonce_layout() {
        let ix = AdvanceNonce {
            nonce: key(2),
            authority: key(3),
        }
        .instruction();
        assert_eq!(ix.program, PROGRAM_ID);
        assert_eq!(ix.data, vec![4, 0, 0, 0]);
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new(key(2), false),
                AccountMeta::new_readonly(RECENT_BLOCKHASHES_SYSVAR, false),
                AccountMeta::new_readonly(key(3), true),
            ]
        );
        assert!(AdvanceNonce::matches(&ix));
    }

    #[test]
    fn test_advance_nonce_roundtrip() {
        let params = AdvanceNonce {
            nonce: key(2),
            authority: key(1),
        };
        let message = Message::compile(&key(1), &[params.instruction()], Hash::default()).unwrap();
        assert_eq!(AdvanceNonce::decompile(&message, 0).unwrap(), params);
    }

    #[test]
    fn test_transfer_layout() {
        let ix = SystemTransfer {
            from: key(1),
            to: key(2),
            lamports: 0x0102,
        }
        .instruction();
        assert_eq!(ix.data, vec![2, 0, 0, 0, 2, 1, 0, 0, 0, 0, 0, 0]);
        assert!(!AdvanceNonce::matches(&ix));
    }

    #[test]
    fn test_wrong_variant() {
        let ix = SystemTransfer {
            from: key(1),
            to: key(2),
            lamports: 1,
        }
        .instruction();
        let message = Message::compile(&key(1), &[ix], Hash::default()).unwrap();
        assert_eq!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::WrongVariant {
                expected: "AdvanceNonceAccount",
                actual: 2
            })
        );
    }

    #[test]
    fn test_wrong_program() {
        let ix = Instruction::new(key(9), vec![], vec![4, 0, 0, 0]);
        let message = Message::compile(&key(1), &[ix], Hash::default()).unwrap();
        assert!(matches!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::WrongProgram { .. })
        ));
    }

    #[test]
    fn test_malformed_data_and_accounts() {
        let short = Instruction::new(PROGRAM_ID, vec![], vec![4, 0]);
        let message = Message::compile(&key(1), &[short], Hash::default()).unwrap();
        assert!(matches!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::Malformed(_))
        ));

        let long = Instruction::new(PROGRAM_ID, vec![], vec![4, 0, 0, 0, 9]);
        let message = Message::compile(&key(1), &[long], Hash::default()).unwrap();
        assert!(matches!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::Malformed(_))
        ));

        let missing_accounts = Instruction::new(
            PROGRAM_ID,
            vec![AccountMeta::new(key(2), false)],
            vec![4, 0, 0, 0],
        );
        let message = Message::compile(&key(1), &[missing_accounts], Hash::default()).unwrap();
        assert!(matches!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::Malformed(_))
        ));

        let wrong_sysvar = Instruction::new(
            PROGRAM_ID,
            vec![
                AccountMeta::new(key(2), false),
                AccountMeta::new_readonly(key(5), false),
                AccountMeta::new_readonly(key(1), true),
            ],
            vec![4, 0, 0, 0],
        );
        let message = Message::compile(&key(1), &[wrong_sysvar], Hash::default()).unwrap();
        assert!(matches!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::Malformed(_))
        ));
    }

    #[test]
    fn test_account_index_out_of_range() {
        let params = AdvanceNonce {
            nonce: key(2),
            authority: key(1),
        };
        let mut message = Message::compile(&key(1), &[params.instruction()], Hash::default()).unwrap();
        message.instructions[0].accounts[2] = 250;
        assert_eq!(
            AdvanceNonce::decompile(&message, 0),
            Err(DecompileError::AccountIndexOutOfRange {
                index: 250,
                len: message.account_keys.len()
            })
        );
    }

    #[test]
    fn test_dispatch_unknown_tag() {
        let ix = Instruction::new(PROGRAM_ID, vec![], vec![9, 0, 0, 0]);
        let message = Message::compile(&key(1), &[ix], Hash::default()).unwrap();
        assert!(matches!(
            SystemInstruction::decompile(&message, 0),
            Err(DecompileError::WrongVariant { actual: 9, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_system_roundtrip(
            a in any::<[u8; 32]>(),
            b in any::<[u8; 32]>(),
            payer in any::<[u8; 32]>(),
            lamports in any::<u64>(),
        ) {
            let payer = PublicKey::new(payer);
            let variants = [
                SystemInstruction::AdvanceNonceAccount(AdvanceNonce {
                    nonce: PublicKey::new(a),
                    authority: PublicKey::new(b),
                }),
                SystemInstruction::Transfer(SystemTransfer {
                    from: PublicKey::new(a),
                    to: PublicKey::new(b),
                    lamports,
                }),
            ];
            for params in variants {
                let message = Message::compile(&payer, &[params.instruction()], Hash::default()).unwrap();
                prop_assert_eq!(SystemInstruction::decompile(&message, 0).unwrap(), params);
            }
        }
    }
}
