//! Legacy Solana transaction layout.
//!
//! ```text
//! transaction = shortvec<signature[64]> message
//! message     = header[3] shortvec<pubkey[32]> blockhash[32] shortvec<instruction>
//! instruction = program_index:u8 shortvec<u8 account_index> shortvec<u8 data>
//! ```

use crate::core::keypair::Keypair;
use crate::domain::model::{Hash, Instruction, Pubkey, TxSignature};
use crate::utils::error::{HarnessError, Result};

/// Appends a compact-u16 length prefix.
pub fn encode_shortvec_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let mut rem = u16::try_from(len).map_err(|_| HarnessError::SigningError {
        message: format!("length {} does not fit a compact-u16", len),
    })?;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return Ok(());
        }
        byte |= 0x80;
        out.push(byte);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Clone, Copy)]
struct KeyFlags {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

impl Message {
    pub fn compile(instructions: &[Instruction], payer: &Pubkey, recent_blockhash: Hash) -> Result<Self> {
        let mut keys: Vec<KeyFlags> = vec![KeyFlags {
            pubkey: *payer,
            is_signer: true,
            is_writable: true,
        }];

        let mut upsert = |pubkey: Pubkey, is_signer: bool, is_writable: bool| {
            if let Some(existing) = keys.iter_mut().find(|k| k.pubkey == pubkey) {
                existing.is_signer |= is_signer;
                existing.is_writable |= is_writable;
            } else {
                keys.push(KeyFlags {
                    pubkey,
                    is_signer,
                    is_writable,
                });
            }
        };

        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // stable sort keeps first-seen order within each class; payer stays at index 0
        let payer_entry = keys.remove(0);
        keys.sort_by_key(|k| match (k.is_signer, k.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });
        keys.insert(0, payer_entry);

        if keys.len() > u8::MAX as usize {
            return Err(HarnessError::SigningError {
                message: format!("too many accounts in transaction: {}", keys.len()),
            });
        }

        let header = MessageHeader {
            num_required_signatures: keys.iter().filter(|k| k.is_signer).count() as u8,
            num_readonly_signed_accounts: keys
                .iter()
                .filter(|k| k.is_signer && !k.is_writable)
                .count() as u8,
            num_readonly_unsigned_accounts: keys
                .iter()
                .filter(|k| !k.is_signer && !k.is_writable)
                .count() as u8,
        };

        let account_keys: Vec<Pubkey> = keys.iter().map(|k| k.pubkey).collect();
        let index_of = |pubkey: &Pubkey| -> u8 {
            // every key was inserted above
            account_keys.iter().position(|k| k == pubkey).unwrap_or_default() as u8
        };

        let compiled = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = vec![
            self.header.num_required_signatures,
            self.header.num_readonly_signed_accounts,
            self.header.num_readonly_unsigned_accounts,
        ];
        encode_shortvec_len(&mut out, self.account_keys.len())?;
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash.0);
        encode_shortvec_len(&mut out, self.instructions.len())?;
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_shortvec_len(&mut out, ix.accounts.len())?;
            out.extend_from_slice(&ix.accounts);
            encode_shortvec_len(&mut out, ix.data.len())?;
            out.extend_from_slice(&ix.data);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: Message,
}

impl Transaction {
    /// Compiles and signs. `payer` pays fees; every other signer account must
    /// have a keypair in `signers`.
    pub fn new_signed(
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
        recent_blockhash: Hash,
    ) -> Result<Self> {
        let message = Message::compile(instructions, &payer.pubkey(), recent_blockhash)?;
        let message_bytes = message.serialize()?;

        let mut signatures = Vec::with_capacity(message.signer_keys().len());
        for key in message.signer_keys() {
            let keypair = if *key == payer.pubkey() {
                payer
            } else {
                signers
                    .iter()
                    .copied()
                    .find(|kp| kp.pubkey() == *key)
                    .ok_or_else(|| HarnessError::SigningError {
                        message: format!("missing keypair for signer {}", key),
                    })?
            };
            signatures.push(keypair.sign(&message_bytes));
        }

        Ok(Self {
            signatures,
            message,
        })
    }

    pub fn signature(&self) -> TxSignature {
        TxSignature(self.signatures[0])
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode_shortvec_len(&mut out, self.signatures.len())?;
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out.extend(self.message.serialize()?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AccountMeta;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    fn key(byte: u8) -> Pubkey {
        Pubkey([byte; 32])
    }

    #[test]
    fn test_shortvec_encoding() {
        let cases: [(usize, &[u8]); 5] = [
            (0, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0x3fff, &[0xff, 0x7f]),
            (0x4000, &[0x80, 0x80, 0x01]),
        ];
        for (len, expected) in cases {
            let mut out = Vec::new();
            encode_shortvec_len(&mut out, len).unwrap();
            assert_eq!(out, expected, "len {}", len);
        }
        assert!(encode_shortvec_len(&mut Vec::new(), 70_000).is_err());
    }

    #[test]
    fn test_account_ordering_and_header() {
        let payer = key(1);
        let program = key(9);
        let ix = Instruction {
            program_id: program,
            accounts: vec![
                AccountMeta::readonly(key(5), false),
                AccountMeta::writable(key(4), false),
                AccountMeta::readonly(key(3), true),
                AccountMeta::writable(key(2), true),
                AccountMeta::writable(payer, true),
            ],
            data: vec![1, 2],
        };

        let message = Message::compile(&[ix], &payer, Hash::default()).unwrap();
        assert_eq!(
            message.account_keys,
            vec![payer, key(2), key(3), key(4), key(5), program]
        );
        assert_eq!(
            message.header,
            MessageHeader {
                num_required_signatures: 3,
                num_readonly_signed_accounts: 1,
                num_readonly_unsigned_accounts: 2,
            }
        );
        assert_eq!(message.instructions[0].program_id_index, 5);
        assert_eq!(message.instructions[0].accounts, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_flags_merge_across_instructions() {
        let payer = key(1);
        let shared = key(7);
        let first = Instruction {
            program_id: key(9),
            accounts: vec![AccountMeta::readonly(shared, false)],
            data: vec![],
        };
        let second = Instruction {
            program_id: key(9),
            accounts: vec![AccountMeta::writable(shared, false)],
            data: vec![],
        };

        let message = Message::compile(&[first, second], &payer, Hash::default()).unwrap();
        assert_eq!(message.account_keys, vec![payer, shared, key(9)]);
        assert_eq!(message.header.num_readonly_unsigned_accounts, 1);
    }

    #[test]
    fn test_instruction_without_accounts_serializes() {
        let payer = Keypair::from_seed([1u8; 32]);
        let ix = Instruction {
            program_id: key(9),
            accounts: vec![],
            data: vec![0xaa; 8],
        };
        let blockhash = Hash([3u8; 32]);
        let tx = Transaction::new_signed(&[ix], &payer, &[], blockhash).unwrap();
        let bytes = tx.serialize().unwrap();

        // 1 signature + header + 2 keys + blockhash + 1 instruction(idx, 0 accounts, 8 data)
        assert_eq!(bytes.len(), 1 + 64 + 3 + 1 + 64 + 32 + 1 + 1 + 1 + 1 + 8);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[65..68], &[1, 0, 1]);

        let message = tx.message.serialize().unwrap();
        let verifying = VerifyingKey::from_bytes(payer.pubkey().as_bytes()).unwrap();
        let sig = Signature::from_bytes(tx.signature().as_bytes());
        assert!(verifying.verify(&message, &sig).is_ok());
    }

    #[test]
    fn test_missing_signer_is_rejected() {
        let payer = Keypair::from_seed([1u8; 32]);
        let ix = Instruction {
            program_id: key(9),
            accounts: vec![AccountMeta::writable(key(4), true)],
            data: vec![],
        };
        let result = Transaction::new_signed(&[ix], &payer, &[], Hash::default());
        assert!(matches!(result, Err(HarnessError::SigningError { .. })));
    }
}
