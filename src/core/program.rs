use crate::core::keypair::Keypair;
use crate::core::provider::Provider;
use crate::domain::model::{AccountMeta, Instruction, Pubkey, TxSignature};
use crate::utils::error::{HarnessError, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Custom program error codes start here for the program generation this client targets.
pub const ERROR_CODE_OFFSET: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramErrorDef {
    pub code: u32,
    pub name: &'static str,
    pub msg: &'static str,
}

/// Errors raised by the framework itself, below `ERROR_CODE_OFFSET`.
pub const FRAMEWORK_ERRORS: &[ProgramErrorDef] = &[
    ProgramErrorDef { code: 100, name: "InstructionMissing", msg: "8 byte instruction identifier not provided" },
    ProgramErrorDef { code: 101, name: "InstructionFallbackNotFound", msg: "Fallback functions are not supported" },
    ProgramErrorDef { code: 102, name: "InstructionDidNotDeserialize", msg: "The program could not deserialize the given instruction" },
    ProgramErrorDef { code: 140, name: "ConstraintMut", msg: "A mut constraint was violated" },
    ProgramErrorDef { code: 142, name: "ConstraintSigner", msg: "A signer constraint was violated" },
    ProgramErrorDef { code: 160, name: "AccountDiscriminatorAlreadySet", msg: "The account discriminator was already set on this account" },
    ProgramErrorDef { code: 161, name: "AccountDiscriminatorNotFound", msg: "No 8 byte discriminator was found on the account" },
    ProgramErrorDef { code: 162, name: "AccountDiscriminatorMismatch", msg: "8 byte discriminator did not match what was expected" },
    ProgramErrorDef { code: 163, name: "AccountDidNotDeserialize", msg: "Failed to deserialize the account" },
    ProgramErrorDef { code: 166, name: "AccountNotMutable", msg: "The given account is not mutable" },
    ProgramErrorDef { code: 167, name: "AccountNotProgramOwned", msg: "The given account is not owned by the executing program" },
];

/// `setupGame` / `setup_game` -> `setup_game`; a run of capitals stays one word (`ABTest` -> `ab_test`).
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '-' {
            out.push('_');
            continue;
        }
        if ch.is_ascii_uppercase() && i > 0 && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    sighash("global", &to_snake_case(name))
}

pub fn account_discriminator(type_name: &str) -> [u8; 8] {
    sighash("account", type_name)
}

/// Pulls `{"Custom": n}` out of an `InstructionError` transaction error.
pub fn custom_error_code(err: &Value) -> Option<u32> {
    let detail = err.get("InstructionError")?.get(1)?;
    detail.get("Custom")?.as_u64().and_then(|c| u32::try_from(c).ok())
}

/// Client handle for one deployed program.
#[derive(Debug, Clone)]
pub struct Program {
    id: Pubkey,
    name: String,
    errors: &'static [ProgramErrorDef],
}

impl Program {
    pub fn new(id: Pubkey, name: impl Into<String>, errors: &'static [ProgramErrorDef]) -> Self {
        Self {
            id,
            name: name.into(),
            errors,
        }
    }

    pub fn id(&self) -> Pubkey {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookup_error(&self, code: u32) -> Option<&ProgramErrorDef> {
        self.errors
            .iter()
            .chain(FRAMEWORK_ERRORS.iter())
            .find(|def| def.code == code)
    }

    pub fn error(&self, code: u32) -> HarnessError {
        match self.lookup_error(code) {
            Some(def) => HarnessError::ProgramError {
                code: def.code,
                name: def.name.to_string(),
                msg: def.msg.to_string(),
            },
            None => HarnessError::ProgramError {
                code,
                name: "Unknown".to_string(),
                msg: format!("custom program error: {:#x}", code),
            },
        }
    }

    /// Rewrites preflight and confirmation failures carrying a custom code into `ProgramError`.
    pub fn translate_error(&self, err: HarnessError) -> HarnessError {
        let tx_err = match &err {
            HarnessError::RpcError { data: Some(data), .. } => data.get("err"),
            HarnessError::TransactionFailedError { err, .. } => Some(err),
            _ => None,
        };
        match tx_err.and_then(custom_error_code) {
            Some(code) => {
                if let HarnessError::RpcError { data: Some(data), .. } = &err {
                    if let Some(logs) = data.get("logs").and_then(Value::as_array) {
                        for line in logs.iter().filter_map(Value::as_str) {
                            tracing::debug!("{}", line);
                        }
                    }
                }
                self.error(code)
            }
            None => err,
        }
    }

    pub fn instruction<A: BorshSerialize>(
        &self,
        name: &str,
        args: &A,
        accounts: Vec<AccountMeta>,
    ) -> Result<Instruction> {
        let mut data = instruction_discriminator(name).to_vec();
        args.serialize(&mut data)?;
        Ok(Instruction {
            program_id: self.id,
            accounts,
            data,
        })
    }

    pub async fn send(
        &self,
        provider: &Provider,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<TxSignature> {
        provider
            .send_and_confirm(instructions, signers)
            .await
            .map_err(|e| self.translate_error(e))
    }

    /// Builds, signs, sends and confirms a single instruction.
    pub async fn rpc<A: BorshSerialize>(
        &self,
        provider: &Provider,
        name: &str,
        args: &A,
        accounts: Vec<AccountMeta>,
        signers: &[&Keypair],
    ) -> Result<TxSignature> {
        let ix = self.instruction(name, args, accounts)?;
        tracing::debug!("{}::{} with {} data bytes", self.name, name, ix.data.len());
        let signature = self.send(provider, &[ix], signers).await?;
        tracing::info!("Your transaction signature {}", signature);
        Ok(signature)
    }

    /// Fetches and decodes an account of `type_name` owned by this program.
    pub async fn fetch_account<T: BorshDeserialize>(
        &self,
        provider: &Provider,
        address: &Pubkey,
        type_name: &str,
    ) -> Result<T> {
        let account = provider
            .rpc()
            .get_account_info(address, provider.commitment())
            .await?
            .ok_or_else(|| HarnessError::decode(format!("account {} does not exist", address)))?;

        if account.owner != self.id {
            return Err(HarnessError::decode(format!(
                "account {} is owned by {}, not {}",
                address, account.owner, self.id
            )));
        }
        self.decode_account(&account.data, type_name)
    }

    pub fn decode_account<T: BorshDeserialize>(&self, data: &[u8], type_name: &str) -> Result<T> {
        if data.len() < 8 || data[..8] != account_discriminator(type_name) {
            return Err(HarnessError::decode(format!(
                "account data is not a {}",
                type_name
            )));
        }
        // accounts are allocated at max size, so trailing zero bytes are expected
        let mut body = &data[8..];
        T::deserialize(&mut body)
            .map_err(|e| HarnessError::decode(format!("{} did not deserialize: {}", type_name, e)))
    }
}
