use crate::domain::model::Pubkey;
use crate::utils::error::{HarnessError, Result};
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Expands a leading `~/` against `HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// ed25519 keypair in the Solana CLI file layout (64-byte JSON array).
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| HarnessError::SigningError {
            message: format!("keypair must be 64 bytes, got {}", bytes.len()),
        })?;
        let signing_key =
            SigningKey::from_keypair_bytes(bytes).map_err(|e| HarnessError::SigningError {
                message: format!("public half does not match secret key: {}", e),
            })?;
        Ok(Self { signing_key })
    }

    pub fn read_from_file(path: &str) -> Result<Self> {
        let full_path = expand_home(path);
        let raw = fs::read_to_string(&full_path).map_err(|e| HarnessError::ConfigError {
            message: format!("failed to read keypair {}: {}", full_path.display(), e),
        })?;
        let bytes: Vec<u8> = serde_json::from_str(raw.trim())?;
        Self::from_bytes(&bytes)
    }

    pub fn write_to_file(&self, path: &str) -> Result<()> {
        let full_path = expand_home(path);
        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = self.signing_key.to_keypair_bytes().to_vec();
        fs::write(full_path, serde_json::to_string(&bytes)?)?;
        Ok(())
    }

    /// Loads the keypair at `path`, generating and saving one if the file is absent.
    pub fn read_or_create(path: &str) -> Result<Self> {
        if expand_home(path).exists() {
            return Self::read_from_file(path);
        }
        let keypair = Self::generate();
        keypair.write_to_file(path)?;
        tracing::info!("Generated keypair {} at {}", keypair.pubkey(), path);
        Ok(keypair)
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.pubkey())
    }
}
