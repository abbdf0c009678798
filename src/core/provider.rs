use crate::core::keypair::Keypair;
use crate::core::rpc::RpcClient;
use crate::core::transaction::Transaction;
use crate::domain::model::{Commitment, Instruction, Pubkey, TxSignature};
use crate::domain::ports::ProviderSettings;
use crate::utils::error::{HarnessError, Result};
use std::sync::OnceLock;
use std::time::Duration;

pub const PROVIDER_URL_ENV: &str = "ANCHOR_PROVIDER_URL";
pub const WALLET_ENV: &str = "ANCHOR_WALLET";
pub const LOCALNET_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_WALLET_PATH: &str = "~/.config/solana/id.json";
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

static PROVIDER: OnceLock<Provider> = OnceLock::new();

/// Connection plus signing context used for every program call.
#[derive(Clone)]
pub struct Provider {
    rpc: RpcClient,
    wallet: Keypair,
    commitment: Commitment,
    preflight_commitment: Commitment,
    skip_preflight: bool,
    confirm_timeout: Duration,
}

impl Provider {
    pub fn new(rpc: RpcClient, wallet: Keypair) -> Self {
        Self {
            rpc,
            wallet,
            commitment: Commitment::Processed,
            preflight_commitment: Commitment::Processed,
            skip_preflight: false,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    /// Reads `ANCHOR_PROVIDER_URL` and `ANCHOR_WALLET`, both required.
    pub fn env() -> Result<Self> {
        let url = std::env::var(PROVIDER_URL_ENV).map_err(|_| HarnessError::MissingConfigError {
            field: PROVIDER_URL_ENV.to_string(),
        })?;
        let wallet_path = std::env::var(WALLET_ENV).map_err(|_| HarnessError::MissingConfigError {
            field: WALLET_ENV.to_string(),
        })?;
        crate::utils::validation::validate_url(PROVIDER_URL_ENV, &url)?;

        tracing::debug!("Provider from env: {} (wallet {})", url, wallet_path);
        Ok(Self::new(
            RpcClient::new(&url)?,
            Keypair::read_from_file(&wallet_path)?,
        ))
    }

    pub fn local() -> Result<Self> {
        Ok(Self::new(
            RpcClient::new(LOCALNET_URL)?,
            Keypair::read_from_file(DEFAULT_WALLET_PATH)?,
        ))
    }

    pub fn from_settings<S: ProviderSettings + ?Sized>(settings: &S) -> Result<Self> {
        let commitment = settings.commitment();
        Ok(Self::new(
            RpcClient::new(settings.cluster_url())?,
            Keypair::read_from_file(settings.wallet_path())?,
        )
        .with_commitment(commitment)
        .with_preflight_commitment(commitment)
        .with_skip_preflight(settings.skip_preflight())
        .with_confirm_timeout(settings.confirm_timeout()))
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn with_preflight_commitment(mut self, commitment: Commitment) -> Self {
        self.preflight_commitment = commitment;
        self
    }

    pub fn with_skip_preflight(mut self, skip: bool) -> Self {
        self.skip_preflight = skip;
        self
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn wallet(&self) -> &Keypair {
        &self.wallet
    }

    pub fn wallet_pubkey(&self) -> Pubkey {
        self.wallet.pubkey()
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Signs with the wallet as fee payer, sends with preflight and waits for `commitment`.
    pub async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<TxSignature> {
        let (blockhash, _) = self.rpc.get_latest_blockhash(self.preflight_commitment).await?;
        let tx = Transaction::new_signed(instructions, &self.wallet, signers, blockhash)?;
        let local_signature = tx.signature();

        let signature = self
            .rpc
            .send_transaction(&tx.serialize()?, self.preflight_commitment, self.skip_preflight)
            .await?;
        if signature != local_signature {
            tracing::warn!(
                "Cluster returned signature {} but transaction was signed as {}",
                signature,
                local_signature
            );
        }

        self.rpc
            .confirm_transaction(&signature, self.commitment, self.confirm_timeout)
            .await?;
        Ok(signature)
    }

    pub async fn airdrop(&self, lamports: u64) -> Result<TxSignature> {
        let recipient = self.wallet_pubkey();
        let signature = self
            .rpc
            .request_airdrop(&recipient, lamports, self.commitment)
            .await?;
        self.rpc
            .confirm_transaction(&signature, self.commitment, self.confirm_timeout)
            .await?;
        tracing::info!("Airdropped {} lamports to {}", lamports, recipient);
        Ok(signature)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("wallet", &self.wallet)
            .field("commitment", &self.commitment)
            .field("preflight_commitment", &self.preflight_commitment)
            .field("confirm_timeout", &self.confirm_timeout)
            .finish()
    }
}

/// Installs the process-wide provider. Only the first call wins.
pub fn set_provider(provider: Provider) -> Result<()> {
    PROVIDER
        .set(provider)
        .map_err(|_| HarnessError::config("provider has already been configured"))
}

pub fn provider() -> Result<&'static Provider> {
    PROVIDER
        .get()
        .ok_or_else(|| HarnessError::config("provider is not configured; call set_provider first"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_provider_is_set_once() {
        let rpc = RpcClient::new(LOCALNET_URL).unwrap();
        let first = Provider::new(rpc.clone(), Keypair::from_seed([1u8; 32]));
        let second = Provider::new(rpc, Keypair::from_seed([2u8; 32]));

        set_provider(first).unwrap();
        assert!(set_provider(second).is_err());
        assert_eq!(
            provider().unwrap().wallet_pubkey(),
            Keypair::from_seed([1u8; 32]).pubkey()
        );
    }
}
