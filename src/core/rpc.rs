use crate::domain::model::{AccountInfo, Commitment, Hash, Pubkey, SignatureStatus, TxSignature};
use crate::domain::ports::RpcTransport;
use crate::utils::error::{HarnessError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

#[async_trait::async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!("RPC request #{} {} -> {}", id, method, self.endpoint);
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarnessError::RpcHttpError {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcEnvelope = response.json().await?;
        if let Some(error) = envelope.error {
            tracing::debug!("RPC #{} {} error {}: {}", id, method, error.code, error.message);
            return Err(HarnessError::RpcError {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        envelope
            .result
            .ok_or_else(|| HarnessError::InvalidResponseError {
                message: format!("{} response has neither result nor error", method),
            })
    }
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAccount {
    data: (String, String),
    executable: bool,
    lamports: u64,
    owner: String,
    #[serde(default)]
    rent_epoch: u64,
}

impl RawAccount {
    fn into_account_info(self) -> Result<AccountInfo> {
        if self.data.1 != "base64" {
            return Err(HarnessError::InvalidResponseError {
                message: format!("unexpected account data encoding '{}'", self.data.1),
            });
        }
        let data = BASE64
            .decode(self.data.0.as_bytes())
            .map_err(|e| HarnessError::decode(format!("account data is not base64: {}", e)))?;
        Ok(AccountInfo {
            lamports: self.lamports,
            owner: self.owner.parse()?,
            data,
            executable: self.executable,
            rent_epoch: self.rent_epoch,
        })
    }
}

fn from_result<T: serde::de::DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| HarnessError::InvalidResponseError {
        message: format!("{} result could not be parsed: {}", method, e),
    })
}

/// Typed view over the handful of cluster RPC methods a program client needs.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    poll_interval: Duration,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(endpoint)?)))
    }

    pub fn with_transport(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<(Hash, u64)> {
        let method = "getLatestBlockhash";
        let result = self
            .transport
            .call(method, json!([{ "commitment": commitment }]))
            .await?;
        let parsed: WithContext<BlockhashValue> = from_result(method, result)?;
        Ok((
            parsed.value.blockhash.parse()?,
            parsed.value.last_valid_block_height,
        ))
    }

    pub async fn send_transaction(
        &self,
        wire_transaction: &[u8],
        preflight_commitment: Commitment,
        skip_preflight: bool,
    ) -> Result<TxSignature> {
        let method = "sendTransaction";
        let encoded = BASE64.encode(wire_transaction);
        let result = self
            .transport
            .call(
                method,
                json!([
                    encoded,
                    {
                        "encoding": "base64",
                        "skipPreflight": skip_preflight,
                        "preflightCommitment": preflight_commitment,
                    }
                ]),
            )
            .await?;
        let signature: String = from_result(method, result)?;
        signature.parse()
    }

    pub async fn get_signature_statuses(
        &self,
        signatures: &[TxSignature],
    ) -> Result<Vec<Option<SignatureStatus>>> {
        let method = "getSignatureStatuses";
        let encoded: Vec<String> = signatures.iter().map(|s| s.to_string()).collect();
        let result = self
            .transport
            .call(
                method,
                json!([encoded, { "searchTransactionHistory": true }]),
            )
            .await?;
        let parsed: WithContext<Vec<Option<SignatureStatus>>> = from_result(method, result)?;
        Ok(parsed.value)
    }

    pub async fn get_account_info(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Option<AccountInfo>> {
        let method = "getAccountInfo";
        let result = self
            .transport
            .call(
                method,
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": commitment }
                ]),
            )
            .await?;
        let parsed: WithContext<Option<RawAccount>> = from_result(method, result)?;
        parsed.value.map(RawAccount::into_account_info).transpose()
    }

    pub async fn get_balance(&self, address: &Pubkey, commitment: Commitment) -> Result<u64> {
        let method = "getBalance";
        let result = self
            .transport
            .call(
                method,
                json!([address.to_string(), { "commitment": commitment }]),
            )
            .await?;
        let parsed: WithContext<u64> = from_result(method, result)?;
        Ok(parsed.value)
    }

    pub async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
        commitment: Commitment,
    ) -> Result<TxSignature> {
        let method = "requestAirdrop";
        let result = self
            .transport
            .call(
                method,
                json!([address.to_string(), lamports, { "commitment": commitment }]),
            )
            .await?;
        let signature: String = from_result(method, result)?;
        signature.parse()
    }

    pub async fn get_minimum_balance_for_rent_exemption(&self, space: usize) -> Result<u64> {
        let method = "getMinimumBalanceForRentExemption";
        let result = self.transport.call(method, json!([space])).await?;
        from_result(method, result)
    }

    /// Polls the signature status until it reaches `commitment`.
    pub async fn confirm_transaction(
        &self,
        signature: &TxSignature,
        commitment: Commitment,
        timeout: Duration,
    ) -> Result<SignatureStatus> {
        let started = Instant::now();
        loop {
            let statuses = self.get_signature_statuses(std::slice::from_ref(signature)).await?;
            if let Some(Some(status)) = statuses.into_iter().next() {
                if let Some(err) = status.err.clone() {
                    return Err(HarnessError::TransactionFailedError {
                        signature: signature.to_string(),
                        err,
                    });
                }
                if status.satisfies(commitment) {
                    tracing::debug!(
                        "{} reached {} at slot {}",
                        signature,
                        commitment,
                        status.slot
                    );
                    return Ok(status);
                }
            }

            if started.elapsed() >= timeout {
                return Err(HarnessError::ConfirmationTimeoutError {
                    signature: signature.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
