use crate::domain::model::Commitment;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Wire seam between the typed RPC client and the cluster endpoint.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value>;
}

pub trait ProviderSettings: Send + Sync {
    fn cluster_url(&self) -> &str;
    fn wallet_path(&self) -> &str;
    fn commitment(&self) -> Commitment;
    fn confirm_timeout(&self) -> Duration;
    fn skip_preflight(&self) -> bool {
        false
    }
}
