use crate::utils::error::{HarnessError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_ANCHOR_TOML: &str = "Anchor.toml";

/// Subset of the workspace manifest (`Anchor.toml`) the client needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorToml {
    #[serde(default)]
    pub provider: Option<ProviderSection>,
    /// cluster -> program name -> program id
    #[serde(default)]
    pub programs: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSection {
    pub cluster: Option<String>,
    pub wallet: Option<String>,
}

/// Maps a cluster moniker to its RPC URL; URLs pass through.
pub fn cluster_url(cluster: &str) -> Result<String> {
    let url = match cluster.trim().to_ascii_lowercase().as_str() {
        "localnet" | "localhost" => "http://127.0.0.1:8899".to_string(),
        "devnet" => "https://api.devnet.solana.com".to_string(),
        "testnet" => "https://api.testnet.solana.com".to_string(),
        "mainnet" | "mainnet-beta" => "https://api.mainnet-beta.solana.com".to_string(),
        _ => cluster.trim().to_string(),
    };
    validation::validate_url("cluster", &url)?;
    Ok(url)
}

/// Name of the `[programs.*]` table for a cluster moniker or URL.
pub fn cluster_key(cluster: &str) -> &'static str {
    match cluster.trim().to_ascii_lowercase().as_str() {
        "devnet" => "devnet",
        "testnet" => "testnet",
        "mainnet" | "mainnet-beta" => "mainnet",
        url if url.contains("devnet") => "devnet",
        url if url.contains("testnet") => "testnet",
        url if url.contains("mainnet") => "mainnet",
        _ => "localnet",
    }
}

impl AnchorToml {
    /// 從 TOML 檔案載入
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| HarnessError::ConfigError {
            message: format!("failed to read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時回傳空設定
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("{} not found, using defaults", path.as_ref().display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| HarnessError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn cluster(&self) -> Option<&str> {
        self.provider.as_ref()?.cluster.as_deref()
    }

    pub fn wallet(&self) -> Option<&str> {
        self.provider.as_ref()?.wallet.as_deref()
    }

    /// Program ids declared for `cluster`, e.g. `[programs.localnet]`.
    pub fn programs_for(&self, cluster: &str) -> BTreeMap<String, String> {
        self.programs
            .get(cluster_key(cluster))
            .cloned()
            .unwrap_or_default()
    }
}

impl Validate for AnchorToml {
    fn validate(&self) -> Result<()> {
        if let Some(cluster) = self.cluster() {
            cluster_url(cluster)?;
        }
        if let Some(wallet) = self.wallet() {
            validation::validate_path("provider.wallet", wallet)?;
        }
        for (cluster, programs) in &self.programs {
            for (name, id) in programs {
                validation::validate_pubkey(&format!("programs.{}.{}", cluster, name), id)?;
            }
        }
        Ok(())
    }
}

/// 替換環境變數 (例如 ${ANCHOR_WALLET})；未定義的變數保持原樣
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| HarnessError::ConfigError {
        message: format!("invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}
