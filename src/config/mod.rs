#[cfg(feature = "cli")]
pub mod cli;
pub mod scenario_config;
pub mod toml_config;

use crate::core::provider::{DEFAULT_CONFIRM_TIMEOUT, DEFAULT_WALLET_PATH, PROVIDER_URL_ENV, WALLET_ENV};
use crate::domain::model::Commitment;
use crate::domain::ports::ProviderSettings;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;
use toml_config::{cluster_url, AnchorToml, DEFAULT_ANCHOR_TOML};

#[cfg(feature = "cli")]
pub use cli::CliConfig;

pub const COMMITMENT_ENV: &str = "ANCHOR_COMMITMENT";
pub const DEFAULT_CLUSTER: &str = "localnet";

/// Values given explicitly on the command line (or by a caller); highest precedence.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub wallet: Option<String>,
    pub commitment: Option<String>,
    pub confirm_timeout_secs: Option<u64>,
    pub anchor_toml: Option<String>,
    pub skip_preflight: bool,
}

/// Connection settings after merging flags, environment, `Anchor.toml` and defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub cluster: String,
    pub cluster_url: String,
    pub wallet_path: String,
    pub commitment: Commitment,
    pub confirm_timeout: Duration,
    pub skip_preflight: bool,
    pub manifest: AnchorToml,
}

impl ResolvedConfig {
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// `env` is injected so precedence can be tested without touching the process environment.
    pub fn resolve_with<F>(overrides: &Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_path = overrides
            .anchor_toml
            .clone()
            .unwrap_or_else(|| DEFAULT_ANCHOR_TOML.to_string());
        let manifest = AnchorToml::from_file_or_default(&manifest_path)?;
        manifest.validate()?;

        let cluster = overrides
            .url
            .clone()
            .or_else(|| env(PROVIDER_URL_ENV))
            .or_else(|| manifest.cluster().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_CLUSTER.to_string());

        let wallet_path = overrides
            .wallet
            .clone()
            .or_else(|| env(WALLET_ENV))
            .or_else(|| manifest.wallet().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_WALLET_PATH.to_string());

        let commitment = match overrides.commitment.clone().or_else(|| env(COMMITMENT_ENV)) {
            Some(raw) => raw.parse()?,
            None => Commitment::default(),
        };

        let confirm_timeout = overrides
            .confirm_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONFIRM_TIMEOUT);

        let resolved = Self {
            cluster_url: cluster_url(&cluster)?,
            cluster,
            wallet_path,
            commitment,
            confirm_timeout,
            skip_preflight: overrides.skip_preflight,
            manifest,
        };
        resolved.validate()?;
        tracing::debug!(
            "Resolved provider: {} wallet={} commitment={}",
            resolved.cluster_url,
            resolved.wallet_path,
            resolved.commitment
        );
        Ok(resolved)
    }
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("cluster", &self.cluster_url)?;
        validation::validate_path("wallet", &self.wallet_path)?;
        validation::validate_positive_number("confirm_timeout_secs", self.confirm_timeout.as_secs(), 1)?;
        Ok(())
    }
}

impl ProviderSettings for ResolvedConfig {
    fn cluster_url(&self) -> &str {
        &self.cluster_url
    }

    fn wallet_path(&self) -> &str {
        &self.wallet_path
    }

    fn commitment(&self) -> Commitment {
        self.commitment
    }

    fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }

    fn skip_preflight(&self) -> bool {
        self.skip_preflight
    }
}
