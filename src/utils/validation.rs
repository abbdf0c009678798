use crate::domain::model::Pubkey;
use crate::utils::error::{HarnessError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> HarnessError {
    HarnessError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// RPC endpoints are plain HTTP(S); websocket URLs and monikers are rejected here.
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(invalid(field, raw, "cluster URL cannot be empty"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("not a URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(()),
        "http" | "https" => Err(invalid(field, raw, "URL has no host")),
        scheme => Err(invalid(field, raw, format!("RPC scheme must be http or https, got {}", scheme))),
    }
}

/// Keypair file locations; `~/` is expanded later, so only emptiness and NUL are checked.
pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field, path, "path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path, "path contains a NUL byte"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(field, value, format!("must be at least {}", min_value)));
    }
    Ok(())
}

/// Labels and names: at least one non-whitespace character.
pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "cannot be empty"));
    }
    Ok(())
}

/// A base58 string that decodes to exactly 32 bytes.
pub fn validate_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    value
        .parse::<Pubkey>()
        .map_err(|e| invalid(field, value, e.to_string()))
}
