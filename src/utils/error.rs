use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("RPC error {code}: {message}")]
    RpcError {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("RPC endpoint returned HTTP {status}: {body}")]
    RpcHttpError { status: u16, body: String },

    #[error("Invalid RPC response: {message}")]
    InvalidResponseError { message: String },

    #[error("Transaction {signature} failed: {err}")]
    TransactionFailedError {
        signature: String,
        err: serde_json::Value,
    },

    #[error("Transaction {signature} was not confirmed within {seconds}s")]
    ConfirmationTimeoutError { signature: String, seconds: u64 },

    #[error("Program error {code} {name}: {msg}")]
    ProgramError {
        code: u32,
        name: String,
        msg: String,
    },

    #[error("Decode error: {message}")]
    DecodeError { message: String },

    #[error("Signing error: {message}")]
    SigningError { message: String },

    #[error("Scenario step {index} ({step}) failed: {message}")]
    ScenarioError {
        index: usize,
        step: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Network,
    Program,
    Internal,
}

impl HarnessError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Config,
            Self::HttpError(_)
            | Self::RpcError { .. }
            | Self::RpcHttpError { .. }
            | Self::InvalidResponseError { .. }
            | Self::ConfirmationTimeoutError { .. } => ErrorCategory::Network,
            Self::ProgramError { .. } | Self::TransactionFailedError { .. } => {
                ErrorCategory::Program
            }
            Self::ScenarioError { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::DecodeError { .. }
            | Self::SigningError { .. } => ErrorCategory::Internal,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Config => 2,
            ErrorCategory::Network => 3,
            ErrorCategory::Program => 4,
            ErrorCategory::Internal => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } => format!(
                "{} is not set. Export it or pass the matching command line flag.",
                field
            ),
            Self::HttpError(e) if e.is_connect() => {
                "Could not reach the cluster. Is the validator running?".to_string()
            }
            Self::ConfirmationTimeoutError { signature, .. } => format!(
                "Transaction {} was sent but not confirmed in time; check it on the cluster.",
                signature
            ),
            Self::ProgramError { name, msg, .. } => format!("{}: {}", name, msg),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
