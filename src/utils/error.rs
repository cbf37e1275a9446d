use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API key is required. Provide api_key in the request or configure CANVAS_API_KEY")]
    MissingCredential,

    #[error("Unauthorized: the upstream API rejected the key. Please verify your API key")]
    UpstreamUnauthorized,

    #[error("Failed to fetch courses: {message}")]
    UpstreamError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Server error: {0}")]
    ServerError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Credential,
    Upstream,
    Configuration,
    System,
}

/// 上游 API 呼叫失敗；有 HTTP 回應時帶狀態碼
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamFailure {
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl From<UpstreamFailure> for RelayError {
    fn from(failure: UpstreamFailure) -> Self {
        match failure.status {
            Some(401) => RelayError::UpstreamUnauthorized,
            _ => RelayError::UpstreamError {
                message: failure.message,
            },
        }
    }
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::InvalidRequest { .. } | RelayError::MissingCredential => 400,
            RelayError::UpstreamUnauthorized => 401,
            _ => 500,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::InvalidRequest { .. } => ErrorCategory::Request,
            RelayError::MissingCredential | RelayError::UpstreamUnauthorized => {
                ErrorCategory::Credential
            }
            RelayError::UpstreamError { .. } => ErrorCategory::Upstream,
            RelayError::ConfigError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::TomlError(_) => ErrorCategory::Configuration,
            RelayError::IoError(_) | RelayError::ServerError(_) => ErrorCategory::System,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RelayError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            RelayError::TomlError(e) => format!("Could not read the configuration file: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
