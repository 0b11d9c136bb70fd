//! Error types for the request dispatch and pagination engine

/// Result alias used across the API layer
pub type Result<T> = std::result::Result<T, CrmError>;

/// Every failure the client can report to its caller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrmError {
    /// The module is not one of the client's configured modules
    #[error("Module {0} is not supported.")]
    UnsupportedModule(String),

    /// The module exists but does not expose the method
    #[error("Method {method} is not supported by module {module}.")]
    UnsupportedMethod { module: String, method: String },

    /// A configured module has no descriptor in the catalog
    #[error("Module {0} not found.")]
    ModuleNotFound(String),

    /// The auth token was empty
    #[error("Auth token cannot be empty.")]
    EmptyAuthToken,

    /// Network or HTTP level failure
    #[error("Transport error{}: {}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default(), .message)]
    Transport { status: Option<u16>, message: String },

    /// The payload could not be decoded, or the server reported an error in-band
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// The aggregated response was requested before any page was fetched
    #[error("No page has been fetched yet")]
    NotYetFetched,

    /// The caller cancelled the operation or its deadline elapsed
    #[error("Request was cancelled")]
    Cancelled,
}

impl CrmError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// True for errors caused by caller misuse rather than the remote side
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedModule(_) | Self::UnsupportedMethod { .. } | Self::EmptyAuthToken
        )
    }
}

impl From<reqwest::Error> for CrmError {
    fn from(error: reqwest::Error) -> Self {
        Self::transport(error.status().map(|s| s.as_u16()), error.to_string())
    }
}

impl From<serde_json::Error> for CrmError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("invalid JSON: {}", error))
    }
}

impl From<roxmltree::Error> for CrmError {
    fn from(error: roxmltree::Error) -> Self {
        Self::parse(format!("invalid XML: {}", error))
    }
}
