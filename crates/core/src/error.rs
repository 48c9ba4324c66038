//! Error types for the collaborator boundaries.
//!
//! Each boundary (generation, persistence, identity, configuration) has its own error enum so
//! the lifecycle controller can tell the outcomes apart without inspecting messages.

/// Failure to produce report text.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("generation service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("generation service reported an error: {0}")]
    Upstream(String),
    #[error("generation response is missing report text")]
    MalformedResponse,
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Failure reported by the report store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report store unavailable: {0}")]
    Unavailable(String),
    #[error("report store returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("report not found: {0}")]
    NotFound(uuid::Uuid),
    #[error("report owner does not match the calling user")]
    Forbidden,
    #[error("failed to decode store payload: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure reported by the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("an account already exists for {0}")]
    AlreadyRegistered(String),
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
    #[error("identity provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("failed to decode identity payload: {0}")]
    Decode(String),
}

pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

/// Invalid or incomplete startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
