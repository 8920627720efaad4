use std::error::Error;

/// Raised by a [crate::ClientFactory] when the connection parameters
/// it was handed cannot describe a usable endpoint. Factories fail at
/// construction time, never on first request.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },
    #[error("port {0} is out of range (not within 1..=65535)")]
    InvalidPort(i32),
    #[error("unsupported protocol '{0}', expected 'http' or 'https'")]
    UnsupportedProtocol(String),
    #[error("invalid path prefix '{0}'")]
    InvalidPrefix(String),
    #[error("invalid default header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("backend could not be initialized: {0}")]
    Backend(String),
}

/// Wrong accessor used for the active [crate::BinaryRequest] variant, or
/// the payload source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("binary payload is not file-backed (it is {actual})")]
    NotAFile { actual: &'static str },
    #[error("binary payload is not byte-array-backed (it is {actual})")]
    NotBytes { actual: &'static str },
    #[error("stream payload was already consumed")]
    StreamConsumed,
    #[error("reading payload failed")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [crate::Client] while executing a request.
/// The builder layer hands these through untouched.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("i/o error during request")]
    Io(#[from] std::io::Error),
    #[error("request body unavailable")]
    Payload(#[from] PayloadError),
    #[error("request could not be sent: {0}")]
    InvalidRequest(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("client is closed")]
    Closed,
    #[error(transparent)]
    Backend(Box<dyn Error + Send + Sync>),
}
