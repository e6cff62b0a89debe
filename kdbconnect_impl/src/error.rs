use thiserror::Error;

/// Result alias used throughout the crate.
pub type QResult<T> = Result<T, QError>;

/// Error taxonomy for the crate.
///
/// Variants that are documented as "subclassing" another kind in the
/// design (e.g. `Handshake` under `Connection`, `Authentication` under
/// `Handshake`) are flattened into one enum; `is_retryable` encodes the
/// subclass relationship that matters operationally: whether the retry
/// wrapper should treat the failure as transient.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QError {
    #[error("cannot connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {addr} closed by peer")]
    ConnectionClosed { addr: String },

    #[error("IPC handshake with {addr} failed: {reason}")]
    Handshake { addr: String, reason: String },

    #[error("authentication rejected by {addr}")]
    Authentication { addr: String },

    #[error("cannot serialize value of type {0} to the wire format")]
    Serialization(&'static str),

    #[error("cannot deserialize: {0}")]
    Deserialization(String),

    #[error("{0}")]
    Query(String),

    #[error("q error: {0}")]
    Remote(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("no connections available (pool exhausted)")]
    PoolExhausted,

    #[error("malformed reflection result: {0}")]
    Reflection(String),

    #[error("erroneous connection parameters: {0}")]
    ConnParams(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

impl QError {
    /// Whether the retry wrapper should treat this as a transient,
    /// connection-level failure (the default retryable set of §7).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QError::Connection { .. }
                | QError::ConnectionClosed { .. }
                | QError::Handshake { .. }
                | QError::Io(_)
        )
    }

    /// The server-supplied text for a [`QError::Remote`], if this is one.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            QError::Remote(msg) => Some(msg),
            _ => None,
        }
    }
}
