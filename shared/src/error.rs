use thiserror::Error;

/// Failures of the relational store gateway.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection is not initialized")]
    NotConnected,
    #[error("failed to connect to database: {0}")]
    Connect(#[source] tokio_postgres::Error),
    #[error("failed to build TLS connector: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("query failed: {0}")]
    Query(#[source] tokio_postgres::Error),
    #[error("unexpected row shape: {0}")]
    Decode(String),
}

impl StoreError {
    /// Connectivity problems that could succeed on redelivery.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::NotConnected | StoreError::Connect(_) | StoreError::Tls(_) => true,
            StoreError::Query(e) => e.is_closed(),
            StoreError::Decode(_) => false,
        }
    }
}

/// Failures of the inference gateway.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference credentials missing: {0}")]
    Credentials(String),
    #[error("invalid inference endpoint: {0}")]
    Endpoint(String),
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("http error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl InferenceError {
    pub fn is_transient(&self) -> bool {
        match self {
            InferenceError::Transport(_) => true,
            InferenceError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_server_errors_are_transient() {
        let s = |status| InferenceError::Status {
            status,
            body: String::new(),
        };
        assert!(s(429).is_transient());
        assert!(s(503).is_transient());
        assert!(!s(400).is_transient());
        assert!(!s(403).is_transient());
        assert!(!InferenceError::Credentials("none".into()).is_transient());
    }

    #[test]
    fn missing_connection_is_transient() {
        assert!(StoreError::NotConnected.is_transient());
        assert!(!StoreError::Decode("x".into()).is_transient());
    }
}
