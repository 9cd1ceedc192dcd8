use thiserror::Error;

/// Failure taxonomy for one connection's lifetime.
///
/// Every variant is fatal to its connection and never retried. On the client
/// the single connection is the whole run, so any of these ends the process
/// with a printed diagnostic; on the server they end one session and leave the
/// listener and sibling sessions untouched.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid target name: {0}")]
    InvalidTarget(String),

    #[error("response headers exceed {0} bytes")]
    HeadersTooLarge(usize),

    #[error("connection closed before the header separator arrived")]
    TruncatedHeaders,
}
