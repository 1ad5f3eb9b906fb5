/// Errors that can occur in the transport layer.
///
/// Every variant is fatal to the connection that produced it: the
/// connection actor tears the session down and never retries.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A read or write did not finish before its deadline.
    #[error("{0} deadline exceeded")]
    DeadlineExceeded(&'static str),
}
