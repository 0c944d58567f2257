use thiserror::Error;

/// The error taxonomy for the network layer. Distinct variants for transport
/// failures, HTTP-level failures, and parse/resource-construction failures —
/// collapsing them into one opaque wrapper would lose exactly the
/// information a retry strategy needs to tell a flaky connection apart from
/// a 404.
#[derive(Debug, Error)]
pub enum Error {
    /// The network layer failed before producing an HTTP response at all
    /// (DNS, connect, TLS, timeout, request build).
    #[error("transport error: {0}")]
    TransportError(String),
    /// The server produced a non-success status (>= 400).
    #[error("HTTP {status}: {body}")]
    HTTPError { status: u16, body: String },
    /// The response body could not be parsed into the expected shape.
    #[error("failed to parse response: {0}")]
    ParseError(String),
    /// The resource factory returned nothing at send time.
    #[error("failed to create resource")]
    FailedToCreateResource,
    #[error("request cancelled")]
    Cancelled,
    #[error("exceeded {0} retry attempts")]
    MaxRetriesExceeded(u32),
}
