/// Errors from the vendor API layer.
#[derive(Debug, thiserror::Error)]
pub enum PetkitError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The vendor returned a non-2xx status code.
    #[error("PetKit API error ({status}): {body}")]
    Http { status: u16, body: String },

    /// The vendor returned 2xx with an `error` payload.
    #[error("PetKit API rejected request: {0}")]
    Api(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected PetKit response: {0}")]
    Decode(String),

    /// The login response did not yield a usable session.
    #[error("Session error: {0}")]
    Session(String),
}
