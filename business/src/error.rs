use thiserror::Error;

/// Placeholder message for failures that carry no description.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Why a directory load failed, as shown to the user.
///
/// Every kind is recoverable; the view offers a retry for all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("No internet connection")]
    NoInternet,
    #[error("Server error: {code}")]
    ServerError { code: u16 },
    #[error("{message}")]
    GenericError { message: String },
}

/// Raw failure surfaced by a [`UserDirectoryClient`](crate::UserDirectoryClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// DNS, TLS, refused or reset connection, timeout.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The server answered with a non-2xx status.
    #[error("server responded with status {0}")]
    Status(u16),
    /// The body was not a JSON array of users.
    #[error("failed to decode users: {0}")]
    Decode(String),
    #[error("{}", .0.as_deref().unwrap_or(UNKNOWN_ERROR))]
    Unexpected(Option<String>),
}
