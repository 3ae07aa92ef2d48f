use thiserror::Error;

/// Main error type for relkit
#[derive(Error, Debug)]
pub enum RelkitError {
    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success response from the admin API
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Selected id is not among the loaded options
    #[error("Stale selection: relation {0} is not among the loaded options")]
    StaleSelection(String),

    /// Search or list fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Reordering attempted on a single-valued relation kind
    #[error("Reorder not allowed for relation kind {0}")]
    ReorderNotAllowed(String),

    /// Attached relation not found
    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RelkitError {
    /// Whether a retry of the same request may succeed (429 or 5xx, or a transport failure).
    pub fn is_retryable(&self) -> bool {
        match self {
            RelkitError::Api { status, .. } => *status == 429 || (500..600).contains(status),
            RelkitError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Convenient Result type using RelkitError
pub type Result<T> = std::result::Result<T, RelkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelkitError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_stale_selection_display() {
        let err = RelkitError::StaleSelection("42".to_string());
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RelkitError = io_err.into();
        assert!(matches!(err, RelkitError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RelkitError = json_err.into();
        assert!(matches!(err, RelkitError::Json(_)));
    }

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = RelkitError::Api { status: 429, body: String::new() };
        let unavailable = RelkitError::Api { status: 503, body: String::new() };
        let not_found = RelkitError::Api { status: 404, body: String::new() };
        assert!(rate_limited.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(!RelkitError::Fetch("boom".to_string()).is_retryable());
    }
}
