//! Error types for the Airtable client

use thiserror::Error;

/// Errors that can occur when talking to Airtable
///
/// The variants keep the failure category recoverable: callers pick a
/// user-facing message from [`is_network`](Self::is_network) and
/// [`is_server`](Self::is_server) rather than from the text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AirtableError {
    /// A required configuration environment variable is not set
    #[error("Missing {0} environment variable")]
    MissingConfig(&'static str),

    /// The configured API URL cannot be used as a base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// No HTTP response was received (offline, DNS, connection reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Airtable answered with a 5xx status
    #[error("Server error (status {status})")]
    Server {
        /// HTTP status code
        status: u16,
    },

    /// Airtable answered with any other non-2xx status
    #[error("HTTP error (status {status}): {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The response body could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl AirtableError {
    /// Whether the request never got an HTTP response
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Whether Airtable reported a server-side failure
    #[must_use]
    pub const fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// HTTP status, when a response was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a non-success status code
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        if status >= 500 {
            Self::Server { status }
        } else {
            Self::Http { status, body }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            AirtableError::from_status(503, String::new()),
            AirtableError::Server { status: 503 }
        );
        assert!(AirtableError::from_status(500, String::new()).is_server());

        let not_found = AirtableError::from_status(404, "missing".to_string());
        assert!(!not_found.is_server());
        assert_eq!(not_found.status(), Some(404));
    }

    #[test]
    fn network_errors_have_no_status() {
        let error = AirtableError::Network("offline".to_string());
        assert!(error.is_network());
        assert_eq!(error.status(), None);
    }
}
