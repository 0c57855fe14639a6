//! Error types for the CAS adapter.

use thiserror::Error;

/// Errors raised by the CAS adapter.
#[derive(Debug, Error)]
pub enum CasError {
    /// Invalid or incomplete configuration.
    #[error("CAS configuration error: {0}")]
    Config(String),

    /// The resolved CAS server URL is not an absolute http(s) URL.
    #[error("CAS server URL invalid: {0}")]
    InvalidServerUrl(String),

    /// The ticket validator reported a failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Validation succeeded but an expected attribute is absent.
    #[error("CAS response is missing attribute '{0}'")]
    MissingAttribute(String),

    /// The inbound request could not be interpreted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The host session store rejected a write.
    #[error("session store error: {0}")]
    Session(String),
}

/// Failures reported by a [`TicketValidator`](crate::client::TicketValidator).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The CAS server rejected the ticket (invalid, expired or already used).
    #[error("CAS ticket rejected ({code}): {description}")]
    TicketRejected { code: String, description: String },

    /// The CAS server could not be reached.
    #[error("CAS server unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The validate endpoint URL could not be built.
    #[error("invalid CAS endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The CAS server answered with an unexpected status or body.
    #[error("malformed CAS response: {0}")]
    MalformedResponse(String),
}

impl ValidationError {
    /// Build a rejection with the CAS error code and description.
    pub fn rejected(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::TicketRejected {
            code: code.into(),
            description: description.into(),
        }
    }
}

pub type Result<T, E = CasError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message() {
        let err: CasError = ValidationError::rejected("INVALID_TICKET", "Ticket ST-1 not recognized").into();
        assert_eq!(
            err.to_string(),
            "CAS ticket rejected (INVALID_TICKET): Ticket ST-1 not recognized"
        );
    }

    #[test]
    fn test_missing_attribute_message() {
        let err = CasError::MissingAttribute("personName".to_string());
        assert!(err.to_string().contains("personName"));
    }
}
