use thiserror::Error;

use crate::session::SessionError;

/// Every way a gateway call can be rejected.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend could not be reached, or answered with a non-2xx status.
    #[error("{message}")]
    Transport {
        message: String,
        /// HTTP status, when a response was received at all
        status: Option<u16>,
    },

    /// Business code 401: the token is invalid or expired.
    #[error("{message}")]
    AuthenticationExpired { message: String },

    /// Any other business code that is not a success.
    #[error("{message}")]
    BusinessRejection { code: Option<i64>, message: String },

    /// The stored session could not be read.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The HTTP client could not be set up; nothing was sent.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A successful payload did not have the shape the caller asked for.
    #[error("Unexpected response payload: {message}")]
    Decode { message: String },
}

impl GatewayError {
    /// The human-readable message carried by this rejection.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Business code of a backend rejection, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            GatewayError::AuthenticationExpired { .. } => Some(super::UNAUTHENTICATED_CODE),
            GatewayError::BusinessRejection { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, GatewayError::AuthenticationExpired { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport { .. })
    }
}
