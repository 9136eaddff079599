//! Portal client error taxonomy
//!
//! Every mutating call resolves to one of these kinds. Each kind has a fixed
//! user-facing message; none of them is retried automatically.

use std::collections::BTreeMap;

use fyp_common::TransitionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortalError {
    /// Role may not perform the action
    #[error("Not permitted: {0}")]
    UnauthorizedActor(String),

    /// Action not valid from the document's current status
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    /// Remote state moved on since it was last read
    #[error("Stale state: {0}")]
    StaleState(String),

    /// No response from the backend
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Payload rejected by the backend
    #[error("Validation failed: {message}")]
    ValidationFailure {
        message: String,
        fields: BTreeMap<String, String>,
    },

    /// Missing or rejected credential
    #[error("Session expired")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// User declined a confirmation prompt
    #[error("Cancelled: {0}")]
    Declined(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Local credential storage failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortalError::ValidationFailure {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Stable snake_case kind name, used in logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::UnauthorizedActor(_) => "unauthorized_actor",
            PortalError::IllegalTransition(_) => "illegal_transition",
            PortalError::StaleState(_) => "stale_state",
            PortalError::NetworkFailure(_) => "network_failure",
            PortalError::ValidationFailure { .. } => "validation_failure",
            PortalError::SessionExpired => "session_expired",
            PortalError::NotFound(_) => "not_found",
            PortalError::Server { .. } => "server",
            PortalError::Decode(_) => "decode",
            PortalError::Declined(_) => "declined",
            PortalError::Config(_) => "config",
            PortalError::Storage(_) => "storage",
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            PortalError::UnauthorizedActor(detail) => {
                format!("You do not have permission to do that ({}).", detail)
            }
            PortalError::IllegalTransition(detail) => {
                format!("The document is not in a state that allows this: {}.", detail)
            }
            PortalError::StaleState(_) => {
                "This item was changed by someone else. Please refresh and try again.".to_string()
            }
            PortalError::NetworkFailure(_) => {
                "Could not reach the server. Your change was undone; retry when you are back online."
                    .to_string()
            }
            PortalError::ValidationFailure { message, fields } => {
                if fields.is_empty() {
                    message.clone()
                } else {
                    let details: Vec<String> = fields
                        .iter()
                        .map(|(field, problem)| format!("{}: {}", field, problem))
                        .collect();
                    format!("{} ({})", message, details.join("; "))
                }
            }
            PortalError::SessionExpired => {
                "Your session has expired. Please log in again.".to_string()
            }
            PortalError::NotFound(what) => format!("{} no longer exists.", what),
            PortalError::Server { .. } => {
                "The server failed to process the request. Please try again later.".to_string()
            }
            PortalError::Decode(_) => "The server sent an unexpected response.".to_string(),
            PortalError::Declined(what) => format!("{} cancelled.", what),
            PortalError::Config(detail) => format!("Configuration problem: {}", detail),
            PortalError::Storage(detail) => format!("Could not store session: {}", detail),
        }
    }

    /// The session must be torn down
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, PortalError::SessionExpired)
    }
}

impl From<TransitionError> for PortalError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::UnauthorizedActor { .. } => {
                PortalError::UnauthorizedActor(err.to_string())
            }
            TransitionError::IllegalTransition { .. } | TransitionError::DeadlinePassed { .. } => {
                PortalError::IllegalTransition(err.to_string())
            }
            TransitionError::StaleState { .. } => PortalError::StaleState(err.to_string()),
        }
    }
}

impl From<fyp_common::Error> for PortalError {
    fn from(err: fyp_common::Error) -> Self {
        match err {
            fyp_common::Error::Config(msg) => PortalError::Config(msg),
            fyp_common::Error::InvalidInput(msg) => PortalError::validation(msg),
            fyp_common::Error::Io(e) => PortalError::Storage(e.to_string()),
            fyp_common::Error::Serialization(e) => PortalError::Decode(e.to_string()),
            other @ (fyp_common::Error::UnknownStatus(_) | fyp_common::Error::UnknownRole(_)) => {
                PortalError::Decode(other.to_string())
            }
        }
    }
}
