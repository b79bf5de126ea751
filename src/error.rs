use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::{remote::RemoteError, session_store::SessionStoreError},
    state::gate::GateRejection,
};

/// Message shown for any local gate refusal.
pub const NOT_AVAILABLE_MESSAGE: &str = "action not currently available";
/// Message shown for transport failures of user-initiated commands.
pub const NETWORK_MESSAGE: &str = "network error, please try again";

/// Errors surfaced by the client's service layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached.
    #[error("tournament service unreachable")]
    Transport(#[source] RemoteError),
    /// The service answered `success = false`.
    #[error("request rejected ({code}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        /// Code from the envelope.
        code: i32,
        /// Server message, shown verbatim.
        message: Option<String>,
    },
    /// The action gate refused the command; nothing was sent.
    #[error(transparent)]
    NotAvailable(#[from] GateRejection),
    /// The command needs a logged-in participant.
    #[error("no active session")]
    NoSession,
    /// Local input failed validation; nothing was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The service answered with something the client cannot interpret.
    #[error("unexpected response from the tournament service")]
    Protocol(#[source] RemoteError),
    /// The session identity could not be persisted.
    #[error("session store failed")]
    Store(#[from] SessionStoreError),
}

impl ClientError {
    /// Text suitable for showing to the participant.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => NETWORK_MESSAGE.into(),
            ClientError::Rejected {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            ClientError::Rejected { .. } => "request rejected".into(),
            ClientError::NotAvailable(_) => NOT_AVAILABLE_MESSAGE.into(),
            ClientError::NoSession => "please log in first".into(),
            ClientError::InvalidInput(message) => message.clone(),
            ClientError::Protocol(_) => "unexpected response from the server".into(),
            ClientError::Store(_) => "could not save the session".into(),
        }
    }
}

impl From<RemoteError> for ClientError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Rejected { code, message } => ClientError::Rejected { code, message },
            err if err.is_transport() => ClientError::Transport(err),
            err => ClientError::Protocol(err),
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(err: ValidationErrors) -> Self {
        ClientError::InvalidInput(format!("validation failed: {}", err))
    }
}
