//! Error taxonomy for record synchronisation.
//!
//! The gateway classifies every failure into a [`SyncError`]; the repository forwards it
//! unchanged; controllers turn it into a [`Notice`] for the view.

/// Classified failure of a record operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The server rejected the request payload (HTTP 400/422).
    #[error("validation failed: {0}")]
    Validation(String),
    /// The server refused the caller (HTTP 401).
    #[error("not authorised: {0}")]
    Auth(String),
    /// The addressed record does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),
    /// The server failed while handling the request (HTTP 500).
    #[error("server error: {0}")]
    Server(String),
    /// Transport failure or an unrecognised status.
    #[error("network error: {0}")]
    Network(String),
    /// A successful response whose body does not match the expected schema.
    #[error("malformed response: {0}")]
    Decode(String),
    /// Client-side validation rejected the input before anything was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Coarse error category, independent of the message payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    Server,
    Network,
    Decode,
    InvalidInput,
}

impl SyncError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => SyncError::Validation(message),
            401 => SyncError::Auth(message),
            404 => SyncError::NotFound(message),
            500 => SyncError::Server(message),
            other => SyncError::Network(format!("unexpected status {other}: {message}")),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::Auth(_) => ErrorKind::Auth,
            SyncError::NotFound(_) => ErrorKind::NotFound,
            SyncError::Server(_) => ErrorKind::Server,
            SyncError::Network(_) => ErrorKind::Network,
            SyncError::Decode(_) => ErrorKind::Decode,
            SyncError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Whether offering the user a retry makes sense.
    ///
    /// Repeating a rejected or unauthorised request cannot succeed without a change of input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Server(_) | SyncError::Network(_) | SyncError::Decode(_)
        )
    }

    /// User-facing description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Validation(msg) => format!("The server rejected the data: {msg}"),
            SyncError::Auth(_) => "You are not authorised to perform this action.".into(),
            SyncError::NotFound(_) => "The record no longer exists.".into(),
            SyncError::Server(_) => "The server encountered an error. Please try again.".into(),
            SyncError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".into()
            }
            SyncError::Decode(_) => "The server sent an unexpected response.".into(),
            SyncError::InvalidInput(msg) => msg.clone(),
        }
    }

    pub fn notice(&self) -> Notice {
        Notice {
            kind: self.kind(),
            message: self.user_message(),
            retryable: self.is_retryable(),
        }
    }
}

/// Transient, user-visible report of a failed operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
    /// Whether the view should offer a retry affordance.
    pub retryable: bool,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
