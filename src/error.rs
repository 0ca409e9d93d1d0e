use reqwest::StatusCode;
use thiserror::Error;

/// Message shown when the join endpoint fails without giving a reason.
pub const GENERIC_SUBMIT_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors raised by a `KeyValueStore` backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to persist storage file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Retrieving the waitlist count failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("count HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("count endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode count response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Joining the waitlist failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("already on the waitlist")]
    AlreadyJoined,
    #[error("join HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("join endpoint returned status {status}")]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
}

impl SubmitError {
    /// Text suitable for a transient user notification.
    ///
    /// A reason supplied by the server is returned verbatim.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            SubmitError::AlreadyJoined => "You're already on the waitlist!".to_string(),
            SubmitError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            _ => GENERIC_SUBMIT_MESSAGE.to_string(),
        }
    }
}

/// A persisted count entry could not be used. Never surfaced to the user.
#[derive(Debug, Error)]
pub enum CacheParseError {
    #[error("cached count is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cached count timestamp {timestamp} is later than now ({now})")]
    FutureTimestamp { timestamp: i64, now: i64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_with_reason_uses_reason_verbatim() {
        let err = SubmitError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: Some("already joined".to_string()),
        };
        assert_eq!(err.user_message(), "already joined");
    }

    #[test]
    fn rejected_without_reason_is_generic() {
        let err = SubmitError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_SUBMIT_MESSAGE);
    }
}
