use thiserror::Error;

/// Local precondition violations raised by the attempt core.
///
/// These point at a defect in the caller (UI wiring, a malformed test
/// definition) rather than anything the person taking the test did.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("duration must be positive, got {0}s")]
    InvalidDuration(i64),

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("invalid answer for {question_id}: {reason}")]
    InvalidAnswer { question_id: String, reason: String },

    #[error("attempt already started")]
    AlreadyStarted,

    #[error("attempt is closed")]
    AttemptClosed,

    #[error("attempt has not been started")]
    NotStarted,

    #[error("invalid test definition: {0}")]
    InvalidDefinition(String),

    #[error("pausing is not available in timed mode")]
    PauseUnavailable,
}

const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Failures reported by the remote exam service or the transport to it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Test generation failed; the message comes straight from the server.
    #[error("{0}")]
    Generation(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text for the inline error banner.
    pub fn user_message(&self) -> String {
        let message = match self {
            ApiError::Generation(msg) => msg.trim().to_string(),
            ApiError::Validation(msg) => format!("Please check your input: {}", msg.trim()),
            ApiError::Server { message, .. } => message.trim().to_string(),
            ApiError::Transport(_) => "Could not reach the exam service".to_string(),
            ApiError::Decode(_) => GENERIC_FAILURE.to_string(),
        };

        if message.is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_))
            || matches!(self, ApiError::Server { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Local result history failures.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("csv export: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_error_messages() {
        assert_eq!(
            AttemptError::UnknownQuestion("q9".into()).to_string(),
            "unknown question: q9"
        );
        assert_eq!(
            AttemptError::InvalidDuration(0).to_string(),
            "duration must be positive, got 0s"
        );
        assert_eq!(
            AttemptError::InvalidAnswer {
                question_id: "q1".into(),
                reason: "option 8 does not exist".into(),
            }
            .to_string(),
            "invalid answer for q1: option 8 does not exist"
        );
    }

    #[test]
    fn test_generation_message_is_verbatim() {
        let err = ApiError::Generation("Error generating exam: quota exceeded".into());
        assert_eq!(err.user_message(), "Error generating exam: quota exceeded");
    }

    #[test]
    fn test_empty_server_message_falls_back() {
        let err = ApiError::Server {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        let err = ApiError::Server {
            status: 404,
            message: "Exam not found".into(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.user_message(), "Exam not found");
    }
}
