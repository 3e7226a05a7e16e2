//! Error types for modeldesk-core.

use serde::Deserialize;
use thiserror::Error;

/// Shown whenever a failure carries nothing the user can act on.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Shown for every sign-in failure, whatever the cause.
pub const SIGN_IN_FAILED_MESSAGE: &str = "Sign in failed";

#[derive(Error, Debug)]
pub enum ModeldeskError {
    /// Validation message(s) returned by a backend service.
    #[error("{0}")]
    Validation(String),

    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}", SIGN_IN_FAILED_MESSAGE)]
    SignInFailed,

    #[error("not signed in")]
    NotSignedIn,

    /// Client-side form validation.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ModeldeskError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorPayload>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Issues(Vec<Issue>),
    Message(String),
}

#[derive(Deserialize)]
struct Issue {
    msg: String,
}

impl ModeldeskError {
    /// Decode a non-success response body.
    ///
    /// Backends report validation failures as `{"error": [{"msg": ..}, ..]}`
    /// or `{"error": "<message>"}`. Anything else keeps the raw status.
    pub fn from_response(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error);
        match payload {
            Some(ErrorPayload::Issues(issues)) if !issues.is_empty() => ModeldeskError::Validation(
                issues
                    .into_iter()
                    .map(|i| i.msg)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Some(ErrorPayload::Message(msg)) if !msg.trim().is_empty() => {
                ModeldeskError::Validation(msg)
            }
            _ => ModeldeskError::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    /// The string a view displays for this error.
    pub fn user_message(&self) -> String {
        match self {
            ModeldeskError::Validation(msg) | ModeldeskError::InvalidInput(msg) => msg.clone(),
            ModeldeskError::SignInFailed => SIGN_IN_FAILED_MESSAGE.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_issue_array() {
        let body = r#"{"error":[{"msg":"name is required"},{"msg":"file is required"}]}"#;
        let err = ModeldeskError::from_response(422, body);
        assert_eq!(err.user_message(), "name is required, file is required");
    }

    #[test]
    fn keeps_string_error_verbatim() {
        let err = ModeldeskError::from_response(400, r#"{"error":"Model not found"}"#);
        assert!(matches!(err, ModeldeskError::Validation(ref m) if m == "Model not found"));
    }

    #[test]
    fn falls_back_to_generic_message() {
        let err = ModeldeskError::from_response(500, "<html>Internal Server Error</html>");
        assert!(matches!(err, ModeldeskError::Status { status: 500, .. }));
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        let empty = ModeldeskError::from_response(422, r#"{"error":[]}"#);
        assert_eq!(empty.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn transport_errors_are_generic() {
        let err = ModeldeskError::Transport("connection refused".into());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(ModeldeskError::SignInFailed.user_message(), "Sign in failed");
    }
}
