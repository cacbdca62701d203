use thiserror::Error;

use crate::dialogs::ValidationErrors;

/// Errors surfaced by the HomeFit client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not authenticated")]
    Unauthorized,

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("dialog is not accepting input")]
    DialogNotEditing,

    #[error("invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

impl ClientError {
    /// Message suitable for an inline alert.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(err) if err.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ClientError::Http(_) => "Could not reach the server. Please try again.".to_string(),
            ClientError::Status { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Status { .. } | ClientError::Decode(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            ClientError::Unauthorized => "Please log in to continue.".to_string(),
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::DialogNotEditing => "This form is not open.".to_string(),
            ClientError::Config { .. } => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_prefers_server_text() {
        let err = ClientError::Status {
            status: 409,
            message: "Tour slot already taken".to_string(),
        };
        assert_eq!(err.user_message(), "Tour slot already taken");

        let err = ClientError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }

    #[test]
    fn unauthorized_asks_for_login() {
        assert_eq!(ClientError::Unauthorized.user_message(), "Please log in to continue.");
    }
}
