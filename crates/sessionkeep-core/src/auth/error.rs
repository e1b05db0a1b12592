use thiserror::Error;

use crate::api::ApiError;
use crate::validation::FieldErrors;

/// Errors surfaced to the user by session operations. None of these are
/// fatal; every one can be retried by hand.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid form: {0}")]
    Validation(FieldErrors),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Session expired")]
    AuthorizationExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Unprocessable(Vec<String>),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("A newer session request replaced this one")]
    Superseded,

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Classify an error from the login endpoint. Client-side rejections
    /// there mean the credentials were refused.
    pub(crate) fn from_login(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => {
                AuthError::Authentication("Invalid email or password".to_string())
            }
            ApiError::AccessDenied(message) | ApiError::NotFound(message) => {
                AuthError::Authentication(message)
            }
            ApiError::UnexpectedStatus { status, message } if (400..500).contains(&status) => {
                AuthError::Authentication(message)
            }
            other => other.into(),
        }
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        AuthError::Storage(format!("{:#}", err))
    }

    /// Messages for a notification, one per line.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            AuthError::Validation(errors) => errors
                .iter()
                .map(|(field, message)| format!("{}: {}", field, message))
                .collect(),
            AuthError::Unprocessable(messages) => messages.clone(),
            other => vec![other.user_message()],
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(errors) => errors.to_string(),
            AuthError::Authentication(message) => message.clone(),
            AuthError::AuthorizationExpired => "Session expired. Please login again.".to_string(),
            AuthError::NotAuthenticated => "You are not logged in.".to_string(),
            AuthError::Forbidden(_) => {
                "You do not have permission to perform this action".to_string()
            }
            AuthError::NotFound(_) => "Resource not found".to_string(),
            AuthError::Unprocessable(messages) => messages.join("\n"),
            AuthError::Rejected(message) => message.clone(),
            AuthError::Server(_) => "Internal server error. Please try again later.".to_string(),
            AuthError::Network(_) => {
                "No response from server. Please check your internet connection.".to_string()
            }
            AuthError::Malformed(_) => "Error in making request. Please try again.".to_string(),
            AuthError::Superseded => "A newer login attempt replaced this one.".to_string(),
            AuthError::Storage(_) => "Could not save the session on this machine.".to_string(),
        }
    }

    /// Whether the user should be sent back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, AuthError::AuthorizationExpired | AuthError::NotAuthenticated)
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => AuthError::AuthorizationExpired,
            ApiError::AccessDenied(message) => AuthError::Forbidden(message),
            ApiError::NotFound(message) => AuthError::NotFound(message),
            ApiError::Unprocessable(messages) => AuthError::Unprocessable(messages),
            ApiError::ServerError(message) => AuthError::Server(message),
            ApiError::UnexpectedStatus { status, message } => {
                AuthError::Rejected(format!("{} ({})", message, status))
            }
            ApiError::NetworkError(e) => AuthError::Network(e.to_string()),
            ApiError::MalformedRequest(message) | ApiError::InvalidResponse(message) => {
                AuthError::Malformed(message)
            }
        }
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        AuthError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Field;

    #[test]
    fn test_api_error_classification() {
        assert!(matches!(
            AuthError::from(ApiError::Unauthorized),
            AuthError::AuthorizationExpired
        ));
        assert!(matches!(
            AuthError::from(ApiError::AccessDenied("x".into())),
            AuthError::Forbidden(_)
        ));
        assert!(matches!(
            AuthError::from(ApiError::ServerError("x".into())),
            AuthError::Server(_)
        ));
        assert!(matches!(
            AuthError::from(ApiError::InvalidResponse("x".into())),
            AuthError::Malformed(_)
        ));
    }

    #[test]
    fn test_login_rejections_are_authentication_errors() {
        match AuthError::from_login(ApiError::Unauthorized) {
            AuthError::Authentication(m) => assert_eq!(m, "Invalid email or password"),
            other => panic!("unexpected {other:?}"),
        }
        match AuthError::from_login(ApiError::NotFound("User does not exist".into())) {
            AuthError::Authentication(m) => assert_eq!(m, "User does not exist"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AuthError::from_login(ApiError::UnexpectedStatus {
                status: 400,
                message: "email is required".into()
            }),
            AuthError::Authentication(_)
        ));
        assert!(matches!(
            AuthError::from_login(ApiError::ServerError("boom".into())),
            AuthError::Server(_)
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AuthError::AuthorizationExpired.user_message(),
            "Session expired. Please login again."
        );
        assert!(AuthError::AuthorizationExpired.requires_login());
        assert!(!AuthError::Server("x".into()).requires_login());

        let mut errors = FieldErrors::new();
        errors.set(Field::Email, "Email is invalid");
        errors.set(Field::Password, "Password is required");
        assert_eq!(
            AuthError::Validation(errors).user_messages(),
            vec!["email: Email is invalid", "password: Password is required"]
        );

        let err = AuthError::Unprocessable(vec!["a".into(), "b".into()]);
        assert_eq!(err.user_messages(), vec!["a", "b"]);
    }
}
