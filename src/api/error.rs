use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unauthorized - credential expired or revoked")]
    Unauthorized,

    #[error("Invalid request: {message}")]
    Validation {
        message: String,
        /// Structured per-field detail when the server provides it.
        detail: Option<serde_json::Value>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the Counsel API; both fields are optional.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    errors: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data in messages
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the human-readable `detail` field out of an error body, falling
    /// back to the (truncated) raw body.
    fn body_message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: Some(detail),
                ..
            }) if !detail.is_empty() => detail,
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            400 | 422 => {
                let parsed = serde_json::from_str::<ErrorBody>(body).ok();
                ApiError::Validation {
                    message: Self::body_message(body),
                    detail: parsed.and_then(|b| b.errors),
                }
            }
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(Self::body_message(body)),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(Self::truncate_body(body)),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// Map a login/signup rejection, where 401/403 means bad credentials
    /// rather than an expired session.
    pub(crate) fn from_auth_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::Authentication(Self::body_message(body)),
            _ => Self::from_status(status, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn maps_statuses_to_variants() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down"),
            ApiError::ServerError(_)
        ));
    }

    #[test]
    fn validation_carries_detail_and_structured_errors() {
        let body = r#"{"detail": "email is not valid", "errors": {"email": ["not valid"]}}"#;
        match ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body) {
            ApiError::Validation { message, detail } => {
                assert_eq!(message, "email is not valid");
                let detail = detail.expect("structured errors should be kept");
                assert_eq!(detail["email"][0], "not valid");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn login_rejection_maps_to_authentication() {
        let body = r#"{"detail": "invalid email or password"}"#;
        match ApiError::from_auth_status(StatusCode::UNAUTHORIZED, body) {
            ApiError::Authentication(message) => {
                assert_eq!(message, "invalid email or password");
            }
            other => panic!("expected Authentication, got {other:?}"),
        }
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(message) => {
                assert!(message.len() < body.len());
                assert!(message.contains("truncated"));
            }
            other => panic!("expected ServerError, got {other:?}"),
        }
    }
}
