use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use recap_summarizer::SummarizerError;

/// Error taxonomy for the REST surface. Not-found is always 404 (the
/// endpoints answer uniformly), duplicate signup is 400 to match the
/// contract its clients already rely on.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A request field is missing, empty, or malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// The referenced user or chat does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Signup with an email that is already registered.
    #[error("{0}")]
    AlreadyExists(&'static str),

    /// Missing or invalid bearer token.
    #[error("Invalid or missing token")]
    Unauthorized,

    /// The summarization collaborator failed; the message is already
    /// translated for the end user.
    #[error("{0}")]
    Upstream(&'static str),

    /// Datastore or other unexpected failure. Logged, never exposed.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) | ApiError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SummarizerError> for ApiError {
    fn from(err: SummarizerError) -> Self {
        error!("Summarization failed: {}", err);
        ApiError::Upstream(err.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": true, "message": message }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(ApiError::invalid("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Chat not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AlreadyExists("User already exists").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("db exploded")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = ApiError::Internal(anyhow::anyhow!("secret table missing")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
