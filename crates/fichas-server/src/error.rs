use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fichas_core::FichaError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. The body is always
/// `{"error": <message>, "kind": <snake_case kind>}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(FichaError::InvalidRecord(msg.into()).into())
    }

    pub(crate) fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(err: &FichaError) -> StatusCode {
    match err {
        FichaError::NotFound(_) => StatusCode::NOT_FOUND,
        FichaError::Conflict(_) | FichaError::InvalidTransition { .. } => StatusCode::CONFLICT,
        FichaError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
        FichaError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        FichaError::Io(_) | FichaError::Yaml(_) | FichaError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match self.0.downcast_ref::<FichaError>() {
            Some(e) => (status_for(e), e.kind()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            tracing::error!(kind, "request failed: {:#}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string(), "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
