use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Failures reported to HTTP callers. Collaborator outages (store, storage)
/// collapse into one opaque `Upstream` error; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Upstream(e) => {
                error!(error = ?e, "upstream failure");
                "service unavailable".to_string()
            }
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_are_opaque() {
        let err = AppError::from(anyhow::anyhow!("pg: connection refused"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn client_errors_keep_their_message() {
        assert_eq!(AppError::NotFound("record").to_string(), "record not found");
        assert_eq!(AppError::BadRequest("bad".into()).status(), StatusCode::BAD_REQUEST);
    }
}
