use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Authenticated caller; the id is only ever used as a partition key.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

        let claims = state.jwt.verify(token).map_err(|e| {
            warn!(error = %e, "rejected token");
            AppError::Unauthorized("invalid or expired token".into())
        })?;

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::sign_for_tests;
    use axum::http::Request;

    async fn extract(header: Option<String>) -> Result<AuthUser, AppError> {
        let state = AppState::fake();
        let mut req = Request::builder().uri("/api/v1/stats");
        if let Some(h) = header {
            req = req.header("Authorization", h);
        }
        let (mut parts, _) = req.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &state).await
    }

    #[tokio::test]
    async fn bearer_token_yields_subject() {
        let cfg = AppState::fake().config.jwt.clone();
        let token = sign_for_tests(&cfg, "openid-abc");
        let AuthUser(id) = extract(Some(format!("Bearer {token}"))).await.unwrap();
        assert_eq!(id, "openid-abc");
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthorized() {
        for h in [None, Some("Basic abc".to_string()), Some("Bearer nope".to_string())] {
            let err = extract(h).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
    }
}
