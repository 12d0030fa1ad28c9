use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::{error, warn};
use uuid::Uuid;

use super::repo_types::User;
use crate::{error::AppError, state::AppState};

/// Header carrying the session token on every protected call.
pub const AUTH_HEADER: &str = "x-auth-token";

pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies `token` and resolves its subject.
///
/// `Ok(None)` means the token is rejected (bad signature, expired, or the
/// user no longer exists). `Err` is reserved for store failures.
pub async fn resolve_session(state: &AppState, token: &str) -> Result<Option<User>, AppError> {
    let Ok(user_id) = state.keys.verify(token) else {
        warn!("invalid or expired token");
        return Ok(None);
    };
    let user = state.users.find_by_id(user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "user lookup failed during authentication");
        AppError::internal(e)
    })?;
    if user.is_none() {
        warn!(%user_id, "token subject not found");
    }
    Ok(user)
}

/// Authenticated caller: the verified identity and the raw token it presented.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            warn!("missing {AUTH_HEADER} header");
            AppError::Unauthenticated
        })?;

        let user = resolve_session(state, token)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(AuthUser {
            user_id: user.id,
            token: token.to_string(),
        })
    }
}
