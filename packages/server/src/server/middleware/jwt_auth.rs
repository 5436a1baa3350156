use crate::common::AdminUserId;
use crate::domains::auth::{AdminUser, JwtService};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Identity taken from a verified session token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: AdminUserId,
    pub email: String,
    pub is_admin: bool,
}

/// Token from the `Authorization` header, with or without the `Bearer ` prefix.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

fn verify_headers(headers: &HeaderMap, jwt_service: &JwtService) -> Option<AuthUser> {
    let token = session_token(headers)?;
    match jwt_service.verify_token(token) {
        Ok(claims) => Some(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
        }),
        Err(e) => {
            debug!(error = %e, "Rejected session token");
            None
        }
    }
}

/// Attaches an [`AuthUser`] to the request when a valid token is present.
///
/// Never rejects: routes that need an admin use [`RequireAdmin`], and the
/// public routes ignore the extension.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(user) = verify_headers(request.headers(), &jwt_service) {
        debug!(user_id = %user.user_id, is_admin = user.is_admin, "Authenticated request");
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Extractor for admin-only handlers
///
/// Requires a verified token carrying the admin claim whose subject is an
/// active row in `admin_users`. Missing or invalid tokens are 401, a valid
/// token without access is 403.
#[derive(Clone, Debug)]
pub struct RequireAdmin(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))?;

        if !user.is_admin {
            return Err(ApiError::Forbidden("Admin access required".into()));
        }

        let state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("AppState extension missing")))?;

        if AdminUser::find_active(user.user_id, &state.deps.db_pool)
            .await?
            .is_none()
        {
            debug!(user_id = %user.user_id, "Token holder is not an active admin");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }

        Ok(RequireAdmin(user))
    }
}
