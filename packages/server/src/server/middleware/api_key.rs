//! Shared-secret checks for machine callers.
//!
//! Secrets are kept as SHA-256 hex digests and compared digest to digest.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use sha2::{Digest, Sha256};

use super::jwt_auth::{AuthUser, RequireAdmin};
use crate::server::app::AppState;
use crate::server::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const WORKER_SECRET_HEADER: &str = "x-worker-secret";

pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Compare a presented secret against a stored digest
pub fn secret_matches(presented: &str, expected_hash: &str) -> bool {
    let presented = hash_secret(presented);
    presented.len() == expected_hash.len()
        && presented
            .bytes()
            .zip(expected_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// `x-api-key`, or a bearer token when that header is absent
fn presented_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn app_state(parts: &Parts) -> Result<AppState, ApiError> {
    parts
        .extensions
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("AppState extension missing")))
}

/// Extractor for the external blog intake key
#[derive(Debug, Clone, Copy)]
pub struct BlogApiKey;

#[async_trait]
impl<S> FromRequestParts<S> for BlogApiKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        match presented_api_key(&parts.headers) {
            Some(key) if secret_matches(key, &state.blog_api_key_hash) => Ok(BlogApiKey),
            Some(_) => Err(ApiError::Unauthorized("Invalid API key".into())),
            None => Err(ApiError::Unauthorized("API key required".into())),
        }
    }
}

/// Who triggered a queue pass
#[derive(Debug, Clone)]
pub enum WorkerCaller {
    Scheduler,
    Admin(AuthUser),
}

/// Extractor for the worker trigger: the worker secret header, else an admin token
#[derive(Debug, Clone)]
pub struct WorkerAccess(pub WorkerCaller);

#[async_trait]
impl<S> FromRequestParts<S> for WorkerAccess
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = app_state(parts)?;
        let presented = parts
            .headers
            .get(WORKER_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());

        if let (Some(secret), Some(expected)) = (presented, app.worker_secret_hash.as_deref()) {
            if secret_matches(secret.trim(), expected) {
                return Ok(WorkerAccess(WorkerCaller::Scheduler));
            }
            return Err(ApiError::Unauthorized("Invalid worker secret".into()));
        }

        let RequireAdmin(user) = RequireAdmin::from_request_parts(parts, state).await?;
        Ok(WorkerAccess(WorkerCaller::Admin(user)))
    }
}
