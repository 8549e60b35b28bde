//! Caller identity for request handlers.
//!
//! Tokens are issued by the external identity provider as HS256 JWTs; this
//! module only verifies them. The user id always comes from the token subject,
//! never from a request body.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("jwt_secret", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

pub fn validate_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Request context for the callable functions: `auth` is `None` when no
/// credentials were attached, mirroring an anonymous call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub auth: Option<AuthUser>,
}

impl FromRequestParts<AppState> for CallContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(CallContext { auth: None });
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthenticated("expected Authorization: Bearer <token>".to_string())
            })?;

        let claims = validate_token(token, &state.auth).map_err(|e| {
            tracing::debug!("rejected token: {}", e);
            AppError::Unauthenticated("invalid or expired token".to_string())
        })?;
        if claims.sub.is_empty() {
            return Err(AppError::Unauthenticated("token has no subject".to_string()));
        }

        Ok(CallContext {
            auth: Some(AuthUser {
                user_id: claims.sub,
                email: claims.email,
            }),
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        CallContext::from_request_parts(parts, state)
            .await?
            .auth
            .ok_or_else(|| AppError::Unauthenticated("authentication required".to_string()))
    }
}

/// A verified caller whose role record says `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let role = repository::find_user(&state.db, &user.user_id)
            .await?
            .map(|u| u.role)
            .unwrap_or_default();

        if role != Role::Admin {
            return Err(AppError::PermissionDenied("admin role required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
