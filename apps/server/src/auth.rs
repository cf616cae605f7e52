//! JWT authentication.
//!
//! Tokens are issued by the login service and verified here. The token is
//! looked up in this order:
//!
//! 1. cookie `userAuthToken` (role-scoped user)
//! 2. cookie `authToken` (admin)
//! 3. `Authorization: Bearer <token>`
//!
//! The `username` claim is the tenant key for every query.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub const USER_COOKIE: &str = "userAuthToken";
pub const ADMIN_COOKIE: &str = "authToken";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,

    /// Login name, doubles as the tenant
    pub username: String,

    /// "admin" or a staff role
    pub role: String,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// HS256 token verifier.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtManager {
    pub fn new(secret: &str) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token valid for `lifetime`. Used by tooling and tests; the
    /// production login service signs with the same secret.
    pub fn issue(
        &self,
        user_id: &str,
        username: &str,
        role: &str,
        lifetime: Duration,
    ) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + lifetime).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// The caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,

    /// Tenant key; every repository call is scoped to it.
    pub tenant: String,
    pub role: String,
}

impl AuthUser {
    /// Rejects access to another user's records.
    pub fn ensure_self(&self, user_id: &str) -> Result<(), ApiError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("Cannot access another user's profile"))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(USER_COOKIE)
            .or_else(|| jar.get(ADMIN_COOKIE))
            .map(|cookie| cookie.value().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(extract_bearer_token)
                    .map(str::to_string)
            })
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let claims = state.jwt.validate(&token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            tenant: claims.username,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret");
        let token = manager
            .issue("user-1", "grand-hotel", "admin", Duration::hours(1))
            .unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "grand-hotel");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("one")
            .issue("user-1", "grand-hotel", "admin", Duration::hours(1))
            .unwrap();
        assert!(JwtManager::new("two").validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new("test-secret");
        let token = manager
            .issue("user-1", "grand-hotel", "admin", Duration::hours(-2))
            .unwrap();
        assert!(manager.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
