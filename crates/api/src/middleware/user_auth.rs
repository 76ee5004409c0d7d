//! User JWT authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::jwt::JwtConfig;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated user taken from a validated access token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// JWT ID of the access token.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns the user it was issued to.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt_config.validate_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
        })
    }

    /// Reads and validates the `Authorization: Bearer` header.
    pub fn from_headers(
        jwt_config: &JwtConfig,
        headers: &axum::http::HeaderMap,
    ) -> Result<Self, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;
        Self::validate(jwt_config, token)
    }
}

/// Token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that rejects requests without a valid access token.
///
/// The authenticated user is stored in request extensions for the rate
/// limiter and the [`UserAuth`] extractor.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match UserAuth::from_headers(&state.jwt, req.headers()) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let jwt = JwtConfig::from_rsa_pem(
            crate::test_keys::PRIVATE_KEY,
            crate::test_keys::PUBLIC_KEY,
            3600,
            604800,
            0,
        )
        .unwrap();
        assert!(matches!(
            UserAuth::validate(&jwt, "not-a-token"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_validate_accepts_issued_access_token() {
        let jwt = JwtConfig::from_rsa_pem(
            crate::test_keys::PRIVATE_KEY,
            crate::test_keys::PUBLIC_KEY,
            3600,
            604800,
            0,
        )
        .unwrap();
        let user_id = Uuid::new_v4();
        let pair = jwt.issue_pair(user_id).unwrap();

        let auth = UserAuth::validate(&jwt, &pair.access_token).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.jti, pair.access_jti);

        assert!(UserAuth::validate(&jwt, &pair.refresh_token).is_err());
    }
}
