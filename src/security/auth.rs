//! Principal verification for the authenticated route group.
//!
//! The group guard delegates token checks to an [`Authenticator`]. The
//! bundled [`JwtAuthenticator`] verifies HS256 bearer tokens carrying a
//! numeric `user_id` claim.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::response::error_response;

/// Verified caller identity, inserted into request extensions by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingToken,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Token verification seam.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// Extract a bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let header = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub iat: u64,
    pub exp: u64,
}

/// HS256 token issuer and verifier.
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
        }
    }

    /// Sign a token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: u64) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        self.sign(&Claims {
            user_id,
            iat: now,
            exp: now + self.ttl_secs,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = bearer_token(headers)?;
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(Principal {
            user_id: data.claims.user_id,
        })
    }
}

/// Group guard: only requests carrying a verified principal reach the handler.
pub async fn require_principal(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticator.authenticate(request.headers()) {
        Ok(principal) => {
            tracing::debug!(user_id = principal.user_id, "Authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %request.uri().path(), "Authentication rejected");
            error_response(StatusCode::UNAUTHORIZED, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_issued_token_verifies() {
        let auth = JwtAuthenticator::new("secret", 60);
        let token = auth.issue(42).unwrap();

        let principal = auth.authenticate(&headers_with(&format!("Bearer {token}"))).unwrap();
        assert_eq!(principal, Principal { user_id: 42 });
    }

    #[test]
    fn test_missing_header() {
        let auth = JwtAuthenticator::new("secret", 60);
        assert!(matches!(
            auth.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_non_bearer_scheme() {
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::MalformedHeader)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtAuthenticator::new("one", 60);
        let verifier = JwtAuthenticator::new("two", 60);
        let token = issuer.issue(7).unwrap();

        assert!(matches!(
            verifier.authenticate(&headers_with(&format!("Bearer {token}"))),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = JwtAuthenticator::new("secret", 60);
        let now = get_current_timestamp();
        let token = auth
            .sign(&Claims {
                user_id: 1,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(auth
            .authenticate(&headers_with(&format!("Bearer {token}")))
            .is_err());
    }
}
