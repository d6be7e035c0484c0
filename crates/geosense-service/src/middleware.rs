//! Token-based authorization for guarded routes.
//!
//! Requests carry a JWT either in the `Authorization: token <jwt>` header or
//! as a `token` query parameter. A header carrying the `token` scheme wins
//! over the query parameter; a header with any other scheme is ignored and
//! the query parameter is consulted instead. The verifier checks the RS256
//! signature and expiry against the authenticator's public key, then gates
//! on role:
//!
//! - no usable token at all: 401
//! - token present but unparseable or expired: 400
//! - valid token, insufficient role: 403
//!
//! Verified claims are inserted into request extensions so handlers can read
//! who made the call.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::DecodingKey;
use tracing::warn;

use geosense_auth::token::{self, TokenClaims};
use geosense_types::Role;

use crate::api::ApiError;

/// Verifies bearer tokens against the authenticator's public key.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<DecodingKey>,
}

impl TokenVerifier {
    /// Build a verifier from an RSA public key in PEM form.
    pub fn new(public_key_pem: &[u8]) -> Result<Self, geosense_auth::Error> {
        Ok(Self {
            key: Arc::new(token::decoding_key_from_pem(public_key_pem)?),
        })
    }

    /// Authorize a request against the allowed roles.
    ///
    /// An empty `allowed` slice admits any authenticated caller.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        query: Option<&str>,
        allowed: &[Role],
    ) -> Result<TokenClaims, ApiError> {
        let raw = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(scheme_token)
            .or_else(|| token_from_query(query))
            .ok_or_else(|| ApiError::Unauthorized("missing token".to_string()))?;

        let claims = token::parse(raw, &self.key).map_err(ApiError::from)?;

        if !allowed.is_empty() && !allowed.contains(&claims.role) {
            warn!(username = %claims.username, role = %claims.role, "role not permitted");
            return Err(ApiError::Forbidden("insufficient role".to_string()));
        }

        Ok(claims)
    }
}

/// Split an `Authorization` header value on the `token` scheme. Any other
/// scheme yields `None` so the caller can fall back to the query parameter.
fn scheme_token(value: &str) -> Option<&str> {
    let mut parts = value.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(rest)) if scheme.eq_ignore_ascii_case("token") && !rest.is_empty() => {
            Some(rest)
        }
        _ => None,
    }
}

/// Pull a `token` parameter out of a raw query string.
fn token_from_query(query: Option<&str>) -> Option<&str> {
    query?.split('&').find_map(|param| {
        let mut parts = param.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) if !value.is_empty() => Some(value),
            _ => None,
        }
    })
}

async fn guard(
    verifier: &TokenVerifier,
    allowed: &[Role],
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match verifier.authorize(
        request.headers(),
        request.uri().query(),
        allowed,
    ) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Middleware admitting only ADMIN callers.
pub async fn require_admin(
    State(verifier): State<Arc<TokenVerifier>>,
    request: Request,
    next: Next,
) -> Response {
    guard(&verifier, &[Role::Admin], request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use geosense_auth::testkeys;
    use geosense_auth::token::encoding_key_from_pem;
    use time::Duration;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(testkeys::PUBLIC_KEY_PEM.as_bytes()).unwrap()
    }

    fn mint(role: Role, ttl: Duration) -> String {
        let key = encoding_key_from_pem(testkeys::PRIVATE_KEY_PEM.as_bytes()).unwrap();
        token::mint(&key, "alice", role, ttl).unwrap()
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_valid_header_token_yields_claims() {
        let token = mint(Role::User, Duration::hours(1));
        let claims = verifier()
            .authorize(&headers_with(&token), None, &[])
            .unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_query_token_accepted_when_header_absent() {
        let token = mint(Role::User, Duration::hours(1));
        let query = format!("token={token}");
        let claims = verifier()
            .authorize(&HeaderMap::new(), Some(&query), &[])
            .unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_header_takes_precedence_over_query() {
        let good = mint(Role::User, Duration::hours(1));
        let query = "token=garbage".to_string();
        // Header wins, so the bad query token is never looked at.
        let claims = verifier()
            .authorize(&headers_with(&good), Some(&query), &[])
            .unwrap();
        assert_eq!(claims.username, "alice");

        // And the other way round: a bad header is a 400 even with a good
        // token in the query.
        let query = format!("token={good}");
        let err = verifier()
            .authorize(&headers_with("garbage"), Some(&query), &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let err = verifier()
            .authorize(&HeaderMap::new(), None, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_non_token_scheme_falls_back_to_query() {
        let token = mint(Role::User, Duration::hours(1));
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        // No query token to fall back to: the request carries nothing usable.
        let err = verifier().authorize(&headers, None, &[]).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let query = format!("token={token}");
        let claims = verifier()
            .authorize(&headers, Some(&query), &[])
            .unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_expired_token_is_bad_request() {
        let token = mint(Role::Admin, Duration::hours(-1));
        let err = verifier()
            .authorize(&headers_with(&token), None, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_token_signed_with_other_key_is_bad_request() {
        let key = encoding_key_from_pem(testkeys::OTHER_PRIVATE_KEY_PEM.as_bytes()).unwrap();
        let token = token::mint(&key, "mallory", Role::Admin, Duration::hours(1)).unwrap();
        let err = verifier()
            .authorize(&headers_with(&token), None, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_role_gate() {
        let token = mint(Role::User, Duration::hours(1));
        let err = verifier()
            .authorize(&headers_with(&token), None, &[Role::Admin])
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let token = mint(Role::Admin, Duration::hours(1));
        let claims = verifier()
            .authorize(&headers_with(&token), None, &[Role::Admin])
            .unwrap();
        assert_eq!(claims.role, Role::Admin);
    }
}
