//! RS256 JWT minting and parsing.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use geosense_types::Role;

use crate::error::{Error, Result};

/// Claims embedded in an issued token.
///
/// Constructed at login, never persisted, and reconstructed by [`parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username the token was issued to.
    pub username: String,
    /// Role the token authorizes.
    pub role: Role,
    /// Expiry, seconds since the epoch. Enforced by [`parse`].
    pub exp: u64,
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
}

/// Parse an RSA private key from PEM for minting.
pub fn encoding_key_from_pem(pem: &[u8]) -> Result<EncodingKey> {
    EncodingKey::from_rsa_pem(pem).map_err(Error::Key)
}

/// Parse an RSA public key from PEM for verification.
pub fn decoding_key_from_pem(pem: &[u8]) -> Result<DecodingKey> {
    DecodingKey::from_rsa_pem(pem).map_err(Error::Key)
}

/// Sign a token carrying `{username, role}` that expires after `ttl`.
pub fn mint(key: &EncodingKey, username: &str, role: Role, ttl: Duration) -> Result<String> {
    let now = OffsetDateTime::now_utc();
    let claims = TokenClaims {
        username: username.to_string(),
        role,
        exp: (now + ttl).unix_timestamp().max(0) as u64,
        iat: now.unix_timestamp().max(0) as u64,
    };
    encode(&Header::new(Algorithm::RS256), &claims, key).map_err(Error::Signing)
}

/// Verify a token's signature and expiry and decode its claims.
///
/// Expired tokens are rejected; `exp` is a hard limit, not advisory.
pub fn parse(token: &str, key: &DecodingKey) -> Result<TokenClaims> {
    let validation = Validation::new(Algorithm::RS256);
    let data = decode::<TokenClaims>(token, key, &validation).map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => Error::Expired,
        ErrorKind::InvalidSignature => Error::SignatureInvalid,
        _ => Error::Malformed,
    })?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkeys;

    fn keys() -> (EncodingKey, DecodingKey) {
        (
            encoding_key_from_pem(testkeys::PRIVATE_KEY_PEM.as_bytes()).unwrap(),
            decoding_key_from_pem(testkeys::PUBLIC_KEY_PEM.as_bytes()).unwrap(),
        )
    }

    #[test]
    fn test_mint_then_parse_round_trips_claims() {
        let (enc, dec) = keys();
        let token = mint(&enc, "alice", Role::Admin, Duration::hours(1)).unwrap();

        let claims = parse(&token, &dec).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_key_fails_verification() {
        let enc =
            encoding_key_from_pem(testkeys::OTHER_PRIVATE_KEY_PEM.as_bytes()).unwrap();
        let dec = decoding_key_from_pem(testkeys::PUBLIC_KEY_PEM.as_bytes()).unwrap();

        let token = mint(&enc, "alice", Role::User, Duration::hours(1)).unwrap();
        let err = parse(&token, &dec).unwrap_err();
        assert!(matches!(err, Error::SignatureInvalid));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let (enc, dec) = keys();
        let token = mint(&enc, "alice", Role::User, Duration::hours(-1)).unwrap();

        let err = parse(&token, &dec).unwrap_err();
        assert!(matches!(err, Error::Expired));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let (_, dec) = keys();
        let err = parse("not.a.jwt", &dec).unwrap_err();
        assert!(matches!(err, Error::Malformed));
    }

    #[test]
    fn test_bad_pem_is_rejected() {
        assert!(encoding_key_from_pem(b"garbage").is_err());
        assert!(decoding_key_from_pem(b"garbage").is_err());
    }
}
