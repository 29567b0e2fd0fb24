use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use recipebook_core::UserId;

use crate::AuthFailure;

/// JWT claims model.
///
/// A credential only names its subject; the role is looked up from the
/// account on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / account identifier.
    pub sub: UserId,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch.
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(sub: UserId, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of JWT claims.
///
/// Signature verification happens in [`TokenCodec::decode`]; this is kept
/// separate so expiry can be tested against a fixed clock.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct TokenIssueError(#[from] jsonwebtoken::errors::Error);

/// HS256 signer/verifier for session credentials.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<String, TokenIssueError> {
        let claims = JwtClaims::new(sub, now, self.ttl);
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify signature and time window, returning the claims.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthFailure> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|_| AuthFailure::MalformedCredential)?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            TokenValidationError::Expired => AuthFailure::ExpiredCredential,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                AuthFailure::MalformedCredential
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret", Duration::minutes(10))
    }

    #[test]
    fn issued_token_decodes_to_subject() {
        let now = Utc::now();
        let sub = UserId::new();
        let token = codec().issue(sub, now).unwrap();

        let claims = codec().decode(&token, now).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn token_past_expiry_is_expired() {
        let now = Utc::now();
        let token = codec().issue(UserId::new(), now).unwrap();

        let err = codec().decode(&token, now + Duration::minutes(10)).unwrap_err();
        assert_eq!(err, AuthFailure::ExpiredCredential);
    }

    #[test]
    fn token_signed_with_other_secret_is_malformed() {
        let now = Utc::now();
        let other = TokenCodec::new(b"other-secret", Duration::minutes(10));
        let token = other.issue(UserId::new(), now).unwrap();

        assert_eq!(codec().decode(&token, now).unwrap_err(), AuthFailure::MalformedCredential);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            codec().decode("not.a.jwt", Utc::now()).unwrap_err(),
            AuthFailure::MalformedCredential
        );
    }

    #[test]
    fn validate_claims_rejects_inverted_window() {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: UserId::new(),
            iat: now.timestamp(),
            exp: now.timestamp() - 1,
        };
        assert_eq!(
            validate_claims(&claims, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn validate_claims_rejects_future_issue() {
        let now = Utc::now();
        let claims = JwtClaims::new(UserId::new(), now + Duration::minutes(5), Duration::minutes(10));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }
}
