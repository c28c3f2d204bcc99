// SPDX-License-Identifier: Apache-2.0
//! Token mint/verify.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::claims::AccessClaims;

/// Default access-token lifetime.
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Failures verifying a presented token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signature valid but the token is past its expiry.
    #[error("token expired")]
    Expired,
    /// Anything else: bad signature, malformed envelope, wrong algorithm.
    #[error("token invalid")]
    Invalid,
}

/// HS256 signer/verifier around the process-wide secret.
///
/// Constructed once at startup and shared by reference; there is no hidden
/// global key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Builds a codec over an HMAC secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs `claims` as a compact token string.
    pub fn mint(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verifies signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Issued-at / expiry pair for a token minted at `now`.
    #[must_use]
    pub fn lifetime(now: DateTime<Utc>) -> (i64, i64) {
        let exp = now + Duration::hours(ACCESS_TOKEN_TTL_HOURS);
        (now.timestamp(), exp.timestamp())
    }
}

/// Mints a 256-bit random opaque token (invitations, refresh tokens) as
/// URL-safe unpadded base64.
#[must_use]
pub fn random_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use atrium_core::rbac::PermissionKey;
    use atrium_core::{OrgId, UserId};

    use super::*;

    fn claims(iat: i64, exp: i64) -> AccessClaims {
        AccessClaims {
            user: UserId::generate(),
            email: "a@x.io".into(),
            org: OrgId::generate(),
            role: "Owner".into(),
            perms: vec![PermissionKey::GraphPublish, PermissionKey::GraphEdit],
            iat,
            exp,
        }
    }

    #[test]
    fn mint_verify_round_trips_claims() {
        let codec = TokenCodec::new(b"test-secret");
        let (iat, exp) = TokenCodec::lifetime(Utc::now());
        let original = claims(iat, exp);
        let token = codec.mint(&original).unwrap();
        let decoded = codec.verify(&token).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn expired_token_fails_verification() {
        let codec = TokenCodec::new(b"test-secret");
        let now = Utc::now().timestamp();
        let token = codec.mint(&claims(now - 7200, now - 3600)).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_secret_fails_verification() {
        let minter = TokenCodec::new(b"secret-a");
        let verifier = TokenCodec::new(b"secret-b");
        let (iat, exp) = TokenCodec::lifetime(Utc::now());
        let token = minter.mint(&claims(iat, exp)).unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_token_fails_verification() {
        let codec = TokenCodec::new(b"test-secret");
        let (iat, exp) = TokenCodec::lifetime(Utc::now());
        let mut token = codec.mint(&claims(iat, exp)).unwrap();
        token.push('x');
        assert_eq!(codec.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn opaque_tokens_are_distinct_and_url_safe() {
        let a = random_opaque_token();
        let b = random_opaque_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
