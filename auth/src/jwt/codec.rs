use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenKind;
use super::errors::TokenError;
use crate::clock::Clock;

/// Signs and verifies access and refresh tokens.
///
/// Uses an HMAC algorithm (HS256 by default) with a process-wide secret.
/// Expiry is checked against the injected [`Clock`] rather than the wall
/// clock, so the codec is deterministic under test.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec signing with HS256.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `clock` - Time source for issuance and expiry checks
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Changing the secret invalidates every token issued before the change
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self::build(secret, Algorithm::HS256, clock)
    }

    /// Create a codec with an explicit HMAC algorithm.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is not HS256, HS384 or HS512
    pub fn with_algorithm(
        secret: &[u8],
        algorithm: Algorithm,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                Ok(Self::build(secret, algorithm, clock))
            }
            other => Err(TokenError::UnsupportedAlgorithm(format!("{:?}", other))),
        }
    }

    /// Parse an algorithm name such as `"HS256"` from configuration.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Unknown name or not an HMAC algorithm
    pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
        let algorithm = Algorithm::from_str(name)
            .map_err(|_| TokenError::UnsupportedAlgorithm(name.to_string()))?;

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            _ => Err(TokenError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    fn build(secret: &[u8], algorithm: Algorithm, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(algorithm);
        // Expiry is evaluated against the injected clock in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
            clock,
        }
    }

    /// Time source used by this codec.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue a signed token.
    ///
    /// # Arguments
    /// * `subject` - Token subject (user email)
    /// * `kind` - Access or refresh
    /// * `ttl` - Lifetime counted from now
    ///
    /// # Returns
    /// Compact JWT string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_with_claims(subject, kind, ttl).map(|(token, _)| token)
    }

    /// Issue a signed token and return the claims it carries.
    ///
    /// Callers that persist the token use the claims' expiry so the stored
    /// record and the token agree on when it stops being valid.
    pub fn issue_with_claims(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, Claims), TokenError> {
        let claims = Claims::new(subject, kind, self.clock.now(), ttl);
        let header = Header::new(self.algorithm);

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok((token, claims))
    }

    /// Verify a token and return its claims.
    ///
    /// Checks signature, algorithm, `now < exp`, and that the token is of
    /// the expected kind.
    ///
    /// # Errors
    /// * `Invalid` - Any check failed; the reason is logged, not returned
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected: decoding failed");
                TokenError::Invalid
            })?;

        if claims.kind != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.kind,
                "Token rejected: wrong kind"
            );
            return Err(TokenError::Invalid);
        }

        if claims.is_expired(self.clock.now()) {
            tracing::debug!(exp = claims.exp, "Token rejected: expired");
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }
}
