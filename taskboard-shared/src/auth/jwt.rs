/// JWT token issuance and validation
///
/// Access tokens are HMAC-signed JWTs carrying the user id (`sub`, as a
/// string), the issue time and an absolute expiry. There are no refresh
/// tokens: once an access token expires the user logs in again.
///
/// The signing secret and algorithm live in [`JwtConfig`], handed to
/// [`TokenService::new`] once at startup.
///
/// # Security
///
/// - **Algorithms**: HS256 (default), HS384, HS512
/// - **Expiration**: 30 minutes by default, checked with zero leeway
/// - **Validation**: signature, algorithm and expiry; any failure is "invalid"
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{JwtConfig, TokenService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(JwtConfig::new("test-secret-key-at-least-32-bytes-long"));
///
/// let token = tokens.issue(42)?;
/// let claims = tokens.validate(&token).expect("fresh token validates");
/// assert_eq!(claims.sub, "42");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::UserId;

/// Default access token lifetime
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Algorithm is not a supported HMAC variant
    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,

    /// Signing algorithm (HMAC family only)
    pub algorithm: Algorithm,

    /// Token lifetime
    pub ttl: Duration,
}

impl JwtConfig {
    /// HS256 config with the default 30-minute lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    /// Parses an algorithm name, accepting only HS256/HS384/HS512
    pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
        match Algorithm::from_str(name) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
            _ => Err(JwtError::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish()
    }
}

/// JWT claims structure
///
/// - `sub`: Subject (user ID rendered as a string)
/// - `iat`: Issued at (Unix timestamp)
/// - `exp`: Absolute expiration (Unix timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a subject expiring `ttl` from now
    pub fn new(subject: UserId, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Parses the subject back into a user ID
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

/// Issues and validates access tokens
///
/// Keys are derived once from the config; the service is immutable and
/// shared across requests.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    /// Creates a token service from its configuration
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            ttl: config.ttl,
        }
    }

    /// Issues a token for `subject`, expiring after the configured lifetime
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if encoding fails
    pub fn issue(&self, subject: UserId) -> Result<String, JwtError> {
        self.sign(&Claims::new(subject, self.ttl))
    }

    /// Signs arbitrary claims with the configured key and algorithm
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token and returns its claims
    ///
    /// Returns `None` for malformed tokens, bad signatures, a different
    /// algorithm, or a missing/passed `exp`. Never panics, never errors.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                // Only the failure kind is logged, never the token
                tracing::debug!(reason = ?e.kind(), "Token rejected");
                None
            }
        }
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish_non_exhaustive()
    }
}
