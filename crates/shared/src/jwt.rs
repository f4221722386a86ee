//! Bearer token issuing and validation.
//!
//! The ledger trusts HS256 tokens signed with the secret it shares with the
//! identity service. Issuing lives here too so the seeder and tests can mint
//! tokens for known users.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::JwtConfig;
use crate::error::AppError;

/// Upper bound on token lifetime, one week.
const MAX_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Errors raised while issuing or checking a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature is valid but `exp` has passed.
    #[error("token has expired")]
    Expired,

    /// Malformed, wrongly signed or missing required claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signing failed.
    #[error("failed to issue token: {0}")]
    Issue(String),
}

impl TokenError {
    /// Stable code for API error bodies.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Expired => "TOKEN_EXPIRED",
            Self::Invalid(_) => "INVALID_TOKEN",
            Self::Issue(_) => "TOKEN_ISSUE_FAILED",
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Unauthorized("Token has expired".to_string()),
            TokenError::Invalid(_) => Self::Unauthorized("Invalid or malformed token".to_string()),
            TokenError::Issue(e) => Self::Internal(e),
        }
    }
}

/// Signs and verifies access tokens.
#[derive(Clone)]
pub struct JwtService {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl_secs", &self.ttl.num_seconds())
            .field("keys", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Builds the service from the `jwt` config section.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        let ttl_secs = config.access_token_expiry_secs.min(MAX_TOKEN_TTL_SECS);

        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or_default()),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issues a token for `user_id` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Issue` if signing fails.
    pub fn generate_access_token(&self, user_id: Uuid, username: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Issues a token as if it were minted at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Issue` if signing fails.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, username, issued_at, issued_at + self.ttl);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verifies the signature and expiry of `token` and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token and
    /// `TokenError::Invalid` for anything else that does not verify.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}
