//! Signed session tokens.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    /// Logged-in username.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no session token")]
    Missing,

    #[error("session token expired")]
    Expired,

    #[error("invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("failed to sign session token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Missing => "missing",
            AuthError::Expired => "expired",
            AuthError::Invalid(_) => "invalid",
            AuthError::Signing(_) => "signing",
        }
    }
}

/// Issues and verifies session tokens, whatever the signing scheme.
pub trait SessionCodec: Send + Sync {
    fn issue(&self, subject: &str) -> Result<String, AuthError>;

    fn verify(&self, token: &str) -> Result<SessionClaim, AuthError>;

    /// Lifetime of newly issued tokens.
    fn ttl(&self) -> Duration;
}

/// HS256 JSON Web Tokens with a server-held secret and no expiry leeway.
pub struct JwtSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtSessions {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Sign an arbitrary claim.
    pub fn encode_claim(&self, claim: &SessionClaim) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claim, &self.encoding)
            .map_err(AuthError::Signing)
    }
}

impl SessionCodec for JwtSessions {
    fn issue(&self, subject: &str) -> Result<String, AuthError> {
        let claim = SessionClaim {
            sub: subject.to_string(),
            exp: jsonwebtoken::get_current_timestamp().saturating_add(self.ttl.as_secs()),
        };
        self.encode_claim(&claim)
    }

    fn verify(&self, token: &str) -> Result<SessionClaim, AuthError> {
        jsonwebtoken::decode::<SessionClaim>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e),
            })
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
