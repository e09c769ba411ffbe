//! Session token verification and the authenticated caller.
//!
//! Tokens are HS256 JWTs minted by the identity service (or `issue-token`
//! in development). The server only verifies them.

mod extractor;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::error::{AppError, AppResult};
use crate::models::Role;

pub use extractor::{AuthError, SessionAuth, bearer_token};

/// Issuer claim expected on every session token.
pub const SESSION_ISSUER: &str = "school-records";

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub iat: usize,
    pub exp: usize,
    pub user_id: Uuid,
    pub role: Role,
}

/// Identity attached to a verified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reject callers whose role is not listed.
    pub fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role '{}' may not perform this action",
                self.role
            )))
        }
    }
}

/// Signing material for session tokens.
///
/// `Debug` never prints the secret.
pub struct SessionKeys {
    secret: SecretString,
    ttl_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: SecretString, ttl_secs: u64) -> Self {
        Self { secret, ttl_secs }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(
            SecretString::from(settings.secret.expose_secret().to_string()),
            settings.ttl_secs,
        )
    }

    /// Mint a token for the given identity.
    pub fn issue(&self, user_id: Uuid, role: Role) -> AppResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_secs as i64);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            iss: SESSION_ISSUER.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
            user_id,
            role,
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| AppError::InvalidInput(format!("Failed to create session token: {}", e)))
    }

    /// Verify signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Caller, String> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.validate_aud = false;

        let data = decode::<SessionClaims>(token, &key, &validation)
            .map_err(|e| format!("Invalid session token: {}", e))?;

        Ok(Caller {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKeys([REDACTED], ttl={}s)", self.ttl_secs)
    }
}
