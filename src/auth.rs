//! Caller identity and the token authenticator contract.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Who is calling, as established by the bearer token.
///
/// Lives in the request extensions for the rest of the request and is never
/// persisted. Serialises with the claim names used inside tokens.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: String,
    /// Expiry as unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

impl AuthContext {
    /// A context with no expiry set yet. [`Authenticator::generate`] stamps it.
    pub fn new(user_id: i64, role: impl Into<String>) -> Self {
        Self { user_id, role: role.into(), expires_at: 0 }
    }

    /// Sets the expiry to `ttl` from now.
    pub fn expire_in(&mut self, ttl: Duration) {
        self.expires_at = unix_now().saturating_add(ttl.as_secs());
    }

    /// Expired once the current second reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.expires_at
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Why a token could not be issued or accepted.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is not valid: {0}")]
    Invalid(String),

    #[error("unable to generate token: {0}")]
    Generate(String),
}

/// Issues and verifies bearer tokens.
///
/// Implementations are shared by every connection task and must tolerate
/// concurrent calls.
pub trait Authenticator: Send + Sync + 'static {
    /// Signs `claims` with an expiry `ttl` from now.
    fn generate(&self, claims: AuthContext, ttl: Duration) -> Result<String, TokenError>;

    /// Checks the signature and expiry and returns the embedded claims.
    fn verify(&self, token: &str) -> Result<AuthContext, TokenError>;
}
