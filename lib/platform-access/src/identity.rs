//! Authorization codes, sessions and the identities they authenticate.
//!
//! None of these values outlive the request that produced them. Secret
//! material is redacted from `Debug` output so it cannot leak into logs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-use authorization code returned by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Wraps a code taken from the callback query string.
    ///
    /// Returns `None` for a missing or blank value.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| Self(code.to_string()))
    }

    /// Returns the raw code for submission to the token endpoint.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationCode(<redacted>)")
    }
}

/// Identifier of a principal as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Creates an identity ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated principal behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: IdentityId,
}

impl Identity {
    /// Creates an identity for a provider-issued ID.
    #[must_use]
    pub fn new(id: IdentityId) -> Self {
        Self { id }
    }

    /// Returns the identity's provider ID.
    #[must_use]
    pub fn id(&self) -> &IdentityId {
        &self.id
    }
}

/// Credential material produced by a successful code exchange.
///
/// Refresh tokens are not kept: the session ends when the access token does.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session valid for `lifetime` from now.
    #[must_use]
    pub fn new(access_token: String, lifetime: Duration) -> Self {
        Self {
            access_token,
            expires_at: Utc::now() + lifetime,
        }
    }

    /// Returns the bearer access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the lifetime left on the session, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).max(Duration::zero())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
