//! Interfaces to the external identity provider and user directory.
//!
//! The callback flow only talks to these traits. The server supplies
//! HTTP-backed implementations; tests supply in-memory ones.

use async_trait::async_trait;
use hirepath_core::Result;
use serde::{Deserialize, Serialize};

use crate::account::AccountRecord;
use crate::error::{DirectoryError, IdentityError};
use crate::identity::{AuthorizationCode, Identity, IdentityId, Session};

/// Login state issued when the browser was sent to the provider.
///
/// Stored client-side between login initiation and the callback.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// CSRF token sent as the `state` parameter.
    pub csrf_token: String,
    /// PKCE code verifier matching the challenge sent to the provider.
    pub pkce_verifier: String,
    /// Redirect URI the authorization request was made with.
    pub redirect_uri: String,
}

impl std::fmt::Debug for PendingLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLogin")
            .field("csrf_token", &"<redacted>")
            .field("pkce_verifier", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Everything needed to redeem an authorization code.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    /// The code from the callback query.
    pub code: AuthorizationCode,
    /// The `state` parameter from the callback query.
    pub state: Option<String>,
    /// Login state stored when the flow started, if the browser still has it.
    pub pending: Option<PendingLogin>,
}

/// Identity/session service that issues authorization codes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Redeems an authorization code for a session.
    ///
    /// Codes are single-use; implementations must not retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the code or cannot be reached.
    async fn exchange_code(&self, request: ExchangeRequest) -> Result<Session, IdentityError>;

    /// Returns the principal the session authenticates.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider does not recognise the session.
    async fn current_identity(&self, session: &Session) -> Result<Identity, IdentityError>;
}

/// Directory holding role and onboarding state per identity.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Fetches the account record for an identity.
    ///
    /// `Ok(None)` means the identity has no directory row yet. The session is
    /// provided so implementations can query on the user's behalf.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be queried.
    async fn lookup_account(
        &self,
        identity_id: &IdentityId,
        session: &Session,
    ) -> Result<Option<AccountRecord>, DirectoryError>;
}
