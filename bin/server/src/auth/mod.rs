//! Authentication module for the hirepath server.
//!
//! This module provides:
//! - The OAuth client for the external identity/session provider
//! - The REST client for the user directory
//! - Request origin extraction for redirect targets
//! - The login, callback and error-page routes
//!
//! The routing decisions themselves (where a signed-in user lands, which
//! origin is trusted) live in `hirepath_platform_access`; this module only
//! adapts HTTP to them.

pub mod directory;
pub mod identity;
pub mod request_origin;
pub mod routes;

use crate::config::SessionConfig;
use hirepath_platform_access::CallbackFlow;
use std::sync::Arc;

pub use directory::RestAccountDirectory;
pub use identity::OAuthIdentityProvider;
pub use request_origin::RequestOriginResolver;
pub use routes::{auth_code_error, callback, health, login};

/// Shared application state.
pub struct AppState {
    /// Callback pipeline over the identity provider and directory.
    pub callback_flow: CallbackFlow,
    /// OAuth client used to start logins.
    pub identity_client: Arc<OAuthIdentityProvider>,
    /// Request origin extraction.
    pub request_origin: RequestOriginResolver,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        callback_flow: CallbackFlow,
        identity_client: Arc<OAuthIdentityProvider>,
        request_origin: RequestOriginResolver,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            callback_flow,
            identity_client,
            request_origin,
            session_config,
        }
    }
}
