//! OAuth 2.0 identity provider client using the oauth2 crate.
//!
//! Implements the authorization-code grant with PKCE. The identity behind the
//! resulting access token is read from the provider's userinfo endpoint.

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use hirepath_platform_access::{
    ExchangeRequest, Identity, IdentityError, IdentityId, IdentityProvider, NextHint,
    PendingLogin, Session,
};
use oauth2::basic::BasicClient;
use oauth2::url::Url;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use rootcause::Report;
use serde::Deserialize;
use std::time::Duration;

use crate::config::IdentityConfig;

/// Client for the external identity/session provider.
pub struct OAuthIdentityProvider {
    http_client: reqwest::Client,
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    userinfo_url: Url,
    redirect_uri: Url,
    scopes: Vec<Scope>,
    default_session_lifetime: ChronoDuration,
}

impl OAuthIdentityProvider {
    /// Creates a provider client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        config: &IdentityConfig,
        default_session_lifetime: ChronoDuration,
    ) -> Result<Self, Report<IdentityError>> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| configuration(format!("invalid token URL: {e}")))?;
        let userinfo_url = Url::parse(&config.userinfo_url)
            .map_err(|e| configuration(format!("invalid userinfo URL: {e}")))?;
        let redirect_uri = Url::parse(&config.redirect_uri)
            .map_err(|e| configuration(format!("invalid redirect URI: {e}")))?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: config.client_secret.clone().map(ClientSecret::new),
            auth_url,
            token_url,
            userinfo_url,
            redirect_uri,
            scopes: config
                .scopes()
                .into_iter()
                .map(|s| Scope::new(s.to_string()))
                .collect(),
            default_session_lifetime,
        })
    }

    /// Generates the authorization URL for redirecting the user.
    ///
    /// A valid `next` hint is carried on the callback URL so it survives the
    /// round trip through the provider.
    pub fn authorization_url(&self, next: &NextHint) -> (String, PendingLogin) {
        let mut redirect_uri = self.redirect_uri.clone();
        if !next.was_rejected() && next.path() != hirepath_platform_access::DEFAULT_PATH {
            redirect_uri.query_pairs_mut().append_pair("next", next.path());
        }

        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(RedirectUrl::from_url(redirect_uri.clone()));

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned())
            .set_pkce_challenge(pkce_challenge)
            .url();

        let pending = PendingLogin {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            redirect_uri: redirect_uri.to_string(),
        };

        (auth_url.to_string(), pending)
    }
}

fn configuration(reason: String) -> IdentityError {
    IdentityError::Configuration { reason }
}

/// Subset of the userinfo response we rely on.
///
/// OIDC providers report the principal as `sub`; some session services
/// use `id` instead.
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(alias = "id")]
    sub: String,
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    async fn exchange_code(
        &self,
        request: ExchangeRequest,
    ) -> hirepath_core::Result<Session, IdentityError> {
        let pending = request.pending.ok_or(IdentityError::MissingPendingLogin)?;

        if request.state.as_deref() != Some(pending.csrf_token.as_str()) {
            return Err(IdentityError::StateMismatch.into());
        }

        let redirect_url = RedirectUrl::new(pending.redirect_uri)
            .map_err(|e| configuration(format!("invalid stored redirect URI: {e}")))?;

        let mut client = BasicClient::new(self.client_id.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(redirect_url);
        if let Some(secret) = &self.client_secret {
            client = client.set_client_secret(secret.clone());
        }

        let token_response = client
            .exchange_code(AuthorizationCode::new(request.code.secret().to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier))
            .request_async(&self.http_client)
            .await
            .map_err(|e| IdentityError::TokenExchange {
                reason: e.to_string(),
            })?;

        let lifetime = token_response
            .expires_in()
            .and_then(|d| ChronoDuration::from_std(d).ok())
            .unwrap_or(self.default_session_lifetime);

        Ok(Session::new(
            token_response.access_token().secret().clone(),
            lifetime,
        ))
    }

    async fn current_identity(
        &self,
        session: &Session,
    ) -> hirepath_core::Result<Identity, IdentityError> {
        let identity_error = |reason: String| IdentityError::Identity { reason };

        let response = self
            .http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(session.access_token())
            .send()
            .await
            .map_err(|e| identity_error(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(identity_error(format!("userinfo returned {status}")).into());
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| identity_error(format!("invalid userinfo response: {e}")))?;

        if info.sub.trim().is_empty() {
            return Err(identity_error("userinfo response has an empty subject".to_string()).into());
        }

        Ok(Identity::new(IdentityId::new(info.sub)))
    }
}
