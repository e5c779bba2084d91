//! Authentication routes for login initiation, the callback, and the error page.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hirepath_core::RequestId;
use hirepath_platform_access::{CallbackOutcome, CallbackRequest, NextHint, PendingLogin};
use std::sync::Arc;
use time::Duration as TimeDuration;
use tracing::Instrument;

use super::{AppState, request_origin::forwarded_host};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (PKCE verifier and CSRF token during the flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Raw query pairs in request order.
///
/// Extracting pairs instead of a struct means a repeated parameter can never
/// turn into a `400`; the first occurrence of each key wins.
type QueryPairs = Vec<(String, String)>;

/// Query parameters for starting a login.
#[derive(Debug, Default)]
pub struct LoginQuery {
    next: Option<String>,
}

impl LoginQuery {
    fn from_pairs(pairs: QueryPairs) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            if key == "next" {
                query.next.get_or_insert(value);
            }
        }
        query
    }
}

/// Query parameters for the provider callback.
///
/// Every field is optional: a missing code is handled by the flow, not
/// rejected by the extractor.
#[derive(Debug, Default)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    next: Option<String>,
}

impl CallbackQuery {
    fn from_pairs(pairs: QueryPairs) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "code" => &mut query.code,
                "state" => &mut query.state,
                "next" => &mut query.next,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// Initiates the authorization flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
    jar: CookieJar,
) -> impl IntoResponse {
    let query = LoginQuery::from_pairs(pairs);
    let next = NextHint::from_query(query.next.as_deref());
    let (auth_url, pending) = state.identity_client.authorization_url(&next);

    let jar = match serde_json::to_string(&pending) {
        Ok(value) => {
            let cookie = Cookie::build((AUTH_STATE_COOKIE, value))
                .path("/")
                .http_only(true)
                .secure(state.session_config.secure_cookies)
                .same_site(SameSite::Lax)
                .max_age(TimeDuration::minutes(10));
            jar.add(cookie)
        }
        Err(e) => {
            // The callback will fail the exchange without the verifier.
            tracing::error!(error = %e, "failed to serialize auth state");
            jar
        }
    };

    (jar, Redirect::to(&auth_url))
}

/// Handles the provider callback and redirects to the resolved destination.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
    uri: Uri,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let query = CallbackQuery::from_pairs(pairs);
    let request_id = RequestId::new();
    let span = tracing::info_span!("auth_callback", request_id = %request_id);

    let pending: Option<PendingLogin> = jar
        .get(AUTH_STATE_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok());

    let request = CallbackRequest {
        code: query.code,
        state: query.state,
        next: query.next,
        request_origin: state.request_origin.resolve(&uri, &headers),
        forwarded_host: forwarded_host(&headers),
        pending,
    };

    let outcome = state.callback_flow.run(request).instrument(span).await;

    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);
    let mut jar = jar.add(remove_auth_state);

    if let CallbackOutcome::SignedIn { session, .. } = &outcome {
        let session_cookie = Cookie::build((SESSION_COOKIE, session.access_token().to_string()))
            .path("/")
            .http_only(true)
            .secure(state.session_config.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(TimeDuration::seconds(session.remaining().num_seconds()));
        jar = jar.add(session_cookie);
    }

    (jar, Redirect::temporary(&outcome.destination().location()))
}

/// Static page shown when sign-in fails. Carries no failure detail.
pub async fn auth_code_error() -> impl IntoResponse {
    Html(
        "<!DOCTYPE html>\
         <html lang=\"en\"><head><meta charset=\"utf-8\"><title>Sign-in failed</title></head>\
         <body><h1>Sign-in failed</h1>\
         <p>We could not complete your sign-in. Please <a href=\"/auth/login\">try again</a>.</p>\
         </body></html>",
    )
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
