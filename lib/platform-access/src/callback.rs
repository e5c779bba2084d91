//! The post-authentication callback flow.
//!
//! Each callback runs the same linear pipeline:
//!
//! ```text
//! Start -> CodeExchanged -> IdentityResolved -> {RecordFound | RecordAbsent}
//!       -> DestinationComputed -> Redirected
//! ```
//!
//! A missing code or a failed exchange ends at the error page. A failed
//! directory lookup does not: the user is already authenticated, so the flow
//! continues as if no record existed, which lands them on onboarding.

use std::fmt;
use std::sync::Arc;

use crate::account::AccountRecord;
use crate::destination::{Destination, NextHint, resolve_path};
use crate::error::{CallbackError, IdentityError};
use crate::identity::{AuthorizationCode, Identity, Session};
use crate::origin::{HostTrustPolicy, Origin};
use crate::provider::{AccountDirectory, ExchangeRequest, IdentityProvider, PendingLogin};

/// Inputs of one callback request, already extracted from HTTP.
#[derive(Debug, Clone)]
pub struct CallbackRequest {
    /// Raw `code` query parameter.
    pub code: Option<String>,
    /// Raw `state` query parameter.
    pub state: Option<String>,
    /// Raw `next` query parameter.
    pub next: Option<String>,
    /// Origin the server believes it was addressed with.
    pub request_origin: Origin,
    /// Raw `x-forwarded-host` header value.
    pub forwarded_host: Option<String>,
    /// Login state stored by the browser at login initiation.
    pub pending: Option<PendingLogin>,
}

/// Pipeline stage, recorded on log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    Start,
    CodeExchanged,
    IdentityResolved,
    RecordFound,
    RecordAbsent,
    LookupDegraded,
    DestinationComputed,
    ExchangeFailed,
}

impl fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::CodeExchanged => "code_exchanged",
            Self::IdentityResolved => "identity_resolved",
            Self::RecordFound => "record_found",
            Self::RecordAbsent => "record_absent",
            Self::LookupDegraded => "lookup_degraded",
            Self::DestinationComputed => "destination_computed",
            Self::ExchangeFailed => "exchange_failed",
        };
        f.write_str(name)
    }
}

/// Result of running the callback flow.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// The code was redeemed; the browser goes to `destination`.
    SignedIn {
        destination: Destination,
        session: Box<Session>,
        identity: Identity,
    },
    /// Sign-in failed; `destination` is the static error page.
    Failed {
        error: CallbackError,
        destination: Destination,
    },
}

impl CallbackOutcome {
    fn failed(error: CallbackError, origin: Origin) -> Self {
        Self::Failed {
            error,
            destination: Destination::auth_error(origin),
        }
    }

    /// Returns where the browser should be redirected.
    #[must_use]
    pub fn destination(&self) -> &Destination {
        match self {
            Self::SignedIn { destination, .. } | Self::Failed { destination, .. } => destination,
        }
    }

    /// Returns the new session on success.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn { session, .. } => Some(session.as_ref()),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the failure, if sign-in failed.
    #[must_use]
    pub fn error(&self) -> Option<CallbackError> {
        match self {
            Self::SignedIn { .. } => None,
            Self::Failed { error, .. } => Some(*error),
        }
    }
}

/// Runs callbacks against a pair of collaborators.
#[derive(Clone)]
pub struct CallbackFlow {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn AccountDirectory>,
    trust_policy: HostTrustPolicy,
}

impl CallbackFlow {
    /// Creates a flow over the given collaborators and trust policy.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn AccountDirectory>,
        trust_policy: HostTrustPolicy,
    ) -> Self {
        Self {
            identity,
            directory,
            trust_policy,
        }
    }

    /// Processes one callback request.
    pub async fn run(&self, request: CallbackRequest) -> CallbackOutcome {
        let CallbackRequest {
            code,
            state,
            next,
            request_origin,
            forwarded_host,
            pending,
        } = request;

        let Some(code) = AuthorizationCode::from_query(code.as_deref()) else {
            tracing::info!(stage = %CallbackStage::Start, "callback without authorization code");
            return CallbackOutcome::failed(CallbackError::MissingCode, request_origin);
        };

        let exchange = ExchangeRequest {
            code,
            state,
            pending,
        };
        let (session, identity) = match self.authenticate(exchange).await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                tracing::warn!(error = %e, stage = %CallbackStage::ExchangeFailed, "sign-in failed");
                return CallbackOutcome::failed(CallbackError::ExchangeFailed, request_origin);
            }
        };

        let record = self.lookup(&identity, &session).await;

        let next = NextHint::from_query(next.as_deref());
        if next.was_rejected() {
            tracing::debug!("discarding next hint that is not a root-relative path");
        }

        let path = resolve_path(record.as_ref(), &next);
        let origin = self
            .trust_policy
            .resolve_origin(&request_origin, forwarded_host.as_deref());
        let destination = Destination::new(origin, path);

        tracing::info!(
            stage = %CallbackStage::DestinationComputed,
            identity_id = %identity.id(),
            location = %destination,
            "sign-in complete"
        );

        CallbackOutcome::SignedIn {
            destination,
            session: Box::new(session),
            identity,
        }
    }

    async fn authenticate(
        &self,
        exchange: ExchangeRequest,
    ) -> hirepath_core::Result<(Session, Identity), IdentityError> {
        let session = self.identity.exchange_code(exchange).await?;
        tracing::debug!(stage = %CallbackStage::CodeExchanged, "authorization code redeemed");

        let identity = self.identity.current_identity(&session).await?;
        tracing::debug!(
            stage = %CallbackStage::IdentityResolved,
            identity_id = %identity.id(),
            "identity resolved"
        );

        Ok((session, identity))
    }

    async fn lookup(&self, identity: &Identity, session: &Session) -> Option<AccountRecord> {
        match self.directory.lookup_account(identity.id(), session).await {
            Ok(Some(record)) => {
                tracing::debug!(
                    stage = %CallbackStage::RecordFound,
                    role = record.role().map(|r| r.as_str()).unwrap_or("unset"),
                    onboarding_completed = record.onboarding_completed(),
                    "account record found"
                );
                Some(record)
            }
            Ok(None) => {
                tracing::debug!(stage = %CallbackStage::RecordAbsent, "no account record");
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    stage = %CallbackStage::LookupDegraded,
                    identity_id = %identity.id(),
                    "account lookup failed; treating account as not onboarded"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::identity::IdentityId;
    use crate::origin::Environment;
    use crate::provider::AccountDirectory;
    use crate::role::Role;
    use async_trait::async_trait;
    use chrono::Duration;
    use rootcause::Report;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeIdentity {
        reject_code: bool,
        reject_session: bool,
        exchange_calls: AtomicUsize,
        identity_calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn exchange_code(
            &self,
            request: ExchangeRequest,
        ) -> Result<Session, Report<IdentityError>> {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_code {
                return Err(IdentityError::TokenExchange {
                    reason: "invalid_grant".to_string(),
                }
                .into());
            }
            Ok(Session::new(
                format!("token-for-{}", request.code.secret()),
                Duration::hours(1),
            ))
        }

        async fn current_identity(
            &self,
            _session: &Session,
        ) -> Result<Identity, Report<IdentityError>> {
            self.identity_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_session {
                return Err(IdentityError::Identity {
                    reason: "401".to_string(),
                }
                .into());
            }
            Ok(Identity::new(IdentityId::new("user-1")))
        }
    }

    enum Lookup {
        Found(AccountRecord),
        Absent,
        Down,
    }

    struct FakeDirectory {
        lookup: Lookup,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn new(lookup: Lookup) -> Self {
            Self {
                lookup,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AccountDirectory for FakeDirectory {
        async fn lookup_account(
            &self,
            identity_id: &IdentityId,
            _session: &Session,
        ) -> Result<Option<AccountRecord>, Report<DirectoryError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(identity_id.as_str(), "user-1");
            match &self.lookup {
                Lookup::Found(record) => Ok(Some(record.clone())),
                Lookup::Absent => Ok(None),
                Lookup::Down => Err(DirectoryError::Unreachable {
                    reason: "connection refused".to_string(),
                }
                .into()),
            }
        }
    }

    fn origin() -> Origin {
        Origin::parse("http://localhost:3000").expect("valid origin")
    }

    fn request(code: Option<&str>, next: Option<&str>) -> CallbackRequest {
        CallbackRequest {
            code: code.map(str::to_string),
            state: None,
            next: next.map(str::to_string),
            request_origin: origin(),
            forwarded_host: None,
            pending: None,
        }
    }

    fn flow(
        identity: Arc<FakeIdentity>,
        directory: Arc<FakeDirectory>,
        environment: Environment,
    ) -> CallbackFlow {
        CallbackFlow::new(identity, directory, HostTrustPolicy::new(environment))
    }

    #[tokio::test]
    async fn missing_code_makes_no_collaborator_calls() {
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Absent));
        let flow = flow(identity.clone(), directory.clone(), Environment::Deployed);

        for code in [None, Some(""), Some("   ")] {
            let outcome = flow.run(request(code, Some("/jobs/42"))).await;
            assert_eq!(outcome.error(), Some(CallbackError::MissingCode));
            assert_eq!(
                outcome.destination().location(),
                "http://localhost:3000/auth/auth-code-error"
            );
        }

        assert_eq!(identity.exchange_calls.load(Ordering::SeqCst), 0);
        assert_eq!(identity.identity_calls.load(Ordering::SeqCst), 0);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_code_goes_to_error_page() {
        let identity = Arc::new(FakeIdentity {
            reject_code: true,
            ..FakeIdentity::default()
        });
        let directory = Arc::new(FakeDirectory::new(Lookup::Absent));
        let flow = flow(identity.clone(), directory.clone(), Environment::Deployed);

        let outcome = flow.run(request(Some("used-code"), None)).await;

        assert_eq!(outcome.error(), Some(CallbackError::ExchangeFailed));
        assert_eq!(outcome.destination().path(), "/auth/auth-code-error");
        assert!(outcome.session().is_none());
        assert_eq!(identity.exchange_calls.load(Ordering::SeqCst), 1);
        assert_eq!(identity.identity_calls.load(Ordering::SeqCst), 0);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unresolvable_identity_is_an_exchange_failure() {
        let identity = Arc::new(FakeIdentity {
            reject_session: true,
            ..FakeIdentity::default()
        });
        let directory = Arc::new(FakeDirectory::new(Lookup::Absent));
        let flow = flow(identity, directory.clone(), Environment::Deployed);

        let outcome = flow.run(request(Some("code"), None)).await;

        assert_eq!(outcome.error(), Some(CallbackError::ExchangeFailed));
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_record_goes_to_onboarding() {
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Absent));
        let flow = flow(identity.clone(), directory, Environment::Deployed);

        let outcome = flow.run(request(Some("code"), Some("/jobs/42"))).await;

        assert!(outcome.error().is_none());
        assert_eq!(outcome.destination().path(), "/onboarding");
        assert_eq!(identity.exchange_calls.load(Ordering::SeqCst), 1);
        let session = outcome.session().expect("session");
        assert_eq!(session.access_token(), "token-for-code");
    }

    #[tokio::test]
    async fn employer_role_beats_next_hint() {
        let record = AccountRecord::new(Some(Role::Employer), true);
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Found(record)));
        let flow = flow(identity, directory, Environment::Deployed);

        let outcome = flow.run(request(Some("code"), Some("/jobs/42"))).await;

        assert_eq!(outcome.destination().location(), "http://localhost:3000/employer");
    }

    #[tokio::test]
    async fn lookup_outage_degrades_to_onboarding() {
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Down));
        let flow = flow(identity, directory.clone(), Environment::Deployed);

        let outcome = flow.run(request(Some("code"), Some("/jobs/42"))).await;

        assert!(outcome.error().is_none());
        assert!(outcome.session().is_some());
        assert_eq!(outcome.destination().path(), "/onboarding");
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrecognized_role_follows_validated_hint() {
        let record = AccountRecord::new(Some(Role::Unrecognized("recruiter".into())), true);
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Found(record)));
        let flow = flow(identity, directory, Environment::Deployed);

        let kept = flow.run(request(Some("code"), Some("/jobs/42"))).await;
        assert_eq!(kept.destination().path(), "/jobs/42");

        let replaced = flow
            .run(request(Some("code"), Some("https://evil.example/x")))
            .await;
        assert_eq!(replaced.destination().path(), "/");
    }

    #[tokio::test]
    async fn deployed_redirect_uses_forwarded_host() {
        let record = AccountRecord::new(Some(Role::Candidate), true);
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Found(record)));
        let flow = flow(identity, directory, Environment::Deployed);

        let mut req = request(Some("code"), None);
        req.forwarded_host = Some("jobs.example.com".to_string());
        let outcome = flow.run(req).await;

        assert_eq!(
            outcome.destination().location(),
            "https://jobs.example.com/candidate"
        );
    }

    #[tokio::test]
    async fn development_redirect_ignores_forwarded_host() {
        let record = AccountRecord::new(Some(Role::Admin), true);
        let identity = Arc::new(FakeIdentity::default());
        let directory = Arc::new(FakeDirectory::new(Lookup::Found(record)));
        let flow = flow(identity, directory, Environment::Development);

        let mut req = request(Some("code"), None);
        req.forwarded_host = Some("evil.example".to_string());
        let outcome = flow.run(req).await;

        assert_eq!(outcome.destination().location(), "http://localhost:3000/admin");
    }

    #[tokio::test]
    async fn error_page_uses_request_origin() {
        let identity = Arc::new(FakeIdentity {
            reject_code: true,
            ..FakeIdentity::default()
        });
        let directory = Arc::new(FakeDirectory::new(Lookup::Absent));
        let flow = flow(identity, directory, Environment::Deployed);

        let mut req = request(Some("code"), None);
        req.forwarded_host = Some("jobs.example.com".to_string());
        let outcome = flow.run(req).await;

        assert_eq!(
            outcome.destination().location(),
            "http://localhost:3000/auth/auth-code-error"
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(CallbackStage::LookupDegraded.to_string(), "lookup_degraded");
        assert_eq!(CallbackStage::ExchangeFailed.to_string(), "exchange_failed");
    }
}
