//! Post-authentication routing for hirepath.
//!
//! This crate decides where a browser goes after it returns from the identity
//! provider:
//! - Code exchange and identity resolution (`IdentityProvider`)
//! - Account state lookup (`AccountDirectory`, `AccountRecord`, `Role`)
//! - Destination resolution (`resolve_path`, `NextHint`, `Destination`)
//! - Origin resolution under the forwarded-host trust policy (`HostTrustPolicy`)
//! - The callback pipeline tying them together (`CallbackFlow`)
//!
//! # Example
//!
//! ```
//! use hirepath_platform_access::{
//!     AccountRecord, Destination, Environment, HostTrustPolicy, NextHint, Origin, Role,
//!     resolve_path,
//! };
//!
//! let record = AccountRecord::new(Some(Role::Employer), true);
//! let next = NextHint::from_query(Some("/jobs/42"));
//! let path = resolve_path(Some(&record), &next);
//! assert_eq!(path, "/employer");
//!
//! let policy = HostTrustPolicy::new(Environment::Deployed);
//! let request_origin = Origin::parse("http://10.0.0.7:3000").unwrap();
//! let origin = policy.resolve_origin(&request_origin, Some("jobs.example.com"));
//!
//! let destination = Destination::new(origin, path);
//! assert_eq!(destination.location(), "https://jobs.example.com/employer");
//! ```

pub mod account;
pub mod callback;
pub mod destination;
pub mod error;
pub mod identity;
pub mod origin;
pub mod provider;
pub mod role;

// Re-export main types at crate root
pub use account::AccountRecord;
pub use callback::{CallbackFlow, CallbackOutcome, CallbackRequest, CallbackStage};
pub use destination::{
    AUTH_ERROR_PATH, DEFAULT_PATH, Destination, NextHint, ONBOARDING_PATH, resolve_path,
};
pub use error::{CallbackError, DirectoryError, IdentityError};
pub use identity::{AuthorizationCode, Identity, IdentityId, Session};
pub use origin::{Environment, HostTrustPolicy, InvalidOrigin, Origin};
pub use provider::{AccountDirectory, ExchangeRequest, IdentityProvider, PendingLogin};
pub use role::Role;
