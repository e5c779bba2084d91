//! Post-login destination resolution.
//!
//! The path is chosen from the account state first and the caller's `next`
//! hint last:
//!
//! 1. no record, no role, or onboarding incomplete: `/onboarding`
//! 2. `admin`: `/admin`
//! 3. `employer`: `/employer`
//! 4. `candidate`: `/candidate`
//! 5. any other role: the validated `next` hint, `/` by default
//!
//! Role landing pages win over an explicit `next`.

use std::fmt;

use crate::account::AccountRecord;
use crate::origin::Origin;

/// Path of the onboarding flow.
pub const ONBOARDING_PATH: &str = "/onboarding";

/// Static page shown when sign-in fails.
pub const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";

/// Path used when no usable `next` hint was supplied.
pub const DEFAULT_PATH: &str = "/";

/// Caller-supplied post-login path, validated against open redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHint {
    path: String,
    rejected: bool,
}

impl NextHint {
    /// Validates the raw `next` query value.
    ///
    /// Only root-relative paths are kept. Absolute URLs, scheme-relative
    /// URLs (`//host`, `/\host`) and control characters are replaced with `/`.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::default(),
            Some(value) if is_root_relative(value) => Self {
                path: value.to_string(),
                rejected: false,
            },
            Some(_) => Self {
                path: DEFAULT_PATH.to_string(),
                rejected: true,
            },
        }
    }

    /// Returns the path to use.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if a supplied value was discarded.
    #[must_use]
    pub fn was_rejected(&self) -> bool {
        self.rejected
    }
}

impl Default for NextHint {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            rejected: false,
        }
    }
}

fn is_root_relative(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !value.chars().any(char::is_control)
}

/// Resolves the post-login path for an account.
#[must_use]
pub fn resolve_path<'a>(record: Option<&'a AccountRecord>, next: &'a NextHint) -> &'a str {
    let Some(record) = record.filter(|r| r.is_onboarded()) else {
        return ONBOARDING_PATH;
    };

    record
        .role()
        .and_then(|role| role.landing_path())
        .unwrap_or_else(|| next.path())
}

/// Final redirect target handed back to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    origin: Origin,
    path: String,
}

impl Destination {
    /// Joins an origin and a root-relative path.
    #[must_use]
    pub fn new(origin: Origin, path: impl Into<String>) -> Self {
        Self {
            origin,
            path: path.into(),
        }
    }

    /// Returns the sign-in error page on `origin`.
    #[must_use]
    pub fn auth_error(origin: Origin) -> Self {
        Self::new(origin, AUTH_ERROR_PATH)
    }

    /// Returns the path part.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the value for the `Location` header.
    #[must_use]
    pub fn location(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.path)
    }
}
