//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `IdentityError`: failures talking to the identity/session provider
//! - `DirectoryError`: failures talking to the user directory
//! - `CallbackError`: the only failures a browser ever gets to see

use std::fmt;

/// Errors from the identity/session provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider client is misconfigured.
    Configuration { reason: String },
    /// No login was started from this browser (no PKCE verifier available).
    MissingPendingLogin,
    /// The `state` parameter does not match the one issued at login.
    StateMismatch,
    /// The token endpoint rejected the code or could not be reached.
    TokenExchange { reason: String },
    /// The provider did not return a usable identity for the session.
    Identity { reason: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "identity provider configuration error: {reason}")
            }
            Self::MissingPendingLogin => write!(f, "no pending login for this browser"),
            Self::StateMismatch => write!(f, "state parameter mismatch"),
            Self::TokenExchange { reason } => write!(f, "code exchange failed: {reason}"),
            Self::Identity { reason } => write!(f, "identity lookup failed: {reason}"),
        }
    }
}

impl std::error::Error for IdentityError {}

/// Errors from the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The directory could not be reached or timed out.
    Unreachable { reason: String },
    /// The directory answered with a non-success status.
    Rejected { status: u16 },
    /// The directory answered with a body that is not an account row.
    Decode { reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { reason } => write!(f, "directory unreachable: {reason}"),
            Self::Rejected { status } => write!(f, "directory rejected lookup with status {status}"),
            Self::Decode { reason } => write!(f, "invalid directory response: {reason}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Callback failures that send the browser to the error page.
///
/// Neither variant carries provider detail: the browser learns only that
/// sign-in failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    /// The request carried no authorization code.
    MissingCode,
    /// The provider rejected the code or the exchange failed.
    ExchangeFailed,
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCode => write!(f, "missing authorization code"),
            Self::ExchangeFailed => write!(f, "authorization code exchange failed"),
        }
    }
}

impl std::error::Error for CallbackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_error_token_exchange_display() {
        let err = IdentityError::TokenExchange {
            reason: "invalid_grant".to_string(),
        };
        assert!(err.to_string().contains("code exchange failed"));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn directory_error_rejected_display() {
        let err = DirectoryError::Rejected { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn callback_error_display_has_no_detail() {
        assert_eq!(
            CallbackError::ExchangeFailed.to_string(),
            "authorization code exchange failed"
        );
        assert_eq!(
            CallbackError::MissingCode.to_string(),
            "missing authorization code"
        );
    }
}
