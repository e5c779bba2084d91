//! Dashboard roles stored in the user directory.
//!
//! The directory stores the role as free text. The known values map to the
//! dashboards the platform ships; anything else is preserved verbatim so the
//! resolver can tell "no role yet" apart from "a role we do not route".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an onboarded account.
///
/// An unset role is represented by `Option<Role>::None`, never by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Role {
    /// Job seeker taking assessments.
    Candidate,
    /// Hiring organisation reviewing candidates.
    Employer,
    /// Platform operator.
    Admin,
    /// A stored role with no dedicated dashboard.
    Unrecognized(String),
}

impl Role {
    /// Parses a stored role value.
    ///
    /// Returns `None` for an empty value or the literal `unset`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("unset") {
            return None;
        }

        Some(Self::from(value.to_string()))
    }

    /// Returns the stored representation of this role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Candidate => "candidate",
            Self::Employer => "employer",
            Self::Admin => "admin",
            Self::Unrecognized(other) => other,
        }
    }

    /// Returns the landing path of this role's dashboard, if it has one.
    #[must_use]
    pub fn landing_path(&self) -> Option<&'static str> {
        match self {
            Self::Admin => Some("/admin"),
            Self::Employer => Some("/employer"),
            Self::Candidate => Some("/candidate"),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "candidate" => Self::Candidate,
            "employer" => Self::Employer,
            "admin" => Self::Admin,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unrecognized(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
