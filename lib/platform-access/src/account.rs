//! Directory records describing an identity's account state.

use serde::{Deserialize, Deserializer, Serialize};

use crate::role::Role;

/// Directory entry for an authenticated identity.
///
/// A missing record is a valid state (the identity signed in but has no
/// directory row yet) and is modelled as `Option<AccountRecord>::None` by
/// callers, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Dashboard role, `None` while unset.
    #[serde(default, deserialize_with = "deserialize_role")]
    role: Option<Role>,
    /// Whether the identity finished the onboarding flow.
    #[serde(default, deserialize_with = "deserialize_flag")]
    onboarding_completed: bool,
}

impl AccountRecord {
    /// Creates a record with the given role and onboarding flag.
    #[must_use]
    pub fn new(role: Option<Role>, onboarding_completed: bool) -> Self {
        Self {
            role,
            onboarding_completed,
        }
    }

    /// Returns the account role, if one has been assigned.
    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    /// Returns true once onboarding has been completed.
    #[must_use]
    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    /// Returns true when the account may be routed past the onboarding gate.
    #[must_use]
    pub fn is_onboarded(&self) -> bool {
        self.onboarding_completed && self.role.is_some()
    }
}

fn deserialize_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Role::parse))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<bool> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or(false))
}
