//! Request correlation identifiers.
//!
//! ULIDs sort by creation time, so ids from one process read in order across
//! log lines.

use std::fmt;
use ulid::Ulid;

/// Correlation identifier attached to the tracing span of one inbound request.
///
/// Displays as `req_<ulid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Ulid);

impl RequestId {
    const PREFIX: &'static str = "req";

    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}
