//! Origin resolution under the forwarded-host trust policy.
//!
//! Where the browser is sent after sign-in depends on how the request reached
//! us. In development there is no proxy, so the request's own origin is used
//! and `x-forwarded-host` is ignored. When deployed, the service sits behind a
//! TLS-terminating proxy that sets `x-forwarded-host` to the client-facing
//! host; that header is trusted and the scheme forced to `https`.
//!
//! The proxy is assumed to sanitize the header. Deployments that cannot
//! guarantee this can configure an allow-list, in which case unknown hosts
//! fall back to the request's own origin.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Deployment environment the service is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development, no reverse proxy in front of the service.
    Development,
    /// Deployed behind a trusted TLS-terminating proxy.
    #[default]
    Deployed,
}

impl Environment {
    /// Returns true for local development.
    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Error returned when a value is not a usable `scheme://host` origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOrigin {
    /// The rejected value.
    pub value: String,
}

impl fmt::Display for InvalidOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid origin: {:?}", self.value)
    }
}

impl std::error::Error for InvalidOrigin {}

/// Scheme and authority a browser can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    /// Creates an origin from a scheme and a `host[:port]` authority.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme is not `http`/`https` or the host is
    /// not a bare authority.
    pub fn new(scheme: &str, host: &str) -> Result<Self, InvalidOrigin> {
        let scheme = scheme.to_ascii_lowercase();
        if !matches!(scheme.as_str(), "http" | "https") || !is_valid_host(host) {
            return Err(InvalidOrigin {
                value: format!("{scheme}://{host}"),
            });
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
        })
    }

    /// Parses a `scheme://host[:port]` string; a single trailing `/` is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an origin.
    pub fn parse(value: &str) -> Result<Self, InvalidOrigin> {
        let invalid = || InvalidOrigin {
            value: value.to_string(),
        };

        let (scheme, rest) = value.trim().split_once("://").ok_or_else(invalid)?;
        let host = rest.strip_suffix('/').unwrap_or(rest);
        Self::new(scheme, host).map_err(|_| invalid())
    }

    /// Returns the scheme (`http` or `https`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the `host[:port]` authority.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Returns true if `host` is a bare `host[:port]` authority.
///
/// Rejects anything that could change the meaning of a URL it is
/// interpolated into: userinfo, paths, queries, fragments, whitespace.
/// IPv6 literals must be bracketed, and a port must be a `u16`.
#[must_use]
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty()
        || host.len() > 261
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '[' | ']' | '_'))
    {
        return false;
    }

    let (name, port) = if let Some(literal) = host.strip_prefix('[') {
        let Some((address, rest)) = literal.split_once(']') else {
            return false;
        };
        if address.is_empty() || address.contains(['[', ']']) {
            return false;
        }
        match rest {
            "" => (address, None),
            _ => match rest.strip_prefix(':') {
                Some(port) => (address, Some(port)),
                None => return false,
            },
        }
    } else {
        if host.contains(['[', ']']) {
            return false;
        }
        match host.split_once(':') {
            Some((name, port)) => (name, Some(port)),
            None => (host, None),
        }
    };

    !name.is_empty()
        && port.is_none_or(|p| p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<u16>().is_ok())
}

/// Decides which origin a post-login redirect should use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HostTrustPolicy {
    /// Environment the service is deployed in.
    #[serde(default)]
    environment: Environment,
    /// Permitted forwarded hosts, configured as a comma-separated string.
    /// Empty trusts whatever the proxy forwards.
    #[serde(default, deserialize_with = "deserialize_host_list")]
    allowed_forwarded_hosts: Vec<String>,
}

fn parse_host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_host_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_host_list(&value))
}

impl HostTrustPolicy {
    /// Creates a policy that trusts the forwarded host unconditionally when deployed.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            allowed_forwarded_hosts: Vec::new(),
        }
    }

    /// Restricts the forwarded hosts that will be honoured.
    #[must_use]
    pub fn with_allowed_forwarded_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_forwarded_hosts = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        self
    }

    /// Returns the configured environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns the allow-listed forwarded hosts, empty when unrestricted.
    #[must_use]
    pub fn allowed_forwarded_hosts(&self) -> &[String] {
        &self.allowed_forwarded_hosts
    }

    /// Resolves the origin to redirect to.
    ///
    /// `forwarded_host` is the raw `x-forwarded-host` header value, if any.
    /// Only its first comma-separated entry is considered.
    #[must_use]
    pub fn resolve_origin(&self, request_origin: &Origin, forwarded_host: Option<&str>) -> Origin {
        if self.environment.is_development() {
            if forwarded_host.is_some() {
                tracing::debug!("ignoring x-forwarded-host in development");
            }
            return request_origin.clone();
        }

        let Some(raw) = forwarded_host else {
            return request_origin.clone();
        };

        let host = raw.split(',').next().map(str::trim).unwrap_or_default();
        if host.is_empty() {
            return request_origin.clone();
        }

        if !self.is_permitted(host) {
            tracing::warn!(
                forwarded_host = %host,
                "forwarded host not in allow-list; using request origin"
            );
            return request_origin.clone();
        }

        match Origin::new("https", host) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::warn!(error = %e, "malformed forwarded host; using request origin");
                request_origin.clone()
            }
        }
    }

    fn is_permitted(&self, host: &str) -> bool {
        self.allowed_forwarded_hosts.is_empty()
            || self
                .allowed_forwarded_hosts
                .iter()
                .any(|a| a.eq_ignore_ascii_case(host))
    }
}
