//! REST client for the user directory.
//!
//! The directory exposes account rows over a PostgREST-style interface:
//! `GET /rest/v1/{table}?id=eq.{id}&select=...` returns a JSON array with zero
//! or one row. Requests carry the project API key and the signed-in user's
//! access token so row-level policies apply.

use async_trait::async_trait;
use hirepath_platform_access::{
    AccountDirectory, AccountRecord, DirectoryError, IdentityId, Session,
};
use reqwest::Url;
use rootcause::Report;
use std::time::Duration;

use crate::config::DirectoryConfig;

/// Columns fetched for an account record.
const ACCOUNT_COLUMNS: &str = "role,onboarding_completed";

/// Directory client backed by the REST interface.
pub struct RestAccountDirectory {
    http_client: reqwest::Client,
    table_url: Url,
    api_key: String,
}

impl RestAccountDirectory {
    /// Creates a directory client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self, Report<DirectoryError>> {
        let base = config.base_url.trim_end_matches('/');
        let table_url = Url::parse(&format!("{base}/rest/v1/{}", config.table)).map_err(|e| {
            DirectoryError::Unreachable {
                reason: format!("invalid directory URL: {e}"),
            }
        })?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DirectoryError::Unreachable {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            table_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Returns the URL queried for an identity.
    fn lookup_url(&self, identity_id: &IdentityId) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{identity_id}"))
            .append_pair("select", ACCOUNT_COLUMNS)
            .append_pair("limit", "1");
        url
    }
}

#[async_trait]
impl AccountDirectory for RestAccountDirectory {
    async fn lookup_account(
        &self,
        identity_id: &IdentityId,
        session: &Session,
    ) -> hirepath_core::Result<Option<AccountRecord>, DirectoryError> {
        let response = self
            .http_client
            .get(self.lookup_url(identity_id))
            .header("apikey", &self.api_key)
            .bearer_auth(session.access_token())
            .send()
            .await
            .map_err(|e| DirectoryError::Unreachable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }

        let rows: Vec<AccountRecord> =
            response.json().await.map_err(|e| DirectoryError::Decode {
                reason: e.to_string(),
            })?;

        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> DirectoryConfig {
        DirectoryConfig {
            base_url: base_url.to_string(),
            api_key: "anon".to_string(),
            table: "profiles".to_string(),
            timeout_seconds: 1,
        }
    }

    #[test]
    fn lookup_url_filters_by_identity() {
        let directory = RestAccountDirectory::new(&config("https://db.example.com/")).expect("valid");
        let url = directory.lookup_url(&IdentityId::new("6f1c-42"));

        assert_eq!(url.path(), "/rest/v1/profiles");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), "eq.6f1c-42".to_string()),
                ("select".to_string(), "role,onboarding_completed".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn identity_id_is_query_encoded() {
        let directory = RestAccountDirectory::new(&config("https://db.example.com")).expect("valid");
        let url = directory.lookup_url(&IdentityId::new("a&select=*"));
        let id = url
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned());
        assert_eq!(id.as_deref(), Some("eq.a&select=*"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(RestAccountDirectory::new(&config("not a url")).is_err());
    }

    #[tokio::test]
    async fn unreachable_directory_is_an_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let directory = RestAccountDirectory::new(&config("http://127.0.0.1:9")).expect("valid");
        let session = Session::new("token".to_string(), chrono::Duration::minutes(5));
        let result = directory
            .lookup_account(&IdentityId::new("user-1"), &session)
            .await;
        assert!(result.is_err());
    }
}
