//! Client configuration.

use reqwest::Url;

use kbdesk_core::defaults::{
    API_URL, ENV_API_URL, ENV_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS, USER_AGENT,
};
use kbdesk_core::{Error, Result};

/// Configuration for [`HttpDocumentApi`](crate::HttpDocumentApi).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the document endpoints, e.g. `http://host/api/document`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Create from environment variables.
    ///
    /// - `KBDESK_API_URL`: base URL (default `http://localhost:5000/api/document`)
    /// - `KBDESK_TIMEOUT_SECS`: request timeout (default 30); zero or
    ///   unparseable values fall back to the default
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn from_dotenv() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(ENV_API_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| API_URL.to_string());
        let timeout_secs = lookup(ENV_TIMEOUT_SECS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(REQUEST_TIMEOUT_SECS);

        Self {
            base_url,
            timeout_secs,
            ..Self::default()
        }
    }

    /// Join an endpoint path onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL of `action` for one document, with the id as a single
    /// percent-encoded path segment.
    pub(crate) fn document_url(&self, action: &str, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint(action))
            .map_err(|e| Error::Config(format!("Invalid base_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("base_url cannot carry a path".to_string()))?
            .push(id);
        Ok(url)
    }
}
