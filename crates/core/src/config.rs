//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the gateway. Nothing in
//! this crate reads environment variables while requests are in flight.

use crate::constants::{DEFAULT_API_URL, DEFAULT_USER_AGENT};
use crate::{SyncError, SyncResult};
use url::Url;

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    user_agent: String,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// `base_url` must be an absolute `http` or `https` URL; it normally ends in `/api`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidInput`] if the URL cannot be parsed, uses another scheme, or
    /// carries a query or fragment.
    pub fn new(base_url: &str, user_agent: impl Into<String>) -> SyncResult<Self> {
        let cleaned = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(cleaned).map_err(|e| {
            SyncError::InvalidInput(format!("invalid API URL '{cleaned}': {e}"))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SyncError::InvalidInput(format!(
                "API URL must use http or https scheme, got: {}",
                parsed.scheme()
            )));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(SyncError::InvalidInput(
                "API URL must not contain a query or fragment".into(),
            ));
        }

        let user_agent = user_agent.into();
        if user_agent.trim().is_empty() {
            return Err(SyncError::InvalidInput("user agent cannot be empty".into()));
        }

        Ok(Self {
            base_url: parsed,
            user_agent,
        })
    }

    /// Configuration for `base_url` with the default user agent.
    pub fn with_base_url(base_url: &str) -> SyncResult<Self> {
        Self::new(base_url, DEFAULT_USER_AGENT)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Absolute URL of an API resource.
    ///
    /// Each segment is percent-encoded as a single path segment, so identifiers can never
    /// escape their position in the path.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Resolve the API base URL from an optional (environment) value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_API_URL`].
pub fn base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}
