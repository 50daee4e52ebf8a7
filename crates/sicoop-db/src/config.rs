//! Supabase connection settings.

use std::env;
use std::time::Duration;

use sicoop_core::{defaults, Error, Result};

/// Connection settings for the Supabase PostgREST API.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub url: String,
    /// Public anon key, sent as the `apikey` header on every request.
    pub anon_key: String,
    /// Signed-in user's JWT. Row-level security sees this user.
    pub access_token: Option<String>,
    /// Service-role key for server-side callers that bypass row-level security.
    pub service_role_key: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::SUPABASE_URL.to_string(),
            anon_key: String::new(),
            access_token: None,
            service_role_key: None,
            timeout_secs: defaults::REMOTE_TIMEOUT_SECS,
        }
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        self.service_role_key = Some(key.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: env::var("SUPABASE_URL").unwrap_or_else(|_| defaults::SUPABASE_URL.to_string()),
            anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            access_token: env::var("SUPABASE_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            timeout_secs: env::var("SUPABASE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::REMOTE_TIMEOUT_SECS),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "SUPABASE_URL must be an http(s) URL, got '{}'",
                self.url
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(Error::Config("SUPABASE_ANON_KEY is not set".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("SUPABASE_TIMEOUT_SECS must be positive".into()));
        }
        Ok(())
    }

    /// Token sent as `Authorization: Bearer`: the user's JWT, else the
    /// service-role key, else the anon key.
    pub fn bearer_token(&self) -> &str {
        self.access_token
            .as_deref()
            .or(self.service_role_key.as_deref())
            .unwrap_or(&self.anon_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
