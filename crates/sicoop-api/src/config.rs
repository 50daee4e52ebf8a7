//! Server configuration loaded from the environment.

use std::env;
use std::net::SocketAddr;

use sicoop_core::{defaults, Error, Result};
use sicoop_db::SupabaseConfig;

/// Where notification logs are read from and written to.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Supabase PostgREST, usually with the service-role key.
    Supabase(SupabaseConfig),
    /// Process-local store, for development without a Supabase stack.
    Memory,
}

/// Runtime settings of the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum pending notifications handled per call.
    pub batch_limit: usize,
    /// Delivery webhook; deliveries are only logged when unset.
    pub webhook_url: Option<String>,
    pub store: StoreBackend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            batch_limit: defaults::NOTIFICATION_BATCH_LIMIT,
            webhook_url: None,
            store: StoreBackend::Memory,
        }
    }
}

impl ServerConfig {
    /// Load from `HOST`, `PORT`, `NOTIFICATION_BATCH_LIMIT`,
    /// `NOTIFICATION_WEBHOOK_URL` and the Supabase variables.
    ///
    /// The Supabase backend is selected when `SUPABASE_ANON_KEY` is set.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {}", raw)))?,
            Err(_) => defaults::SERVER_PORT,
        };
        let batch_limit = match env::var("NOTIFICATION_BATCH_LIMIT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("Invalid NOTIFICATION_BATCH_LIMIT: {}", raw)))?,
            Err(_) => defaults::NOTIFICATION_BATCH_LIMIT,
        };
        let store = if env::var("SUPABASE_ANON_KEY").map_or(false, |k| !k.is_empty()) {
            StoreBackend::Supabase(SupabaseConfig::from_env())
        } else {
            StoreBackend::Memory
        };

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            batch_limit,
            webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            store,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_limit == 0 {
            return Err(Error::Config(
                "NOTIFICATION_BATCH_LIMIT must be positive".to_string(),
            ));
        }
        if let Some(ref url) = self.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "NOTIFICATION_WEBHOOK_URL must be an http(s) URL: {}",
                    url
                )));
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))
    }
}
