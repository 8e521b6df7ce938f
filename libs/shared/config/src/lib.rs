use std::env;
use std::path::PathBuf;

use tracing::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("PORT '{}' is not a valid port, using {}", raw, DEFAULT_PORT);
                    DEFAULT_PORT
                }),
                Err(_) => DEFAULT_PORT,
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

/// Settings for the booking form front end.
///
/// Appointments go to `api_base_url`. The service catalog lives on a separate
/// host that this workspace does not serve; `catalog_base_url` points at it and
/// falls back to `api_base_url` for deployments that proxy `/services` there.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub catalog_base_url: String,
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_base_url = env::var("BOOKING_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let catalog_base_url = env::var("BOOKING_CATALOG_URL").unwrap_or_else(|_| {
            warn!("BOOKING_CATALOG_URL not set, fetching services from {}", api_base_url);
            api_base_url.clone()
        });

        Self {
            api_base_url,
            catalog_base_url,
            session_file: env::var("BOOKING_SESSION_FILE").ok().map(PathBuf::from),
        }
    }

    /// Uses one host for both appointments and the catalog.
    pub fn single_host(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            catalog_base_url: base_url.to_string(),
            session_file: None,
        }
    }
}
