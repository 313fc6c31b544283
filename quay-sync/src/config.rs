//! Service configuration
//!
//! Every knob the components need is carried explicitly here; nothing reads
//! the environment after startup.

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path for the request ledger
    pub database_path: String,
    /// HTTP port for the ops surface (health + internal enqueue)
    pub http_port: u16,
    /// Marketplace app key (credential refresh + request signing)
    pub app_key: String,
    /// Marketplace app secret
    pub app_secret: String,
    /// Base URL of the marketplace open API
    pub marketplace_api_url: String,
    /// Base URL of the marketplace auth/token service
    pub marketplace_auth_url: String,
    /// Channel type tag this pipeline owns; events for other channel
    /// types are skipped during intake
    pub channel_type: String,
    /// Seconds between reconciliation runs
    pub reconcile_interval_secs: u64,
    /// Per-call timeout for outbound marketplace requests
    pub request_timeout_secs: u64,
    /// Environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "quay-sync.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            app_key: Self::require_secret("MARKETPLACE_APP_KEY", &environment)?,
            app_secret: Self::require_secret("MARKETPLACE_APP_SECRET", &environment)?,
            marketplace_api_url: std::env::var("MARKETPLACE_API_URL")
                .unwrap_or_else(|_| "https://open-api.marketplace.example".into()),
            marketplace_auth_url: std::env::var("MARKETPLACE_AUTH_URL")
                .unwrap_or_else(|_| "https://auth.marketplace.example".into()),
            channel_type: std::env::var("CHANNEL_TYPE").unwrap_or_else(|_| "marketplace".into()),
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            environment,
        })
    }
}
