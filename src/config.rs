use std::env;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

/// Upper bound for `DEFAULT_WINDOW_HOURS` (one year).
pub const MAX_WINDOW_HOURS: i64 = 24 * 366;
/// Upper bound for `DEFAULT_WINDOW_CAP`.
pub const MAX_WINDOW_CAP: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    // LeafAI backend
    pub leaf_api_base_url: String,
    pub leaf_legacy_api_base_url: String,
    pub upstream_timeout_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Dashboard
    pub poll_interval_seconds: u64,
    pub default_window_hours: i64,
    pub default_window_cap: usize,

    // Provisioning sessions
    pub session_ttl_seconds: u64,
    pub session_max_entries: u64,

    // Application metadata
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            leaf_api_base_url: "https://mygrow.leafai.io/api".to_string(),
            leaf_legacy_api_base_url: "https://leafaiapi.projectsave.de/api".to_string(),
            upstream_timeout_seconds: 30,
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            disable_rate_limiting: false,
            rate_limit_per_second: 5,
            rate_limit_burst: 60,
            poll_interval_seconds: 60,
            default_window_hours: 4,
            default_window_cap: 24,
            session_ttl_seconds: 1800,
            session_max_entries: 10_000,
            deployment: Deployment::Local,
        }
    }
}

/// Read an environment variable and parse it, falling back to `default`
/// when it is unset or does not parse.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn base_url(key: &'static str, default: String) -> Result<String, ConfigError> {
    let url = env::var(key).unwrap_or(default);
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Invalid(key, url));
    }
    Ok(url.trim_end_matches('/').to_string())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a backend base URL is not an http(s) URL
    /// or a dashboard window setting is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            // LeafAI backend
            leaf_api_base_url: base_url("LEAF_API_BASE_URL", defaults.leaf_api_base_url)?,
            leaf_legacy_api_base_url: base_url(
                "LEAF_LEGACY_API_BASE_URL",
                defaults.leaf_legacy_api_base_url,
            )?,
            upstream_timeout_seconds: env_or(
                "UPSTREAM_TIMEOUT_SECONDS",
                defaults.upstream_timeout_seconds,
            ),

            // API settings
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: env_or("API_PORT", defaults.api_port),

            // Rate limiting
            disable_rate_limiting: env_or("DISABLE_RATE_LIMITING", defaults.disable_rate_limiting),
            rate_limit_per_second: env_or("RATE_LIMIT_PER_SECOND", defaults.rate_limit_per_second),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", defaults.rate_limit_burst),

            // Dashboard
            poll_interval_seconds: env_or("POLL_INTERVAL_SECONDS", defaults.poll_interval_seconds)
                .max(1),
            default_window_hours: env_or("DEFAULT_WINDOW_HOURS", defaults.default_window_hours),
            default_window_cap: env_or("DEFAULT_WINDOW_CAP", defaults.default_window_cap),

            // Provisioning sessions
            session_ttl_seconds: env_or("SESSION_TTL_SECONDS", defaults.session_ttl_seconds),
            session_max_entries: env_or("SESSION_MAX_ENTRIES", defaults.session_max_entries),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        }
        .validate()
    }

    /// Reject dashboard window settings that would empty every chart or
    /// overflow date arithmetic.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending variable.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(1..=MAX_WINDOW_HOURS).contains(&self.default_window_hours) {
            return Err(ConfigError::Invalid(
                "DEFAULT_WINDOW_HOURS",
                self.default_window_hours.to_string(),
            ));
        }
        if !(1..=MAX_WINDOW_CAP).contains(&self.default_window_cap) {
            return Err(ConfigError::Invalid(
                "DEFAULT_WINDOW_CAP",
                self.default_window_cap.to_string(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}
