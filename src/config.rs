use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3333".to_string(),
            api_timeout: Duration::from_secs(10),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl DashboardConfig {
    /// Reads the process environment. Missing or unparseable values keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup("PARTICIPATION_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base_url);
        let api_timeout = lookup("PARTICIPATION_API_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.api_timeout);
        let host = lookup("HOST")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);

        Self {
            api_base_url,
            api_timeout,
            host,
            port,
        }
    }
}
