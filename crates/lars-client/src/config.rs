//! Repository client configuration.
//!
//! Configures the repository base URL and credentials. Load from the
//! environment for tooling, or construct explicitly for tests.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for connecting to an asset repository.
///
/// Custom `Debug` implementation redacts the credentials to prevent
/// leakage in log output.
#[derive(Clone)]
pub struct RepositoryConfig {
    /// Base URL of the repository service, e.g. `https://repo.example.com`.
    pub repository_url: Url,
    /// Basic-auth user.
    pub user: Option<String>,
    /// Basic-auth password.
    pub password: Option<Zeroizing<String>>,
    /// API key sent as a query parameter on every request.
    pub api_key: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("repository_url", &self.repository_url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RepositoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LARS_REPOSITORY_URL` (required)
    /// - `LARS_USER`, `LARS_PASSWORD` (optional basic auth; both or neither)
    /// - `LARS_API_KEY` (optional)
    /// - `LARS_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("LARS_REPOSITORY_URL").map_err(|_| ConfigError::MissingUrl)?;
        let repository_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("LARS_REPOSITORY_URL".to_string(), e.to_string()))?;

        let user = std::env::var("LARS_USER").ok();
        let password = std::env::var("LARS_PASSWORD").ok().map(Zeroizing::new);
        if user.is_some() != password.is_some() {
            return Err(ConfigError::IncompleteCredentials);
        }

        Ok(Self {
            repository_url,
            user,
            password,
            api_key: std::env::var("LARS_API_KEY").ok().map(Zeroizing::new),
            timeout_secs: std::env::var("LARS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Unauthenticated configuration for a local or mock repository.
    pub fn local(url: &str) -> Result<Self, ConfigError> {
        let repository_url =
            Url::parse(url).map_err(|e| ConfigError::InvalidUrl(url.to_string(), e.to_string()))?;
        Ok(Self {
            repository_url,
            user: None,
            password: None,
            api_key: None,
            timeout_secs: 5,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("LARS_REPOSITORY_URL environment variable is required")]
    MissingUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("LARS_USER and LARS_PASSWORD must be set together")]
    IncompleteCredentials,
}
