//! Profile resolution and logging configuration.
//!
//! All process-wide configuration is carried in explicit structs built at
//! the CLI entry point; environment variables serve only as fallbacks for
//! flags the operator did not pass.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment fallback for `--api-client-id`.
pub const ENV_API_CLIENT_ID: &str = "AEGIS_API_CLIENT_ID";

/// Environment variable holding the API secret (never a CLI flag).
pub const ENV_API_SECRET: &str = "AEGIS_API_SECRET";

/// Environment fallback for `--api-url`.
pub const ENV_API_URL: &str = "AEGIS_API_URL";

/// Environment fallback for `--config-dir`.
pub const ENV_CONFIG_DIR: &str = "AEGIS_CONFIG_DIR";

/// Default API base URL.
const DEFAULT_API_URL: &str = "https://api.aegis.example.com";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required credential was neither passed nor present in the environment
    #[error("missing credential: {0} (pass the flag or set the environment variable)")]
    MissingCredential(&'static str),

    /// No usable per-user configuration directory could be determined
    #[error("could not determine a config directory; pass --config-dir or set {ENV_CONFIG_DIR}")]
    NoConfigDir,
}

/// Resolved API credential scope for one invocation.
///
/// The `api_client_id` doubles as the on-disk checkpoint scope: checkpoints
/// created under one credential are invisible to another.
#[derive(Debug, Clone)]
pub struct Profile {
    /// API client identifier
    pub api_client_id: String,
    /// API client secret
    pub api_secret: String,
    /// Base URL of the API
    pub base_url: String,
    /// Root directory for persisted per-user state
    pub config_root: PathBuf,
}

impl Profile {
    /// Resolve a profile from CLI flags with environment fallbacks.
    pub fn resolve(
        api_client_id: Option<&str>,
        api_url: Option<&str>,
        config_dir: Option<&PathBuf>,
    ) -> Result<Self, ConfigError> {
        let api_secret = std::env::var(ENV_API_SECRET)
            .map_err(|_| ConfigError::MissingCredential(ENV_API_SECRET))?;

        let base_url = match api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => std::env::var(ENV_API_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };

        Ok(Self {
            api_client_id: resolve_api_client_id(api_client_id)?,
            api_secret,
            base_url,
            config_root: resolve_config_root(config_dir)?,
        })
    }
}

/// The subset of a profile needed for local checkpoint operations.
///
/// Clearing and listing checkpoints only touch the on-disk store, so they
/// must work without the API secret present.
#[derive(Debug, Clone)]
pub struct LocalProfile {
    /// API client identifier (the checkpoint scope)
    pub api_client_id: String,
    /// Root directory for persisted per-user state
    pub config_root: PathBuf,
}

impl LocalProfile {
    /// Resolve the local subset from CLI flags with environment fallbacks.
    pub fn resolve(
        api_client_id: Option<&str>,
        config_dir: Option<&PathBuf>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            api_client_id: resolve_api_client_id(api_client_id)?,
            config_root: resolve_config_root(config_dir)?,
        })
    }
}

fn resolve_api_client_id(flag: Option<&str>) -> Result<String, ConfigError> {
    match flag {
        Some(id) => Ok(id.to_string()),
        None => std::env::var(ENV_API_CLIENT_ID)
            .map_err(|_| ConfigError::MissingCredential(ENV_API_CLIENT_ID)),
    }
}

fn resolve_config_root(flag: Option<&PathBuf>) -> Result<PathBuf, ConfigError> {
    match flag {
        Some(dir) => Ok(dir.clone()),
        None => match std::env::var(ENV_CONFIG_DIR) {
            Ok(dir) => Ok(PathBuf::from(dir)),
            Err(_) => dirs::config_dir()
                .map(|base| base.join("aegis"))
                .ok_or(ConfigError::NoConfigDir),
        },
    }
}

/// Logging configuration built from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Filter directive (e.g. "aegis_cli=debug"); falls back to `RUST_LOG`
    pub filter: Option<String>,
    /// Emit logs as JSON lines instead of human-readable text
    pub json: bool,
}

/// Initialize the tracing subscriber from an explicit [`LogConfig`].
///
/// Logs go to stderr so they interleave safely with rendered results on
/// stdout.
pub fn init_tracing(config: &LogConfig) {
    let filter = match &config.filter {
        Some(directive) => EnvFilter::new(directive.clone()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("aegis_cli=info")),
    };

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
