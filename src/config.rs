//! Client configuration loading.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/client.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAMESIGN_CLIENT_CONFIG_PATH";
/// Environment variable that overrides the configured base URL.
const BASE_URL_ENV: &str = "GAMESIGN_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api/";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_DRAW_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_REDEMPTION_EXIT_MS: u64 = 1_200;
const DEFAULT_SESSION_PATH: &str = "data/session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the client.
pub struct ClientConfig {
    /// Root of the tournament service API.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// Cadence of the background synchronization loop.
    pub poll_interval_ms: u64,
    /// Cadence of the song draw poller while a draw is rolling.
    pub draw_poll_interval_ms: u64,
    /// Length of the redemption overlay exit.
    pub redemption_exit_ms: u64,
    /// File keeping the session identity.
    pub session_path: PathBuf,
}

impl ClientConfig {
    /// Load the configuration from disk and the environment, falling back to defaults.
    pub fn load() -> Self {
        let mut config = Self::load_from(&resolve_config_path());
        if let Some(base_url) = env::var(BASE_URL_ENV).ok().filter(|url| !url.is_empty()) {
            info!(%base_url, "base url overridden from environment");
            config.base_url = base_url;
        }
        config
    }

    /// Load the configuration file at `path`; missing or invalid files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        base_url = %config.base_url,
                        "loaded client config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Cadence of the sync loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Cadence of the fast song draw poller.
    pub fn draw_poll_interval(&self) -> Duration {
        Duration::from_millis(self.draw_poll_interval_ms)
    }

    /// Length of the redemption exit sequence.
    pub fn redemption_exit(&self) -> Duration {
        Duration::from_millis(self.redemption_exit_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            draw_poll_interval_ms: DEFAULT_DRAW_POLL_INTERVAL_MS,
            redemption_exit_ms: DEFAULT_REDEMPTION_EXIT_MS,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    draw_poll_interval_ms: Option<u64>,
    redemption_exit_ms: Option<u64>,
    session_path: Option<PathBuf>,
}

impl From<RawConfig> for ClientConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        // zero intervals would spin the pollers
        let positive = |ms: Option<u64>, fallback: u64| ms.filter(|ms| *ms > 0).unwrap_or(fallback);
        Self {
            base_url: value.base_url.unwrap_or(defaults.base_url),
            request_timeout_ms: positive(value.request_timeout_ms, defaults.request_timeout_ms),
            poll_interval_ms: positive(value.poll_interval_ms, defaults.poll_interval_ms),
            draw_poll_interval_ms: positive(
                value.draw_poll_interval_ms,
                defaults.draw_poll_interval_ms,
            ),
            redemption_exit_ms: value.redemption_exit_ms.unwrap_or(defaults.redemption_exit_ms),
            session_path: value.session_path.unwrap_or(defaults.session_path),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
