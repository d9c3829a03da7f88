//! Environment-driven configuration

use std::path::PathBuf;
use std::time::Duration;

/// Controller settings
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Live-writes switch. When off, every mutating operation is refused
    /// before it reaches the store.
    pub allow_writes: bool,
    /// How long a buzz waits for its own broadcast echo
    pub echo_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            allow_writes: true,
            echo_timeout: Duration::from_millis(2000),
        }
    }
}

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub sync: SyncConfig,
    /// JSON file the store persists to, if any
    pub snapshot_path: Option<PathBuf>,
    /// Create the default game at startup when the store is empty
    pub create_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7357,
            sync: SyncConfig::default(),
            snapshot_path: None,
            create_on_start: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: parsed_var("JOLLYDASH_PORT").unwrap_or(defaults.port),
            sync: SyncConfig {
                allow_writes: parsed_var("JOLLYDASH_ALLOW_WRITES")
                    .unwrap_or(defaults.sync.allow_writes),
                echo_timeout: parsed_var("JOLLYDASH_ECHO_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.sync.echo_timeout),
            },
            snapshot_path: env_var("JOLLYDASH_SNAPSHOT_PATH").map(PathBuf::from),
            create_on_start: parsed_var("JOLLYDASH_CREATE_ON_START")
                .unwrap_or(defaults.create_on_start),
        }
    }
}

/// Trimmed, non-empty value of an environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, raw);
            None
        }
    }
}
