use std::time::Duration;

use serde::{Deserialize, Serialize};
use tekton_storage::KubeStoreOptions;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub poll: PollConfig,
    /// Operation timeouts applied when an object does not set its own
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.store.endpoint.trim().is_empty() {
            return Err("store.endpoint must not be empty".into());
        }
        if !(self.store.endpoint.starts_with("http://") || self.store.endpoint.starts_with("https://")) {
            return Err("store.endpoint must be an http(s) URL".into());
        }
        if self.store.request_timeout.is_zero() {
            return Err("store.request_timeout must be > 0".into());
        }
        if self.defaults.namespace.trim().is_empty() {
            return Err("defaults.namespace must not be empty".into());
        }
        if self.poll.interval.is_zero() {
            return Err("poll.interval must be > 0".into());
        }
        if self.timeouts.create.is_zero() || self.timeouts.delete.is_zero() {
            return Err("timeouts must be > 0".into());
        }
        if self.poll.interval > self.timeouts.create || self.poll.interval > self.timeouts.delete {
            return Err("poll.interval must not exceed the operation timeouts".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    /// Connection options for the Kubernetes store backend.
    pub fn store_options(&self) -> KubeStoreOptions {
        KubeStoreOptions {
            endpoint: self.store.endpoint.clone(),
            token: self.store.token.clone().filter(|t| !t.is_empty()),
            insecure_skip_tls_verify: self.store.insecure_skip_tls_verify,
            request_timeout: self.store.request_timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token. Prefer TEKTON__STORE__TOKEN over the config file.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_endpoint() -> String {
    "https://127.0.0.1:6443".into()
}
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            insecure_skip_tls_verify: false,
            request_timeout: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Namespace for objects whose configuration leaves it empty
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "default".into()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
        }
    }
}

/// Deadlines for the polling phase of create and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_create_timeout", with = "humantime_serde")]
    pub create: Duration,
    #[serde(default = "default_delete_timeout", with = "humantime_serde")]
    pub delete: Duration,
}

fn default_create_timeout() -> Duration {
    Duration::from_secs(40 * 60)
}
fn default_delete_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: default_create_timeout(),
            delete: default_delete_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::ProviderConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_FILE: &str = "tekton.toml";
    pub const ENV_PREFIX: &str = "TEKTON";

    pub fn load_config(path: Option<&str>) -> Result<ProviderConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., TEKTON__POLL__INTERVAL=10s
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: ProviderConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<ProviderConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
