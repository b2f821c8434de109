use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::CrmError;
use crate::events::{CrmEvent, EventBus};
use crate::gateway::client::RemoteGateway;
use crate::gateway::RecordGateway;
use crate::hooks::{spawn_hook_consumer, WelcomeMailer};
use crate::notification::{LogNotifier, Notifier};
use crate::types::Config;

pub const ENV_BASE_URL: &str = "SALESDESK_BASE_URL";
pub const ENV_PROJECT_ID: &str = "SALESDESK_PROJECT_ID";
pub const ENV_PUBLIC_KEY: &str = "SALESDESK_PUBLIC_KEY";
pub const ENV_WELCOME_EMAIL_FN: &str = "SALESDESK_WELCOME_EMAIL_FN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid baseUrl '{0}'")]
    InvalidBaseUrl(String),
}

impl From<ConfigError> for CrmError {
    fn from(err: ConfigError) -> Self {
        CrmError::Configuration(err.to_string())
    }
}

/// Application state shared by every view and flow.
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn RecordGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub events: EventBus,
    event_receiver: Mutex<Option<mpsc::Receiver<CrmEvent>>>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn RecordGateway>, notifier: Arc<dyn Notifier>) -> Self {
        let (events, receiver) = EventBus::new();
        Self {
            config,
            gateway,
            notifier,
            events,
            event_receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Build the gateway the config asks for: seeded in-memory records in
    /// demo mode, the hosted record service otherwise.
    pub fn from_config(config: Config) -> Result<Self, CrmError> {
        let gateway: Arc<dyn RecordGateway> = if config.demo_data {
            log::info!("Demo data mode: using in-memory records");
            Arc::new(crate::devtools::demo_gateway())
        } else {
            Arc::new(RemoteGateway::new(&config)?)
        };
        log::info!("Record gateway: {}", gateway.backend_tag());
        Ok(Self::new(config, gateway, Arc::new(LogNotifier)))
    }

    /// Start the background post-create hooks. Only the first call spawns.
    pub fn start_hooks(&self) -> Option<JoinHandle<usize>> {
        let receiver = self.event_receiver.lock().take()?;
        let mailer = WelcomeMailer::new(
            self.gateway.clone(),
            self.config.welcome_email_function.clone(),
        );
        Some(spawn_hook_consumer(receiver, mailer))
    }
}

/// Get the canonical config file path (~/.salesdesk/config.json)
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".salesdesk").join("config.json"))
}

/// Load configuration from ~/.salesdesk/config.json plus environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    let mut config = load_config_from(&config_path()?)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Read a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let content = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-empty environment values replace the file's.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(v) = get(ENV_BASE_URL) {
        config.base_url = v;
    }
    if let Some(v) = get(ENV_PROJECT_ID) {
        config.project_id = v;
    }
    if let Some(v) = get(ENV_PUBLIC_KEY) {
        config.public_key = Some(v);
    }
    if let Some(v) = get(ENV_WELCOME_EMAIL_FN) {
        config.welcome_email_function = Some(v);
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    match url::Url::parse(&config.base_url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidBaseUrl(config.base_url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::notification::MemoryNotifier;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.base_url, crate::types::DEFAULT_BASE_URL);
        assert!(!config.demo_data);
    }

    #[test]
    fn test_round_trip_and_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            project_id: "proj".into(),
            public_key: Some("pk".into()),
            welcome_email_function: Some("send-welcome".into()),
            ..Default::default()
        };
        save_config_to(&path, &config).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"projectId\""));
        assert!(raw.contains("\"welcomeEmailFunction\""));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.project_id, "proj");
        assert_eq!(loaded.public_key.as_deref(), Some("pk"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_PROJECT_ID, "env-proj"),
            (ENV_PUBLIC_KEY, "env-key"),
            (ENV_BASE_URL, "  "),
        ]
        .into_iter()
        .collect();
        let mut config = Config {
            project_id: "file-proj".into(),
            ..Default::default()
        };
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.project_id, "env-proj");
        assert_eq!(config.public_key.as_deref(), Some("env-key"));
        assert_eq!(config.base_url, crate::types::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        assert!(validate_config(&config).is_ok());
        config.base_url = "not a url".into();
        assert!(matches!(validate_config(&config), Err(ConfigError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_from_config_requires_credentials_unless_demo() {
        assert!(matches!(
            AppState::from_config(Config::default()),
            Err(CrmError::Configuration(_))
        ));
        let demo = Config {
            demo_data: true,
            ..Default::default()
        };
        let state = AppState::from_config(demo).unwrap();
        assert_eq!(state.gateway.backend_tag(), "memory");
    }

    #[tokio::test]
    async fn test_hooks_start_once() {
        let state = AppState::new(
            Config::default(),
            Arc::new(MemoryGateway::new()),
            MemoryNotifier::new(),
        );
        let handle = state.start_hooks();
        assert!(handle.is_some());
        assert!(state.start_hooks().is_none());
    }
}
