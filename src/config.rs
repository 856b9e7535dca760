//! Configuration loading.
//!
//! Lookup order: `~/.taskflow/config.toml`, then `./taskflow.toml`, then
//! built-in defaults. Environment variables override whatever was loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the task collection. Defaults to `~/.taskflow`.
    #[serde(default)]
    pub data_dir: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub image_edit: ImageEditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// EnvFilter string, e.g. "info" or "taskflow=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Also log to stderr. Ignored by the terminal UI.
    #[serde(default)]
    pub console: bool,

    /// Directory for log files. Defaults to `<data_dir>/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            level: default_logging_level(),
            console: false,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEditConfig {
    /// Credential for the image service. Without one, image editing is off.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ImageEditConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        match self.data_dir.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        }
    }

    /// Resolved log directory.
    pub fn log_dir(&self) -> PathBuf {
        match self.logging.directory.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => self.data_dir().join("logs"),
        }
    }

    /// The image service credential, if a non-blank one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.image_edit.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// `~/.taskflow`, or `./.taskflow` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".taskflow")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.trim().is_empty())
        .map(PathBuf::from)
}

/// Load configuration from the usual locations and apply environment overrides.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let user_config = default_data_dir().join("config.toml");
    let local_config = Path::new("taskflow.toml");

    let mut cfg = if user_config.exists() {
        load_file(&user_config)?
    } else if local_config.exists() {
        load_file(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env(&mut cfg, |name| std::env::var(name).ok());
    Ok(cfg)
}

pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let display = path.display().to_string();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse { path: display, source })
}

/// Apply `TASKFLOW_*` overrides. Blank values are ignored.
pub fn apply_env(cfg: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TASKFLOW_DATA_DIR") {
        cfg.data_dir = Some(v);
    }
    if let Some(v) = get("TASKFLOW_LOG") {
        cfg.logging.level = v;
    }
    if let Some(v) = get("TASKFLOW_API_KEY")
        .or_else(|| get("GEMINI_API_KEY"))
        .or_else(|| get("API_KEY"))
    {
        cfg.image_edit.api_key = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.console);
        assert_eq!(cfg.image_edit.model, DEFAULT_MODEL);
        assert_eq!(cfg.image_edit.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.image_edit.timeout_secs, 60);
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn reads_sections_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskflow.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/tasks"

[logging]
level = "taskflow=debug"
directory = "/tmp/tasks-logs"

[image_edit]
api_key = "secret"
timeout_secs = 5
"#,
        )
        .unwrap();

        let cfg = load_file(&path).unwrap();
        assert_eq!(cfg.data_dir(), PathBuf::from("/tmp/tasks"));
        assert_eq!(cfg.log_dir(), PathBuf::from("/tmp/tasks-logs"));
        assert_eq!(cfg.logging.level, "taskflow=debug");
        assert_eq!(cfg.api_key(), Some("secret"));
        assert_eq!(cfg.image_edit.timeout_secs, 5);
        assert_eq!(cfg.image_edit.model, DEFAULT_MODEL);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        assert!(matches!(load_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn log_dir_defaults_under_data_dir() {
        let cfg = AppConfig { data_dir: Some("/srv/taskflow".into()), ..Default::default() };
        assert_eq!(cfg.log_dir(), PathBuf::from("/srv/taskflow/logs"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = AppConfig::default();
        apply_env(
            &mut cfg,
            env(&[("TASKFLOW_DATA_DIR", "/data"), ("TASKFLOW_LOG", "debug"), ("GEMINI_API_KEY", "g")]),
        );
        assert_eq!(cfg.data_dir(), PathBuf::from("/data"));
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.api_key(), Some("g"));
    }

    #[test]
    fn api_key_fallback_order() {
        let mut cfg = AppConfig::default();
        apply_env(&mut cfg, env(&[("API_KEY", "last"), ("TASKFLOW_API_KEY", "first")]));
        assert_eq!(cfg.api_key(), Some("first"));

        let mut cfg = AppConfig::default();
        apply_env(&mut cfg, env(&[("API_KEY", "last"), ("TASKFLOW_API_KEY", "  ")]));
        assert_eq!(cfg.api_key(), Some("last"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = AppConfig::default();
        cfg.image_edit.api_key = Some("   ".into());
        assert!(cfg.api_key().is_none());
    }
}
