use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const CONFIG_PATH_ENV: &str = "ECG_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub analysis_delay_ms: u64,
    pub frontend_dir: Option<PathBuf>,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    pub path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 50 * 1024 * 1024,
            analysis_delay_ms: 2000,
            frontend_dir: None,
            history: HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            path: None,
        }
    }
}

impl AppConfig {
    /// `.env`, then the YAML file named by `ECG_CONFIG`, then plain env vars.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                log::info!("Loading configuration from {}", path);
                Self::from_yaml(&std::fs::read_to_string(path)?)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse("PORT", port)?;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse("MAX_UPLOAD_BYTES", max)?;
        }
        if let Some(delay) = lookup("ANALYSIS_DELAY_MS") {
            self.analysis_delay_ms = parse("ANALYSIS_DELAY_MS", delay)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.frontend_dir = Some(PathBuf::from(dir));
        }
        if let Some(capacity) = lookup("HISTORY_CAPACITY") {
            self.history.capacity = parse("HISTORY_CAPACITY", capacity)?;
        }
        if let Some(path) = lookup("HISTORY_PATH") {
            self.history.path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_service() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.analysis_delay_ms, 2000);
        assert_eq!(config.history.capacity, 100);
        assert!(config.history.path.is_none());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            "port: 8081\nhistory:\n  path: /var/lib/ecg/history.json\n",
        )
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.history.capacity, 100);
        assert_eq!(
            config.history.path,
            Some(PathBuf::from("/var/lib/ecg/history.json"))
        );
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("ANALYSIS_DELAY_MS", "0"),
            ("HISTORY_CAPACITY", "3"),
            ("UPLOAD_DIR", "/tmp/ecg"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::from_yaml("port: 8081").unwrap();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.analysis_delay_ms, 0);
        assert_eq!(config.history.capacity, 3);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/ecg"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            AppConfig::from_yaml("port: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
