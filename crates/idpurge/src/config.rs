use crate::error::{PurgeError, Result};
use crate::store::StoreKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xdg::BaseDirectories;

/// Settings read from `idpurge.toml`. Every field has a default so an empty
/// or missing file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub confirm_timeout_secs: u64,
    pub assume_yes: bool,
    pub home: Option<PathBuf>,
    pub skip_stores: Vec<String>,
    pub app_support: AppSupportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 30,
            assume_yes: false,
            home: None,
            skip_stores: Vec::new(),
            app_support: AppSupportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppSupportSettings {
    pub enabled: bool,
    pub max_depth: usize,
    pub max_file_bytes: u64,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for AppSupportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 3,
            max_file_bytes: 1024 * 1024,
            include: vec!["*.json".to_string(), "*.plist".to_string()],
            exclude: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PurgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(toml_str)
            .map_err(|e| PurgeError::Config(format!("Failed to parse TOML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.confirm_timeout_secs == 0 {
            return Err(PurgeError::Config(
                "confirm_timeout_secs must be at least 1".to_string(),
            ));
        }
        self.skipped_kinds()?;
        for pattern in &self.app_support.include {
            globset::Glob::new(pattern).map_err(|e| {
                PurgeError::Config(format!("Invalid include pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn skipped_kinds(&self) -> Result<Vec<StoreKind>> {
        self.skip_stores
            .iter()
            .map(|name| StoreKind::from_str(name))
            .collect()
    }
}

pub struct Config {
    pub log_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub home: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Resolve paths: explicit override, then environment, then XDG. The home
    /// directory is only looked up when neither `home_override` nor the
    /// settings name one.
    pub fn new(
        log_dir_override: Option<PathBuf>,
        config_override: Option<PathBuf>,
        home_override: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = if let Some(path) = config_override {
            Some(path)
        } else if let Ok(env_path) = std::env::var("IDPURGE_CONFIG") {
            Some(PathBuf::from(env_path))
        } else {
            BaseDirectories::with_prefix("idpurge")
                .ok()
                .and_then(|xdg| xdg.find_config_file("idpurge.toml"))
        };

        let settings = match &config_path {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };

        let log_dir = if let Some(path) = log_dir_override {
            path
        } else if let Ok(env_path) = std::env::var("IDPURGE_LOG_DIR") {
            PathBuf::from(env_path)
        } else {
            let xdg = BaseDirectories::with_prefix("idpurge").map_err(|e| {
                PurgeError::Config(format!("Failed to initialize XDG directories: {}", e))
            })?;
            xdg.create_data_directory("logs").map_err(|e| {
                PurgeError::Config(format!("Failed to create log directory: {}", e))
            })?
        };

        let home = match home_override.or_else(|| settings.home.clone()) {
            Some(home) => home,
            None => dirs::home_dir()
                .ok_or_else(|| PurgeError::Config("Cannot determine home directory".to_string()))?,
        };

        Ok(Self {
            log_dir,
            config_path,
            home,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::from_toml(
            r#"
confirm_timeout_secs = 10
assume_yes = true
home = "/Users/someone"
skip_stores = ["app-support", "brave-profile"]

[app_support]
max_depth = 2
exclude = ["Slack"]
"#,
        )
        .unwrap();

        assert_eq!(settings.confirm_timeout(), Duration::from_secs(10));
        assert!(settings.assume_yes);
        assert_eq!(settings.home, Some(PathBuf::from("/Users/someone")));
        assert_eq!(settings.app_support.max_depth, 2);
        assert!(settings.app_support.enabled);
        assert_eq!(settings.app_support.include.len(), 2);
        assert_eq!(
            settings.skipped_kinds().unwrap(),
            vec![
                StoreKind::AppSupport,
                StoreKind::Browser(crate::store::BrowserFamily::Brave)
            ]
        );
    }

    #[test]
    fn test_rejects_unknown_store() {
        assert!(Settings::from_toml(r#"skip_stores = ["floppy"]"#).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(Settings::from_toml("confirm_timeout_secs = 0").is_err());
    }

    #[test]
    fn test_rejects_unknown_key() {
        assert!(Settings::from_toml("assume_no = true").is_err());
    }

    #[test]
    fn test_config_with_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_file = temp_dir.path().join("idpurge.toml");
        std::fs::write(&config_file, "home = \"/tmp/fake-home\"\n").unwrap();
        let log_dir = temp_dir.path().join("logs");

        let config = Config::new(Some(log_dir.clone()), Some(config_file.clone()), None).unwrap();
        assert_eq!(config.log_dir, log_dir);
        assert_eq!(config.config_path, Some(config_file));
        assert_eq!(config.home, PathBuf::from("/tmp/fake-home"));
    }

    #[test]
    fn test_home_override_beats_settings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_file = temp_dir.path().join("idpurge.toml");
        std::fs::write(&config_file, "home = \"/tmp/fake-home\"\n").unwrap();

        let config = Config::new(
            Some(temp_dir.path().join("logs")),
            Some(config_file),
            Some(PathBuf::from("/tmp/other-home")),
        )
        .unwrap();
        assert_eq!(config.home, PathBuf::from("/tmp/other-home"));
    }
}
