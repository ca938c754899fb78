use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

const APP_DIR: &str = "tuyatray";
const FILE_NAME: &str = "config.json";

/// Cloud credentials and startup preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// OpenAPI endpoint of the account's data center.
    pub base_url: String,
    pub access_key: String,
    pub secret_key: String,
    /// App account whose devices are listed.
    pub user_id: String,
    pub run_on_startup: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            user_id: String::new(),
            run_on_startup: true,
        }
    }
}

impl AppConfig {
    /// Whether every credential field is filled in.
    pub fn is_usable(&self) -> bool {
        !self.base_url.is_empty()
            && !self.access_key.is_empty()
            && !self.secret_key.is_empty()
            && !self.user_id.is_empty()
    }
}

/// File-backed configuration with an in-memory copy.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<AppConfig>,
}

impl ConfigStore {
    /// Opens the store at the platform configuration path.
    pub fn load() -> Self {
        Self::open(config_path())
    }

    /// Opens the store at `path`. A missing, unreadable or corrupt file
    /// yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_config(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
            AppConfig::default()
        });
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> AppConfig {
        self.current
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn is_usable(&self) -> bool {
        self.get().is_usable()
    }

    /// Writes `config` to disk and makes it current.
    pub fn save(&self, config: AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        set_permissions_0600(&self.path);

        if let Ok(mut current) = self.current.write() {
            *current = config;
        }
        debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Platform location of `config.json`.
pub fn config_path() -> PathBuf {
    config_base_dir().join(APP_DIR).join(FILE_NAME)
}

fn config_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            base_url: "https://openapi.tuyaeu.com".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            user_id: "uid".into(),
            run_on_startup: false,
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config.json"));
        let config = store.get();

        assert_eq!(config, AppConfig::default());
        assert!(config.run_on_startup);
        assert!(!store.is_usable());
    }

    #[test]
    fn save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let store = ConfigStore::open(&path);
        store.save(sample()).unwrap();
        assert_eq!(store.get(), sample());

        let reopened = ConfigStore::open(&path);
        assert_eq!(reopened.get(), sample());
        assert!(reopened.is_usable());
    }

    #[test]
    fn file_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        ConfigStore::open(&path).save(sample()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"baseUrl\""));
        assert!(raw.contains("\"accessKey\""));
        assert!(raw.contains("\"runOnStartup\": false"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"accessKey":"ak"}"#).unwrap();

        let config = ConfigStore::open(&path).get();
        assert_eq!(config.access_key, "ak");
        assert!(config.base_url.is_empty());
        assert!(config.run_on_startup);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(ConfigStore::open(&path).get(), AppConfig::default());
    }

    #[test]
    fn usable_needs_every_credential() {
        assert!(sample().is_usable());
        let clears: [fn(&mut AppConfig); 4] = [
            |c| c.base_url.clear(),
            |c| c.access_key.clear(),
            |c| c.secret_key.clear(),
            |c| c.user_id.clear(),
        ];
        for clear in clears {
            let mut config = sample();
            clear(&mut config);
            assert!(!config.is_usable());
        }
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        ConfigStore::open(&path).save(sample()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn config_path_ends_in_app_dir() {
        assert!(config_path().ends_with("tuyatray/config.json") || cfg!(windows));
    }
}
