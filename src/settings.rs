use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid API configuration: {0} is missing")]
    Missing(&'static str),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    /// Locale tried once more when no trailer exists in `language`.
    pub fallback_language: String,
    /// Watch-provider region, ISO 3166-1.
    pub region: String,
    pub banner_interval_ms: u64,
    pub transition_delay_ms: u64,
    pub transition_ms: u64,
    pub placeholder_image: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::from(DEFAULT_BASE_URL),
            image_base_url: String::from(DEFAULT_IMAGE_BASE_URL),
            language: String::from("pt-BR"),
            fallback_language: String::from("en-US"),
            region: String::from("BR"),
            banner_interval_ms: 6000,
            transition_delay_ms: 100,
            transition_ms: 700,
            placeholder_image: String::from("/placeholder.jpg"),
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("flixrecom")
                .join("config.json")
        })
    }

    /// Loads `path` (or the default config file when it exists), applies
    /// `TMDB_*` environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path().filter(|p| p.exists()) {
                Some(default_path) => Self::from_file(&default_path)?,
                None => Self::default(),
            },
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str, field: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value.trim().to_string();
            }
        };
        set("TMDB_API_KEY", &mut self.api_key);
        set("TMDB_BASE_URL", &mut self.base_url);
        set("TMDB_LANGUAGE", &mut self.language);
        set("TMDB_REGION", &mut self.region);
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.api_key.trim().is_empty() {
            return Err(SettingsError::Missing("api_key"));
        }
        if self.base_url.trim().is_empty() {
            return Err(SettingsError::Missing("base_url"));
        }
        Ok(())
    }

    pub fn banner_interval(&self) -> Duration {
        Duration::from_millis(self.banner_interval_ms.max(1))
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"api_key": "abc", "region": "US"}}"#).unwrap();

        let settings = AppSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.api_key, "abc");
        assert_eq!(settings.region, "US");
        assert_eq!(settings.language, "pt-BR");
        assert_eq!(settings.banner_interval_ms, 6000);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = AppSettings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let env: HashMap<&str, &str> = [("TMDB_API_KEY", " from-env "), ("TMDB_REGION", "")]
            .into_iter()
            .collect();
        let mut settings = AppSettings {
            api_key: "from-file".to_string(),
            ..AppSettings::default()
        };
        settings.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.api_key, "from-env");
        assert_eq!(settings.region, "BR");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = AppSettings::default().validate().unwrap_err();
        assert!(matches!(err, SettingsError::Missing("api_key")));

        let settings = AppSettings {
            api_key: "k".to_string(),
            base_url: " ".to_string(),
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Missing("base_url"))
        ));
    }
}
