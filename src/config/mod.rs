use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:49161";
pub const DEFAULT_EXTENSION: &str = "wav";

const MIN_VOLUME: f32 = 0.0;
const MAX_VOLUME: f32 = 2.0;
const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(anyhow!("Invalid log level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub address: String,
    pub log_level: LogLevel,
    /// Directory holding `sfx/` and `icons/`. Resolved next to the
    /// executable when unset.
    pub assets_dir: Option<PathBuf>,
    pub extension: String,
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            log_level: LogLevel::Info,
            assets_dir: None,
            extension: DEFAULT_EXTENSION.to_string(),
            volume: 1.0,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "cybersonic", "cybersonic").map(|p| p.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Reads `path`, or the platform config file when `path` is `None`.
    /// A missing default config file yields the defaults; a missing
    /// explicit one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(anyhow!("address must not be empty"));
        }
        if self.extension.is_empty() || self.extension.len() > MAX_EXTENSION_LEN {
            return Err(anyhow!("extension must be 1 to {} characters", MAX_EXTENSION_LEN));
        }
        if !self.extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("extension contains invalid characters"));
        }
        if !self.volume.is_finite() || self.volume < MIN_VOLUME || self.volume > MAX_VOLUME {
            return Err(anyhow!("volume must be between {} and {}", MIN_VOLUME, MAX_VOLUME));
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.address = self.address.trim().to_string();
        self.extension = self.extension.trim().trim_start_matches('.').to_string();
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(MIN_VOLUME, MAX_VOLUME)
        } else {
            1.0
        };
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.assets_dir.clone().unwrap_or_else(default_assets_dir)
    }

    pub fn sfx_dir(&self) -> PathBuf {
        self.assets_dir().join("sfx")
    }

    pub fn icon_path(&self) -> PathBuf {
        self.assets_dir().join("icons").join("tray.ico")
    }
}

/// `assets/` beside the executable if it exists, else `./assets`.
fn default_assets_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("assets")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("assets"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.address, "127.0.0.1:49161");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.extension, "wav");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
address = "0.0.0.0:8080"
log_level = "debug"
assets_dir = "/opt/cybersonic/assets"
"#,
        )
        .unwrap();
        assert_eq!(config.address, "0.0.0.0:8080");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.sfx_dir(), PathBuf::from("/opt/cybersonic/assets/sfx"));
        assert_eq!(
            config.icon_path(),
            PathBuf::from("/opt/cybersonic/assets/icons/tray.ico")
        );
        assert_eq!(config.volume, 1.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::parse("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_sanitize() {
        let config = Config::parse("extension = \".wav\"\nvolume = 7.5").unwrap();
        assert_eq!(config.extension, "wav");
        assert_eq!(config.volume, 2.0);
    }

    #[test]
    fn test_invalid_extension() {
        assert!(Config::parse("extension = \"w/v\"").is_err());
        assert!(Config::parse("extension = \"\"").is_err());
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert!("INFO".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.address, DEFAULT_ADDRESS);
    }
}
