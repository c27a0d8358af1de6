//! Environment-backed runtime configuration for `settings-smoke`.

use std::{
    env,
    error::Error,
    fmt,
    path::{Path, PathBuf},
};

use settings_core::LanguageRegistry;

const DEFAULT_DATA_DIR: &str = "./.chat-settings-store";
const STORAGE_FILENAME: &str = "local-storage.json";
const DEFAULT_WINDOW_WIDTH: u32 = 1_280;
const DEFAULT_USERNAME: &str = "alice";

/// Runtime configuration used by the smoke driver.
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeConfig {
    /// Directory holding the local storage file.
    pub data_dir: PathBuf,
    /// Optional directory with `<language-key>.json` translation packs.
    pub locales_dir: Option<PathBuf>,
    /// Optional language to select, validated against the registry.
    pub language: Option<String>,
    /// Initial window width fed to the window properties.
    pub window_width: u32,
    /// Username of the demo account.
    pub username: String,
}

impl SmokeConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let data_dir = optional_trimmed_env("CHAT_SETTINGS_DATA_DIR", &mut lookup)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let locales_dir =
            optional_trimmed_env("CHAT_SETTINGS_LOCALES_DIR", &mut lookup).map(PathBuf::from);
        let username = optional_trimmed_env("CHAT_SETTINGS_USERNAME", &mut lookup)
            .unwrap_or_else(|| DEFAULT_USERNAME.to_owned());

        let language = optional_trimmed_env("CHAT_SETTINGS_LANGUAGE", &mut lookup);
        if let Some(language) = &language
            && !LanguageRegistry::builtin().is_known(language)
        {
            return Err(ConfigError::InvalidValue {
                key: "CHAT_SETTINGS_LANGUAGE",
                value: language.clone(),
                reason: "unknown language key".to_owned(),
            });
        }

        let window_width = parse_optional_u32_with_default(
            "CHAT_SETTINGS_WINDOW_WIDTH",
            DEFAULT_WINDOW_WIDTH,
            &mut lookup,
        )?;
        if window_width == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CHAT_SETTINGS_WINDOW_WIDTH",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            data_dir,
            locales_dir,
            language,
            window_width,
            username,
        })
    }

    /// Location of the local storage file.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILENAME)
    }

    /// Language registry with pack sources pointed at the locales dir, when set.
    pub fn language_registry(&self) -> LanguageRegistry {
        let registry = LanguageRegistry::builtin();
        match &self.locales_dir {
            Some(dir) => registry.with_locales_dir(Path::new(dir)),
            None => registry,
        }
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_u32_with_default<F>(
    key: &'static str,
    default: u32,
    lookup: &mut F,
) -> Result<u32, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .trim()
        .parse::<u32>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}
