//! Known UI languages and their translation pack sources.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Display metadata for one language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    /// Display name.
    pub name: String,
    /// Flag emoji shown next to the name.
    pub emoji: String,
    /// Profile links of the translators.
    pub contributors: Vec<String>,
}

impl Language {
    fn new(name: &str, emoji: &str, contributors: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            emoji: emoji.to_owned(),
            contributors: contributors.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

/// Where a language's translation pack comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackSource {
    /// JSON text held in memory.
    Inline(String),
    /// JSON file on disk.
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("language '{key}' has no translation pack source")]
    MissingSource { key: String },
    #[error("failed reading translation pack {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed parsing translation pack for '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
struct LanguageEntry {
    language: Language,
    source: Option<PackSource>,
}

/// Explicit key → language mapping. Lookups are validated against the
/// registered keys before any pack is read.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    entries: BTreeMap<String, LanguageEntry>,
}

impl LanguageRegistry {
    /// Registry with the bundled languages and no pack sources yet.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(
            "en-gb",
            Language::new("British English", "🇬🇧", &["https://github.com/SupertigerDev"]),
            None,
        );
        registry.register(
            "hu-hu",
            Language::new("Hungarian", "🇭🇺", &["https://github.com/andrasdaradici"]),
            None,
        );
        registry.register(
            "tr-tr",
            Language::new("Turkish", "🇹🇷", &["https://github.com/sutnax"]),
            None,
        );
        registry.register(
            "nl-nl",
            Language::new("Dutch", "🇳🇱", &["https://github.com/captainqdev"]),
            None,
        );
        registry
    }

    /// Point every registered language at `<dir>/<key>.json`.
    pub fn with_locales_dir(mut self, dir: &Path) -> Self {
        for (key, entry) in &mut self.entries {
            entry.source = Some(PackSource::File(dir.join(format!("{key}.json"))));
        }
        self
    }

    pub fn register(&mut self, key: &str, language: Language, source: Option<PackSource>) {
        self.entries.insert(
            normalize_key(key),
            LanguageEntry { language, source },
        );
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    pub fn get(&self, key: &str) -> Option<&Language> {
        self.entries
            .get(&normalize_key(key))
            .map(|entry| &entry.language)
    }

    /// Registered languages in key order.
    pub fn languages(&self) -> impl Iterator<Item = (&str, &Language)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.language))
    }

    /// Load the translation pack for `key`. Unknown keys yield `Ok(None)`.
    pub fn load_pack(&self, key: &str) -> Result<Option<serde_json::Value>, LanguageError> {
        let key = normalize_key(key);
        let Some(entry) = self.entries.get(&key) else {
            debug!(%key, "unknown language key");
            return Ok(None);
        };

        let raw = match &entry.source {
            None => return Err(LanguageError::MissingSource { key }),
            Some(PackSource::Inline(raw)) => raw.clone(),
            Some(PackSource::File(path)) => {
                fs::read_to_string(path).map_err(|source| LanguageError::Io {
                    path: path.clone(),
                    source,
                })?
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| LanguageError::Parse { key, source })
    }
}

/// Canonical registry key: lowercase with `-` separators (`en_gb` → `en-gb`).
pub fn normalize_key(key: &str) -> String {
    key.trim().replace('_', "-").to_ascii_lowercase()
}

/// Stored form of a language key, using `_` separators (`en-gb` → `en_gb`).
pub fn storage_key(key: &str) -> String {
    normalize_key(key).replace('-', "_")
}
