use anyhow::{bail, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{keys, Storage};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ja,
}

impl Language {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ja" => Some(Language::Ja),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSettings {
    pub auto_detect: bool,
    pub language: Language,
    pub api_base_url: String,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            auto_detect: true,
            language: Language::En,
            api_base_url: DEFAULT_API_BASE_URL.into(),
        }
    }
}

impl ExtensionSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(url) = lookup("LEXICARD_API_BASE_URL").filter(|url| !url.trim().is_empty()) {
            settings.api_base_url = url.trim().to_string();
        }
        if let Some(value) = lookup("LEXICARD_AUTO_DETECT") {
            settings.auto_detect = value == "1" || value.eq_ignore_ascii_case("true");
        }
        if let Some(value) = lookup("LEXICARD_LANGUAGE") {
            match Language::parse(&value) {
                Some(language) => settings.language = language,
                None => warn!("Ignoring unsupported LEXICARD_LANGUAGE '{value}'"),
            }
        }

        settings
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    storage: Storage,
    defaults: ExtensionSettings,
}

impl SettingsStore {
    pub fn new(storage: Storage, defaults: ExtensionSettings) -> Self {
        Self { storage, defaults }
    }

    pub async fn current(&self) -> ExtensionSettings {
        let overrides = self.stored_overrides().await;
        merge_over(&self.defaults, &overrides)
    }

    pub async fn update(&self, patch: Value) -> Result<ExtensionSettings> {
        let Value::Object(patch) = patch else {
            bail!("settings patch must be a JSON object");
        };

        let mut overrides = self.stored_overrides().await;
        overrides.extend(patch);
        self.storage
            .set(keys::SETTINGS, &Value::Object(overrides.clone()))
            .await;

        Ok(merge_over(&self.defaults, &overrides))
    }

    pub async fn reset(&self) {
        self.storage.remove(&[keys::SETTINGS]).await;
    }

    async fn stored_overrides(&self) -> Map<String, Value> {
        self.storage
            .get::<Map<String, Value>>(keys::SETTINGS)
            .await
            .unwrap_or_default()
    }
}

fn merge_over(defaults: &ExtensionSettings, overrides: &Map<String, Value>) -> ExtensionSettings {
    let mut merged = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults.clone(),
    };

    for (key, value) in overrides {
        if !merged.contains_key(key) {
            continue;
        }
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<ExtensionSettings>(Value::Object(candidate.clone())).is_ok() {
            merged = candidate;
        } else {
            warn!("Ignoring invalid stored setting '{key}': {value}");
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| defaults.clone())
}
