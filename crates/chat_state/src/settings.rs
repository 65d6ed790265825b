use chat_llm::ApiProvider;
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, SettingsError};

/// Key under which the serialized settings are stored.
pub const SETTINGS_KEY: &str = "branch-chat-settings";

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// User preferences that outlive any one conversation tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_provider: ApiProvider,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_provider: ApiProvider::default(),
            api_key: None,
            model: default_model(),
        }
    }
}

/// Partial settings update. `api_key: Some(None)` clears the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub api_provider: Option<ApiProvider>,
    pub api_key: Option<Option<String>>,
    pub model: Option<String>,
}

impl Settings {
    /// Shallow-merge `patch` into a copy of these settings.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut settings = self.clone();
        if let Some(provider) = patch.api_provider {
            settings.api_provider = provider;
        }
        if let Some(api_key) = &patch.api_key {
            settings.api_key = api_key.clone();
        }
        if let Some(model) = &patch.model {
            settings.model = model.clone();
        }
        settings
    }

    /// Stored settings, or defaults when absent or unreadable.
    pub fn read(store: &dyn KeyValueStore) -> Self {
        match store.get(SETTINGS_KEY) {
            Ok(Some(content)) => match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Failed to parse stored settings: {}", e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read stored settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), SettingsError> {
        let content = serde_json::to_string(self)?;
        store.set(SETTINGS_KEY, &content)
    }

    /// Apply `BRANCH_CHAT_PROVIDER`, `BRANCH_CHAT_API_KEY` and
    /// `BRANCH_CHAT_MODEL`. The result is for use only and is never saved.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(provider) = var("BRANCH_CHAT_PROVIDER") {
            match ApiProvider::parse(&provider) {
                Some(provider) => self.api_provider = provider,
                None => tracing::warn!("Ignoring unknown BRANCH_CHAT_PROVIDER '{}'", provider),
            }
        }
        if let Some(api_key) = var("BRANCH_CHAT_API_KEY") {
            self.api_key = Some(api_key).filter(|key| !key.trim().is_empty());
        }
        if let Some(model) = var("BRANCH_CHAT_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};

    #[test]
    fn merge_is_shallow() {
        let settings = Settings {
            api_key: Some("sk-1".to_string()),
            ..Settings::default()
        };

        let merged = settings.merged(&SettingsPatch {
            model: Some("openai/gpt-4o".to_string()),
            ..SettingsPatch::default()
        });
        assert_eq!(merged.model, "openai/gpt-4o");
        assert_eq!(merged.api_key.as_deref(), Some("sk-1"));
        assert_eq!(merged.api_provider, ApiProvider::Gateway);

        let cleared = merged.merged(&SettingsPatch {
            api_key: Some(None),
            ..SettingsPatch::default()
        });
        assert_eq!(cleared.api_key, None);
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        assert_eq!(Settings::read(&MemoryKeyValueStore::new()), Settings::default());
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let store = MemoryKeyValueStore::new();
        store.set(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(Settings::read(&store), Settings::default());
    }

    #[test]
    fn partial_stored_settings_fill_defaults() {
        let store = MemoryKeyValueStore::new();
        store.set(SETTINGS_KEY, r#"{"apiProvider":"openai"}"#).unwrap();

        let settings = Settings::read(&store);
        assert_eq!(settings.api_provider, ApiProvider::OpenAi);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn overrides_replace_only_the_named_fields() {
        let stored = Settings {
            api_key: Some("sk-stored".to_string()),
            ..Settings::default()
        };

        let effective = stored.clone().with_overrides(|key| match key {
            "BRANCH_CHAT_PROVIDER" => Some("Mock".to_string()),
            "BRANCH_CHAT_MODEL" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(effective.api_provider, ApiProvider::Mock);
        assert_eq!(effective.api_key.as_deref(), Some("sk-stored"));
        assert_eq!(effective.model, DEFAULT_MODEL);

        let unknown = stored.with_overrides(|key| {
            (key == "BRANCH_CHAT_PROVIDER").then(|| "bedrock".to_string())
        });
        assert_eq!(unknown.api_provider, ApiProvider::Gateway);
    }

    #[test]
    fn settings_survive_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        let settings = Settings {
            api_provider: ApiProvider::OpenAi,
            api_key: Some("sk-test".to_string()),
            model: "openai/gpt-4o".to_string(),
        };

        settings.save(&store).unwrap();
        assert_eq!(Settings::read(&FileKeyValueStore::new(dir.path())), settings);
    }
}
