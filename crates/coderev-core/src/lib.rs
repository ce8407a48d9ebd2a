pub mod criteria;
pub mod sanitize;

pub use criteria::{CriteriaError, CriteriaRegistry, Criterion};
pub use sanitize::strip_comments;

use serde::{Deserialize, Serialize};

// --- Chat payload ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message of a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// --- AI Settings ---

pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const DEPLOYMENT_VAR: &str = "DEPLOYMENT_NAME";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";

pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Azure OpenAI credentials. Empty strings mean "not set".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureSettings {
    pub api_key: String,
    pub endpoint: String,
    /// Deployment name; also used as the model identifier.
    pub deployment: String,
    pub api_version: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            deployment: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl AzureSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source (the process env in
    /// production, a map in tests). Trailing slashes are dropped from the
    /// endpoint; the client appends its own path.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let api_version = get(API_VERSION_VAR);
        Self {
            api_key: get(API_KEY_VAR),
            endpoint: get(ENDPOINT_VAR).trim_end_matches('/').to_string(),
            deployment: get(DEPLOYMENT_VAR),
            api_version: if api_version.is_empty() {
                DEFAULT_API_VERSION.to_string()
            } else {
                api_version
            },
        }
    }

    /// Names of the required variables that are unset.
    pub fn missing_vars(&self) -> Vec<&'static str> {
        [
            (API_KEY_VAR, &self.api_key),
            (ENDPOINT_VAR, &self.endpoint),
            (DEPLOYMENT_VAR, &self.deployment),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

pub fn ai_configured(settings: &AzureSettings) -> bool {
    settings.missing_vars().is_empty()
}
