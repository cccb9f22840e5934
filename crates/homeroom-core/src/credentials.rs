// API keys and tokens: credentials.toml first, environment variables second.

use serde::Deserialize;

pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_GIST_ID: &str = "GITHUB_GIST_ID";

/// Secrets loaded from `config/credentials.toml`. Every field is optional;
/// anything left empty is looked up in the environment by
/// [`CredentialsConfig::fill_from`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub deepseek_api_key: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub github_gist_id: Option<String>,
}

impl CredentialsConfig {
    /// Fill missing (or empty) values using `lookup`, which maps an
    /// upper-case variable name to its value.
    pub fn fill_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots: [(&mut Option<String>, &str); 4] = [
            (&mut self.openrouter_api_key, OPENROUTER_API_KEY),
            (&mut self.deepseek_api_key, DEEPSEEK_API_KEY),
            (&mut self.github_token, GITHUB_TOKEN),
            (&mut self.github_gist_id, GITHUB_GIST_ID),
        ];
        for (slot, name) in slots {
            if non_empty(slot.as_deref()).is_none() {
                *slot = lookup(name).filter(|v| !v.trim().is_empty());
            }
        }
    }

    /// Fill missing values from the process environment.
    pub fn fill_from_env(&mut self) {
        self.fill_from(|name| std::env::var(name).ok());
    }

    /// Key for question generation and news analysis: OpenRouter first,
    /// DeepSeek as a fallback.
    pub fn question_llm_key(&self) -> Option<&str> {
        non_empty(self.openrouter_api_key.as_deref())
            .or_else(|| non_empty(self.deepseek_api_key.as_deref()))
    }

    pub fn translator_key(&self) -> Option<&str> {
        non_empty(self.deepseek_api_key.as_deref())
    }

    pub fn github_token(&self) -> Option<&str> {
        non_empty(self.github_token.as_deref())
    }

    pub fn gist_id(&self) -> Option<&str> {
        non_empty(self.github_gist_id.as_deref())
    }

    /// Presence report for the translate chat page.
    pub fn secrets_status(&self) -> SecretsStatus {
        SecretsStatus {
            entries: vec![
                (DEEPSEEK_API_KEY.to_string(), self.translator_key().is_some()),
                (GITHUB_TOKEN.to_string(), self.github_token().is_some()),
                (GITHUB_GIST_ID.to_string(), self.gist_id().is_some()),
            ],
        }
    }
}

/// Which translate-chat secrets are configured. Holds names and presence
/// flags only, never the values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretsStatus {
    pub entries: Vec<(String, bool)>,
}

impl SecretsStatus {
    pub fn missing(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn all_present(&self) -> bool {
        self.entries.iter().all(|(_, present)| *present)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn file_values_win_over_environment() {
        let mut creds = CredentialsConfig {
            deepseek_api_key: Some("from-file".into()),
            ..Default::default()
        };
        let env = env_of(&[(DEEPSEEK_API_KEY, "from-env"), (GITHUB_TOKEN, "gh-env")]);
        creds.fill_from(|name| env.get(name).cloned());

        assert_eq!(creds.deepseek_api_key.as_deref(), Some("from-file"));
        assert_eq!(creds.github_token.as_deref(), Some("gh-env"));
        assert!(creds.github_gist_id.is_none());
    }

    #[test]
    fn empty_file_values_fall_back_to_environment() {
        let mut creds = CredentialsConfig {
            github_gist_id: Some("  ".into()),
            ..Default::default()
        };
        let env = env_of(&[(GITHUB_GIST_ID, "abc123")]);
        creds.fill_from(|name| env.get(name).cloned());
        assert_eq!(creds.gist_id(), Some("abc123"));
    }

    #[test]
    fn empty_environment_values_count_as_missing() {
        let mut creds = CredentialsConfig::default();
        let env = env_of(&[(OPENROUTER_API_KEY, "")]);
        creds.fill_from(|name| env.get(name).cloned());
        assert!(creds.openrouter_api_key.is_none());
    }

    #[test]
    fn question_key_prefers_openrouter() {
        let creds = CredentialsConfig {
            openrouter_api_key: Some("or".into()),
            deepseek_api_key: Some("ds".into()),
            ..Default::default()
        };
        assert_eq!(creds.question_llm_key(), Some("or"));

        let creds = CredentialsConfig {
            deepseek_api_key: Some("ds".into()),
            ..Default::default()
        };
        assert_eq!(creds.question_llm_key(), Some("ds"));
    }

    #[test]
    fn secrets_status_lists_missing_names() {
        let creds = CredentialsConfig {
            deepseek_api_key: Some("ds".into()),
            ..Default::default()
        };
        let status = creds.secrets_status();
        assert!(!status.all_present());
        assert_eq!(status.missing(), vec![GITHUB_TOKEN, GITHUB_GIST_ID]);
        assert_eq!(status.entries.len(), 3);
    }

    #[test]
    fn secrets_status_all_present() {
        let creds = CredentialsConfig {
            deepseek_api_key: Some("ds".into()),
            github_token: Some("gh".into()),
            github_gist_id: Some("id".into()),
            ..Default::default()
        };
        assert!(creds.secrets_status().all_present());
        assert!(creds.secrets_status().missing().is_empty());
    }
}
