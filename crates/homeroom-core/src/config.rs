// Configuration loading and parsing (app.toml, credentials.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::credentials::CredentialsConfig;
use crate::level::Level;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub practice: PracticeConfig,
    pub llm: LlmConfig,
    pub translate: TranslateConfig,
    pub storage: StorageConfig,
    pub profiles: Vec<ProfileConfig>,
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Look up a profile by name, ignoring case.
    pub fn profile(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// app.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire app.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    #[serde(default)]
    practice: PracticeConfig,
    #[serde(default)]
    llm: LlmConfig,
    #[serde(default)]
    translate: TranslateConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    profiles: Vec<ProfileConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub default_level: String,
    pub question_count: usize,
    pub style: QuestionStyle,
    /// Shorter, lower-temperature requests.
    pub fast: bool,
}

impl PracticeConfig {
    /// The configured starting level. Validation guarantees it parses.
    pub fn level(&self) -> Level {
        self.default_level.parse().unwrap_or_default()
    }
}

impl Default for PracticeConfig {
    fn default() -> Self {
        PracticeConfig {
            default_level: Level::default().code().to_string(),
            question_count: 10,
            style: QuestionStyle::default(),
            fast: true,
        }
    }
}

/// Which kinds of question the generator should lean towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStyle {
    #[default]
    Balanced,
    WordProblems,
    MentalMath,
    LogicPuzzles,
}

impl QuestionStyle {
    pub const ALL: [QuestionStyle; 4] = [
        QuestionStyle::Balanced,
        QuestionStyle::WordProblems,
        QuestionStyle::MentalMath,
        QuestionStyle::LogicPuzzles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QuestionStyle::Balanced => "Balanced (Mixed)",
            QuestionStyle::WordProblems => "Word Problems",
            QuestionStyle::MentalMath => "Mental Math",
            QuestionStyle::LogicPuzzles => "Logic Puzzles",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub referer: String,
    pub timeout_secs: u64,
    pub news_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            base_url: "https://openrouter.ai/api/v1".into(),
            model: "deepseek/deepseek-r1-0528:free".into(),
            referer: "http://localhost:8501".into(),
            timeout_secs: 60,
            news_max_tokens: 800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        TranslateConfig {
            base_url: "https://api.deepseek.com/v1".into(),
            model: "deepseek-chat".into(),
            max_tokens: 1000,
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub history_path: String,
    pub gist_api_base: String,
    pub gist_filename: String,
    pub max_chat_history: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            history_path: "history.json".into(),
            gist_api_base: "https://api.github.com".into(),
            gist_filename: "chat_history.json".into(),
            max_chat_history: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub page: ProfilePage,
}

/// Where a profile button on the home page leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePage {
    Practice,
    Translate,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/app.toml` and (optionally)
/// `config/credentials.toml`, relative to `base_dir`. Credentials missing
/// from the file are not filled from the environment here; see
/// [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- app.toml (required) ---
    let app_path = config_dir.join("app.toml");
    let app_text = read_file(&app_path)?;
    let app_file: AppFile = toml::from_str(&app_text).map_err(|e| ConfigError::ParseError {
        path: app_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        practice: app_file.practice,
        llm: app_file.llm,
        translate: app_file.translate,
        storage: app_file.storage,
        profiles: app_file.profiles,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if copy_if_absent(&path, &target)? {
            copied.push(target);
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying defaults
/// first, then fills any missing credentials from the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    config.credentials.fill_from_env();
    Ok(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Copy `src` to `target` unless `target` already exists. Returns whether a
/// copy happened.
fn copy_if_absent(src: &Path, target: &Path) -> Result<bool, ConfigError> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(mut dest) => {
            let content = std::fs::read(src).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read {}: {e}", src.display()),
            })?;
            std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.practice.question_count == 0 {
        return Err(invalid("practice.question_count", "must be greater than 0"));
    }

    if let Err(e) = config.practice.default_level.parse::<Level>() {
        return Err(invalid("practice.default_level", e.to_string()));
    }

    if config.storage.max_chat_history == 0 {
        return Err(invalid("storage.max_chat_history", "must be greater than 0"));
    }

    let temp = config.translate.temperature;
    if !(0.0..=2.0).contains(&temp) {
        return Err(invalid(
            "translate.temperature",
            format!("must be between 0.0 and 2.0 inclusive, got {temp}"),
        ));
    }

    for (field, secs) in [
        ("llm.timeout_secs", config.llm.timeout_secs),
        ("translate.timeout_secs", config.translate.timeout_secs),
    ] {
        if secs == 0 {
            return Err(invalid(field, "must be > 0"));
        }
    }

    if config.profiles.is_empty() {
        return Err(invalid("profiles", "at least one profile is required"));
    }

    let mut seen = HashSet::new();
    for (i, profile) in config.profiles.iter().enumerate() {
        let name = profile.name.trim();
        if name.is_empty() {
            return Err(invalid(&format!("profiles[{i}].name"), "must not be empty"));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(invalid(
                &format!("profiles[{i}].name"),
                format!("duplicate profile name `{name}`"),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
