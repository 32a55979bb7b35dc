use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::AgentId;

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["nova.toml", "config/nova.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub extraction: ExtractionConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub products_path: PathBuf,
    pub categories_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Whether product and ticket extraction may fall back to prose matching.
    pub text_fallback: bool,
    pub max_text_matches: usize,
}

#[derive(Clone, Debug)]
pub struct ConversationConfig {
    pub agent: AgentId,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub products_path: Option<PathBuf>,
    pub categories_path: Option<PathBuf>,
    pub text_fallback: Option<bool>,
    pub agent: Option<AgentId>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                products_path: PathBuf::from("data/products.json"),
                categories_path: PathBuf::from("data/categories.json"),
            },
            extraction: ExtractionConfig::default(),
            conversation: ConversationConfig { agent: AgentId::PersonalShopper },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { text_fallback: true, max_text_matches: 3 }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(catalog) = patch.catalog {
            if let Some(products_path) = catalog.products_path {
                self.catalog.products_path = products_path;
            }
            if let Some(categories_path) = catalog.categories_path {
                self.catalog.categories_path = categories_path;
            }
        }

        if let Some(extraction) = patch.extraction {
            if let Some(text_fallback) = extraction.text_fallback {
                self.extraction.text_fallback = text_fallback;
            }
            if let Some(max_text_matches) = extraction.max_text_matches {
                self.extraction.max_text_matches = max_text_matches;
            }
        }

        if let Some(conversation) = patch.conversation {
            if let Some(agent) = conversation.agent {
                self.conversation.agent = agent.parse()?;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("NOVA_CATALOG_PRODUCTS_PATH") {
            self.catalog.products_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("NOVA_CATALOG_CATEGORIES_PATH") {
            self.catalog.categories_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("NOVA_EXTRACTION_TEXT_FALLBACK") {
            self.extraction.text_fallback = parse_bool("NOVA_EXTRACTION_TEXT_FALLBACK", &value)?;
        }
        if let Some(value) = read_env("NOVA_EXTRACTION_MAX_TEXT_MATCHES") {
            self.extraction.max_text_matches = parse_usize("NOVA_EXTRACTION_MAX_TEXT_MATCHES", &value)?;
        }

        if let Some(value) = read_env("NOVA_CONVERSATION_AGENT") {
            self.conversation.agent = value.parse()?;
        }

        let log_level = read_env("NOVA_LOGGING_LEVEL").or_else(|| read_env("NOVA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("NOVA_LOGGING_FORMAT").or_else(|| read_env("NOVA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(products_path) = overrides.products_path {
            self.catalog.products_path = products_path;
        }
        if let Some(categories_path) = overrides.categories_path {
            self.catalog.categories_path = categories_path;
        }
        if let Some(text_fallback) = overrides.text_fallback {
            self.extraction.text_fallback = text_fallback;
        }
        if let Some(agent) = overrides.agent {
            self.conversation.agent = agent;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_extraction(&self.extraction)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read for `explicit_path`, if any exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    for (key, path) in [
        ("catalog.products_path", &catalog.products_path),
        ("catalog.categories_path", &catalog.categories_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
        let is_json = path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(ConfigError::Validation(format!(
                "{key} must point to a .json file (got `{}`)",
                path.display()
            )));
        }
    }

    Ok(())
}

fn validate_extraction(extraction: &ExtractionConfig) -> Result<(), ConfigError> {
    if extraction.max_text_matches == 0 || extraction.max_text_matches > 10 {
        return Err(ConfigError::Validation(
            "extraction.max_text_matches must be in range 1..=10".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    extraction: Option<ExtractionPatch>,
    conversation: Option<ConversationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    products_path: Option<PathBuf>,
    categories_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractionPatch {
    text_fallback: Option<bool>,
    max_text_matches: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
