use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub approvals: ApprovalsConfig,
    pub logging: LoggingConfig,
}

/// Title tokens that drive approver eligibility and role classification.
#[derive(Clone, Debug)]
pub struct ApprovalsConfig {
    pub manager_title_tokens: Vec<String>,
    pub hr_title_tokens: Vec<String>,
    pub admin_title_tokens: Vec<String>,
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
    pub manager_title_tokens: Option<Vec<String>>,
    pub hr_title_tokens: Option<Vec<String>>,
    pub admin_title_tokens: Option<Vec<String>>,
    pub log_level: Option<String>,
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
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            approvals: ApprovalsConfig {
                manager_title_tokens: vec!["manager".to_string()],
                hr_title_tokens: vec!["hr".to_string(), "human resources".to_string()],
                admin_title_tokens: vec!["admin".to_string()],
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
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

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("leavedesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(approvals) = patch.approvals {
            if let Some(tokens) = approvals.manager_title_tokens {
                self.approvals.manager_title_tokens = tokens;
            }
            if let Some(tokens) = approvals.hr_title_tokens {
                self.approvals.hr_title_tokens = tokens;
            }
            if let Some(tokens) = approvals.admin_title_tokens {
                self.approvals.admin_title_tokens = tokens;
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
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LEAVEDESK_MANAGER_TITLE_TOKENS") {
            self.approvals.manager_title_tokens =
                parse_tokens("LEAVEDESK_MANAGER_TITLE_TOKENS", &value)?;
        }
        if let Some(value) = read_env("LEAVEDESK_HR_TITLE_TOKENS") {
            self.approvals.hr_title_tokens = parse_tokens("LEAVEDESK_HR_TITLE_TOKENS", &value)?;
        }
        if let Some(value) = read_env("LEAVEDESK_ADMIN_TITLE_TOKENS") {
            self.approvals.admin_title_tokens =
                parse_tokens("LEAVEDESK_ADMIN_TITLE_TOKENS", &value)?;
        }

        let log_level =
            read_env("LEAVEDESK_LOGGING_LEVEL").or_else(|| read_env("LEAVEDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LEAVEDESK_LOGGING_FORMAT").or_else(|| read_env("LEAVEDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(tokens) = overrides.manager_title_tokens {
            self.approvals.manager_title_tokens = tokens;
        }
        if let Some(tokens) = overrides.hr_title_tokens {
            self.approvals.hr_title_tokens = tokens;
        }
        if let Some(tokens) = overrides.admin_title_tokens {
            self.approvals.admin_title_tokens = tokens;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tokens("approvals.manager_title_tokens", &self.approvals.manager_title_tokens)?;
        validate_tokens("approvals.hr_title_tokens", &self.approvals.hr_title_tokens)?;
        validate_tokens("approvals.admin_title_tokens", &self.approvals.admin_title_tokens)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("leavedesk.toml"), PathBuf::from("config/leavedesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_tokens(key: &str, tokens: &[String]) -> Result<(), ConfigError> {
    if tokens.is_empty() {
        return Err(ConfigError::Validation(format!("{key} must list at least one token")));
    }
    if tokens.iter().any(|token| token.trim().is_empty()) {
        return Err(ConfigError::Validation(format!("{key} must not contain empty tokens")));
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

fn parse_tokens(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let tokens: Vec<String> = value
        .split(',')
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(tokens)
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    approvals: Option<ApprovalsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApprovalsPatch {
    manager_title_tokens: Option<Vec<String>>,
    hr_title_tokens: Option<Vec<String>>,
    admin_title_tokens: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
