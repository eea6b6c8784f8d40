use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::lead::LeadStatus;
use crate::sla::{SlaPolicy, SlaPolicySet};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub sla: SlaConfig,
    pub assignment: AssignmentConfig,
    pub quotes: QuoteDraftConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Per-status SLA budgets in minutes, keyed by status wire name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlaConfig {
    pub entries: BTreeMap<String, SlaEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaEntry {
    pub max_minutes: i64,
    pub warning_minutes: i64,
}

#[derive(Clone, Debug, Default)]
pub struct AssignmentConfig {
    pub auto_assign_to: Option<String>,
}

/// Quote-drafting collaborator. Fire-and-report; the engine never retries.
#[derive(Clone, Debug)]
pub struct QuoteDraftConfig {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub auto_assign_to: Option<String>,
    pub quotes_enabled: Option<bool>,
    pub quotes_base_url: Option<String>,
    pub quotes_api_key: Option<String>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://leadflow.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8090,
                health_check_port: 8091,
                graceful_shutdown_secs: 15,
            },
            sla: SlaConfig::default(),
            assignment: AssignmentConfig::default(),
            quotes: QuoteDraftConfig {
                enabled: false,
                base_url: None,
                api_key: None,
                timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("new".to_string(), SlaEntry { max_minutes: 120, warning_minutes: 90 });
        entries.insert(
            "no_answer".to_string(),
            SlaEntry { max_minutes: 1_440, warning_minutes: 1_080 },
        );
        entries.insert(
            "followup".to_string(),
            SlaEntry { max_minutes: 2_880, warning_minutes: 2_160 },
        );
        entries.insert(
            "no_answer_x5".to_string(),
            SlaEntry { max_minutes: 480, warning_minutes: 360 },
        );
        Self { entries }
    }
}

impl SlaConfig {
    pub fn policy_set(&self) -> Result<SlaPolicySet, ConfigError> {
        let mut set = SlaPolicySet::empty();
        for (status, entry) in &self.entries {
            let status = LeadStatus::from_str(status).map_err(|_| {
                ConfigError::Validation(format!("unknown status `{status}` in [sla]"))
            })?;
            set = set
                .with_policy(status, SlaPolicy::from_minutes(entry.max_minutes, entry.warning_minutes));
        }
        Ok(set)
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

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    sla: Option<BTreeMap<String, SlaEntry>>,
    assignment: Option<AssignmentPatch>,
    quotes: Option<QuoteDraftPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssignmentPatch {
    auto_assign_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteDraftPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("leadflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(sla) = patch.sla {
            for (status, entry) in sla {
                self.sla.entries.insert(status, entry);
            }
        }

        if let Some(assignment) = patch.assignment {
            if let Some(auto_assign_to) = assignment.auto_assign_to {
                self.assignment.auto_assign_to = Some(auto_assign_to);
            }
        }

        if let Some(quotes) = patch.quotes {
            if let Some(enabled) = quotes.enabled {
                self.quotes.enabled = enabled;
            }
            if let Some(base_url) = quotes.base_url {
                self.quotes.base_url = Some(base_url);
            }
            if let Some(api_key_value) = quotes.api_key {
                self.quotes.api_key = Some(api_key_value.into());
            }
            if let Some(timeout_secs) = quotes.timeout_secs {
                self.quotes.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("LEADFLOW_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LEADFLOW_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("LEADFLOW_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("LEADFLOW_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LEADFLOW_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("LEADFLOW_SERVER_PORT") {
            self.server.port = parse_u16("LEADFLOW_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("LEADFLOW_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("LEADFLOW_ASSIGNMENT_AUTO_ASSIGN_TO") {
            self.assignment.auto_assign_to = Some(value);
        }

        if let Some(value) = read_env("LEADFLOW_QUOTES_ENABLED") {
            self.quotes.enabled = parse_bool("LEADFLOW_QUOTES_ENABLED", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_QUOTES_BASE_URL") {
            self.quotes.base_url = Some(value);
        }
        if let Some(value) = read_env("LEADFLOW_QUOTES_API_KEY") {
            self.quotes.api_key = Some(value.into());
        }
        if let Some(value) = read_env("LEADFLOW_QUOTES_TIMEOUT_SECS") {
            self.quotes.timeout_secs = parse_u64("LEADFLOW_QUOTES_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LEADFLOW_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("LEADFLOW_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(auto_assign_to) = overrides.auto_assign_to {
            self.assignment.auto_assign_to = Some(auto_assign_to);
        }
        if let Some(enabled) = overrides.quotes_enabled {
            self.quotes.enabled = enabled;
        }
        if let Some(base_url) = overrides.quotes_base_url {
            self.quotes.base_url = Some(base_url);
        }
        if let Some(api_key_value) = overrides.quotes_api_key {
            self.quotes.api_key = Some(api_key_value.into());
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        for (status, entry) in &self.sla.entries {
            if entry.max_minutes <= 0 {
                return Err(ConfigError::Validation(format!(
                    "sla.{status}.max_minutes must be positive"
                )));
            }
            if entry.warning_minutes > entry.max_minutes {
                return Err(ConfigError::Validation(format!(
                    "sla.{status}.warning_minutes must not exceed max_minutes"
                )));
            }
        }
        self.sla.policy_set()?;
        if self.quotes.enabled && self.quotes.base_url.is_none() {
            return Err(ConfigError::Validation(
                "quotes.base_url is required when quotes.enabled is true".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        return None;
    }

    let default = PathBuf::from("leadflow.toml");
    if default.exists() {
        return Some(default);
    }
    None
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }),
    }
}
