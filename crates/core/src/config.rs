use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NOTIFIER_SECRET: &str = "notifier";
pub const ASSISTANT_SECRET: &str = "assistant";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful tee-time booking assistant.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub notifier: NotifierConfig,
    pub vault: VaultConfig,
    pub assistant: AssistantConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NotifierConfig {
    pub provider: NotifierProvider,
    /// Pre-registered origin address; never taken from request input.
    pub sender_address: String,
    pub relay_url: Option<String>,
    pub api_base_url: Option<String>,
    pub secret_name: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub backend: VaultBackend,
    pub cache_credentials: bool,
    pub secrets: BTreeMap<String, SecretBinding>,
}

/// Where a logical secret name lives in the vault and which structured fields may hold it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBinding {
    pub path: String,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    pub secret_name: String,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierProvider {
    Direct,
    ThirdParty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultBackend {
    Database,
    Env,
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
    pub notifier_provider: Option<NotifierProvider>,
    pub notifier_sender_address: Option<String>,
    pub notifier_relay_url: Option<String>,
    pub notifier_api_base_url: Option<String>,
    pub vault_backend: Option<VaultBackend>,
    pub vault_cache_credentials: Option<bool>,
    pub server_port: Option<u16>,
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
        let mut secrets = BTreeMap::new();
        secrets.insert(
            NOTIFIER_SECRET.to_string(),
            SecretBinding {
                path: "prod/notifier/api_key".to_string(),
                fields: vec!["API_KEY".to_string()],
            },
        );
        secrets.insert(
            ASSISTANT_SECRET.to_string(),
            SecretBinding {
                path: "prod/openai/api_key".to_string(),
                fields: vec![
                    "OPENAI_API_KEY".to_string(),
                    "openai_api_key".to_string(),
                    "API_KEY".to_string(),
                ],
            },
        );

        Self {
            database: DatabaseConfig {
                url: "sqlite://teetime.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            notifier: NotifierConfig {
                provider: NotifierProvider::Direct,
                sender_address: "bookings@teetime.local".to_string(),
                relay_url: Some("http://127.0.0.1:8025/api/send".to_string()),
                api_base_url: None,
                secret_name: NOTIFIER_SECRET.to_string(),
                timeout_secs: 10,
                max_retries: 2,
                retry_base_delay_ms: 200,
            },
            vault: VaultConfig { backend: VaultBackend::Env, cache_credentials: false, secrets },
            assistant: AssistantConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4".to_string(),
                secret_name: ASSISTANT_SECRET.to_string(),
                timeout_secs: 30,
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for NotifierProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "third_party" | "third-party" => Ok(Self::ThirdParty),
            other => Err(ConfigError::Validation(format!(
                "unsupported notifier provider `{other}` (expected direct|third_party)"
            ))),
        }
    }
}

impl std::str::FromStr for VaultBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "database" => Ok(Self::Database),
            "env" => Ok(Self::Env),
            other => Err(ConfigError::Validation(format!(
                "unsupported vault backend `{other}` (expected database|env)"
            ))),
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

impl NotifierProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ThirdParty => "third_party",
        }
    }
}

impl VaultBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Env => "env",
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("teetime.toml"));
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

        if let Some(notifier) = patch.notifier {
            if let Some(provider) = notifier.provider {
                self.notifier.provider = provider;
            }
            if let Some(sender_address) = notifier.sender_address {
                self.notifier.sender_address = sender_address;
            }
            if let Some(relay_url) = notifier.relay_url {
                self.notifier.relay_url = Some(relay_url);
            }
            if let Some(api_base_url) = notifier.api_base_url {
                self.notifier.api_base_url = Some(api_base_url);
            }
            if let Some(secret_name) = notifier.secret_name {
                self.notifier.secret_name = secret_name;
            }
            if let Some(timeout_secs) = notifier.timeout_secs {
                self.notifier.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = notifier.max_retries {
                self.notifier.max_retries = max_retries;
            }
            if let Some(retry_base_delay_ms) = notifier.retry_base_delay_ms {
                self.notifier.retry_base_delay_ms = retry_base_delay_ms;
            }
        }

        if let Some(vault) = patch.vault {
            if let Some(backend) = vault.backend {
                self.vault.backend = backend;
            }
            if let Some(cache_credentials) = vault.cache_credentials {
                self.vault.cache_credentials = cache_credentials;
            }
            for (name, binding) in vault.secrets.unwrap_or_default() {
                let entry = self.vault.secrets.entry(name).or_insert_with(|| SecretBinding {
                    path: String::new(),
                    fields: vec!["API_KEY".to_string()],
                });
                if let Some(path) = binding.path {
                    entry.path = path;
                }
                if let Some(fields) = binding.fields {
                    entry.fields = fields;
                }
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(base_url) = assistant.base_url {
                self.assistant.base_url = base_url;
            }
            if let Some(model) = assistant.model {
                self.assistant.model = model;
            }
            if let Some(secret_name) = assistant.secret_name {
                self.assistant.secret_name = secret_name;
            }
            if let Some(timeout_secs) = assistant.timeout_secs {
                self.assistant.timeout_secs = timeout_secs;
            }
            if let Some(system_prompt) = assistant.system_prompt {
                self.assistant.system_prompt = system_prompt;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
        if let Some(value) = read_env("TEETIME_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TEETIME_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("TEETIME_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TEETIME_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TEETIME_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TEETIME_NOTIFIER_PROVIDER") {
            self.notifier.provider = value.parse()?;
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_SENDER_ADDRESS") {
            self.notifier.sender_address = value;
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_RELAY_URL") {
            self.notifier.relay_url = Some(value);
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_API_BASE_URL") {
            self.notifier.api_base_url = Some(value);
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_SECRET_NAME") {
            self.notifier.secret_name = value;
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_TIMEOUT_SECS") {
            self.notifier.timeout_secs = parse_u64("TEETIME_NOTIFIER_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_MAX_RETRIES") {
            self.notifier.max_retries = parse_u32("TEETIME_NOTIFIER_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("TEETIME_NOTIFIER_RETRY_BASE_DELAY_MS") {
            self.notifier.retry_base_delay_ms =
                parse_u64("TEETIME_NOTIFIER_RETRY_BASE_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("TEETIME_VAULT_BACKEND") {
            self.vault.backend = value.parse()?;
        }
        if let Some(value) = read_env("TEETIME_VAULT_CACHE_CREDENTIALS") {
            self.vault.cache_credentials = parse_bool("TEETIME_VAULT_CACHE_CREDENTIALS", &value)?;
        }

        if let Some(value) = read_env("TEETIME_ASSISTANT_BASE_URL") {
            self.assistant.base_url = value;
        }
        if let Some(value) = read_env("TEETIME_ASSISTANT_MODEL") {
            self.assistant.model = value;
        }
        if let Some(value) = read_env("TEETIME_ASSISTANT_SECRET_NAME") {
            self.assistant.secret_name = value;
        }
        if let Some(value) = read_env("TEETIME_ASSISTANT_TIMEOUT_SECS") {
            self.assistant.timeout_secs = parse_u64("TEETIME_ASSISTANT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TEETIME_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TEETIME_SERVER_PORT") {
            self.server.port = parse_u16("TEETIME_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TEETIME_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TEETIME_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("TEETIME_LOGGING_LEVEL").or_else(|| read_env("TEETIME_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TEETIME_LOGGING_FORMAT").or_else(|| read_env("TEETIME_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(provider) = overrides.notifier_provider {
            self.notifier.provider = provider;
        }
        if let Some(sender_address) = overrides.notifier_sender_address {
            self.notifier.sender_address = sender_address;
        }
        if let Some(relay_url) = overrides.notifier_relay_url {
            self.notifier.relay_url = Some(relay_url);
        }
        if let Some(api_base_url) = overrides.notifier_api_base_url {
            self.notifier.api_base_url = Some(api_base_url);
        }
        if let Some(backend) = overrides.vault_backend {
            self.vault.backend = backend;
        }
        if let Some(cache_credentials) = overrides.vault_cache_credentials {
            self.vault.cache_credentials = cache_credentials;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_vault(&self.vault)?;
        validate_notifier(&self.notifier, &self.vault)?;
        validate_assistant(&self.assistant, &self.vault)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("teetime.toml"), PathBuf::from("config/teetime.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_vault(vault: &VaultConfig) -> Result<(), ConfigError> {
    for (name, binding) in &vault.secrets {
        if binding.path.trim().is_empty() {
            return Err(ConfigError::Validation(format!("vault.secrets.{name}.path is required")));
        }
        if binding.fields.iter().all(|field| field.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "vault.secrets.{name}.fields must list at least one field name"
            )));
        }
    }

    Ok(())
}

fn validate_notifier(notifier: &NotifierConfig, vault: &VaultConfig) -> Result<(), ConfigError> {
    if notifier.timeout_secs == 0 || notifier.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "notifier.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    if notifier.max_retries > 5 {
        return Err(ConfigError::Validation(
            "notifier.max_retries must be in range 0..=5".to_string(),
        ));
    }

    match notifier.provider {
        NotifierProvider::Direct => {
            let relay_url = notifier.relay_url.as_deref().map(str::trim).unwrap_or_default();
            if !is_http_url(relay_url) {
                return Err(ConfigError::Validation(
                    "notifier.relay_url must start with http:// or https:// for the direct provider"
                        .to_string(),
                ));
            }
        }
        NotifierProvider::ThirdParty => {
            let sender = notifier.sender_address.trim();
            if sender.is_empty() || !sender.contains('@') {
                return Err(ConfigError::Validation(
                    "notifier.sender_address must be a verified sender email address".to_string(),
                ));
            }

            let api_base_url = notifier.api_base_url.as_deref().map(str::trim).unwrap_or_default();
            if !is_http_url(api_base_url) {
                return Err(ConfigError::Validation(
                    "notifier.api_base_url must start with http:// or https:// for the third_party provider"
                        .to_string(),
                ));
            }

            if !vault.secrets.contains_key(&notifier.secret_name) {
                return Err(ConfigError::Validation(format!(
                    "notifier.secret_name `{}` has no matching vault.secrets entry",
                    notifier.secret_name
                )));
            }
        }
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig, vault: &VaultConfig) -> Result<(), ConfigError> {
    if !is_http_url(assistant.base_url.trim()) {
        return Err(ConfigError::Validation(
            "assistant.base_url must start with http:// or https://".to_string(),
        ));
    }

    if assistant.model.trim().is_empty() {
        return Err(ConfigError::Validation("assistant.model is required".to_string()));
    }

    if assistant.timeout_secs == 0 || assistant.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "assistant.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !vault.secrets.contains_key(&assistant.secret_name) {
        return Err(ConfigError::Validation(format!(
            "assistant.secret_name `{}` has no matching vault.secrets entry",
            assistant.secret_name
        )));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
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

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    notifier: Option<NotifierPatch>,
    vault: Option<VaultPatch>,
    assistant: Option<AssistantPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifierPatch {
    provider: Option<NotifierProvider>,
    sender_address: Option<String>,
    relay_url: Option<String>,
    api_base_url: Option<String>,
    secret_name: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct VaultPatch {
    backend: Option<VaultBackend>,
    cache_credentials: Option<bool>,
    secrets: Option<BTreeMap<String, SecretBindingPatch>>,
}

#[derive(Debug, Default, Deserialize)]
struct SecretBindingPatch {
    path: Option<String>,
    fields: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    base_url: Option<String>,
    model: Option<String>,
    secret_name: Option<String>,
    timeout_secs: Option<u64>,
    system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
