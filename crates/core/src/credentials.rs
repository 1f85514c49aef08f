//! Credential resolution for notification and model providers.
//!
//! Callers ask for a logical secret name (`"notifier"`, `"assistant"`). The vault
//! path and the structured field names that may carry the value come from
//! [`VaultConfig`], so request handling never sees vault addressing.
//!
//! Payload handling: a JSON object yields the first configured field holding a
//! non-blank string; a JSON string yields its contents; anything else is taken
//! verbatim as the credential. Blank payloads count as missing.
//!
//! The optional cache has no expiry. Rotating a secret needs a restart or an
//! explicit [`CredentialResolver::invalidate`].

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::{SecretBinding, VaultConfig};

pub type Credential = SecretString;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential `{name}` was not found")]
    NotFound { name: String },
    #[error("credential `{name}` is malformed: no field of {fields:?} holds a string value")]
    Malformed { name: String, fields: Vec<String> },
    #[error("secret store lookup for `{name}` failed: {message}")]
    Store { name: String, message: String },
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SecretStoreError(pub String);

/// Read side of a key/value vault.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SecretStoreError>;
}

#[derive(Default)]
pub struct InMemorySecretStore {
    entries: RwLock<HashMap<String, String>>,
    fetches: AtomicUsize,
}

impl InMemorySecretStore {
    pub async fn insert(&self, path: impl Into<String>, payload: impl Into<String>) {
        self.entries.write().await.insert(path.into(), payload.into());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SecretStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.read().await.get(path).cloned())
    }
}

/// Reads `prod/openai/api_key` from `TEETIME_SECRET_PROD_OPENAI_API_KEY`.
#[derive(Clone, Debug)]
pub struct EnvSecretStore {
    prefix: String,
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self { prefix: "TEETIME_SECRET_".to_string() }
    }
}

impl EnvSecretStore {
    pub fn variable_name(&self, path: &str) -> String {
        let suffix: String = path
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SecretStoreError> {
        match env::var(self.variable_name(path)) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(SecretStoreError(format!("secret `{path}` is not valid unicode")))
            }
        }
    }
}

pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
    bindings: BTreeMap<String, SecretBinding>,
    cache: Option<RwLock<HashMap<String, Credential>>>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>, vault: &VaultConfig) -> Self {
        Self {
            store,
            bindings: vault.secrets.clone(),
            cache: vault.cache_credentials.then(|| RwLock::new(HashMap::new())),
        }
    }

    pub async fn resolve(&self, name: &str) -> Result<Credential, CredentialError> {
        if let Some(cache) = &self.cache {
            if let Some(credential) = cache.read().await.get(name) {
                debug!(event_name = "credentials.resolve.cache_hit", secret_name = %name, "credential served from cache");
                return Ok(credential.clone());
            }
        }

        let binding = self
            .bindings
            .get(name)
            .ok_or_else(|| CredentialError::NotFound { name: name.to_string() })?;

        let payload = self.store.fetch(&binding.path).await.map_err(|error| {
            warn!(event_name = "credentials.resolve.store_error", secret_name = %name, error = %error, "secret store lookup failed");
            CredentialError::Store { name: name.to_string(), message: error.to_string() }
        })?;

        let payload = payload
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| CredentialError::NotFound { name: name.to_string() })?;

        let credential = parse_payload(name, &payload, &binding.fields)?;
        debug!(event_name = "credentials.resolve.fetched", secret_name = %name, "credential fetched from secret store");

        if let Some(cache) = &self.cache {
            cache.write().await.insert(name.to_string(), credential.clone());
        }

        Ok(credential)
    }

    pub async fn invalidate(&self, name: &str) {
        if let Some(cache) = &self.cache {
            cache.write().await.remove(name);
        }
    }

    pub async fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.write().await.clear();
        }
    }
}

pub fn parse_payload(
    name: &str,
    payload: &str,
    fields: &[String],
) -> Result<Credential, CredentialError> {
    if payload.trim().is_empty() {
        return Err(CredentialError::NotFound { name: name.to_string() });
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(object)) => fields
            .iter()
            .filter_map(|field| object.get(field).and_then(Value::as_str))
            .find(|value| !value.trim().is_empty())
            .map(|value| SecretString::from(value.to_string()))
            .ok_or_else(|| CredentialError::Malformed {
                name: name.to_string(),
                fields: fields.to_vec(),
            }),
        Ok(Value::String(value)) if value.trim().is_empty() => {
            Err(CredentialError::NotFound { name: name.to_string() })
        }
        Ok(Value::String(value)) => Ok(SecretString::from(value)),
        _ => Ok(SecretString::from(payload.to_string())),
    }
}
