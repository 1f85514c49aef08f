use async_trait::async_trait;
use chrono::Utc;

use teetime_core::credentials::{SecretStore, SecretStoreError};

use super::RepositoryError;
use crate::DbPool;

/// Vault reader over the `secret` table. Payloads are stored exactly as provisioned.
pub struct SqlSecretStore {
    pool: DbPool,
}

impl SqlSecretStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn put(&self, path: &str, payload: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO secret (path, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(path)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SecretStore for SqlSecretStore {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SecretStoreError> {
        sqlx::query_scalar::<_, String>("SELECT payload FROM secret WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| SecretStoreError(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use secrecy::ExposeSecret;
    use teetime_core::config::{SecretBinding, VaultBackend, VaultConfig};
    use teetime_core::credentials::{CredentialError, CredentialResolver, SecretStore};

    use super::SqlSecretStore;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn stored_payload_feeds_the_credential_resolver() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let store = Arc::new(SqlSecretStore::new(pool.clone()));

        store.put("prod/mail/key", r#"{"API_KEY":"abc"}"#).await.expect("put");
        assert_eq!(
            store.fetch("prod/mail/key").await.expect("fetch").as_deref(),
            Some(r#"{"API_KEY":"abc"}"#)
        );
        assert_eq!(store.fetch("prod/other").await.expect("fetch"), None);

        let mut secrets = BTreeMap::new();
        secrets.insert(
            "notifier".to_string(),
            SecretBinding { path: "prod/mail/key".to_string(), fields: vec!["API_KEY".to_string()] },
        );
        let vault = VaultConfig { backend: VaultBackend::Database, cache_credentials: false, secrets };
        let resolver = CredentialResolver::new(store.clone(), &vault);

        let credential = resolver.resolve("notifier").await.expect("resolve");
        assert_eq!(credential.expose_secret(), "abc");

        store.put("prod/mail/key", "{}").await.expect("overwrite");
        let error = resolver.resolve("notifier").await.expect_err("malformed");
        assert!(matches!(error, CredentialError::Malformed { .. }));

        pool.close().await;
    }
}
