use std::sync::Arc;

use teetime_agent::{BookingAssistant, LlmError, OpenAiChatClient};
use teetime_core::config::{AppConfig, ConfigError, VaultBackend};
use teetime_core::credentials::{CredentialResolver, EnvSecretStore, SecretStore};
use teetime_core::pipeline::{BookingPipeline, NotifyPolicy};
use teetime_db::repositories::{CourseRepository, SqlBookingRepository, SqlCourseRepository, SqlSecretStore};
use teetime_db::{connect_with_config, migrations, DbPool};
use teetime_notify::{build_notifier, http_client, NotifierBuildError};
use thiserror::Error;
use tracing::info;

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notifier setup failed: {0}")]
    Notifier(#[from] NotifierBuildError),
    #[error("assistant setup failed: {0}")]
    Assistant(#[source] LlmError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", correlation_id = "bootstrap", "starting application bootstrap");

    let db_pool = connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let secret_store: Arc<dyn SecretStore> = match config.vault.backend {
        VaultBackend::Database => Arc::new(SqlSecretStore::new(db_pool.clone())),
        VaultBackend::Env => Arc::new(EnvSecretStore::default()),
    };
    let resolver = Arc::new(CredentialResolver::new(secret_store, &config.vault));

    let notifier =
        build_notifier(&config.notifier, resolver.clone(), http_client(&config.notifier)?)?;
    info!(
        event_name = "system.bootstrap.notifier_ready",
        correlation_id = "bootstrap",
        provider = notifier.provider(),
        vault_backend = config.vault.backend.as_str(),
        cache_credentials = config.vault.cache_credentials,
        "notification backend selected"
    );

    let pipeline = BookingPipeline::new(
        Arc::new(SqlBookingRepository::new(db_pool.clone())),
        notifier,
        NotifyPolicy::from(&config.notifier),
    );
    let courses: Arc<dyn CourseRepository> = Arc::new(SqlCourseRepository::new(db_pool.clone()));

    let llm = OpenAiChatClient::from_config(&config.assistant, resolver)
        .map_err(BootstrapError::Assistant)?;
    let assistant = BookingAssistant::new(Arc::new(llm), config.assistant.system_prompt.clone());

    let state = AppState {
        pipeline: Arc::new(pipeline),
        courses,
        assistant: Arc::new(assistant),
    };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use teetime_core::config::{AppConfig, ConfigOverrides, LoadOptions, NotifierProvider, VaultBackend};
    use teetime_core::domain::booking::BookingRequest;
    use teetime_core::pipeline::NotificationOutcome;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn file_database(dir: &tempfile::TempDir) -> String {
        format!("sqlite://{}", dir.path().join("teetime.db").display())
    }

    #[tokio::test]
    async fn bootstrap_wires_sqlite_store_and_configured_notifier() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(file_database(&dir)),
                notifier_relay_url: Some("http://127.0.0.1:9/api/send".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with defaults");

        assert_eq!(app.state.pipeline.notifier_provider(), "direct");

        let confirmation = app
            .state
            .pipeline
            .book(
                BookingRequest {
                    course_id: "c1".to_string(),
                    date: "2024-07-01".to_string(),
                    time: "09:00".to_string(),
                    contact_address: "a@b.com".to_string(),
                },
                "bootstrap-test",
            )
            .await
            .expect("booking persists even though the relay is unreachable");

        assert!(matches!(confirmation.notification, NotificationOutcome::Failed(_)));
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM booking WHERE id = ?")
            .bind(confirmation.booking_id.as_str())
            .fetch_one(&app.db_pool)
            .await
            .expect("count");
        assert_eq!(stored, 1);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_selects_third_party_with_database_vault() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(file_database(&dir)),
                notifier_provider: Some(NotifierProvider::ThirdParty),
                notifier_api_base_url: Some("https://mail.example.test/v1".to_string()),
                notifier_sender_address: Some("tee-times@club.example".to_string()),
                vault_backend: Some(VaultBackend::Database),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed");

        assert_eq!(app.state.pipeline.notifier_provider(), "third_party");
        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_relay_url() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(file_database(&dir)),
                notifier_relay_url: Some("not-a-url".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }
}
