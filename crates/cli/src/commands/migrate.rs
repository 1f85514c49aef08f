use teetime_core::config::{AppConfig, LoadOptions};
use teetime_db::{connect_with_config, migrations};

use crate::commands::{runtime, CommandResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let applied_before = applied_count(&pool).await;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let applied_after = applied_count(&pool).await;
        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(applied_after.saturating_sub(applied_before))
    });

    match result {
        Ok(newly_applied) => CommandResult::success(
            "migrate",
            format!(
                "applied {newly_applied} pending migration(s); schema has {} total",
                migrations::MIGRATOR.iter().count()
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

async fn applied_count(pool: &teetime_db::DbPool) -> usize {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .map(|count| usize::try_from(count).unwrap_or_default())
        .unwrap_or(0)
}
