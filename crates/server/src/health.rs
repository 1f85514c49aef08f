use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use teetime_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    notifier_provider: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub notifier: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, notifier_provider: &'static str) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, notifier_provider })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database,
        notifier: HealthCheck {
            status: "configured",
            detail: format!("{} delivery backend", state.notifier_provider),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    let booking_table = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'booking'",
    )
    .fetch_one(pool)
    .await;

    match booking_table {
        Ok(1) => HealthCheck { status: "ready", detail: "booking table reachable".to_string() },
        Ok(_) => HealthCheck {
            status: "degraded",
            detail: "booking table missing; run `teetime migrate`".to_string(),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}
