use std::sync::Arc;

use serde::Serialize;
use teetime_core::config::{AppConfig, LoadOptions, NotifierProvider, VaultBackend};
use teetime_core::credentials::{CredentialResolver, EnvSecretStore, SecretStore};
use teetime_db::repositories::SqlSecretStore;
use teetime_db::{connect_with_config, DbPool};

use crate::commands::{runtime, CommandResult};

const SCHEMA_TABLES: [&str; 3] = ["booking", "course", "secret"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, options: LoadOptions) -> CommandResult {
    let runtime = match runtime("doctor") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let report = build_report(&runtime, options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(runtime: &tokio::runtime::Runtime, options: LoadOptions) -> DoctorReport {
    let checks = match AppConfig::load(options) {
        Ok(config) => {
            let mut checks =
                vec![DoctorCheck::pass("config_validation", "configuration loaded and validated")];
            checks.extend(runtime_checks(runtime, &config));
            checks
        }
        Err(error) => {
            let reason = "skipped because configuration did not load";
            vec![
                DoctorCheck::fail("config_validation", error.to_string()),
                DoctorCheck::skipped("database_connectivity", reason),
                DoctorCheck::skipped("database_schema", reason),
                DoctorCheck::skipped("notifier_credential", reason),
                DoctorCheck::skipped("assistant_credential", reason),
            ]
        }
    };

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn runtime_checks(runtime: &tokio::runtime::Runtime, config: &AppConfig) -> Vec<DoctorCheck> {
    runtime.block_on(async {
        let mut checks = Vec::new();
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => {
                checks.push(DoctorCheck::pass(
                    "database_connectivity",
                    format!("connected using `{}`", config.database.url),
                ));
                Some(pool)
            }
            Err(error) => {
                checks.push(DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to connect to database: {error}"),
                ));
                None
            }
        };

        match &pool {
            Some(pool) => checks.push(schema_check(pool).await),
            None => checks.push(DoctorCheck::skipped("database_schema", "no database connection")),
        }

        let store: Option<Arc<dyn SecretStore>> = match (config.vault.backend, &pool) {
            (VaultBackend::Env, _) => Some(Arc::new(EnvSecretStore::default())),
            (VaultBackend::Database, Some(pool)) => Some(Arc::new(SqlSecretStore::new(pool.clone()))),
            (VaultBackend::Database, None) => None,
        };

        match store {
            Some(store) => {
                let resolver = CredentialResolver::new(store, &config.vault);
                checks.push(notifier_credential_check(config, &resolver).await);
                checks.push(
                    credential_check(
                        "assistant_credential",
                        &resolver,
                        &config.assistant.secret_name,
                    )
                    .await,
                );
            }
            None => {
                let reason = "database vault selected but the database is unreachable";
                checks.push(DoctorCheck::fail("notifier_credential", reason));
                checks.push(DoctorCheck::fail("assistant_credential", reason));
            }
        }

        if let Some(pool) = pool {
            pool.close().await;
        }
        checks
    })
}

async fn schema_check(pool: &DbPool) -> DoctorCheck {
    let mut missing = Vec::new();
    for table in SCHEMA_TABLES {
        let present = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(pool)
        .await;
        match present {
            Ok(1) => {}
            Ok(_) => missing.push(table),
            Err(error) => {
                return DoctorCheck::fail("database_schema", format!("schema query failed: {error}"))
            }
        }
    }

    if missing.is_empty() {
        DoctorCheck::pass("database_schema", "booking, course and secret tables present")
    } else {
        DoctorCheck::fail(
            "database_schema",
            format!("missing tables: {}; run `teetime migrate`", missing.join(", ")),
        )
    }
}

async fn notifier_credential_check(config: &AppConfig, resolver: &CredentialResolver) -> DoctorCheck {
    match config.notifier.provider {
        NotifierProvider::Direct => DoctorCheck::skipped(
            "notifier_credential",
            "direct relay is authorized by the execution environment",
        ),
        NotifierProvider::ThirdParty => {
            credential_check("notifier_credential", resolver, &config.notifier.secret_name).await
        }
    }
}

async fn credential_check(
    name: &'static str,
    resolver: &CredentialResolver,
    secret_name: &str,
) -> DoctorCheck {
    match resolver.resolve(secret_name).await {
        Ok(_) => DoctorCheck::pass(name, format!("secret `{secret_name}` resolved")),
        Err(error) => DoctorCheck::fail(name, error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
