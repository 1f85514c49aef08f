use teetime_core::config::{AppConfig, LoadOptions};
use teetime_db::{connect_with_config, migrations, CourseSeedDataset};

use crate::commands::{runtime, CommandResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = CourseSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CourseSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;

        let outcome: Result<Vec<&'static str>, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(seed_result.courses_seeded)
            } else {
                Err(("seed_verification", verification_message(&verification.checks), 6u8))
            };
        outcome
    });

    match result {
        Ok(courses) => CommandResult::success(
            "seed",
            format!("demo course catalog loaded: {}", courses.join(", ")),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "some seed courses failed to load".to_string()
    } else {
        format!("seed verification failed for courses: {}", failed_checks.join(", "))
    }
}
