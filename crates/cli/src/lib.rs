pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use teetime_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "teetime",
    about = "Teetime operator CLI",
    long_about = "Operate the tee-time booking service: migrations, demo catalog, config inspection and readiness checks.",
    after_help = "Examples:\n  teetime migrate\n  teetime seed\n  teetime doctor --json\n  teetime --config-file ./teetime.toml config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file (must exist)")]
    config_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Upsert the demo course catalog and verify it can be read back")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config, database schema, and credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        match &self.config_file {
            Some(path) => LoadOptions {
                config_path: Some(path.clone()),
                require_file: true,
                ..LoadOptions::default()
            },
            None => LoadOptions::default(),
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(json, options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
