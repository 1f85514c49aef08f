use std::process::ExitCode;

fn main() -> ExitCode {
    teetime_cli::run()
}
