use std::process::ExitCode;

use timetrack::cli::run_cli;
use tracing::error;

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error running cli {e:?}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
