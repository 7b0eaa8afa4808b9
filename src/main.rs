use std::process::ExitCode;

use leakdump_rs::RunOutcome;

/// Exit code for a run deliberately stopped by the configured result limit.
const EXIT_LIMIT_REACHED: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    match leakdump_rs::run().await {
        Ok(RunOutcome::Completed(_)) => ExitCode::SUCCESS,
        Ok(RunOutcome::LimitReached(_)) => ExitCode::from(EXIT_LIMIT_REACHED),
        Err(e) => {
            eprintln!("Error: {e}");
            if std::env::var("RUST_BACKTRACE").is_ok() {
                if let Some(source) = std::error::Error::source(&e) {
                    eprintln!("Caused by: {source}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}
