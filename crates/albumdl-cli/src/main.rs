use albumdl_core::logging;
use std::process::ExitCode;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Log to the state file when possible; stderr otherwise.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    match cli::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("albumdl error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
