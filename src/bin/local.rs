use std::process::ExitCode;

use tracing::error;

use paperwatch::{
    config::Config,
    logging::{self, LogTarget},
    pipeline
};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(LogTarget::Terminal);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    match pipeline::run(&config).await {
        Ok(report) => {
            println!("# fetched: {}, matched: {}, notified: {}, failed: {}",
                report.fetched, report.matched, report.notified, report.failed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
