use std::sync::Arc;

use lambda_runtime::{service_fn, LambdaEvent, Error as LambdaError};
use serde_json::Value;
use tracing::error;

use paperwatch::{
    config::Config,
    logging::{self, LogTarget},
    pipeline
};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    logging::init(LogTarget::Lambda);

    // a missing credential fails the cold start, before any invocation.
    let config = Arc::new(Config::from_env()?);

    let func = service_fn(move |event: LambdaEvent<Value>| {
        let config = Arc::clone(&config);
        async move { handler(&config, event).await }
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

// scheduled events carry nothing we need, so the payload is ignored.
async fn handler(config: &Config, _event: LambdaEvent<Value>) -> Result<Value, LambdaError> {
    match pipeline::run(config).await {
        Ok(report) => Ok(serde_json::to_value(report)?),
        Err(e) => {
            error!(error = %e, "run failed");
            Err(e.into())
        }
    }
}
