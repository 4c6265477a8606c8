use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Terminal,
    /// CloudWatch stamps every line itself and does not render colours.
    Lambda,
}

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(target: LogTarget) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // a second init (tests, warm lambda) keeps the first subscriber.
    let _ = match target {
        LogTarget::Terminal => builder.try_init(),
        LogTarget::Lambda => builder.with_ansi(false).without_time().try_init(),
    };
}
