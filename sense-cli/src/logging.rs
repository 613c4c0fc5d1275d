use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// `LOG_FORMAT=json` switches stderr logs to JSON lines
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Install the global subscriber. Logs go to stderr so stdout stays the report.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug,hyper=info,reqwest=info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(json_format = json, "logging initialized");
}
