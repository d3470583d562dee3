use crate::config::LogLevel;
use tracing_subscriber::EnvFilter;

/// JSON lines on stdout. `RUST_LOG` wins over `level` when set.
pub fn init_daemon(level: LogLevel) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(level))
        .with_writer(std::io::stdout)
        .init();
}

/// Plain text on stderr, errors only unless `RUST_LOG` says otherwise.
pub fn init_client() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn filter(level: LogLevel) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(env.as_deref(), level)
}

/// Non-empty, parseable `env` directives override `level`.
fn filter_from(env: Option<&str>, level: LogLevel) -> EnvFilter {
    env.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}
