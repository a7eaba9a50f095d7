use std::env;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive, first match wins: `--quiet`, `--log-level`,
/// `TRACING_LEVEL`, the configured level, then `info`.
pub fn filter_directive(
    quiet: bool,
    flag: Option<&str>,
    env_level: Option<&str>,
    configured: Option<&str>,
) -> String {
    if quiet {
        return "error".to_string();
    }
    flag.or(env_level)
        .or(configured)
        .unwrap_or("info")
        .to_string()
}

/// Stdout layer is left out with `quiet`; the log file always receives
/// events that pass the filter.
pub fn init_logger(quiet: bool, flag: Option<&str>, configured: Option<&str>) -> impl Drop {
    let env_level = env::var("TRACING_LEVEL").ok();
    let filter = filter_directive(quiet, flag, env_level.as_deref(), configured);
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/marquee.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", &log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = (!quiet).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .pretty()
            .with_file(false)
            .without_time()
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    info!("Logging at '{}' to {}", filter, log_file_path);

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins() {
        assert_eq!(filter_directive(true, Some("trace"), Some("debug"), None), "error");
    }

    #[test]
    fn test_flag_before_environment_and_config() {
        assert_eq!(
            filter_directive(false, Some("trace"), Some("debug"), Some("warn")),
            "trace"
        );
        assert_eq!(filter_directive(false, None, Some("debug"), Some("warn")), "debug");
        assert_eq!(filter_directive(false, None, None, Some("warn")), "warn");
        assert_eq!(filter_directive(false, None, None, None), "info");
    }
}
