use tracing_subscriber::EnvFilter;

/// Environment variable that overrides `--log-level` with a full filter directive
pub const LOG_ENV: &str = "CRYPTO_BACKTEST_LOG";

/// Install the global subscriber; logs go to stderr so stdout stays the report
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter =
        EnvFilter::try_new(filter).map_err(|err| format!("invalid log filter: {err}"))?;

    let format = log_format.trim().to_lowercase();
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
        return Ok(());
    }
    if format != "text" && format != "pretty" {
        return Err(format!("unknown log format {log_format:?} (expected text or json)"));
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
