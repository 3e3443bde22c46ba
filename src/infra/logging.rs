pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // stdout carries the MCP stream in stdio mode, so logs go to stderr.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a metric-like line next to the `metrics` facade, for setups that
/// only collect logs.
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::debug!(tool = tool, metric = metric, value = value, "metric");
}
