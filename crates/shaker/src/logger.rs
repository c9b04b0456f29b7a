use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. Filtering follows `RUST_LOG` and
/// falls back to `shaker=info`. Calling it again is a no-op.
pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shaker=info")),
        )
        .with_span_events(FmtSpan::NONE)
        .without_time()
        .try_init();
}
