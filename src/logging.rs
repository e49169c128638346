use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Without debug logging the level is pinned to `info` and `RUST_LOG` is
/// ignored; with it the default is `debug` and `RUST_LOG` may override it.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
