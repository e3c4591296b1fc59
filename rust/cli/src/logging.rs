use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,greenbench=info";

/// Installs a `fmt` subscriber on stderr. Safe to call more than once; only
/// the first call takes effect.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    // a second call finds a subscriber already installed
    let _ = tracing::subscriber::set_global_default(subscriber);
}
