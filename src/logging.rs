//! Global tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initialise the global [`tracing`] subscriber.
///
/// Console output goes to stderr so command output on stdout stays clean.
/// The default level is `info`, raised to `debug` with `--verbose`; an
/// explicit `RUST_LOG` always wins. Must be called once at program startup,
/// before any logging.
pub fn init_subscriber(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}
