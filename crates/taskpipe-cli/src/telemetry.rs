//! Structured logging for the `taskpipe` binary.
//!
//! - Uses `tracing-subscriber` with pretty-printed output on stderr, so the
//!   final result on stdout stays machine readable.
//! - Pulls filtering rules from `RUST_LOG` or defaults to `info`.
//! - Includes thread name, file and line number. Pipeline threads are named
//!   `taskpipe-worker-N`, `taskpipe-source` and `taskpipe-watcher`.
//! - Timestamped using local time (RFC 3339 format).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. Must be called once, before the first run.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .init();
}
