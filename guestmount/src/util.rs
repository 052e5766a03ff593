//! Small helpers shared by the library and its front ends.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber writing plain (non-ANSI) lines to `writer`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn register_to_tracing<W>(writer: W, env_filter: EnvFilter) -> bool
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true),
        )
        .try_init()
        .is_ok()
}

/// Trim trailing whitespace and newlines from captured command output.
pub fn trim_end(output: &str) -> &str {
    output.trim_end()
}
