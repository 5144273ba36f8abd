//! Observability and user-facing notifications.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_ENV: &str = "MARGINALIA_LOG";

/// Initializes the global tracing subscriber.
///
/// The filter comes from `MARGINALIA_LOG` when set, otherwise defaults to
/// `warn` (or `debug` with `verbose`). Safe to call once per process;
/// subsequent calls are ignored.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "marginalia=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Sink for user-visible messages.
///
/// The engine reports recoverable problems (missing prompt files, unreachable
/// server, empty documents) through this seam instead of failing; the host
/// decides how to surface them. Fire-and-forget: no return value.
pub trait Notifier {
    /// Surfaces a message to the user.
    fn notify(&self, message: &str);
}

/// Notifier that routes messages to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new log-backed notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "marginalia::notify", "{message}");
    }
}
