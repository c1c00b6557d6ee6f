use std::io;
use tracing::{error, info};

/// Sink for the errors and messages of the server loop.
///
/// Both methods have defaults emitting `tracing` events, so an implementation
/// only overrides what it wants to handle itself.
///
/// # Examples
/// ```
/// use std::{io, sync::atomic::{AtomicUsize, Ordering}};
/// use webapp_http::Inspector;
///
/// #[derive(Default)]
/// struct ErrorCounter(AtomicUsize);
///
/// impl Inspector for ErrorCounter {
///     fn register_error(&self, _: &str, _: &io::Error) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Inspector: Send + Sync + 'static {
    fn register_error(&self, message: &str, err: &io::Error) {
        error!(error = %err, kind = ?err.kind(), "{message}");
    }

    fn register_message(&self, message: &str) {
        info!("{message}");
    }
}

/// Forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInspector;

impl Inspector for TracingInspector {}
