//! Logging capability handed to hooks and services.
//!
//! Hooks never talk to a log sink directly: they resolve a [`Logger`] from the
//! request's services and scope it with a source tag. The default
//! [`TracingLogger`] forwards everything to `tracing`.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type SharedLogger = Arc<dyn Logger>;

pub trait Logger: Send + Sync + 'static {
    /// Returns a logger whose messages are attributed to `source`.
    fn source(&self, source: &str) -> SharedLogger;

    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    fn critical(&self, message: &str) {
        self.error(message);
    }
}

#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    source: Option<String>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLogger {
        Arc::new(Self::new())
    }

    fn source_tag(&self) -> &str {
        self.source.as_deref().unwrap_or("app")
    }
}

impl Logger for TracingLogger {
    fn source(&self, source: &str) -> SharedLogger {
        Arc::new(TracingLogger {
            source: Some(source.to_string()),
        })
    }

    fn debug(&self, message: &str) {
        tracing::debug!(source = self.source_tag(), "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(source = self.source_tag(), "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(source = self.source_tag(), "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(source = self.source_tag(), "{}", message);
    }

    fn critical(&self, message: &str) {
        tracing::error!(source = self.source_tag(), critical = true, "{}", message);
    }
}

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
