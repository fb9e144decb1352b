use crate::handler::{Hook, HookFuture};
use crate::http::{Request, Response};
use crate::logger::{Logger, SharedLogger, TracingLogger};
use futures::future;

const SOURCE: &str = "debugLog";

/// Hook that writes a fixed message to the debug log on every invocation.
///
/// The logger is taken from the request's services when one is registered
/// as a [`SharedLogger`], otherwise messages go straight to `tracing`.
#[derive(Debug, Clone)]
pub struct DebugLog {
    message: String,
}

pub fn debug_log<M: Into<String>>(message: M) -> DebugLog {
    DebugLog {
        message: message.into(),
    }
}

impl Hook for DebugLog {
    fn call(&self, req: Request, res: Response) -> HookFuture {
        let logger = match req.service::<SharedLogger>() {
            Some(logger) => logger.source(SOURCE),
            None => TracingLogger::new().source(SOURCE),
        };
        logger.debug(&self.message);
        Box::pin(future::ready(Ok(res)))
    }

    fn name(&self) -> &str {
        SOURCE
    }
}
