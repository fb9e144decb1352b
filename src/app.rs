//! Server is the main entry point for trellis.
//!
//! It owns the shared services, the framework-wide hooks and the route
//! table. Controllers are compiled into the table through
//! [`Server::register_routes`]; an external transport then hands requests to
//! [`Server::dispatch`] or calls a route's compiled handler directly.
//!
//! # Examples
//!
//! ```rust,ignore
//! use trellis::app::Server;
//! use trellis::middleware::debug_log;
//!
//! let mut server = Server::new();
//! server.before_all(debug_log("request received"))?;
//! server.register_routes(BooksController::new())?;
//!
//! let response = server.dispatch(Request::new(Method::GET, "/books")).await;
//! ```

use crate::controller::{route_map, Controller};
use crate::error::{ConfigError, ServerError, ServerResult};
use crate::handler::Hook;
use crate::http::{HttpException, HttpExceptionKind, Method, Request, Response};
use crate::logger::SharedLogger;
use crate::middleware::GlobalHooks;
use crate::pipeline;
use crate::plugins::Services;
use crate::router::RouteTable;
use std::sync::Arc;

type ErrorHandler = Arc<dyn Fn(ServerError) -> Response + Send + Sync>;

#[derive(Clone, Default)]
pub struct Server {
    routes: RouteTable,
    global_hooks: GlobalHooks,
    services: Services,
    on_error: Option<ErrorHandler>,
    compiled: bool,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `value` available to hooks through [`Request::service`].
    pub fn services<T>(&mut self, value: T) -> Result<&mut Self, ConfigError>
    where
        T: Send + Sync + 'static,
    {
        if self.compiled {
            return Err(ConfigError::ServicesFrozen);
        }
        self.services.insert(value);
        Ok(self)
    }

    /// Registers the logger capability hooks resolve as a [`SharedLogger`].
    pub fn logger(&mut self, logger: SharedLogger) -> Result<&mut Self, ConfigError> {
        self.services(logger)
    }

    pub fn before_all<H: Hook>(&mut self, hook: H) -> Result<&mut Self, ConfigError> {
        self.ensure_hooks_open()?;
        self.global_hooks.before_all(hook);
        Ok(self)
    }

    pub fn after_all<H: Hook>(&mut self, hook: H) -> Result<&mut Self, ConfigError> {
        self.ensure_hooks_open()?;
        self.global_hooks.after_all(hook);
        Ok(self)
    }

    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(ServerError) -> Response + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Compiles every route of `controller` into the route table.
    ///
    /// Global hooks and services are frozen from the first call on.
    pub fn register_routes<C: Controller>(&mut self, controller: C) -> ServerResult<&mut Self> {
        self.register_shared(Arc::new(controller))
    }

    pub fn register_shared<C: Controller>(&mut self, controller: Arc<C>) -> ServerResult<&mut Self> {
        self.compiled = true;
        let map = route_map::<C>();
        let compiled = pipeline::compile(controller, &map, &self.global_hooks, &self.services);

        // Stage into a copy so a conflict leaves the table untouched.
        let mut routes = self.routes.clone();
        for route in compiled {
            routes.insert(route)?;
        }
        tracing::info!(controller = C::controller_name(), routes = routes.len(), "registered controller routes");
        self.routes = routes;
        Ok(self)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn global_hooks(&self) -> &GlobalHooks {
        &self.global_hooks
    }

    /// Runs `req` through its route and always produces a response: errors
    /// become error responses, HTTP exceptions keep their status.
    pub async fn dispatch(&self, req: Request) -> Response {
        match self.handle(req).await {
            Ok(response) => response,
            Err(err) => {
                if err.status_code() >= 500 {
                    tracing::error!(error = %err, "request failed");
                } else {
                    tracing::debug!(error = %err, "request rejected");
                }
                self.handle_error(err)
            }
        }
    }

    async fn handle(&self, mut req: Request) -> ServerResult<Response> {
        req.attach_services(&self.services);
        if let Some((route, params)) = self.routes.find(req.method, &req.path) {
            req.params = params;
            return route.call(req, Response::default()).await;
        }

        if req.method == Method::HEAD {
            if let Some((route, params)) = self.routes.find(Method::GET, &req.path) {
                req.params = params;
                let mut response = route.call(req, Response::default()).await?;
                response.body.clear();
                return Ok(response);
            }
        }

        let allowed = self.routes.allowed_methods(&req.path);
        if allowed.is_empty() {
            Err(HttpException::not_found(format!("no route for {} {}", req.method, req.path)).into())
        } else {
            let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            Err(HttpException::with_message(
                HttpExceptionKind::MethodNotAllowedException,
                format!("allowed: {}", allowed.join(", ")),
            )
            .into())
        }
    }

    fn handle_error(&self, error: ServerError) -> Response {
        if let Some(handler) = &self.on_error {
            handler(error)
        } else {
            Response::error(&error)
        }
    }

    fn ensure_hooks_open(&self) -> Result<(), ConfigError> {
        if self.compiled {
            Err(ConfigError::GlobalHooksFrozen)
        } else {
            Ok(())
        }
    }
}
