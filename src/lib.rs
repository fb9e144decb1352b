//! # Trellis
//!
//! Controller-based request dispatch with ordered route hooks.
//!
//! ## Features
//!
//! - Controllers declare routes and hooks once per type
//! - Hooks run in a fixed order around the route handler and may
//!   short-circuit by finalizing the response
//! - Typed HTTP exceptions mapped to status codes
//! - Model hydration with type casters and nested relations
//! - A lazily connected database service with a connection pool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis::app::Server;
//! use trellis::controller::{Controller, RouteMapBuilder};
//! use trellis::http::{Method, Request, Response};
//! use trellis::middleware::debug_log;
//!
//! struct Books;
//!
//! impl Controller for Books {
//!     fn define(routes: &mut RouteMapBuilder<Self>) {
//!         routes
//!             .action("index", Method::GET, "/books", |_books: Arc<Books>, _req: Request, _res: Response| {
//!                 Response::text("[]")
//!             })
//!             .before("index", debug_log("listing books"));
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.register_routes(Books)?;
//! let response = server.dispatch(Request::new(Method::GET, "/books")).await;
//! ```

pub mod app;
pub mod controller;
pub mod database;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod model;
pub mod pipeline;
pub mod plugins;
pub mod router;
pub extern crate serde_json;

// Reexport serde_json
pub use serde_json::{json, Value};

pub use app::Server;
pub use error::{ConfigError, ServerError, ServerResult};
