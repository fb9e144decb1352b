use crate::database::DatabaseError;
use crate::http::HttpException;
use crate::model::HydrationError;
use std::io;
use thiserror::Error;

/// Errors detected while wiring controllers, routes and models together.
///
/// These are startup-time failures: they surface from `register_routes`,
/// global hook registration or a model schema that was never fully declared.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model `{model}` does not declare an identifier key")]
    MissingIdentifierKey { model: String },

    #[error("route {method} {path} is already bound to `{existing}`, cannot bind `{incoming}`")]
    RouteConflict {
        method: String,
        path: String,
        existing: String,
        incoming: String,
    },

    #[error("global hooks cannot change once routes have been compiled")]
    GlobalHooksFrozen,

    #[error("services cannot change once routes have been compiled")]
    ServicesFrozen,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Http(#[from] HttpException),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Hydration error: {0}")]
    Hydration(#[from] HydrationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Http(exception) => exception.status_code(),
            ServerError::Config(_)
            | ServerError::Hydration(_)
            | ServerError::Database(_)
            | ServerError::Io(_)
            | ServerError::Internal(_) => 500,
        }
    }

    /// The HTTP exception carried by this error, if any.
    pub fn as_http(&self) -> Option<&HttpException> {
        match self {
            ServerError::Http(exception) => Some(exception),
            _ => None,
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
