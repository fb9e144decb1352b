//! Model hydration.
//!
//! A [`ModelSchema`] describes one model type: its identifier key, the type
//! casters applied to scalar fields and the relation hydrators that turn
//! nested objects into related [`Entity`] values. [`ModelSchema::hydrate`]
//! turns raw keyed data into an entity in one pass:
//!
//! ```text
//! raw object ─┬─> raw_data (verbatim)
//!             └─> casts ─> relations ─┬─> original (baseline for dirty checks)
//!                                     └─> attributes (live, mutable)
//! ```

pub mod casts;
mod entity;
pub mod relations;
mod schema;

pub use entity::{Attribute, Entity, Identifier};
pub use schema::{ModelDraft, ModelSchema, ModelSchemaBuilder, Relation, RelationHydrator, TypeCaster};

use thiserror::Error;

/// Failure reported by a single type caster.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CastError {
    message: String,
}

impl CastError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HydrationError {
    #[error("`{model}` can only be hydrated from an object, got {found}")]
    NotAnObject { model: String, found: &'static str },

    #[error("a collection of `{model}` must be an array, got {found}")]
    NotACollection { model: String, found: &'static str },

    #[error("cannot cast `{model}.{field}`: {source}")]
    Cast {
        model: String,
        field: String,
        #[source]
        source: CastError,
    },

    #[error("cannot hydrate relation `{model}.{field}`: {source}")]
    Relation {
        model: String,
        field: String,
        #[source]
        source: Box<HydrationError>,
    },

    #[error("relation `{model}.{field}` expected {expected}, hydrator returned {found}")]
    ShapeMismatch {
        model: String,
        field: String,
        expected: String,
        found: String,
    },
}

pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
