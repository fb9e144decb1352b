//! Stock relation hydrators built on a related [`ModelSchema`].

use super::{kind_of, HydrationError, ModelDraft, ModelSchema, Relation};
use serde_json::Value;
use std::sync::Arc;

/// Hydrates a single nested object.
pub fn has_one(
    schema: Arc<ModelSchema>,
) -> impl Fn(Value, &ModelDraft<'_>) -> Result<Relation, HydrationError> + Send + Sync + 'static {
    move |value: Value, _draft: &ModelDraft<'_>| schema.hydrate(value).map(Relation::One)
}

/// Hydrates an array of nested objects.
pub fn has_many(
    schema: Arc<ModelSchema>,
) -> impl Fn(Value, &ModelDraft<'_>) -> Result<Relation, HydrationError> + Send + Sync + 'static {
    move |value: Value, _draft: &ModelDraft<'_>| match value {
        Value::Array(items) => hydrate_all(&schema, items),
        other => Err(HydrationError::NotACollection {
            model: schema.name().to_string(),
            found: kind_of(&other),
        }),
    }
}

/// Follows the input shape: an object yields one entity, an array a collection.
pub fn related(
    schema: Arc<ModelSchema>,
) -> impl Fn(Value, &ModelDraft<'_>) -> Result<Relation, HydrationError> + Send + Sync + 'static {
    move |value: Value, _draft: &ModelDraft<'_>| match value {
        Value::Array(items) => hydrate_all(&schema, items),
        other => schema.hydrate(other).map(Relation::One),
    }
}

fn hydrate_all(schema: &Arc<ModelSchema>, items: Vec<Value>) -> Result<Relation, HydrationError> {
    items
        .into_iter()
        .map(|item| schema.hydrate(item))
        .collect::<Result<Vec<_>, _>>()
        .map(Relation::Many)
}
