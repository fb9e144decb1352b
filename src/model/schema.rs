use super::entity::{Attribute, Entity};
use super::{kind_of, CastError, HydrationError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type TypeCaster = Arc<dyn Fn(Value, &ModelDraft<'_>) -> Result<Value, CastError> + Send + Sync>;

pub type RelationHydrator = Arc<dyn Fn(Value, &ModelDraft<'_>) -> Result<Relation, HydrationError> + Send + Sync>;

/// Output of a relation hydrator: one related entity or a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    One(Entity),
    Many(Vec<Entity>),
}

impl Relation {
    fn describe(&self) -> String {
        match self {
            Relation::One(_) => "a single entity".to_string(),
            Relation::Many(entities) => format!("a collection of {}", entities.len()),
        }
    }
}

/// Read-only view of an entity while it is being hydrated.
pub struct ModelDraft<'a> {
    schema: &'a ModelSchema,
    attributes: &'a BTreeMap<String, Attribute>,
}

impl<'a> ModelDraft<'a> {
    pub fn model_name(&self) -> &str {
        &self.schema.name
    }

    pub fn get(&self, field: &str) -> Option<&Attribute> {
        self.attributes.get(field)
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(Attribute::as_value)
    }
}

pub struct ModelSchema {
    name: String,
    identifier_key: Option<String>,
    casts: Vec<(String, TypeCaster)>,
    relations: Vec<(String, RelationHydrator)>,
}

impl ModelSchema {
    pub fn builder<N: Into<String>>(name: N) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            schema: ModelSchema {
                name: name.into(),
                identifier_key: None,
                casts: Vec::new(),
                relations: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier_key(&self) -> Option<&str> {
        self.identifier_key.as_deref()
    }

    pub fn cast_fields(&self) -> impl Iterator<Item = &str> {
        self.casts.iter().map(|(field, _)| field.as_str())
    }

    pub fn relation_fields(&self) -> impl Iterator<Item = &str> {
        self.relations.iter().map(|(field, _)| field.as_str())
    }

    /// Builds an entity from `data`.
    ///
    /// Casters run first, in registration order, then relation hydrators;
    /// either only runs for keys present in `data`. A `null` relation value
    /// is kept as is. Any failure aborts the whole construction.
    pub fn hydrate(self: &Arc<Self>, data: Value) -> Result<Entity, HydrationError> {
        let raw = match data {
            Value::Object(raw) => raw,
            other => {
                return Err(HydrationError::NotAnObject {
                    model: self.name.clone(),
                    found: kind_of(&other),
                })
            }
        };

        let mut attributes: BTreeMap<String, Attribute> = raw
            .iter()
            .map(|(key, value)| (key.clone(), Attribute::Value(value.clone())))
            .collect();

        for (field, caster) in &self.casts {
            let Some(value) = attributes.get(field).and_then(Attribute::as_value).cloned() else {
                continue;
            };
            let draft = ModelDraft {
                schema: self.as_ref(),
                attributes: &attributes,
            };
            let cast = caster(value, &draft).map_err(|source| HydrationError::Cast {
                model: self.name.clone(),
                field: field.clone(),
                source,
            })?;
            attributes.insert(field.clone(), Attribute::Value(cast));
        }

        for (field, hydrator) in &self.relations {
            let Some(value) = attributes.get(field).and_then(Attribute::as_value).cloned() else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let expected_len = value.as_array().map(Vec::len);
            let draft = ModelDraft {
                schema: self.as_ref(),
                attributes: &attributes,
            };
            let relation = hydrator(value, &draft).map_err(|source| HydrationError::Relation {
                model: self.name.clone(),
                field: field.clone(),
                source: Box::new(source),
            })?;
            let attribute = match (expected_len, relation) {
                (None, Relation::One(entity)) => Attribute::One(Box::new(entity)),
                (Some(len), Relation::Many(entities)) if entities.len() == len => Attribute::Many(entities),
                (expected_len, relation) => {
                    return Err(HydrationError::ShapeMismatch {
                        model: self.name.clone(),
                        field: field.clone(),
                        expected: match expected_len {
                            Some(len) => format!("a collection of {}", len),
                            None => "a single entity".to_string(),
                        },
                        found: relation.describe(),
                    })
                }
            };
            attributes.insert(field.clone(), attribute);
        }

        Ok(Entity::new(Arc::clone(self), raw, attributes))
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("identifier_key", &self.identifier_key)
            .field("casts", &self.cast_fields().collect::<Vec<_>>())
            .field("relations", &self.relation_fields().collect::<Vec<_>>())
            .finish()
    }
}

pub struct ModelSchemaBuilder {
    schema: ModelSchema,
}

impl ModelSchemaBuilder {
    /// Declares the field that identifies an entity of this model.
    pub fn identifier<K: Into<String>>(mut self, key: K) -> Self {
        self.schema.identifier_key = Some(key.into());
        self
    }

    /// Registers a type caster; a second caster for the same field replaces the first.
    pub fn cast<F>(mut self, field: &str, caster: F) -> Self
    where
        F: Fn(Value, &ModelDraft<'_>) -> Result<Value, CastError> + Send + Sync + 'static,
    {
        let caster: TypeCaster = Arc::new(caster);
        upsert(&mut self.schema.casts, field, caster);
        self
    }

    pub fn relation<F>(mut self, field: &str, hydrator: F) -> Self
    where
        F: Fn(Value, &ModelDraft<'_>) -> Result<Relation, HydrationError> + Send + Sync + 'static,
    {
        let hydrator: RelationHydrator = Arc::new(hydrator);
        upsert(&mut self.schema.relations, field, hydrator);
        self
    }

    pub fn build(self) -> Arc<ModelSchema> {
        Arc::new(self.schema)
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, field: &str, value: T) {
    match entries.iter_mut().find(|(existing, _)| existing == field) {
        Some(entry) => entry.1 = value,
        None => entries.push((field.to_string(), value)),
    }
}
