use super::schema::ModelSchema;
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A field of a hydrated entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Value(Value),
    One(Box<Entity>),
    Many(Vec<Entity>),
}

impl Attribute {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Attribute::One(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_entities(&self) -> Option<&[Entity]> {
        match self {
            Attribute::Many(entities) => Some(entities),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Attribute::Value(value) => value.clone(),
            Attribute::One(entity) => entity.to_value(),
            Attribute::Many(entities) => Value::Array(entities.iter().map(Entity::to_value).collect()),
        }
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Attribute::Value(value)
    }
}

impl From<Entity> for Attribute {
    fn from(entity: Entity) -> Self {
        Attribute::One(Box::new(entity))
    }
}

impl From<Vec<Entity>> for Attribute {
    fn from(entities: Vec<Entity>) -> Self {
        Attribute::Many(entities)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    String(String),
    Number(Number),
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::String(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::String(value)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Number(value.into())
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Identifier::Number(value.into())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::String(value) => f.write_str(value),
            Identifier::Number(value) => write!(f, "{}", value),
        }
    }
}

/// A hydrated model instance.
#[derive(Clone)]
pub struct Entity {
    schema: Arc<ModelSchema>,
    raw_data: Map<String, Value>,
    original: BTreeMap<String, Attribute>,
    attributes: BTreeMap<String, Attribute>,
}

impl Entity {
    pub(super) fn new(
        schema: Arc<ModelSchema>,
        raw_data: Map<String, Value>,
        attributes: BTreeMap<String, Attribute>,
    ) -> Self {
        Self {
            schema,
            raw_data,
            original: attributes.clone(),
            attributes,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Input exactly as it was handed to the hydrator.
    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.raw_data
    }

    /// Attributes as they were right after hydration.
    pub fn original(&self) -> &BTreeMap<String, Attribute> {
        &self.original
    }

    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    pub fn get(&self, field: &str) -> Option<&Attribute> {
        self.attributes.get(field)
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(Attribute::as_value)
    }

    pub fn related(&self, field: &str) -> Option<&Entity> {
        self.get(field).and_then(Attribute::as_entity)
    }

    pub fn related_many(&self, field: &str) -> Option<&[Entity]> {
        self.get(field).and_then(Attribute::as_entities)
    }

    pub fn set<A: Into<Attribute>>(&mut self, field: &str, value: A) -> &mut Self {
        self.attributes.insert(field.to_string(), value.into());
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Attribute> {
        self.attributes.remove(field)
    }

    /// Value of the schema's identifier field.
    ///
    /// Fails when the schema never declared an identifier key. Yields `None`
    /// when the field is absent or is neither a string nor a number.
    pub fn identifier(&self) -> Result<Option<Identifier>, ConfigError> {
        let key = self
            .schema
            .identifier_key()
            .ok_or_else(|| ConfigError::MissingIdentifierKey {
                model: self.schema.name().to_string(),
            })?;
        Ok(match self.value(key) {
            Some(Value::String(value)) => Some(Identifier::String(value.clone())),
            Some(Value::Number(value)) => Some(Identifier::Number(value.clone())),
            _ => None,
        })
    }

    /// Fields whose live value differs from the hydrated baseline, sorted.
    pub fn dirty_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .attributes
            .iter()
            .filter(|(field, value)| self.original.get(field.as_str()) != Some(*value))
            .map(|(field, _)| field.as_str())
            .chain(
                self.original
                    .keys()
                    .filter(|field| !self.attributes.contains_key(field.as_str()))
                    .map(String::as_str),
            )
            .collect();
        fields.sort_unstable();
        fields
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_fields().is_empty()
    }

    /// Serializes live attributes, relations included, to a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(field, attribute)| (field.clone(), attribute.to_value()))
                .collect(),
        )
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.attributes == other.attributes
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("model", &self.schema.name())
            .field("attributes", &self.attributes)
            .finish()
    }
}
