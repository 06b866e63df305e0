//! Schema fragment data model
//!
//! A [`SchemaFragment`] describes the shape of one JSON value. Objects are the
//! only fragments the registry stores by name; everywhere else an object shows
//! up as a [`SchemaFragment::Reference`] to its registry entry.

use super::format::Format;
use serde_json::{json, Map, Value};

/// Prefix of every `$ref` pointing into `components.schemas`
pub const REF_PREFIX: &str = "#/components/schemas/";

/// Scalar type of a primitive schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Integer,
    Number,
    Boolean,
    String,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::String => "string",
        }
    }

    fn parse(type_name: &str) -> Option<Self> {
        match type_name {
            "integer" => Some(PrimitiveKind::Integer),
            "number" => Some(PrimitiveKind::Number),
            "boolean" => Some(PrimitiveKind::Boolean),
            "string" => Some(PrimitiveKind::String),
            _ => None,
        }
    }
}

/// Shape of a single JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaFragment {
    /// Untyped schema (`{}`), e.g. the items of an empty array
    Empty,
    Object(ObjectSchema),
    Array { items: Box<SchemaFragment> },
    Primitive {
        kind: PrimitiveKind,
        format: Option<Format>,
    },
    /// A `null` example: nullable, but nothing else is known
    Null,
    /// Points at a named object in the registry
    Reference { name: String },
    /// A value no other variant can describe
    Unsupported { reason: String },
}

impl SchemaFragment {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        SchemaFragment::Primitive { kind, format: None }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        SchemaFragment::Reference { name: name.into() }
    }

    pub fn array(items: SchemaFragment) -> Self {
        SchemaFragment::Array {
            items: Box::new(items),
        }
    }

    /// Name of the referenced schema, if this is a reference
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            SchemaFragment::Reference { name } => Some(name),
            _ => None,
        }
    }

    /// True for fragments that carry no type information (`null` and `{}`)
    pub fn is_untyped(&self) -> bool {
        matches!(self, SchemaFragment::Null | SchemaFragment::Empty)
    }

    /// Render as an OpenAPI schema object
    pub fn to_value(&self) -> Value {
        match self {
            SchemaFragment::Empty => json!({}),
            SchemaFragment::Object(object) => object.to_value(),
            SchemaFragment::Array { items } => json!({
                "type": "array",
                "items": items.to_value()
            }),
            SchemaFragment::Primitive { kind, format } => {
                let mut schema = Map::new();
                schema.insert("type".to_string(), Value::String(kind.as_str().to_string()));
                if let Some(format) = format {
                    schema.insert("format".to_string(), Value::String(format.as_str().to_string()));
                }
                Value::Object(schema)
            }
            SchemaFragment::Null => json!({ "nullable": true }),
            SchemaFragment::Reference { name } => json!({ "$ref": reference_target(name) }),
            SchemaFragment::Unsupported { reason } => json!({ "x-unsupported": reason }),
        }
    }

    /// Parse an OpenAPI schema object back into a fragment.
    ///
    /// Only the shapes this crate renders are understood; anything else is
    /// rejected with a short reason.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let schema = value
            .as_object()
            .ok_or_else(|| format!("expected a schema object, got {}", json_type_name(value)))?;

        if let Some(reference) = schema.get("$ref") {
            let target = reference
                .as_str()
                .ok_or_else(|| "$ref must be a string".to_string())?;
            let token = target
                .strip_prefix(REF_PREFIX)
                .ok_or_else(|| format!("unsupported $ref target '{target}'"))?;
            if token.contains('/') {
                return Err(format!("$ref target '{target}' points below a component schema"));
            }
            return Ok(SchemaFragment::reference(unescape_pointer_token(token)));
        }

        if let Some(reason) = schema.get("x-unsupported") {
            return Ok(SchemaFragment::Unsupported {
                reason: reason.as_str().unwrap_or_default().to_string(),
            });
        }

        let Some(type_value) = schema.get("type") else {
            return match schema.get("nullable") {
                Some(Value::Bool(true)) => Ok(SchemaFragment::Null),
                _ if schema.is_empty() => Ok(SchemaFragment::Empty),
                _ => Err("schema has no type".to_string()),
            };
        };

        let type_name = type_value
            .as_str()
            .ok_or_else(|| "type must be a string".to_string())?;

        match type_name {
            "object" => Ok(SchemaFragment::Object(ObjectSchema::from_value(value)?)),
            "array" => {
                let items = match schema.get("items") {
                    Some(items) => SchemaFragment::from_value(items)?,
                    None => SchemaFragment::Empty,
                };
                Ok(SchemaFragment::array(items))
            }
            "null" => Ok(SchemaFragment::Null),
            other => {
                let kind = PrimitiveKind::parse(other)
                    .ok_or_else(|| format!("unknown type '{other}'"))?;
                let format = schema.get("format").and_then(Value::as_str).and_then(Format::parse);
                Ok(SchemaFragment::Primitive { kind, format })
            }
        }
    }
}

/// One property of an object schema
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub schema: SchemaFragment,
    /// Set when the property was missing from at least one observed example
    pub nullable: bool,
}

impl Property {
    pub fn new(schema: SchemaFragment) -> Self {
        Property {
            schema,
            nullable: false,
        }
    }

    pub fn nullable(schema: SchemaFragment) -> Self {
        Property {
            schema,
            nullable: true,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut value = self.schema.to_value();
        if self.nullable {
            if let Value::Object(ref mut schema) = value {
                schema.insert("nullable".to_string(), Value::Bool(true));
            }
        }
        value
    }
}

/// Object schema with properties kept in the order they were first observed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    properties: Vec<(String, Property)>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, keeping its original position on replace
    pub fn insert(&mut self, name: impl Into<String>, property: Property) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => *existing = property,
            None => self.properties.push((name, property)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, property)| property)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, property)| property)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(key, property)| (key.as_str(), property))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Every property name of `self` also appears in `other`
    pub fn is_subset_of(&self, other: &ObjectSchema) -> bool {
        self.keys().all(|key| other.contains_key(key))
    }

    pub fn to_value(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, property)| (name.clone(), property.to_value()))
            .collect();

        json!({
            "type": "object",
            "properties": properties
        })
    }

    /// Parse a `{"type": "object", "properties": {...}}` schema
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let schema = value
            .as_object()
            .ok_or_else(|| format!("expected an object schema, got {}", json_type_name(value)))?;

        match schema.get("type").and_then(Value::as_str) {
            Some("object") => {}
            Some(other) => return Err(format!("expected type 'object', got '{other}'")),
            None => return Err("missing type 'object'".to_string()),
        }

        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| "missing properties mapping".to_string())?;

        let mut object = ObjectSchema::new();
        for (name, property_value) in properties {
            let fragment = SchemaFragment::from_value(property_value)
                .map_err(|reason| format!("property '{name}': {reason}"))?;
            let nullable = fragment != SchemaFragment::Null
                && property_value.get("nullable") == Some(&Value::Bool(true));
            object.insert(name.clone(), Property { schema: fragment, nullable });
        }

        Ok(object)
    }
}

impl FromIterator<(String, Property)> for ObjectSchema {
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        let mut object = ObjectSchema::new();
        for (name, property) in iter {
            object.insert(name, property);
        }
        object
    }
}

/// `$ref` value for a registry name. The name is a single JSON pointer token,
/// so `~` and `/` are escaped (RFC 6901); the empty name is a valid token.
pub fn reference_target(name: &str) -> String {
    format!("{REF_PREFIX}{}", name.replace('~', "~0").replace('/', "~1"))
}

fn unescape_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_schema() -> ObjectSchema {
        let mut object = ObjectSchema::new();
        object.insert("id", Property::new(SchemaFragment::primitive(PrimitiveKind::Integer)));
        object.insert(
            "email",
            Property::nullable(SchemaFragment::Primitive {
                kind: PrimitiveKind::String,
                format: Some(Format::Email),
            }),
        );
        object.insert("address", Property::new(SchemaFragment::reference("address")));
        object.insert(
            "tags",
            Property::new(SchemaFragment::array(SchemaFragment::primitive(PrimitiveKind::String))),
        );
        object
    }

    #[test]
    fn test_object_renders_openapi_shape() {
        assert_eq!(
            user_schema().to_value(),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "email": {"type": "string", "format": "email", "nullable": true},
                    "address": {"$ref": "#/components/schemas/address"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                }
            })
        );
    }

    #[test]
    fn test_property_order_is_insertion_order() {
        let object = user_schema();
        let keys: Vec<&str> = object.keys().collect();
        assert_eq!(keys, vec!["id", "email", "address", "tags"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut object = user_schema();
        object.insert("id", Property::new(SchemaFragment::primitive(PrimitiveKind::String)));
        assert_eq!(object.len(), 4);
        assert_eq!(object.keys().next(), Some("id"));
        assert_eq!(
            object.get("id").map(|p| &p.schema),
            Some(&SchemaFragment::primitive(PrimitiveKind::String))
        );
    }

    #[test]
    fn test_parse_rendered_object() {
        let original = user_schema();
        let parsed = ObjectSchema::from_value(&original.to_value()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_reference_names_are_pointer_escaped() {
        assert_eq!(
            SchemaFragment::reference("a/b").to_value(),
            json!({"$ref": "#/components/schemas/a~1b"})
        );
        assert_eq!(
            SchemaFragment::reference("x~1").to_value(),
            json!({"$ref": "#/components/schemas/x~01"})
        );
        assert_eq!(SchemaFragment::reference("").to_value(), json!({"$ref": "#/components/schemas/"}));

        for name in ["a/b", "x~1", "~/", ""] {
            let reference = SchemaFragment::reference(name);
            assert_eq!(SchemaFragment::from_value(&reference.to_value()), Ok(reference));
        }
    }

    #[test]
    fn test_parse_rejects_nested_pointer() {
        assert!(SchemaFragment::from_value(&json!({"$ref": "#/components/schemas/user/properties"})).is_err());
    }

    #[test]
    fn test_parse_null_and_empty() {
        assert_eq!(SchemaFragment::from_value(&json!({"nullable": true})), Ok(SchemaFragment::Null));
        assert_eq!(SchemaFragment::from_value(&json!({})), Ok(SchemaFragment::Empty));
        assert_eq!(
            SchemaFragment::from_value(&json!({"type": "array"})),
            Ok(SchemaFragment::array(SchemaFragment::Empty))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_shapes() {
        assert!(SchemaFragment::from_value(&json!("string")).is_err());
        assert!(SchemaFragment::from_value(&json!({"type": "tuple"})).is_err());
        assert!(SchemaFragment::from_value(&json!({"$ref": "other.json#/Foo"})).is_err());
        assert!(SchemaFragment::from_value(&json!({"oneOf": []})).is_err());
        assert!(ObjectSchema::from_value(&json!({"type": "string"})).is_err());
        assert!(ObjectSchema::from_value(&json!({"type": "object"})).is_err());
    }
}
