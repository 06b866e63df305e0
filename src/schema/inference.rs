//! Schema inference from JSON examples
//!
//! Walks one example value and returns the fragment describing it. Every object
//! met on the way is registered in the [`SchemaRegistry`] and replaced by a
//! reference; arrays are folded into a single item schema.

use super::format::{sniff, Format};
use super::fragment::{json_type_name, ObjectSchema, PrimitiveKind, Property, SchemaFragment};
use super::registry::SchemaRegistry;
use super::unify::unify;
use crate::config::InferConfig;
use crate::naming::singularize;
use serde_json::{Map, Value};
use tracing::debug;

/// Infers schema fragments into a borrowed registry
#[derive(Debug)]
pub struct SchemaInferrer<'r> {
    registry: &'r mut SchemaRegistry,
    detect_formats: bool,
}

impl<'r> SchemaInferrer<'r> {
    pub fn new(registry: &'r mut SchemaRegistry) -> Self {
        SchemaInferrer {
            registry,
            detect_formats: true,
        }
    }

    pub fn with_config(registry: &'r mut SchemaRegistry, config: &InferConfig) -> Self {
        Self::new(registry).with_format_detection(config.detect_formats)
    }

    /// Enable/disable string format detection
    #[must_use]
    pub fn with_format_detection(mut self, enabled: bool) -> Self {
        self.detect_formats = enabled;
        self
    }

    /// Infer the fragment for `value`, registering objects under `registry_key`.
    ///
    /// Objects come back as a reference to the name they were registered under,
    /// which may be a suffixed variant of `registry_key`.
    pub fn infer(&mut self, value: &Value, registry_key: &str) -> SchemaFragment {
        match self.infer_inline(value, registry_key) {
            SchemaFragment::Object(object) => {
                SchemaFragment::reference(self.registry.register(registry_key, object))
            }
            other => other,
        }
    }

    /// Like [`infer`](Self::infer), but tolerates a missing example.
    ///
    /// Without an example the result is an empty inline object schema and the
    /// registry is left untouched.
    pub fn infer_example(&mut self, example: Option<&Value>, registry_key: &str) -> SchemaFragment {
        match example {
            Some(value) => self.infer(value, registry_key),
            None => {
                debug!(key = registry_key, "no example available, using empty object schema");
                SchemaFragment::Object(ObjectSchema::new())
            }
        }
    }

    // Objects stay inline here so array elements can be unified before registration
    fn infer_inline(&mut self, value: &Value, registry_key: &str) -> SchemaFragment {
        match value {
            Value::Object(object) => SchemaFragment::Object(self.infer_object(object)),
            Value::Array(items) => self.infer_array(items, registry_key),
            scalar => infer_primitive(scalar, self.detect_formats),
        }
    }

    fn infer_object(&mut self, object: &Map<String, Value>) -> ObjectSchema {
        object
            .iter()
            .map(|(property_name, value)| {
                // Nested objects are named after the property holding them
                let registry_key = property_name.as_str();
                let schema = self.infer(value, registry_key);
                (property_name.clone(), Property::new(schema))
            })
            .collect()
    }

    fn infer_array(&mut self, items: &[Value], registry_key: &str) -> SchemaFragment {
        if items.is_empty() {
            return SchemaFragment::array(SchemaFragment::Empty);
        }

        let item_key = singularize(registry_key);
        let fragments: Vec<SchemaFragment> = items
            .iter()
            .map(|item| self.infer_inline(item, &item_key))
            .collect();

        let item_schema = match unify(fragments) {
            SchemaFragment::Object(object) => {
                SchemaFragment::reference(self.registry.register(&item_key, object))
            }
            other => other,
        };

        SchemaFragment::array(item_schema)
    }
}

/// Fragment for a scalar JSON value.
///
/// Objects and arrays are not scalars and yield [`SchemaFragment::Unsupported`],
/// as does a number that fits neither an integer nor a float.
pub fn infer_primitive(value: &Value, detect_formats: bool) -> SchemaFragment {
    match value {
        Value::Null => SchemaFragment::Null,
        Value::Bool(_) => SchemaFragment::primitive(PrimitiveKind::Boolean),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                SchemaFragment::primitive(PrimitiveKind::Integer)
            } else if n.as_f64().is_some() {
                SchemaFragment::Primitive {
                    kind: PrimitiveKind::Number,
                    format: Some(Format::Float),
                }
            } else {
                SchemaFragment::Unsupported {
                    reason: format!("number {n} is neither an integer nor a float"),
                }
            }
        }
        Value::String(s) => SchemaFragment::Primitive {
            kind: PrimitiveKind::String,
            format: if detect_formats { sniff(s) } else { None },
        },
        Value::Array(_) | Value::Object(_) => SchemaFragment::Unsupported {
            reason: format!("{} is not a scalar value", json_type_name(value)),
        },
    }
}
