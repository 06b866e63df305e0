//! # openapi-infer - OpenAPI schemas from response examples
//!
//! Derives OpenAPI schema fragments from JSON example payloads and consolidates
//! objects of the same shape into named, reusable `components.schemas` entries.
//!
//! ## Modules
//!
//! - **schema**: format sniffing, inference, array unification and the schema registry
//! - **naming**: registry keys for API locations and singular names for array items
//! - **document**: runs inference over every JSON response example of an OpenAPI document
//!
//! ## Quick Start
//!
//! ```rust
//! use openapi_infer::schema::{SchemaInferrer, SchemaRegistry};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! let mut inferrer = SchemaInferrer::new(&mut registry);
//!
//! let fragment = inferrer.infer(&json!({"id": 1, "email": "alice@example.com"}), "user");
//! assert_eq!(fragment.to_value(), json!({"$ref": "#/components/schemas/user"}));
//!
//! // A later example without "email" makes the field nullable
//! inferrer.infer(&json!({"id": 2}), "user");
//!
//! let components = registry.to_components();
//! assert_eq!(components["user"]["properties"]["email"]["nullable"], json!(true));
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::BufRead;

pub mod config;
pub mod document;
pub mod error;
pub mod naming;
pub mod schema;

// Re-export commonly used types for convenience
pub use config::InferConfig;
pub use document::{infer_document, InferenceReport};
pub use error::{DocumentError, RegistryError};
pub use schema::{ObjectSchema, SchemaFragment, SchemaInferrer, SchemaRegistry};

/// Infer schemas for a sequence of examples that all describe the same value.
///
/// Every example is inferred under `config.default_key`; returns the fragment
/// of the last example together with the populated registry.
pub fn infer_examples<'a, I>(examples: I, config: &InferConfig) -> (SchemaFragment, SchemaRegistry)
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut registry = SchemaRegistry::new();
    let mut inferrer = SchemaInferrer::with_config(&mut registry, config);

    let mut fragment = SchemaFragment::Empty;
    for example in examples {
        fragment = inferrer.infer(example, &config.default_key);
    }

    (fragment, registry)
}

/// Infer schemas from a newline-delimited JSON stream, one example per line
pub fn infer_ndjson<R: BufRead>(reader: R, config: &InferConfig) -> Result<(SchemaFragment, SchemaRegistry)> {
    let mut examples = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", index + 1))?;
        examples.push(value);
    }

    Ok(infer_examples(&examples, config))
}
