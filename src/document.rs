//! OpenAPI document processing
//!
//! Walks every `paths.<path>.<method>.responses.<code>.content.<media type>`
//! entry of an OpenAPI 3 document, infers a schema from the JSON example found
//! there and writes it back into the media type's `schema` slot. All objects
//! discovered along the way end up in `components.schemas`.

use crate::config::InferConfig;
use crate::error::DocumentError;
use crate::naming::response_key;
use crate::schema::{SchemaInferrer, SchemaRegistry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Serialization format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// Where in the document a response body lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseLocation {
    pub path: String,
    pub method: String,
    pub response: String,
    pub media_type: String,
}

/// A response body that received an inferred schema
#[derive(Debug, Clone, Serialize)]
pub struct InferredResponse {
    #[serde(flatten)]
    pub location: ResponseLocation,
    /// Registry key the example was inferred under
    pub key: String,
    pub schema: Value,
}

/// Summary of one document run
#[derive(Debug, Clone, Default, Serialize)]
pub struct InferenceReport {
    pub inferred: Vec<InferredResponse>,
    /// JSON responses without an example payload
    pub missing_examples: Vec<ResponseLocation>,
    /// Media entries skipped because they are not JSON
    pub skipped_media_types: usize,
    /// Number of named schemas after the run
    pub schemas: usize,
    /// Existing `components.schemas` entries left as they were because they
    /// are not object schemas, with the reason
    pub preserved_schemas: BTreeMap<String, String>,
}

/// Infer response schemas for a whole document in place.
pub fn infer_document(document: &mut Value, config: &InferConfig) -> Result<InferenceReport, DocumentError> {
    let root = document.as_object_mut().ok_or_else(|| DocumentError::InvalidDocument {
        message: "document root must be an object".to_string(),
    })?;

    let (mut registry, preserved_schemas) =
        match root.get("components").and_then(|components| components.get("schemas")) {
            Some(schemas) if config.seed_from_document => SchemaRegistry::from_components_lenient(schemas)?,
            _ => (SchemaRegistry::new(), BTreeMap::new()),
        };
    for (name, reason) in &preserved_schemas {
        warn!(schema = %name, reason = %reason, "existing schema is not an object schema, leaving it as is");
    }

    let paths = root
        .get_mut("paths")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| DocumentError::InvalidDocument {
            message: "document has no paths object".to_string(),
        })?;

    let mut report = InferenceReport {
        preserved_schemas,
        ..InferenceReport::default()
    };
    let mut inferrer = SchemaInferrer::with_config(&mut registry, config);

    for (path, path_item) in paths.iter_mut() {
        let Some(operations) = path_item.as_object_mut() else {
            continue;
        };

        for (method, operation) in operations.iter_mut() {
            if !HTTP_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                continue;
            }
            let Some(responses) = operation.get_mut("responses").and_then(Value::as_object_mut) else {
                continue;
            };

            for (code, response) in responses.iter_mut() {
                let Some(content) = response.get_mut("content").and_then(Value::as_object_mut) else {
                    continue;
                };

                for (media_type, media) in content.iter_mut() {
                    let location = ResponseLocation {
                        path: path.clone(),
                        method: method.clone(),
                        response: code.clone(),
                        media_type: media_type.clone(),
                    };

                    if !is_json_media_type(media_type) {
                        debug!(path = %path, method = %method, media_type = %media_type, "skipping non-JSON media type");
                        report.skipped_media_types += 1;
                        continue;
                    }
                    let Some(media) = media.as_object_mut() else {
                        warn!(path = %path, method = %method, response = %code, "media type entry is not an object, skipping");
                        continue;
                    };

                    let key = response_key(path, method, code);
                    let example = find_example(media).cloned();
                    if example.is_none() {
                        report.missing_examples.push(location.clone());
                        if !config.fill_missing {
                            debug!(path = %path, method = %method, response = %code, "no example payload");
                            continue;
                        }
                    }

                    let schema = inferrer.infer_example(example.as_ref(), &key).to_value();
                    media.insert("schema".to_string(), schema.clone());
                    report.inferred.push(InferredResponse { location, key, schema });
                }
            }
        }
    }

    report.schemas = registry.len();

    let components = root
        .entry("components")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| DocumentError::InvalidDocument {
            message: "components must be an object".to_string(),
        })?;
    let schemas = components
        .entry("schemas")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| DocumentError::InvalidDocument {
            message: "components.schemas must be an object".to_string(),
        })?;
    if let Value::Object(inferred) = registry.to_components() {
        schemas.extend(inferred);
    }

    info!(
        responses = report.inferred.len(),
        missing = report.missing_examples.len(),
        schemas = report.schemas,
        "inferred document schemas"
    );
    Ok(report)
}

/// Example payload of a media type object: `example`, else the first
/// `examples.*.value`.
pub fn find_example(media: &Map<String, Value>) -> Option<&Value> {
    media.get("example").or_else(|| {
        media
            .get("examples")?
            .as_object()?
            .values()
            .find_map(|example| example.get("value"))
    })
}

/// `application/json`, `text/json` and any `+json` structured syntax suffix
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

/// Parse a document from raw bytes.
///
/// Without a format hint JSON is tried first, then YAML.
pub fn parse_document(bytes: &[u8], format: Option<DocumentFormat>) -> Result<Value, DocumentError> {
    match format {
        Some(DocumentFormat::Yaml) => {
            serde_yaml::from_slice(bytes).map_err(|source| DocumentError::InvalidYaml { source })
        }
        Some(DocumentFormat::Json) => parse_json(bytes),
        None => parse_json(bytes).or_else(|json_error| serde_yaml::from_slice(bytes).map_err(|_| json_error)),
    }
}

fn parse_json(bytes: &[u8]) -> Result<Value, DocumentError> {
    // simd-json parses in place, so it gets a scratch copy
    let mut scratch = bytes.to_vec();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(value) => Ok(value),
        // Re-parse for a serde_json error with line and column
        Err(_) => serde_json::from_slice(bytes).map_err(|source| DocumentError::InvalidJson { source }),
    }
}

/// Read and parse a document from disk
pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    let bytes = std::fs::read(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&bytes, DocumentFormat::from_path(path))
}

/// Fetch and parse a document over HTTP
#[cfg(feature = "remote")]
pub fn fetch_document(url: &str, timeout: std::time::Duration) -> Result<Value, DocumentError> {
    let fetch_error = |source| DocumentError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_error)?;
    let bytes = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(fetch_error)?;

    debug!(url, bytes = bytes.len(), "fetched document");
    parse_document(&bytes, DocumentFormat::from_path(Path::new(url)))
}

/// Serialize a document for output
pub fn render_document(document: &Value, format: DocumentFormat, compact: bool) -> Result<String, DocumentError> {
    match format {
        DocumentFormat::Json if compact => {
            serde_json::to_string(document).map_err(|source| DocumentError::InvalidJson { source })
        }
        DocumentFormat::Json => {
            serde_json::to_string_pretty(document).map_err(|source| DocumentError::InvalidJson { source })
        }
        DocumentFormat::Yaml => serde_yaml::to_string(document).map_err(|source| DocumentError::InvalidYaml { source }),
    }
}
