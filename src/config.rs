/// Configuration for schema inference
#[derive(Debug, Clone)]
pub struct InferConfig {
    /// Registry key for a bare example that has no API location
    pub default_key: String,

    /// Tag strings with a detected format (email, uuid, date, ...)
    pub detect_formats: bool,

    /// Give JSON responses that have no example an empty object schema
    /// instead of leaving them untouched
    pub fill_missing: bool,

    /// Seed the registry from the document's existing `components.schemas`
    pub seed_from_document: bool,
}

impl Default for InferConfig {
    fn default() -> Self {
        InferConfig {
            default_key: String::from("response"),
            detect_formats: true,
            fill_missing: false,
            seed_from_document: true,
        }
    }
}
