//! Error types for schema registry seeding and document processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while seeding a registry from an existing `components.schemas` block.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("components.schemas must be an object, got {actual}")]
    SeedNotAnObject { actual: String },

    #[error("invalid seed schema '{name}': {reason}")]
    InvalidSeedSchema { name: String, reason: String },
}

/// Errors while loading, processing or writing an OpenAPI document.
#[derive(Debug, Error)]
pub enum DocumentError {
    // IO errors (exit code 3)
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DocumentError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocumentError::Read { .. } => 3,
            #[cfg(feature = "remote")]
            DocumentError::Fetch { .. } => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_exit_codes() {
        let err = DocumentError::Read {
            path: PathBuf::from("api.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = DocumentError::InvalidDocument {
            message: "paths must be an object".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = DocumentError::from(RegistryError::SeedNotAnObject {
            actual: "array".into(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::InvalidSeedSchema {
            name: "user".into(),
            reason: "missing properties mapping".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid seed schema 'user': missing properties mapping"
        );
    }
}
