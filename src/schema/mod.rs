//! OpenAPI schema inference
//!
//! Derives schema fragments from JSON examples and consolidates object shapes
//! into a registry of named, reusable component schemas.

pub mod format;
pub mod fragment;
pub mod inference;
pub mod registry;
pub mod unify;

pub use format::{sniff, Format};
pub use fragment::{reference_target, ObjectSchema, PrimitiveKind, Property, SchemaFragment, REF_PREFIX};
pub use inference::{infer_primitive, SchemaInferrer};
pub use registry::{equivalent, merge, SchemaRegistry};
pub use unify::unify;
