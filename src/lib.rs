//! # jsonschema-core
//!
//! The validation core of a JSON Schema engine: apply an already-compiled
//! schema tree to a decoded JSON document and get back either success or a
//! structured error tree naming every failing keyword together with its
//! location in the schema and in the instance.
//!
//! Compilation is someone else's job. A compiler builds [`Schema`] nodes
//! inside a [`Schemas`] arena — references resolved, regexes compiled,
//! numeric bounds parsed into exact rationals, format and content
//! predicates bound — and hands the arena over.
//!
//! ## Example
//!
//! ```rust
//! use jsonschema_core::{PrimitiveType, Schema, Schemas, TypeSet};
//! use serde_json::json;
//!
//! let mut schemas = Schemas::new();
//! let name = schemas.insert(Schema {
//!     pointer: "#/properties/name".into(),
//!     types: TypeSet::new().add(PrimitiveType::String),
//!     ..Schema::default()
//! });
//! let root = schemas.insert(Schema {
//!     required: vec!["name".into()],
//!     properties: vec![("name".into(), name)],
//!     ..Schema::default()
//! });
//!
//! assert!(schemas.is_valid(root, &json!({"name": "x"})));
//! let error = schemas.validate(root, &json!({})).unwrap_err();
//! assert_eq!(error.keyword, "required");
//! ```
//!
//! Numeric keywords use exact rational arithmetic: `0.3` is a multiple of
//! `0.1` here, which no binary-float implementation gets right.
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::explicit_iter_loop,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::print_stdout,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]

mod content;
mod error;
mod helpers;
mod paths;
mod primitive_type;
mod rational;
mod schema;
mod validator;

pub use content::{from_base64, is_json_media_type};
pub use error::{ValidationError, ValidationErrorKind};
pub use primitive_type::{PrimitiveType, TypeSet, TypeSetIterator};
pub use rational::to_fraction;
pub use schema::{
    Additional, BoxError, Conditional, ContentEncoding, ContentMediaType, DecodeFn, Dependency,
    Extension, ExtensionContext, ExtensionValidator, Format, FormatCheck, Items, MediaTypeCheck,
    Schema, SchemaRef, Schemas,
};

// Re-exported so compilers can build nodes against the exact versions the
// core links.
pub use fancy_regex::Regex;
pub use fraction::BigFraction;

use serde_json::Value;

/// Decode JSON from a reader into a [`Value`] suitable for validation.
///
/// Numbers keep their full decimal precision instead of being rounded
/// through `f64`, which numeric keywords rely on.
///
/// ```rust
/// let value = jsonschema_core::decode_json("0.30000000000000001".as_bytes()).unwrap();
/// assert_eq!(value.to_string(), "0.30000000000000001");
/// ```
pub fn decode_json(reader: impl std::io::Read) -> Result<Value, serde_json::Error> {
    serde_json::from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::{decode_json, Schema, Schemas};
    use serde_json::json;

    #[test]
    fn empty_schema_accepts_everything() {
        let mut schemas = Schemas::new();
        let root = schemas.insert(Schema::default());
        for instance in [json!(null), json!(1), json!("x"), json!([1]), json!({})] {
            assert!(schemas.is_valid(root, &instance));
        }
    }

    #[test]
    fn decoding_preserves_numeric_precision() {
        let value = decode_json("123456789012345678901234567890".as_bytes()).unwrap();
        assert_eq!(value.to_string(), "123456789012345678901234567890");
    }
}
