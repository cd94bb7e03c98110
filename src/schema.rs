//! The compiled schema tree.
//!
//! Nodes are produced by an external compiler and are immutable once
//! validation starts. They live in an arena ([`Schemas`]) and refer to each
//! other through opaque [`SchemaRef`] indices, so reference cycles are
//! representable without ownership cycles.

use crate::{error::ValidationError, primitive_type::TypeSet};
use fancy_regex::Regex;
use fraction::BigFraction;
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Boxed error type for user-supplied content predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Format predicate bound by the compiler. Returns whether the instance is
/// valid for the format; inapplicable instance kinds are the predicate's
/// responsibility.
pub type FormatCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Content decoder bound by the compiler, e.g. base64.
pub type DecodeFn = Arc<dyn Fn(&str) -> Result<Vec<u8>, BoxError> + Send + Sync>;

/// Media type predicate bound by the compiler, run over decoded bytes.
pub type MediaTypeCheck = Arc<dyn Fn(&[u8]) -> Result<(), BoxError> + Send + Sync>;

/// The `format` keyword: a name for error messages plus the bound check.
#[derive(Clone)]
pub struct Format {
    /// Format name as written in the schema.
    pub name: String,
    /// The bound predicate.
    pub check: FormatCheck,
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format").field("name", &self.name).finish()
    }
}

/// The `contentEncoding` keyword with its bound decoder.
#[derive(Clone)]
pub struct ContentEncoding {
    /// Encoding name as written in the schema.
    pub name: String,
    /// The bound decoder.
    pub decode: DecodeFn,
}

impl fmt::Debug for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentEncoding")
            .field("name", &self.name)
            .finish()
    }
}

/// The `contentMediaType` keyword with its bound predicate.
#[derive(Clone)]
pub struct ContentMediaType {
    /// Media type name as written in the schema.
    pub name: String,
    /// The bound predicate.
    pub check: MediaTypeCheck,
}

impl fmt::Debug for ContentMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentMediaType")
            .field("name", &self.name)
            .finish()
    }
}

/// Context handed to extension validators. Carries nothing yet; it exists
/// so registered extensions keep working when it grows.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ExtensionContext {}

/// User-defined keyword validation.
pub trait ExtensionValidator: Send + Sync {
    /// Validate the instance against the extension's configuration.
    fn validate(
        &self,
        ctx: &ExtensionContext,
        config: &Value,
        instance: &Value,
    ) -> Result<(), ValidationError>;
}

impl<F> ExtensionValidator for F
where
    F: Fn(&ExtensionContext, &Value, &Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(
        &self,
        ctx: &ExtensionContext,
        config: &Value,
        instance: &Value,
    ) -> Result<(), ValidationError> {
        self(ctx, config, instance)
    }
}

/// One registered extension keyword on a schema node.
#[derive(Clone)]
pub struct Extension {
    /// Extension keyword name.
    pub name: String,
    /// Compiled configuration value for this node.
    pub config: Value,
    /// The user-supplied validator.
    pub validator: Arc<dyn ExtensionValidator>,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .finish()
    }
}

/// Opaque handle to a schema node inside a [`Schemas`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaRef(usize);

/// The `items` keyword.
#[derive(Debug, Clone, Default)]
pub enum Items {
    /// Keyword not present.
    #[default]
    Absent,
    /// One schema applied to every item.
    Single(SchemaRef),
    /// An ordered list of schemas applied positionally.
    Tuple(Vec<SchemaRef>),
}

/// The tri-state `additionalProperties`/`additionalItems` keywords.
#[derive(Debug, Clone, Copy, Default)]
pub enum Additional {
    /// Keyword not present.
    #[default]
    Absent,
    /// Boolean form: allow or reject whatever is left.
    Allow(bool),
    /// Schema form: validate whatever is left.
    Schema(SchemaRef),
}

/// One `dependencies` entry: a schema or a list of required names.
#[derive(Debug, Clone)]
pub enum Dependency {
    /// Schema form.
    Schema(SchemaRef),
    /// Required-names form.
    Required(Vec<String>),
}

/// The `if`/`then`/`else` keywords. `then`/`else` cannot exist without `if`.
#[derive(Debug, Clone, Copy)]
pub struct Conditional {
    /// The `if` subschema, validated silently.
    pub if_schema: SchemaRef,
    /// Applied when `if` accepts.
    pub then: Option<SchemaRef>,
    /// Applied when `if` rejects.
    pub else_schema: Option<SchemaRef>,
}

/// One compiled schema node.
///
/// Fields are public: the external compiler fills them in and hands the
/// arena over. Once validation starts the node must not change.
pub struct Schema {
    /// Absolute URL of the schema resource. Used for error context only.
    pub url: String,
    /// JSON Pointer of this node within the resource, starting with `#`.
    pub pointer: String,

    /// Unconditional outcome: boolean schemas compile to this and skip
    /// every other keyword.
    pub always: Option<bool>,
    /// Resolved `$ref` target.
    pub reference: Option<SchemaRef>,

    // type-agnostic keywords
    /// Allowed types; empty means the keyword is absent.
    pub types: TypeSet,
    /// The `const` value.
    pub constant: Option<Value>,
    /// The `enum` values; empty means the keyword is absent.
    pub enum_values: Vec<Value>,
    /// The `format` keyword with its bound predicate.
    pub format: Option<Format>,

    // logical combinators
    /// The `not` subschema.
    pub not: Option<SchemaRef>,
    /// The `allOf` subschemas.
    pub all_of: Vec<SchemaRef>,
    /// The `anyOf` subschemas.
    pub any_of: Vec<SchemaRef>,
    /// The `oneOf` subschemas.
    pub one_of: Vec<SchemaRef>,
    /// The `if`/`then`/`else` keywords.
    pub conditional: Option<Conditional>,

    // object keywords
    /// Minimum property count.
    pub min_properties: Option<usize>,
    /// Maximum property count.
    pub max_properties: Option<usize>,
    /// Required property names.
    pub required: Vec<String>,
    /// Per-property subschemas, in schema order.
    pub properties: Vec<(String, SchemaRef)>,
    /// Subschema every property name must satisfy.
    pub property_names: Option<SchemaRef>,
    /// Whether property names must themselves be valid regexes.
    pub regex_properties: bool,
    /// Pattern-keyed subschemas.
    pub pattern_properties: Vec<(Regex, SchemaRef)>,
    /// The `additionalProperties` keyword.
    pub additional_properties: Additional,
    /// The `dependencies` keyword entries.
    pub dependencies: Vec<(String, Dependency)>,
    /// The `dependentRequired` keyword entries.
    pub dependent_required: Vec<(String, Vec<String>)>,
    /// The `dependentSchemas` keyword entries.
    pub dependent_schemas: Vec<(String, SchemaRef)>,
    /// Applied to properties no other keyword evaluated.
    pub unevaluated_properties: Option<SchemaRef>,

    // array keywords
    /// Minimum item count.
    pub min_items: Option<usize>,
    /// Maximum item count.
    pub max_items: Option<usize>,
    /// Whether items must be pairwise unequal.
    pub unique_items: bool,
    /// The `items` keyword.
    pub items: Items,
    /// The `additionalItems` keyword.
    pub additional_items: Additional,
    /// The `contains` subschema.
    pub contains: Option<SchemaRef>,
    /// Minimum number of items matching `contains`; defaults to 1.
    pub min_contains: usize,
    /// Maximum number of items matching `contains`.
    pub max_contains: Option<usize>,
    /// Applied to items past the last evaluated index.
    pub unevaluated_items: Option<SchemaRef>,

    // string keywords
    /// Minimum length in code points.
    pub min_length: Option<usize>,
    /// Maximum length in code points.
    pub max_length: Option<usize>,
    /// The `pattern` regex.
    pub pattern: Option<Regex>,
    /// The `contentEncoding` keyword with its bound decoder.
    pub content_encoding: Option<ContentEncoding>,
    /// The `contentMediaType` keyword with its bound predicate.
    pub content_media_type: Option<ContentMediaType>,

    // number keywords, each an exact rational
    /// Inclusive lower bound.
    pub minimum: Option<BigFraction>,
    /// Exclusive lower bound.
    pub exclusive_minimum: Option<BigFraction>,
    /// Inclusive upper bound.
    pub maximum: Option<BigFraction>,
    /// Exclusive upper bound.
    pub exclusive_maximum: Option<BigFraction>,
    /// Required divisor.
    pub multiple_of: Option<BigFraction>,

    /// Registered extension keywords present on this node.
    pub extensions: Vec<Extension>,
}

impl Schema {
    /// A node with no constraints at the given location.
    pub fn new(url: impl Into<String>, pointer: impl Into<String>) -> Schema {
        Schema {
            url: url.into(),
            pointer: pointer.into(),
            always: None,
            reference: None,
            types: TypeSet::new(),
            constant: None,
            enum_values: Vec::new(),
            format: None,
            not: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            conditional: None,
            min_properties: None,
            max_properties: None,
            required: Vec::new(),
            properties: Vec::new(),
            property_names: None,
            regex_properties: false,
            pattern_properties: Vec::new(),
            additional_properties: Additional::Absent,
            dependencies: Vec::new(),
            dependent_required: Vec::new(),
            dependent_schemas: Vec::new(),
            unevaluated_properties: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            items: Items::Absent,
            additional_items: Additional::Absent,
            contains: None,
            min_contains: 1,
            max_contains: None,
            unevaluated_items: None,
            min_length: None,
            max_length: None,
            pattern: None,
            content_encoding: None,
            content_media_type: None,
            minimum: None,
            exclusive_minimum: None,
            maximum: None,
            exclusive_maximum: None,
            multiple_of: None,
            extensions: Vec::new(),
        }
    }

    /// Absolute location of this node, for `$ref` error display.
    pub(crate) fn location(&self, from: &Schema) -> String {
        if self.url == from.url {
            self.pointer.clone()
        } else {
            format!("{}{}", self.url, self.pointer)
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::new("", "#")
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("url", &self.url)
            .field("pointer", &self.pointer)
            .finish_non_exhaustive()
    }
}

/// Arena owning every node of a compiled schema tree.
#[derive(Debug, Default)]
pub struct Schemas {
    nodes: Vec<Schema>,
}

impl Schemas {
    /// An empty arena.
    pub fn new() -> Schemas {
        Schemas { nodes: Vec::new() }
    }

    /// Add a node and return its handle.
    pub fn insert(&mut self, schema: Schema) -> SchemaRef {
        let index = self.nodes.len();
        self.nodes.push(schema);
        SchemaRef(index)
    }

    /// Look up a node.
    ///
    /// # Panics
    /// Panics if the handle comes from a different arena and is out of
    /// range.
    pub fn get(&self, schema: SchemaRef) -> &Schema {
        &self.nodes[schema.0]
    }

    /// Mutable access for the compiler while it wires up references.
    pub fn get_mut(&mut self, schema: SchemaRef) -> &mut Schema {
        &mut self.nodes[schema.0]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validate the instance against the given root node.
    pub fn validate(&self, schema: SchemaRef, instance: &Value) -> Result<(), ValidationError> {
        crate::validator::validate_root(self, schema, instance)
    }

    /// Boolean shortcut over [`Schemas::validate`].
    pub fn is_valid(&self, schema: SchemaRef, instance: &Value) -> bool {
        self.validate(schema, instance).is_ok()
    }
}

impl std::ops::Index<SchemaRef> for Schemas {
    type Output = Schema;

    fn index(&self, index: SchemaRef) -> &Schema {
        &self.nodes[index.0]
    }
}

#[cfg(test)]
mod tests {
    use super::{Schema, Schemas};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn arena_is_shareable_across_threads() {
        assert_send_sync::<Schemas>();
    }

    #[test]
    fn reference_cycles_are_representable() {
        let mut schemas = Schemas::new();
        let root = schemas.insert(Schema::default());
        schemas.get_mut(root).reference = Some(root);
        assert_eq!(schemas[root].reference, Some(root));
    }
}
