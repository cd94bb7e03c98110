//! Validation error tree.
//!
//! Every keyword failure becomes one node: a keyword tag, a structured
//! kind rendered into a message, pointers into the instance and the schema,
//! and the child failures that caused it. Rendering beyond `Display` is the
//! caller's business.

use crate::primitive_type::{PrimitiveType, TypeSet};
use fraction::BigFraction;
use serde_json::Value;
use std::{
    borrow::Cow,
    error,
    fmt::{self, Formatter},
};

/// A single validation failure, possibly caused by deeper failures.
#[derive(Debug)]
pub struct ValidationError {
    /// Keyword tag relative to the failing schema, e.g. `"required"` or
    /// `"allOf/2"`. Empty for synthetic group errors.
    pub keyword: Cow<'static, str>,
    /// What went wrong, with enough structure to inspect programmatically.
    pub kind: ValidationErrorKind,
    /// JSON Pointer to the failing value inside the instance document.
    pub instance_path: String,
    /// JSON Pointer to the failing keyword inside the schema resource.
    pub schema_path: String,
    /// Child failures. Empty for leaves.
    pub causes: Vec<ValidationError>,
}

/// Kinds of validation failures.
#[derive(Debug, PartialEq)]
#[allow(missing_docs)]
pub enum ValidationErrorKind {
    /// The schema is `false` and rejects everything.
    FalseSchema,
    /// The instance kind is not among the allowed types.
    Type {
        expected: TypeSet,
        actual: PrimitiveType,
    },
    /// The instance does not equal the `const` value.
    Constant { expected: Value },
    /// The instance equals none of the `enum` values.
    Enum { options: Vec<Value> },
    /// The bound format predicate rejected the instance.
    Format { format: String },
    MinProperties { limit: usize, found: usize },
    MaxProperties { limit: usize, found: usize },
    /// One or more required properties are missing.
    Required { missing: Vec<String> },
    /// A property name is not a valid regular expression.
    InvalidRegex { pattern: String },
    /// Properties not covered by any property keyword are not allowed.
    AdditionalProperties { unexpected: Vec<String> },
    /// A property demanded by a dependency is missing.
    DependentRequired { property: String, required: String },
    MinItems { limit: usize, found: usize },
    MaxItems { limit: usize, found: usize },
    /// Two array items are equal.
    UniqueItems { first: usize, second: usize },
    /// The array is longer than the `items` tuple allows.
    AdditionalItems { limit: usize, found: usize },
    /// Fewer matching items than `minContains`.
    MinContains { limit: usize, matched: usize },
    /// More matching items than `maxContains`.
    MaxContains { limit: usize, matched: usize },
    MinLength { limit: usize, found: usize },
    MaxLength { limit: usize, found: usize },
    /// The string does not match the pattern.
    Pattern { pattern: String },
    /// The regex engine gave up before producing a match result.
    BacktrackLimit { pattern: String },
    /// The string is not encoded as declared.
    ContentEncoding { encoding: String },
    /// The decoded content is not of the declared media type.
    ContentMediaType { media_type: String },
    Minimum { limit: BigFraction },
    ExclusiveMinimum { limit: BigFraction },
    Maximum { limit: BigFraction },
    ExclusiveMaximum { limit: BigFraction },
    MultipleOf { multiple_of: BigFraction },
    /// The referenced schema rejected the instance.
    Reference { reference: String },
    /// The `not` subschema accepted the instance.
    Not,
    /// One `allOf` subschema rejected the instance.
    AllOf,
    /// Every `anyOf` subschema rejected the instance.
    AnyOf,
    /// More than one `oneOf` subschema accepted the instance.
    OneOfMultipleValid { first: usize, second: usize },
    /// Every `oneOf` subschema rejected the instance.
    OneOfNotValid,
    /// The `then` subschema rejected the instance.
    Then,
    /// The `else` subschema rejected the instance.
    Else,
    /// Synthetic root grouping several sibling failures.
    Group,
    /// Failure reported by a registered extension.
    Custom { message: String },
}

fn join_quoted(f: &mut Formatter<'_>, items: &[String]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item:?}")?;
    }
    Ok(())
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::FalseSchema => f.write_str("always fail"),
            ValidationErrorKind::Type { expected, actual } => {
                write!(f, "expected {expected}, but got {actual}")
            }
            ValidationErrorKind::Constant { expected } => match expected {
                Value::Object(_) | Value::Array(_) => f.write_str("const failed"),
                _ => write!(f, "value must be {expected}"),
            },
            ValidationErrorKind::Enum { options } => {
                if let [single] = options.as_slice() {
                    write!(f, "value must be {single}")
                } else {
                    f.write_str("value must be one of ")?;
                    for (idx, option) in options.iter().enumerate() {
                        if idx != 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{option}")?;
                    }
                    Ok(())
                }
            }
            ValidationErrorKind::Format { format } => {
                write!(f, "value is not valid {format:?}")
            }
            ValidationErrorKind::MinProperties { limit, found } => write!(
                f,
                "minimum {limit} properties allowed, but found {found} properties"
            ),
            ValidationErrorKind::MaxProperties { limit, found } => write!(
                f,
                "maximum {limit} properties allowed, but found {found} properties"
            ),
            ValidationErrorKind::Required { missing } => {
                f.write_str("missing properties: ")?;
                join_quoted(f, missing)
            }
            ValidationErrorKind::InvalidRegex { pattern } => {
                write!(f, "patternProperty {pattern:?} is not valid regex")
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                f.write_str("additionalProperties ")?;
                join_quoted(f, unexpected)?;
                f.write_str(" not allowed")
            }
            ValidationErrorKind::DependentRequired { property, required } => write!(
                f,
                "property {required:?} is required, if {property:?} property exists"
            ),
            ValidationErrorKind::MinItems { limit, found } => {
                write!(f, "minimum {limit} items allowed, but found {found} items")
            }
            ValidationErrorKind::MaxItems { limit, found } => {
                write!(f, "maximum {limit} items allowed, but found {found} items")
            }
            ValidationErrorKind::UniqueItems { first, second } => {
                write!(f, "items at index {first} and {second} are equal")
            }
            ValidationErrorKind::AdditionalItems { limit, found } => {
                write!(f, "only {limit} items are allowed, but found {found} items")
            }
            ValidationErrorKind::MinContains { limit, matched } => {
                write!(f, "valid must be >= {limit}, but got {matched}")
            }
            ValidationErrorKind::MaxContains { limit, matched } => {
                write!(f, "valid must be <= {limit}, but got {matched}")
            }
            ValidationErrorKind::MinLength { limit, found } => {
                write!(f, "length must be >= {limit}, but got {found}")
            }
            ValidationErrorKind::MaxLength { limit, found } => {
                write!(f, "length must be <= {limit}, but got {found}")
            }
            ValidationErrorKind::Pattern { pattern } => {
                write!(f, "does not match pattern {pattern:?}")
            }
            ValidationErrorKind::BacktrackLimit { pattern } => {
                write!(f, "pattern {pattern:?} exceeded backtracking limit")
            }
            ValidationErrorKind::ContentEncoding { encoding } => {
                write!(f, "value is not {encoding} encoded")
            }
            ValidationErrorKind::ContentMediaType { media_type } => {
                write!(f, "value is not of mediatype {media_type:?}")
            }
            ValidationErrorKind::Minimum { limit } => write!(f, "must be >= {limit}"),
            ValidationErrorKind::ExclusiveMinimum { limit } => write!(f, "must be > {limit}"),
            ValidationErrorKind::Maximum { limit } => write!(f, "must be <= {limit}"),
            ValidationErrorKind::ExclusiveMaximum { limit } => write!(f, "must be < {limit}"),
            ValidationErrorKind::MultipleOf { multiple_of } => {
                write!(f, "not multipleOf {multiple_of}")
            }
            ValidationErrorKind::Reference { reference } => {
                write!(f, "doesn't validate with {reference:?}")
            }
            ValidationErrorKind::Not => f.write_str("not failed"),
            ValidationErrorKind::AllOf => f.write_str("allOf failed"),
            ValidationErrorKind::AnyOf => f.write_str("anyOf failed"),
            ValidationErrorKind::OneOfMultipleValid { first, second } => {
                write!(f, "valid against schemas at indexes {first} and {second}")
            }
            ValidationErrorKind::OneOfNotValid => f.write_str("oneOf failed"),
            ValidationErrorKind::Then => f.write_str("if-then failed"),
            ValidationErrorKind::Else => f.write_str("if-else failed"),
            ValidationErrorKind::Group => f.write_str("validation failed"),
            ValidationErrorKind::Custom { message } => f.write_str(message),
        }
    }
}

impl ValidationError {
    /// Build a leaf error.
    pub fn new(
        keyword: impl Into<Cow<'static, str>>,
        kind: ValidationErrorKind,
        instance_path: String,
        schema_path: String,
    ) -> ValidationError {
        ValidationError {
            keyword: keyword.into(),
            kind,
            instance_path,
            schema_path,
            causes: Vec::new(),
        }
    }

    /// Attach one cause.
    #[must_use]
    pub fn with_cause(mut self, cause: ValidationError) -> ValidationError {
        self.causes.push(cause);
        self
    }

    /// Attach several causes.
    #[must_use]
    pub fn with_causes(mut self, causes: Vec<ValidationError>) -> ValidationError {
        self.causes = causes;
        self
    }

    fn fmt_tree(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        write!(
            f,
            "[I{}] [S{}] {}",
            self.instance_path, self.schema_path, self.kind
        )?;
        for cause in &self.causes {
            f.write_str("\n")?;
            cause.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

/// The default format prints this failure's message; the alternate format
/// (`{:#}`) prints the whole cause tree with pointer context.
impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.fmt_tree(f, 0)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl error::Error for ValidationError {}
