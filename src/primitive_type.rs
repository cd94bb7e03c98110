//! Primitive JSON types and the compact set representation used by the
//! `type` keyword.

use serde_json::Value;
use std::{fmt, ops::BitOrAssign};

/// The type names recognised by the `type` keyword. `Integer` never comes
/// out of the classifier; it exists only as a constraint, with a relaxation
/// for mathematically integral numbers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl PrimitiveType {
    const fn to_bit(self) -> u8 {
        match self {
            PrimitiveType::Array => 1,
            PrimitiveType::Boolean => 2,
            PrimitiveType::Integer => 4,
            PrimitiveType::Null => 8,
            PrimitiveType::Number => 16,
            PrimitiveType::Object => 32,
            PrimitiveType::String => 64,
        }
    }

    fn from_bit(bit: u8) -> PrimitiveType {
        match bit {
            1 => PrimitiveType::Array,
            2 => PrimitiveType::Boolean,
            4 => PrimitiveType::Integer,
            8 => PrimitiveType::Null,
            16 => PrimitiveType::Number,
            32 => PrimitiveType::Object,
            64 => PrimitiveType::String,
            _ => unreachable!("invalid bit representation"),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimitiveType::Array => "array",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Null => "null",
            PrimitiveType::Number => "number",
            PrimitiveType::Object => "object",
            PrimitiveType::String => "string",
        })
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

/// Classify an instance value. All numeric representations classify as
/// `Number`; the `integer` relaxation is applied by the kernel.
impl From<&Value> for PrimitiveType {
    fn from(instance: &Value) -> Self {
        match instance {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(_) => PrimitiveType::Number,
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }
}

/// Set of allowed primitive types, packed into one byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TypeSet {
    inner: u8,
}

impl TypeSet {
    /// The empty set, meaning the `type` keyword is not present.
    pub const fn new() -> Self {
        Self { inner: 0 }
    }

    /// Add one type to the set.
    #[must_use]
    pub const fn add(mut self, primitive_type: PrimitiveType) -> Self {
        self.inner |= primitive_type.to_bit();
        self
    }

    /// Whether the set contains the given type.
    pub const fn contains(self, primitive_type: PrimitiveType) -> bool {
        primitive_type.to_bit() & self.inner != 0
    }

    /// Whether no types are set.
    pub const fn is_empty(self) -> bool {
        self.inner == 0
    }
}

impl BitOrAssign<PrimitiveType> for TypeSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: PrimitiveType) {
        *self = self.add(rhs);
    }
}

impl IntoIterator for TypeSet {
    type Item = PrimitiveType;
    type IntoIter = TypeSetIterator;
    fn into_iter(self) -> Self::IntoIter {
        TypeSetIterator { set: self }
    }
}

/// Renders like the expectation in a `type` error: `"integer or string"`.
impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, primitive_type) in (*self).into_iter().enumerate() {
            if idx != 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{primitive_type}")?;
        }
        Ok(())
    }
}

/// Iterator over the types present in a [`TypeSet`].
#[derive(Debug)]
pub struct TypeSetIterator {
    set: TypeSet,
}

impl Iterator for TypeSetIterator {
    type Item = PrimitiveType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.set.inner == 0 {
            None
        } else {
            let bit = self.set.inner & self.set.inner.wrapping_neg();
            self.set.inner &= self.set.inner - 1;
            Some(PrimitiveType::from_bit(bit))
        }
    }
}
