//! Primitive value types of the Wabbit language.

use std::fmt;
use std::str::FromStr;

/// The closed set of primitive type tags.
///
/// Every checked expression resolves to one of these (or to nothing, when an
/// earlier error made the type unknowable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    /// 32-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Boolean.
    Bool,
    /// A single character.
    Char,
}

impl ValueType {
    /// All primitive types, in declaration order.
    pub const ALL: [ValueType; 4] = [
        ValueType::Int,
        ValueType::Float,
        ValueType::Bool,
        ValueType::Char,
    ];

    /// The source-language spelling of this type.
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Char => "char",
        }
    }

    /// Look up a type by its source-language spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Whether values of this type are represented as floating point.
    pub const fn is_float(self) -> bool {
        matches!(self, ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type name '{0}'")]
pub struct UnknownTypeName(pub String);

impl FromStr for ValueType {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownTypeName(s.to_string()))
    }
}

/// Display helper for an optional type, printing `?` when unresolved.
pub struct MaybeType(pub Option<ValueType>);

impl fmt::Display for MaybeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ty) => f.write_str(ty.name()),
            None => f.write_str("?"),
        }
    }
}
