//! Wabbit core types.
//!
//! Shared by every stage of the compiler:
//!
//! - [`Span`]: source positions attached to errors
//! - [`ValueType`]: the closed set of primitive type tags
//! - [`CompilationError`], [`EncodeError`], [`RuntimeError`], [`WabbitError`]:
//!   the error taxonomy

mod error;
mod span;
mod value_type;

pub use error::{
    CompilationError, DecodeError, EncodeError, ErrorCategory, RuntimeError, WabbitError,
};
pub use span::Span;
pub use value_type::{MaybeType, UnknownTypeName, ValueType};
