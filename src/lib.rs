//! Wabbit
//!
//! Compiles Wabbit programs to WebAssembly. The program tree comes from
//! [`wabbit_ast`]; [`Unit`] runs it through checking, lowering and encoding.
//!
//! The stages are also available individually from [`wabbit_compiler`].

pub mod unit;

pub use unit::{BuildError, DEFAULT_ENTRY, Unit, UnitOptions};

pub use wabbit_ast::{AstBuilder, BinaryOp, Program, UnaryOp};
pub use wabbit_compiler::{
    CheckedProgram, ConstValue, EncodeOptions, ErrorSink, FirstError, Instruction, Interpreter,
    IrModule, TracingSink, check_program, encode_module, lower_program, render_module,
    run_module,
};
pub use wabbit_core::{
    CompilationError, DecodeError, EncodeError, ErrorCategory, RuntimeError, Span, ValueType,
    WabbitError,
};

/// Variable-length integer helpers used by the module format.
pub mod leb128 {
    pub use wabbit_compiler::wasm::leb128::*;
}
