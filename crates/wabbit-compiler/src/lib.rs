//! Wabbit Compiler
//!
//! Takes a Wabbit program tree to a binary WebAssembly module.
//!
//! ## Architecture
//!
//! - **Checking**: resolve names, assign types and enforce the language rules,
//!   recording annotations in side tables
//! - **Lowering**: flatten the checked tree into structured stack-machine
//!   instructions, one stream per function
//! - **Encoding**: register imports, globals and functions, then write the
//!   binary module
//!
//! Lowered modules can also be interpreted directly, which is how lowering is
//! tested by behavior, or rendered back to source text for reading.
//!
//! ## Modules
//!
//! - [`check`]: Semantic checker and error sinks
//! - [`const_eval`]: Compile-time folding of global initializers
//! - [`ir`]: Lowered instruction set, interpreter and source renderer
//! - [`lower`]: Instruction lowering
//! - [`scope`]: Lexical scope stack
//! - [`typesys`]: Operator and cast tables
//! - [`wasm`]: Binary module encoder

pub mod check;
pub mod const_eval;
pub mod ir;
pub mod lower;
pub mod scope;
pub mod typesys;
pub mod wasm;

pub use check::{
    Annotations, CheckedProgram, ErrorSink, FirstError, FunctionSig, TracingSink, check_program,
};
pub use const_eval::{ConstEvaluator, ConstValue};
pub use ir::interp::{Interpreter, Value, run_module};
pub use ir::source::render_module;
pub use ir::{Cmp, GlobalDecl, Instruction, IrFunction, IrModule, LocalDecl};
pub use lower::{FALLBACK_ENTRY, lower_program};
pub use scope::ScopeStack;
pub use wasm::{EncodeOptions, ModuleEncoder, encode_module};

// Re-export the error types from core for convenience
pub use wabbit_core::{CompilationError, EncodeError, RuntimeError};
