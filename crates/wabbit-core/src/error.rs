//! Unified error types for the Wabbit compiler.
//!
//! ## Error Hierarchy
//!
//! ```text
//! WabbitError (top-level wrapper)
//! ├── CompilationError - recoverable semantic errors recorded by the checker
//! ├── EncodeError      - encoder usage errors (fatal pipeline violations)
//! ├── DecodeError      - malformed varint input
//! └── RuntimeError     - traps and malformed streams in the IR interpreter
//! ```
//!
//! Semantic errors are never raised: the checker hands each one to an error
//! sink and keeps going. Encoding errors mean the pipeline broke an ordering
//! guarantee (for example, a call to a function that was never registered),
//! so they surface as `Err` and stop the build.

use thiserror::Error;

use crate::{Span, ValueType};

// ============================================================================
// Compilation Errors
// ============================================================================

/// The four families of recoverable semantic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Undefined identifier, duplicate definition.
    NameResolution,
    /// Operator, cast, assignment, test, argument or return type mismatch.
    Type,
    /// Assignment to a constant or function name.
    Mutability,
    /// Wrong argument count, empty body, missing type/value, misplaced statements.
    Structural,
}

impl ErrorCategory {
    /// Short lowercase name, used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::NameResolution => "name",
            ErrorCategory::Type => "type",
            ErrorCategory::Mutability => "mutability",
            ErrorCategory::Structural => "structural",
        }
    }
}

/// Errors recorded during semantic analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    // ------------------------------------------------------------------
    // Name resolution
    // ------------------------------------------------------------------
    /// A referenced name has no definition in any enclosing scope.
    #[error("at {span}: '{name}' is not defined")]
    UndefinedName { name: String, span: Span },

    /// A called function has no definition in any enclosing scope.
    #[error("at {span}: function '{name}' is not defined")]
    UndefinedFunction { name: String, span: Span },

    /// A name was defined twice in the same scope.
    #[error("at {span}: duplicate definition of '{name}'")]
    DuplicateDefinition { name: String, span: Span },

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------
    /// No entry in the binary operator table for these operand types.
    #[error("at {span}: invalid operator for types: {left} {op} {right}")]
    InvalidBinaryOperator {
        op: &'static str,
        left: ValueType,
        right: ValueType,
        span: Span,
    },

    /// No entry in the unary operator table for this operand type.
    #[error("at {span}: invalid unary operation: {op}{operand}")]
    InvalidUnaryOperator {
        op: &'static str,
        operand: ValueType,
        span: Span,
    },

    /// No entry in the cast table for this conversion.
    #[error("at {span}: cannot cast {from} to {to}")]
    InvalidCast {
        from: ValueType,
        to: ValueType,
        span: Span,
    },

    /// A definition's declared type disagrees with its initializer.
    #[error("at {span}: '{name}' declared as {declared} but initialized with {found}")]
    DeclarationMismatch {
        name: String,
        declared: ValueType,
        found: ValueType,
        span: Span,
    },

    /// Assigned value does not match the location's type.
    #[error("at {span}: type error on assignment: {expected} != {found}")]
    AssignmentMismatch {
        expected: ValueType,
        found: ValueType,
        span: Span,
    },

    /// An `if` or `while` test is not boolean.
    #[error("at {span}: {construct} test must be bool, found {found}")]
    NonBooleanTest {
        construct: &'static str,
        found: ValueType,
        span: Span,
    },

    /// A positional argument does not match the parameter's type.
    #[error("at {span}: type error in argument {position} of '{function}': expected {expected}, found {found}")]
    ArgumentMismatch {
        function: String,
        position: usize,
        expected: ValueType,
        found: ValueType,
        span: Span,
    },

    /// A returned value does not match the function's return type.
    #[error(
        "at {span}: '{function}' must return {expected}, found {}",
        .found.map_or("no value", ValueType::name)
    )]
    ReturnMismatch {
        function: String,
        expected: ValueType,
        found: Option<ValueType>,
        span: Span,
    },

    /// A memory address expression is not an integer.
    #[error("at {span}: memory address must be int, found {found}")]
    InvalidAddress { found: ValueType, span: Span },

    /// A function name was used where a value is expected.
    #[error("at {span}: function '{name}' cannot be used as a value")]
    NotAValue { name: String, span: Span },

    /// A non-function name was called.
    #[error("at {span}: cannot call '{name}' as a function")]
    NotCallable { name: String, span: Span },

    // ------------------------------------------------------------------
    // Mutability
    // ------------------------------------------------------------------
    /// Assignment to a constant or function name.
    #[error("at {span}: cannot assign to immutable location '{name}'")]
    ImmutableAssignment { name: String, span: Span },

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------
    /// A call passes the wrong number of arguments.
    #[error("at {span}: '{function}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A function was defined without statements.
    #[error("at {span}: function '{name}' has an empty body")]
    EmptyFunctionBody { name: String, span: Span },

    /// A `var` declaration carries neither a type nor a value.
    #[error("at {span}: variable '{name}' needs a type or an initial value")]
    MissingTypeAndValue { name: String, span: Span },

    /// A function was defined inside a block or another function.
    #[error("at {span}: function '{name}' must be defined at the top level")]
    NestedFunction { name: String, span: Span },

    /// `break` used outside of a loop.
    #[error("at {span}: break outside of a loop")]
    BreakOutsideLoop { span: Span },

    /// `continue` used outside of a loop.
    #[error("at {span}: continue outside of a loop")]
    ContinueOutsideLoop { span: Span },

    /// `return` used outside of a function body.
    #[error("at {span}: return outside of a function")]
    ReturnOutsideFunction { span: Span },
}

impl CompilationError {
    /// The source position of the error, when the tree carried one.
    pub fn span(&self) -> Option<Span> {
        use CompilationError::*;
        let span = match self {
            UndefinedName { span, .. }
            | UndefinedFunction { span, .. }
            | DuplicateDefinition { span, .. }
            | InvalidBinaryOperator { span, .. }
            | InvalidUnaryOperator { span, .. }
            | InvalidCast { span, .. }
            | DeclarationMismatch { span, .. }
            | AssignmentMismatch { span, .. }
            | NonBooleanTest { span, .. }
            | ArgumentMismatch { span, .. }
            | ReturnMismatch { span, .. }
            | InvalidAddress { span, .. }
            | NotAValue { span, .. }
            | NotCallable { span, .. }
            | ImmutableAssignment { span, .. }
            | ArgumentCount { span, .. }
            | EmptyFunctionBody { span, .. }
            | MissingTypeAndValue { span, .. }
            | NestedFunction { span, .. }
            | BreakOutsideLoop { span }
            | ContinueOutsideLoop { span }
            | ReturnOutsideFunction { span } => *span,
        };
        span.known()
    }

    /// Which family of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        use CompilationError::*;
        match self {
            UndefinedName { .. } | UndefinedFunction { .. } | DuplicateDefinition { .. } => {
                ErrorCategory::NameResolution
            }
            InvalidBinaryOperator { .. }
            | InvalidUnaryOperator { .. }
            | InvalidCast { .. }
            | DeclarationMismatch { .. }
            | AssignmentMismatch { .. }
            | NonBooleanTest { .. }
            | ArgumentMismatch { .. }
            | ReturnMismatch { .. }
            | InvalidAddress { .. }
            | NotAValue { .. }
            | NotCallable { .. } => ErrorCategory::Type,
            ImmutableAssignment { .. } => ErrorCategory::Mutability,
            ArgumentCount { .. }
            | EmptyFunctionBody { .. }
            | MissingTypeAndValue { .. }
            | NestedFunction { .. }
            | BreakOutsideLoop { .. }
            | ContinueOutsideLoop { .. }
            | ReturnOutsideFunction { .. } => ErrorCategory::Structural,
        }
    }
}

// ============================================================================
// Encoding Errors
// ============================================================================

/// Usage errors raised by the module encoder.
///
/// These indicate the pipeline violated a registration-order guarantee and
/// are not recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A load or store names neither a local of the current function nor a global.
    #[error("'{name}' is not a registered local or global (in function '{function}')")]
    UnknownVariable { name: String, function: String },

    /// A call or body refers to a function that was never registered.
    #[error("function '{name}' is not registered")]
    UnknownFunction { name: String },

    /// A global was registered twice.
    #[error("global '{name}' is already registered")]
    DuplicateGlobal { name: String },

    /// A function or import was registered twice.
    #[error("function '{name}' is already registered")]
    DuplicateFunction { name: String },

    /// Imports must precede every defined function in the index space.
    #[error("import '{name}' declared after a defined function")]
    ImportAfterFunction { name: String },

    /// Function body encoded twice.
    #[error("body of '{name}' was already encoded")]
    DuplicateBody { name: String },

    /// A declared function never received a body.
    #[error("function '{name}' was declared but has no body")]
    MissingBody { name: String },

    /// Structured control instructions do not nest properly.
    #[error("unbalanced control flow in '{function}': {detail}")]
    UnbalancedControl {
        function: String,
        detail: &'static str,
    },
}

// ============================================================================
// Decoding Errors
// ============================================================================

/// Errors decoding variable-length integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended while the continuation bit was still set.
    #[error("truncated varint")]
    Truncated,
    /// The encoded value does not fit the target integer.
    #[error("varint overflows {bits} bits")]
    Overflow { bits: u32 },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors running lowered instructions in the interpreter.
///
/// The first group mirrors the traps a WebAssembly host raises. The second
/// means the instruction stream itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    // ------------------------------------------------------------------
    // Traps
    // ------------------------------------------------------------------
    /// Execution reached an `unreachable` instruction.
    #[error("unreachable executed in '{function}'")]
    Unreachable { function: String },

    #[error("integer division by zero in '{function}'")]
    DivisionByZero { function: String },

    /// Signed division overflowed, or a float did not fit an int.
    #[error("integer overflow in '{function}'")]
    IntegerOverflow { function: String },

    /// NaN converted to an int.
    #[error("invalid conversion to integer in '{function}'")]
    InvalidConversion { function: String },

    #[error("out of bounds memory access at {address} in '{function}'")]
    MemoryOutOfBounds { address: u32, function: String },

    #[error("call stack exhausted at depth {depth}")]
    CallStackExhausted { depth: usize },

    /// The step budget ran out.
    #[error("out of fuel after {steps} steps")]
    OutOfFuel { steps: u64 },

    // ------------------------------------------------------------------
    // Malformed streams
    // ------------------------------------------------------------------
    #[error("operand stack underflow in '{function}' at '{instruction}'")]
    StackUnderflow {
        function: String,
        instruction: String,
    },

    /// An operand had the wrong representation for the instruction.
    #[error("operand mismatch in '{function}' at '{instruction}'")]
    OperandMismatch {
        function: String,
        instruction: String,
    },

    #[error("'{name}' is not a local or global (in function '{function}')")]
    UnknownVariable { name: String, function: String },

    #[error("function '{name}' is not defined")]
    UnknownFunction { name: String },

    /// Structured control instructions do not nest properly.
    #[error("unbalanced control flow in '{function}': {detail}")]
    UnbalancedControl {
        function: String,
        detail: &'static str,
    },
}

// ============================================================================
// Top-level
// ============================================================================

/// Any error produced by the Wabbit compiler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WabbitError {
    /// Semantic error.
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    /// Encoder usage error.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Varint decoding error.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Interpreter trap.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
