//! Semantic analysis.
//!
//! The checker walks a [`Program`] once, resolving names against a
//! [`ScopeStack`], assigning a type to every expression and enforcing the
//! mutability, arity and structural rules of the language.
//!
//! Checking never aborts. Each error goes to an [`ErrorSink`] and the
//! offending node gets an unresolved (`None`) type; checks that depend on a
//! node with an unresolved type are skipped, so one mistake produces one
//! error rather than a cascade.
//!
//! Results are returned as a [`CheckedProgram`]: the untouched tree together
//! with the [`Annotations`] side tables.

mod decl;
mod expr;
mod info;
mod sink;
mod stmt;

pub use info::{Annotations, DefInfo, ExprInfo, Storage};
pub use sink::{ErrorSink, FirstError, TracingSink};

use rustc_hash::FxHashMap;
use wabbit_ast::{NodeId, Program};
use wabbit_core::{CompilationError, Span, ValueType};

use crate::scope::ScopeStack;

/// Parameter and return types of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSig {
    pub params: Vec<ValueType>,
    pub return_type: ValueType,
}

/// What kind of definition a name is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Function(FunctionSig),
}

/// A name binding in a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Resolved type of the definition (the return type for functions).
    pub ty: Option<ValueType>,
    pub storage: Storage,
    /// The defining node.
    pub def: NodeId,
    pub span: Span,
}

impl Symbol {
    /// Constants and functions cannot be assigned to.
    pub fn is_mutable(&self) -> bool {
        !matches!(self.kind, SymbolKind::Constant | SymbolKind::Function(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }
}

/// A program that has been through semantic analysis.
#[derive(Debug)]
pub struct CheckedProgram<'ast> {
    pub program: Program<'ast>,
    pub annotations: Annotations,
    /// Accepted top-level functions by name.
    pub functions: FxHashMap<String, FunctionSig>,
    /// Number of errors reported while checking.
    pub error_count: usize,
}

impl<'ast> CheckedProgram<'ast> {
    /// Whether checking reported no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count == 0
    }
}

/// Check a program, reporting errors to `sink`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check_program<'ast, S: ErrorSink + ?Sized>(
    program: &Program<'ast>,
    sink: &mut S,
) -> CheckedProgram<'ast> {
    let mut checker = Checker::new(sink, program.node_count as usize);
    checker.check_stmts(program.stmts);

    tracing::debug!(
        statements = program.stmts.len(),
        functions = checker.functions.len(),
        errors = checker.error_count,
        "checked program"
    );

    CheckedProgram {
        program: *program,
        annotations: checker.annotations,
        functions: checker.functions,
        error_count: checker.error_count,
    }
}

/// The enclosing function while checking its body.
#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    return_type: ValueType,
}

/// Traversal state for one checking pass.
pub(crate) struct Checker<'s, S: ErrorSink + ?Sized> {
    scopes: ScopeStack<Symbol>,
    annotations: Annotations,
    functions: FxHashMap<String, FunctionSig>,
    sink: &'s mut S,
    error_count: usize,
    /// Enclosing function, `None` in top-level code.
    function: Option<FunctionContext>,
    /// Number of loops enclosing the current statement.
    loop_depth: u32,
}

impl<'s, S: ErrorSink + ?Sized> Checker<'s, S> {
    fn new(sink: &'s mut S, node_count: usize) -> Self {
        Self {
            scopes: ScopeStack::new(),
            annotations: Annotations::with_capacity(node_count),
            functions: FxHashMap::default(),
            sink,
            error_count: 0,
            function: None,
            loop_depth: 0,
        }
    }

    fn report(&mut self, error: CompilationError) {
        self.error_count += 1;
        self.sink.report(error);
    }

    fn storage(&self) -> Storage {
        if self.scopes.is_global() {
            Storage::Global
        } else {
            Storage::Local
        }
    }
}
