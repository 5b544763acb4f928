//! Statement and definition nodes.
//!
//! Definitions are statements too: `var`, `const` and `func` appear inside
//! statement lists and introduce a name into the enclosing scope.

use wabbit_core::{Span, ValueType};

use crate::NodeId;
use crate::expr::{Expr, Location};

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `location = expression;`
    Assign(&'ast AssignStmt<'ast>),
    /// `print expression;`
    Print(PrintStmt<'ast>),
    /// `if test { ... } else { ... }`
    If(&'ast IfStmt<'ast>),
    /// `while test { ... }`
    While(&'ast WhileStmt<'ast>),
    /// `break;`
    Break(Span),
    /// `continue;`
    Continue(Span),
    /// `return expression;`
    Return(ReturnStmt<'ast>),
    /// A variable, constant or function definition
    Def(Definition<'ast>),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::Assign(s) => s.span,
            Self::Print(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::Break(span) | Self::Continue(span) => *span,
            Self::Return(s) => s.span,
            Self::Def(d) => d.span(),
        }
    }
}

/// An ordered sequence of statements forming one scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

impl<'ast> Block<'ast> {
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub location: Location<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintStmt<'ast> {
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub test: &'ast Expr<'ast>,
    pub consequence: Block<'ast>,
    pub alternative: Option<Block<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub test: &'ast Expr<'ast>,
    pub body: Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

// ============================================================================
// Definitions
// ============================================================================

/// A definition: introduces a name into the current scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Definition<'ast> {
    Variable(&'ast VariableDef<'ast>),
    Constant(&'ast ConstantDef<'ast>),
    Function(&'ast FunctionDef<'ast>),
}

impl<'ast> Definition<'ast> {
    pub fn id(&self) -> NodeId {
        match self {
            Definition::Variable(d) => d.id,
            Definition::Constant(d) => d.id,
            Definition::Function(d) => d.id,
        }
    }

    pub fn name(&self) -> &'ast str {
        match self {
            Definition::Variable(d) => d.name,
            Definition::Constant(d) => d.name,
            Definition::Function(d) => d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Definition::Variable(d) => d.span,
            Definition::Constant(d) => d.span,
            Definition::Function(d) => d.span,
        }
    }
}

/// `var name [type] [= value];` At least one of `ty`/`value` should be present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableDef<'ast> {
    pub id: NodeId,
    pub name: &'ast str,
    pub ty: Option<ValueType>,
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// `const name [type] = value;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDef<'ast> {
    pub id: NodeId,
    pub name: &'ast str,
    pub ty: Option<ValueType>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// `func name(params) return_type { body }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDef<'ast> {
    pub id: NodeId,
    pub name: &'ast str,
    pub params: &'ast [Parameter<'ast>],
    pub return_type: ValueType,
    pub body: Block<'ast>,
    pub span: Span,
}

/// A function parameter such as `x int`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter<'ast> {
    pub id: NodeId,
    pub name: &'ast str,
    pub ty: ValueType,
    pub span: Span,
}
