//! Expression nodes.
//!
//! Expressions evaluate to a value. Locations are expressions too: a
//! location read yields the stored value, and the same node kind appears on
//! the left-hand side of an assignment.
//!
//! Every expression carries a [`NodeId`] so the checker can attach its
//! resolved type in a side table without mutating the tree.

use std::fmt;

use wabbit_core::{Span, ValueType};

use crate::{BinaryOp, Ident, NodeId, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Unary prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Type cast, `int(x)`
    Cast(&'ast CastExpr<'ast>),
    /// Function call
    Call(&'ast CallExpr<'ast>),
    /// Read from a location
    Location(Location<'ast>),
}

impl<'ast> Expr<'ast> {
    /// The node identity used to key annotations.
    pub fn id(&self) -> NodeId {
        match self {
            Self::Literal(e) => e.id,
            Self::Binary(e) => e.id,
            Self::Unary(e) => e.id,
            Self::Cast(e) => e.id,
            Self::Call(e) => e.id,
            Self::Location(loc) => loc.id(),
        }
    }

    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Cast(e) => e.span,
            Self::Call(e) => e.span,
            Self::Location(loc) => loc.span(),
        }
    }
}

/// A literal value with its source location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr {
    pub id: NodeId,
    pub value: Literal,
    pub span: Span,
}

/// The value of a literal. Each kind carries its own primitive type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f64),
    Bool(bool),
    Char(char),
}

impl Literal {
    /// The primitive type of this literal.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Literal::Int(_) => ValueType::Int,
            Literal::Float(_) => ValueType::Float,
            Literal::Bool(_) => ValueType::Bool,
            Literal::Char(_) => ValueType::Char,
        }
    }
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub id: NodeId,
    pub op: BinaryOp,
    pub left: &'ast Expr<'ast>,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// A unary prefix operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub id: NodeId,
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

/// A type cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub id: NodeId,
    /// The type converted to
    pub target: ValueType,
    /// The converted value
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// A function call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub id: NodeId,
    /// Name of the called function
    pub callee: Ident<'ast>,
    /// Arguments, in evaluation order
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// A place where a value is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location<'ast> {
    /// A bare variable name such as `abc`.
    Named(NamedLocation<'ast>),
    /// A memory address such as `` `addr ``.
    Address(&'ast AddressLocation<'ast>),
}

impl<'ast> Location<'ast> {
    pub fn id(&self) -> NodeId {
        match self {
            Location::Named(loc) => loc.id,
            Location::Address(loc) => loc.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Location::Named(loc) => loc.span,
            Location::Address(loc) => loc.span,
        }
    }
}

/// A named location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedLocation<'ast> {
    pub id: NodeId,
    pub name: &'ast str,
    pub span: Span,
}

/// A memory address location, holding a 32-bit integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddressLocation<'ast> {
    pub id: NodeId,
    pub address: &'ast Expr<'ast>,
    pub span: Span,
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Char(c) => write!(f, "'{}'", c.escape_default()),
        }
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Named(loc) => f.write_str(loc.name),
            Location::Address(loc) => write!(f, "`{}", loc.address),
        }
    }
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit.value),
            Expr::Binary(e) => write!(f, "{} {} {}", e.left, e.op, e.right),
            Expr::Unary(e) => write!(f, "{}{}", e.op, e.operand),
            Expr::Cast(e) => write!(f, "{}({})", e.target, e.value),
            Expr::Call(e) => {
                write!(f, "{}(", e.callee.name)?;
                for (i, arg) in e.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Location(loc) => write!(f, "{loc}"),
        }
    }
}
