//! Program tree for the Wabbit language.
//!
//! The tree is produced by an external parser (or by hand, through
//! [`AstBuilder`]) and is never mutated afterwards. Nodes live in a
//! [`bumpalo`] arena and refer to each other as `&'ast T`.
//!
//! Three node families:
//! - [`Expr`]: literals, operators, casts, calls and location reads
//! - [`Stmt`]: assignment, print, if, while, break, continue, return
//! - [`Definition`]: variables, constants and functions (also statements)
//!
//! Expressions and definitions carry a [`NodeId`]. Later passes attach
//! information (resolved types, mutability) in side tables keyed by it.

mod builder;
pub mod expr;
pub mod ops;
pub mod stmt;

pub use builder::AstBuilder;
pub use expr::*;
pub use ops::{BinaryOp, UnaryOp};
pub use stmt::*;

use wabbit_core::Span;

/// Identity of an expression or definition node within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// An identifier with its source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

/// A complete program: the top-level statement list.
#[derive(Debug, Clone, Copy)]
pub struct Program<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    /// Number of node ids handed out while building the tree.
    pub node_count: u32,
}

impl<'ast> Program<'ast> {
    /// Top-level function definitions, in source order.
    pub fn functions(self) -> impl Iterator<Item = &'ast FunctionDef<'ast>> + 'ast {
        self.stmts.iter().filter_map(|stmt| match stmt {
            Stmt::Def(Definition::Function(func)) => Some(*func),
            _ => None,
        })
    }
}
