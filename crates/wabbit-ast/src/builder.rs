//! Arena-backed construction of program trees.
//!
//! The parser (and any tool that synthesizes programs) builds trees through
//! [`AstBuilder`]. It owns the id counter, so every expression and definition
//! in one tree gets a distinct [`NodeId`], and it stamps each node with the
//! current source position set via [`AstBuilder::at`].

use std::cell::Cell;

use bumpalo::Bump;
use wabbit_core::{Span, ValueType};

use crate::expr::*;
use crate::stmt::*;
use crate::{BinaryOp, Ident, NodeId, Program, UnaryOp};

/// Builds program tree nodes in a bump arena.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use wabbit_ast::{AstBuilder, BinaryOp};
///
/// let arena = Bump::new();
/// let b = AstBuilder::new(&arena);
/// let sum = b.binary(BinaryOp::Add, b.int(2), b.int(3));
/// let program = b.program(&[b.print(sum)]);
/// assert_eq!(program.stmts.len(), 1);
/// ```
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
    span: Cell<Span>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(0),
            span: Cell::new(Span::default()),
        }
    }

    /// The arena nodes are allocated in.
    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// Set the span stamped on subsequently built nodes.
    pub fn set_span(&self, span: Span) -> &Self {
        self.span.set(span);
        self
    }

    /// Set the position stamped on subsequently built nodes.
    pub fn at(&self, line: u32, col: u32) -> &Self {
        self.set_span(Span::point(line, col))
    }

    fn next_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn str(&self, s: &str) -> &'ast str {
        self.arena.alloc_str(s)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn literal(&self, value: Literal) -> Expr<'ast> {
        Expr::Literal(LiteralExpr {
            id: self.next_id(),
            value,
            span: self.span.get(),
        })
    }

    pub fn int(&self, value: i32) -> Expr<'ast> {
        self.literal(Literal::Int(value))
    }

    pub fn float(&self, value: f64) -> Expr<'ast> {
        self.literal(Literal::Float(value))
    }

    pub fn bool(&self, value: bool) -> Expr<'ast> {
        self.literal(Literal::Bool(value))
    }

    pub fn char(&self, value: char) -> Expr<'ast> {
        self.literal(Literal::Char(value))
    }

    pub fn binary(&self, op: BinaryOp, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.arena.alloc(BinaryExpr {
            id: self.next_id(),
            op,
            left: self.arena.alloc(left),
            right: self.arena.alloc(right),
            span: self.span.get(),
        }))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Unary(self.arena.alloc(UnaryExpr {
            id: self.next_id(),
            op,
            operand: self.arena.alloc(operand),
            span: self.span.get(),
        }))
    }

    pub fn cast(&self, target: ValueType, value: Expr<'ast>) -> Expr<'ast> {
        Expr::Cast(self.arena.alloc(CastExpr {
            id: self.next_id(),
            target,
            value: self.arena.alloc(value),
            span: self.span.get(),
        }))
    }

    pub fn call(&self, callee: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        let span = self.span.get();
        Expr::Call(self.arena.alloc(CallExpr {
            id: self.next_id(),
            callee: Ident {
                name: self.str(callee),
                span,
            },
            args: self.arena.alloc_slice_copy(args),
            span,
        }))
    }

    /// A named location, for reading or assignment.
    pub fn name(&self, name: &str) -> Location<'ast> {
        Location::Named(NamedLocation {
            id: self.next_id(),
            name: self.str(name),
            span: self.span.get(),
        })
    }

    /// A memory address location.
    pub fn address(&self, address: Expr<'ast>) -> Location<'ast> {
        Location::Address(self.arena.alloc(AddressLocation {
            id: self.next_id(),
            address: self.arena.alloc(address),
            span: self.span.get(),
        }))
    }

    /// Read a named location.
    pub fn var(&self, name: &str) -> Expr<'ast> {
        Expr::Location(self.name(name))
    }

    /// Read a location.
    pub fn load(&self, location: Location<'ast>) -> Expr<'ast> {
        Expr::Location(location)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn assign(&self, location: Location<'ast>, value: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Assign(self.arena.alloc(AssignStmt {
            location,
            value: self.arena.alloc(value),
            span: self.span.get(),
        }))
    }

    pub fn print(&self, value: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Print(PrintStmt {
            value: self.arena.alloc(value),
            span: self.span.get(),
        })
    }

    pub fn if_else(
        &self,
        test: Expr<'ast>,
        consequence: Block<'ast>,
        alternative: Option<Block<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::If(self.arena.alloc(IfStmt {
            test: self.arena.alloc(test),
            consequence,
            alternative,
            span: self.span.get(),
        }))
    }

    pub fn while_loop(&self, test: Expr<'ast>, body: Block<'ast>) -> Stmt<'ast> {
        Stmt::While(self.arena.alloc(WhileStmt {
            test: self.arena.alloc(test),
            body,
            span: self.span.get(),
        }))
    }

    pub fn break_stmt(&self) -> Stmt<'ast> {
        Stmt::Break(self.span.get())
    }

    pub fn continue_stmt(&self) -> Stmt<'ast> {
        Stmt::Continue(self.span.get())
    }

    pub fn return_stmt(&self, value: Option<Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value: value.map(|v| &*self.arena.alloc(v)),
            span: self.span.get(),
        })
    }

    pub fn block(&self, stmts: &[Stmt<'ast>]) -> Block<'ast> {
        Block {
            stmts: self.arena.alloc_slice_copy(stmts),
            span: self.span.get(),
        }
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    pub fn variable(
        &self,
        name: &str,
        ty: Option<ValueType>,
        value: Option<Expr<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::Def(Definition::Variable(self.arena.alloc(VariableDef {
            id: self.next_id(),
            name: self.str(name),
            ty,
            value: value.map(|v| &*self.arena.alloc(v)),
            span: self.span.get(),
        })))
    }

    pub fn constant(&self, name: &str, ty: Option<ValueType>, value: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Def(Definition::Constant(self.arena.alloc(ConstantDef {
            id: self.next_id(),
            name: self.str(name),
            ty,
            value: self.arena.alloc(value),
            span: self.span.get(),
        })))
    }

    pub fn param(&self, name: &str, ty: ValueType) -> Parameter<'ast> {
        Parameter {
            id: self.next_id(),
            name: self.str(name),
            ty,
            span: self.span.get(),
        }
    }

    pub fn function(
        &self,
        name: &str,
        params: &[Parameter<'ast>],
        return_type: ValueType,
        body: Block<'ast>,
    ) -> Stmt<'ast> {
        Stmt::Def(Definition::Function(self.arena.alloc(FunctionDef {
            id: self.next_id(),
            name: self.str(name),
            params: self.arena.alloc_slice_copy(params),
            return_type,
            body,
            span: self.span.get(),
        })))
    }

    /// Finish a program from its top-level statements.
    pub fn program(&self, stmts: &[Stmt<'ast>]) -> Program<'ast> {
        Program {
            stmts: self.arena.alloc_slice_copy(stmts),
            node_count: self.next_id.get(),
        }
    }
}
