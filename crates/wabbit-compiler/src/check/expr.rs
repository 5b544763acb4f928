//! Expression checking.
//!
//! Every expression node gets an [`ExprInfo`] recorded in the annotations,
//! including nodes whose type could not be resolved.

use wabbit_ast::{
    AddressLocation, BinaryExpr, CallExpr, CastExpr, Expr, Location, NamedLocation, UnaryExpr,
    UnaryOp,
};
use wabbit_core::{CompilationError, ValueType};

use super::{Checker, ErrorSink, ExprInfo, SymbolKind};
use crate::typesys;

/// Whether a location is being read or assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Access {
    Read,
    Write,
}

impl<S: ErrorSink + ?Sized> Checker<'_, S> {
    /// Check an expression and return its resolved type.
    pub(super) fn check_expr(&mut self, expr: &Expr<'_>) -> Option<ValueType> {
        let info = match expr {
            Expr::Literal(lit) => ExprInfo::rvalue(Some(lit.value.value_type())),
            Expr::Binary(binary) => ExprInfo::rvalue(self.check_binary(binary)),
            Expr::Unary(unary) => ExprInfo::rvalue(self.check_unary(unary)),
            Expr::Cast(cast) => ExprInfo::rvalue(self.check_cast(cast)),
            Expr::Call(call) => ExprInfo::rvalue(self.check_call(call)),
            Expr::Location(location) => return self.check_location(location, Access::Read).ty,
        };
        self.annotations.record_expr(expr.id(), info);
        info.ty
    }

    fn check_binary(&mut self, binary: &BinaryExpr<'_>) -> Option<ValueType> {
        let left = self.check_expr(binary.left);
        let right = self.check_expr(binary.right);
        let (left, right) = (left?, right?);

        let result = typesys::binary_result(left, binary.op, right);
        if result.is_none() {
            self.report(CompilationError::InvalidBinaryOperator {
                op: binary.op.as_str(),
                left,
                right,
                span: binary.span,
            });
        }
        result
    }

    fn check_unary(&mut self, unary: &UnaryExpr<'_>) -> Option<ValueType> {
        let operand = self.check_expr(unary.operand)?;
        if unary.op == UnaryOp::Grow {
            self.annotations.mark_memory_use();
        }

        let result = typesys::unary_result(unary.op, operand);
        if result.is_none() {
            self.report(CompilationError::InvalidUnaryOperator {
                op: unary.op.as_str(),
                operand,
                span: unary.span,
            });
        }
        result
    }

    fn check_cast(&mut self, cast: &CastExpr<'_>) -> Option<ValueType> {
        let from = self.check_expr(cast.value)?;
        let result = typesys::cast_result(from, cast.target);
        if result.is_none() {
            self.report(CompilationError::InvalidCast {
                from,
                to: cast.target,
                span: cast.span,
            });
        }
        result
    }

    /// Arguments are checked before the callee is resolved. When the callee
    /// is undefined or not a function, that is the only error reported for
    /// the call: arity and argument types are not compared.
    fn check_call(&mut self, call: &CallExpr<'_>) -> Option<ValueType> {
        let arg_types: Vec<Option<ValueType>> =
            call.args.iter().map(|arg| self.check_expr(arg)).collect();

        let name = call.callee.name;
        let Some(symbol) = self.scopes.lookup(name).cloned() else {
            self.report(CompilationError::UndefinedFunction {
                name: name.to_string(),
                span: call.span,
            });
            return None;
        };
        let SymbolKind::Function(sig) = symbol.kind else {
            self.report(CompilationError::NotCallable {
                name: name.to_string(),
                span: call.span,
            });
            return None;
        };
        self.annotations.record_resolution(call.id, symbol.def);

        if arg_types.len() != sig.params.len() {
            self.report(CompilationError::ArgumentCount {
                function: name.to_string(),
                expected: sig.params.len(),
                found: arg_types.len(),
                span: call.span,
            });
        } else {
            for (position, ((arg, found), expected)) in
                call.args.iter().zip(&arg_types).zip(&sig.params).enumerate()
            {
                if let Some(found) = *found
                    && found != *expected
                {
                    self.report(CompilationError::ArgumentMismatch {
                        function: name.to_string(),
                        position: position + 1,
                        expected: *expected,
                        found,
                        span: arg.span(),
                    });
                }
            }
        }

        Some(sig.return_type)
    }

    /// Check a location and record its info.
    pub(super) fn check_location(&mut self, location: &Location<'_>, access: Access) -> ExprInfo {
        let info = match location {
            Location::Named(named) => self.check_named(named, access),
            Location::Address(address) => self.check_address(address),
        };
        self.annotations.record_expr(location.id(), info);
        info
    }

    fn check_named(&mut self, named: &NamedLocation<'_>, access: Access) -> ExprInfo {
        let Some(symbol) = self.scopes.lookup(named.name).cloned() else {
            self.report(CompilationError::UndefinedName {
                name: named.name.to_string(),
                span: named.span,
            });
            return ExprInfo::unresolved();
        };
        self.annotations.record_resolution(named.id, symbol.def);

        if symbol.is_function() {
            // A function name is never a readable value. As an assignment
            // target it carries the return type and is immutable.
            if access == Access::Read {
                self.report(CompilationError::NotAValue {
                    name: named.name.to_string(),
                    span: named.span,
                });
                return ExprInfo::location(None, false);
            }
            return ExprInfo::location(symbol.ty, false);
        }

        ExprInfo::location(symbol.ty, symbol.is_mutable())
    }

    fn check_address(&mut self, address: &AddressLocation<'_>) -> ExprInfo {
        self.annotations.mark_memory_use();
        if let Some(found) = self.check_expr(address.address)
            && found != ValueType::Int
        {
            self.report(CompilationError::InvalidAddress {
                found,
                span: address.span,
            });
        }
        ExprInfo::location(Some(ValueType::Int), true)
    }
}
