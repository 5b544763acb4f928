//! Statement checking.

use wabbit_ast::{AssignStmt, Block, Expr, IfStmt, ReturnStmt, Stmt, WhileStmt};
use wabbit_core::{CompilationError, ValueType};

use super::expr::Access;
use super::{Checker, ErrorSink};

impl<S: ErrorSink + ?Sized> Checker<'_, S> {
    /// Check statements in order, in the current scope.
    ///
    /// Stops early once the sink is saturated.
    pub(super) fn check_stmts(&mut self, stmts: &[Stmt<'_>]) {
        for stmt in stmts {
            if self.sink.is_saturated() {
                return;
            }
            self.check_stmt(stmt);
        }
    }

    /// Check a block in its own child scope.
    fn check_block(&mut self, block: &Block<'_>) {
        self.scopes.push();
        self.check_stmts(block.stmts);
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Print(print) => {
                self.check_expr(print.value);
            }
            Stmt::If(if_stmt) => self.check_if(if_stmt),
            Stmt::While(while_stmt) => self.check_while(while_stmt),
            Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    self.report(CompilationError::BreakOutsideLoop { span: *span });
                }
            }
            Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.report(CompilationError::ContinueOutsideLoop { span: *span });
                }
            }
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Def(def) => self.check_definition(def),
        }
    }

    /// Type and mutability are checked independently; both may fire.
    fn check_assign(&mut self, assign: &AssignStmt<'_>) {
        let location = self.check_location(&assign.location, Access::Write);
        let value = self.check_expr(assign.value);

        if let (Some(expected), Some(found)) = (location.ty, value)
            && expected != found
        {
            self.report(CompilationError::AssignmentMismatch {
                expected,
                found,
                span: assign.span,
            });
        }
        if !location.is_assignable() {
            self.report(CompilationError::ImmutableAssignment {
                name: assign.location.to_string(),
                span: assign.span,
            });
        }
    }

    fn check_test(&mut self, construct: &'static str, test: &Expr<'_>) {
        if let Some(found) = self.check_expr(test)
            && found != ValueType::Bool
        {
            self.report(CompilationError::NonBooleanTest {
                construct,
                found,
                span: test.span(),
            });
        }
    }

    fn check_if(&mut self, if_stmt: &IfStmt<'_>) {
        self.check_test("if", if_stmt.test);
        self.check_block(&if_stmt.consequence);
        if let Some(alternative) = &if_stmt.alternative {
            self.check_block(alternative);
        }
    }

    fn check_while(&mut self, while_stmt: &WhileStmt<'_>) {
        self.check_test("while", while_stmt.test);
        self.loop_depth += 1;
        self.check_block(&while_stmt.body);
        self.loop_depth -= 1;
    }

    fn check_return(&mut self, ret: &ReturnStmt<'_>) {
        let found = ret.value.and_then(|value| self.check_expr(value));

        let Some(function) = &self.function else {
            self.report(CompilationError::ReturnOutsideFunction { span: ret.span });
            return;
        };
        let expected = function.return_type;
        let mismatch = match (ret.value, found) {
            (None, _) => true,
            (Some(_), Some(found)) => found != expected,
            // Unresolved value: already reported.
            (Some(_), None) => false,
        };
        if mismatch {
            let error = CompilationError::ReturnMismatch {
                function: function.name.clone(),
                expected,
                found,
                span: ret.span,
            };
            self.report(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use wabbit_ast::{AstBuilder, BinaryOp, Program};

    use super::*;
    use crate::check::{CheckedProgram, FirstError, check_program};

    fn check<'ast>(program: &Program<'ast>) -> (CheckedProgram<'ast>, Vec<CompilationError>) {
        let mut errors = Vec::new();
        let checked = check_program(program, &mut errors);
        (checked, errors)
    }

    #[test]
    fn float_times_int_constant() {
        // const pi = 3; var tau float; tau = 2.0 * pi;
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let product = b.binary(BinaryOp::Mul, b.float(2.0), b.var("pi"));
        let program = b.program(&[
            b.constant("pi", None, b.int(3)),
            b.variable("tau", Some(ValueType::Float), None),
            b.assign(b.name("tau"), product),
        ]);

        let (checked, errors) = check(&program);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            CompilationError::InvalidBinaryOperator {
                left: ValueType::Float,
                right: ValueType::Int,
                ..
            }
        ));
        assert_eq!(checked.annotations.type_of(product.id()), None);
    }

    #[test]
    fn assignment_type_mismatch() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.variable("tau", Some(ValueType::Float), None),
            b.assign(b.name("tau"), b.int(1)),
        ]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            CompilationError::AssignmentMismatch {
                expected: ValueType::Float,
                found: ValueType::Int,
                ..
            }
        ));
    }

    #[test]
    fn immutable_and_mismatch_both_fire() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.constant("c", None, b.int(1)),
            b.assign(b.name("c"), b.float(2.0)),
        ]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], CompilationError::AssignmentMismatch { .. }));
        assert!(matches!(
            &errors[1],
            CompilationError::ImmutableAssignment { name, .. } if name == "c"
        ));
    }

    #[test]
    fn assigning_to_function() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let func = b.function(
            "f",
            &[],
            ValueType::Int,
            b.block(&[b.return_stmt(Some(b.int(1)))]),
        );
        let program = b.program(&[func, b.assign(b.name("f"), b.int(2))]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CompilationError::ImmutableAssignment { .. }));
    }

    #[test]
    fn function_target_checks_type_and_mutability() {
        // func f() int { return 1; } f = 2.0;
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let func = b.function(
            "f",
            &[],
            ValueType::Int,
            b.block(&[b.return_stmt(Some(b.int(1)))]),
        );
        let program = b.program(&[func, b.assign(b.name("f"), b.float(2.0))]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(matches!(
            errors[0],
            CompilationError::AssignmentMismatch {
                expected: ValueType::Int,
                found: ValueType::Float,
                ..
            }
        ));
        assert!(matches!(
            &errors[1],
            CompilationError::ImmutableAssignment { name, .. } if name == "f"
        ));
    }

    #[test]
    fn shadowed_name_restored_after_block() {
        // var a int = 2; if a < 3 { var a = 1.5; print a; } else { print 0; } print a;
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inner_read = b.var("a");
        let outer_read = b.var("a");
        let test = b.binary(BinaryOp::Less, b.var("a"), b.int(3));
        let consequence = b.block(&[
            b.variable("a", None, Some(b.float(1.5))),
            b.print(inner_read),
        ]);
        let alternative = b.block(&[b.print(b.int(0))]);
        let program = b.program(&[
            b.variable("a", Some(ValueType::Int), Some(b.int(2))),
            b.if_else(test, consequence, Some(alternative)),
            b.print(outer_read),
        ]);

        let (checked, errors) = check(&program);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            checked.annotations.type_of(inner_read.id()),
            Some(ValueType::Float)
        );
        assert_eq!(
            checked.annotations.type_of(outer_read.id()),
            Some(ValueType::Int)
        );
    }

    #[test]
    fn block_definitions_do_not_escape() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[b.variable("inner", None, Some(b.int(1))), b.break_stmt()]);
        let program = b.program(&[b.while_loop(b.bool(true), body), b.print(b.var("inner"))]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CompilationError::UndefinedName { .. }));
    }

    #[test]
    fn tests_must_be_bool() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.if_else(b.int(1), b.block(&[b.print(b.int(1))]), None),
            b.while_loop(b.char('x'), b.block(&[b.break_stmt()])),
        ]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            CompilationError::NonBooleanTest {
                construct: "if",
                found: ValueType::Int,
                ..
            }
        ));
        assert!(matches!(
            errors[1],
            CompilationError::NonBooleanTest {
                construct: "while",
                found: ValueType::Char,
                ..
            }
        ));
    }

    #[test]
    fn loop_control_outside_loop() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inside = b.while_loop(
            b.bool(false),
            b.block(&[b.continue_stmt(), b.break_stmt()]),
        );
        let program = b.program(&[b.break_stmt(), inside, b.continue_stmt()]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], CompilationError::BreakOutsideLoop { .. }));
        assert!(matches!(errors[1], CompilationError::ContinueOutsideLoop { .. }));
    }

    #[test]
    fn loop_depth_resets_in_function() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let func = b.function(
            "f",
            &[],
            ValueType::Int,
            b.block(&[b.break_stmt(), b.return_stmt(Some(b.int(1)))]),
        );
        let program = b.program(&[func]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CompilationError::BreakOutsideLoop { .. }));
    }

    #[test]
    fn return_checks() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let wrong = b.function(
            "wrong",
            &[],
            ValueType::Int,
            b.block(&[b.return_stmt(Some(b.bool(true)))]),
        );
        let empty = b.function("empty", &[], ValueType::Int, b.block(&[b.return_stmt(None)]));
        let program = b.program(&[wrong, empty, b.return_stmt(Some(b.int(0)))]);

        let (_, errors) = check(&program);
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            errors[0],
            CompilationError::ReturnMismatch {
                expected: ValueType::Int,
                found: Some(ValueType::Bool),
                ..
            }
        ));
        assert!(matches!(
            errors[1],
            CompilationError::ReturnMismatch { found: None, .. }
        ));
        assert!(matches!(
            errors[2],
            CompilationError::ReturnOutsideFunction { .. }
        ));
    }

    #[test]
    fn first_error_sink_stops_checking() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.print(b.var("a")),
            b.print(b.var("b")),
            b.print(b.var("c")),
        ]);

        let mut sink = FirstError::new();
        let checked = check_program(&program, &mut sink);
        assert_eq!(checked.error_count, 1);
        assert!(matches!(
            sink.into_result(),
            Err(CompilationError::UndefinedName { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn error_free_program_is_fully_typed() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.var("x");
        let cond = b.binary(BinaryOp::Less, x, b.int(10));
        let step = b.binary(BinaryOp::Add, b.var("x"), b.int(1));
        let body = b.block(&[
            b.assign(b.name("x"), step),
            b.print(b.cast(ValueType::Float, b.var("x"))),
        ]);
        let program = b.program(&[
            b.variable("x", None, Some(b.int(0))),
            b.while_loop(cond, body),
            b.print(b.char('\n')),
        ]);

        let (checked, errors) = check(&program);
        assert!(errors.is_empty());
        assert!(checked.annotations.exprs().all(|(_, info)| info.ty.is_some()));
        assert_eq!(checked.annotations.exprs().count(), 11);
    }
}
