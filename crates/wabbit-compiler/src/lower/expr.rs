//! Expression lowering.

use wabbit_ast::{BinaryExpr, BinaryOp, CastExpr, Expr, Location, UnaryExpr, UnaryOp};
use wabbit_core::ValueType;

use super::{FunctionBuilder, Lowerer};
use crate::ir::{Cmp, Instruction};

impl Lowerer<'_> {
    pub(super) fn lower_expr(&self, expr: &Expr<'_>, out: &mut FunctionBuilder) {
        match expr {
            Expr::Literal(lit) => out.emit(Instruction::constant(lit.value.into())),
            Expr::Binary(binary) => self.lower_binary(binary, out),
            Expr::Unary(unary) => self.lower_unary(unary, out),
            Expr::Cast(cast) => self.lower_cast(cast, out),
            Expr::Call(call) => {
                for arg in call.args {
                    self.lower_expr(arg, out);
                }
                out.emit(Instruction::Call {
                    name: call.callee.name.to_string(),
                    params: call.args.len() as u32,
                    results: 1,
                });
            }
            Expr::Location(Location::Named(named)) => {
                out.emit_load(self.slot_for(named.id, named.name));
            }
            Expr::Location(Location::Address(addr)) => {
                self.lower_expr(addr.address, out);
                out.emit(Instruction::LoadMem);
            }
        }
    }

    fn type_of(&self, expr: &Expr<'_>) -> ValueType {
        self.annotations.type_of(expr.id()).unwrap_or(ValueType::Int)
    }

    fn lower_binary(&self, binary: &BinaryExpr<'_>, out: &mut FunctionBuilder) {
        self.lower_expr(binary.left, out);
        self.lower_expr(binary.right, out);

        let float = self.type_of(binary.left).is_float();
        let instr = match (binary.op, float) {
            (BinaryOp::Add, false) => Instruction::AddI,
            (BinaryOp::Sub, false) => Instruction::SubI,
            (BinaryOp::Mul, false) => Instruction::MulI,
            (BinaryOp::Div, false) => Instruction::DivI,
            (BinaryOp::Add, true) => Instruction::AddF,
            (BinaryOp::Sub, true) => Instruction::SubF,
            (BinaryOp::Mul, true) => Instruction::MulF,
            (BinaryOp::Div, true) => Instruction::DivF,
            (BinaryOp::LogicalAnd, _) => Instruction::And,
            (BinaryOp::LogicalOr, _) => Instruction::Or,
            (op, float) => {
                let cmp = comparison(op);
                if float {
                    Instruction::CmpF(cmp)
                } else {
                    Instruction::CmpI(cmp)
                }
            }
        };
        out.emit(instr);
    }

    fn lower_unary(&self, unary: &UnaryExpr<'_>, out: &mut FunctionBuilder) {
        self.lower_expr(unary.operand, out);
        match unary.op {
            UnaryOp::Plus => {}
            UnaryOp::Neg if self.type_of(unary.operand).is_float() => out.emit(Instruction::NegF),
            UnaryOp::Neg => {
                out.emit_int(-1);
                out.emit(Instruction::MulI);
            }
            UnaryOp::Not => out.emit(Instruction::Eqz),
            UnaryOp::Grow => out.emit(Instruction::GrowMem),
        }
    }

    fn lower_cast(&self, cast: &CastExpr<'_>, out: &mut FunctionBuilder) {
        self.lower_expr(cast.value, out);
        let from = self.type_of(cast.value);
        match (from, cast.target) {
            (ValueType::Int, ValueType::Float) => out.emit(Instruction::IntToFloat),
            (ValueType::Float, ValueType::Int) => out.emit(Instruction::FloatToInt),
            (ValueType::Float, ValueType::Bool) => {
                out.emit_float(0.0);
                out.emit(Instruction::CmpF(Cmp::Ne));
            }
            (ValueType::Int | ValueType::Char, ValueType::Bool) => {
                out.emit_int(0);
                out.emit(Instruction::CmpI(Cmp::Ne));
            }
            // Identity, and the int/char reinterpretations.
            _ => {}
        }
    }
}

fn comparison(op: BinaryOp) -> Cmp {
    match op {
        BinaryOp::Less => Cmp::Lt,
        BinaryOp::LessEqual => Cmp::Le,
        BinaryOp::Greater => Cmp::Gt,
        BinaryOp::GreaterEqual => Cmp::Ge,
        BinaryOp::NotEqual => Cmp::Ne,
        _ => Cmp::Eq,
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use wabbit_ast::{AstBuilder, Program};
    use wabbit_core::CompilationError;

    use crate::check::check_program;
    use crate::ir::{Cmp, Instruction, IrModule};
    use crate::lower::lower_program;

    fn entry_body(program: &Program<'_>) -> Vec<Instruction> {
        let mut errors: Vec<CompilationError> = Vec::new();
        let checked = check_program(program, &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        let module: IrModule = lower_program(&checked, "main");
        module.entry_function().map(|f| f.body.clone()).unwrap_or_default()
    }

    #[test]
    fn float_operators_use_float_instructions() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let div = b.binary(wabbit_ast::BinaryOp::Div, b.float(1.0), b.float(4.0));
        let less = b.binary(wabbit_ast::BinaryOp::Less, b.float(1.0), b.float(2.0));
        let body = entry_body(&b.program(&[b.print(div), b.print(less)]));

        assert_eq!(
            body,
            vec![
                Instruction::const_f64(1.0),
                Instruction::const_f64(4.0),
                Instruction::DivF,
                Instruction::Print(wabbit_core::ValueType::Float),
                Instruction::const_f64(1.0),
                Instruction::const_f64(2.0),
                Instruction::CmpF(Cmp::Lt),
                Instruction::Print(wabbit_core::ValueType::Bool),
            ]
        );
    }

    #[test]
    fn char_comparison_is_integer() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ge = b.binary(wabbit_ast::BinaryOp::GreaterEqual, b.char('b'), b.char('a'));
        let body = entry_body(&b.program(&[b.print(ge)]));
        assert_eq!(
            body,
            vec![
                Instruction::ConstI32('b' as i32),
                Instruction::ConstI32('a' as i32),
                Instruction::CmpI(Cmp::Ge),
                Instruction::Print(wabbit_core::ValueType::Bool),
            ]
        );
    }

    #[test]
    fn unary_operators() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let neg = b.unary(wabbit_ast::UnaryOp::Neg, b.int(5));
        let fneg = b.unary(wabbit_ast::UnaryOp::Neg, b.float(5.0));
        let not = b.unary(wabbit_ast::UnaryOp::Not, b.bool(true));
        let plus = b.unary(wabbit_ast::UnaryOp::Plus, b.int(1));
        let program = b.program(&[b.print(neg), b.print(fneg), b.print(not), b.print(plus)]);
        let body = entry_body(&program);

        use wabbit_core::ValueType::*;
        assert_eq!(
            body,
            vec![
                Instruction::ConstI32(5),
                Instruction::ConstI32(-1),
                Instruction::MulI,
                Instruction::Print(Int),
                Instruction::const_f64(5.0),
                Instruction::NegF,
                Instruction::Print(Float),
                Instruction::ConstI32(1),
                Instruction::Eqz,
                Instruction::Print(Bool),
                Instruction::ConstI32(1),
                Instruction::Print(Int),
            ]
        );
    }

    #[test]
    fn casts() {
        use wabbit_core::ValueType::*;

        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let to_float = b.cast(Float, b.int(2));
        let to_int = b.cast(Int, b.float(2.5));
        let to_bool = b.cast(Bool, b.float(0.5));
        let char_to_bool = b.cast(Bool, b.char('x'));
        let body = entry_body(&b.program(&[
            b.print(to_float),
            b.print(to_int),
            b.print(to_bool),
            b.print(char_to_bool),
        ]));

        assert_eq!(
            body,
            vec![
                Instruction::ConstI32(2),
                Instruction::IntToFloat,
                Instruction::Print(Float),
                Instruction::const_f64(2.5),
                Instruction::FloatToInt,
                Instruction::Print(Int),
                Instruction::const_f64(0.5),
                Instruction::const_f64(0.0),
                Instruction::CmpF(Cmp::Ne),
                Instruction::Print(Bool),
                Instruction::ConstI32('x' as i32),
                Instruction::ConstI32(0),
                Instruction::CmpI(Cmp::Ne),
                Instruction::Print(Bool),
            ]
        );
    }

    #[test]
    fn memory_access() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let grow = b.unary(wabbit_ast::UnaryOp::Grow, b.int(1));
        let read = b.load(b.address(b.int(8)));
        let program = b.program(&[
            b.print(grow),
            b.assign(b.address(b.int(8)), b.int(42)),
            b.print(read),
        ]);

        let mut errors: Vec<CompilationError> = Vec::new();
        let checked = check_program(&program, &mut errors);
        let module = lower_program(&checked, "main");
        assert!(module.uses_memory);
        assert_eq!(
            module.entry_function().map(|f| f.body.clone()),
            Some(vec![
                Instruction::ConstI32(1),
                Instruction::GrowMem,
                Instruction::Print(wabbit_core::ValueType::Int),
                Instruction::ConstI32(8),
                Instruction::ConstI32(42),
                Instruction::StoreMem,
                Instruction::ConstI32(8),
                Instruction::LoadMem,
                Instruction::Print(wabbit_core::ValueType::Int),
            ])
        );
    }
}
