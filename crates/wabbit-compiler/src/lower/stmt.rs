//! Statement lowering.

use wabbit_ast::{Definition, Expr, IfStmt, Location, NodeId, Stmt, WhileStmt};
use wabbit_core::ValueType;

use super::{FunctionBuilder, Lowerer};
use crate::ir::Instruction;

impl Lowerer<'_> {
    pub(super) fn lower_stmt(&mut self, stmt: &Stmt<'_>, out: &mut FunctionBuilder) {
        match stmt {
            Stmt::Assign(assign) => match assign.location {
                Location::Named(named) => {
                    self.lower_expr(assign.value, out);
                    out.emit_store(self.slot_for(named.id, named.name));
                }
                Location::Address(addr) => {
                    self.lower_expr(addr.address, out);
                    self.lower_expr(assign.value, out);
                    out.emit(Instruction::StoreMem);
                }
            },
            Stmt::Print(print) => {
                self.lower_expr(print.value, out);
                let ty = self
                    .annotations
                    .type_of(print.value.id())
                    .unwrap_or(ValueType::Int);
                out.emit(Instruction::Print(ty));
            }
            Stmt::If(if_stmt) => self.lower_if(if_stmt, out),
            Stmt::While(while_stmt) => self.lower_while(while_stmt, out),
            Stmt::Break(_) => out.emit(Instruction::Break),
            Stmt::Continue(_) => out.emit(Instruction::Continue),
            Stmt::Return(ret) => {
                if let Some(value) = ret.value {
                    self.lower_expr(value, out);
                }
                out.emit(Instruction::Return);
            }
            Stmt::Def(Definition::Variable(var)) => {
                let ty = self.def_type(var.id, var.ty);
                self.lower_local(var.id, var.name, ty, var.value, out);
            }
            Stmt::Def(Definition::Constant(constant)) => {
                let ty = self.def_type(constant.id, constant.ty);
                self.lower_local(constant.id, constant.name, ty, Some(constant.value), out);
            }
            // Rejected by the checker.
            Stmt::Def(Definition::Function(_)) => {}
        }
    }

    fn lower_stmts(&mut self, stmts: &[Stmt<'_>], out: &mut FunctionBuilder) {
        for stmt in stmts {
            self.lower_stmt(stmt, out);
        }
    }

    /// A definition inside a function body or a nested block. Locals always
    /// start from an explicit store, so a loop body re-entering the
    /// definition sees a fresh value.
    fn lower_local(
        &mut self,
        id: NodeId,
        name: &str,
        ty: ValueType,
        value: Option<&Expr<'_>>,
        out: &mut FunctionBuilder,
    ) {
        match value {
            Some(value) => self.lower_expr(value, out),
            None => out.emit_zero(ty),
        }
        let slot = out.declare_local(name, ty);
        out.emit_store(slot.clone());
        self.slots.insert(id, slot);
    }

    fn lower_if(&mut self, if_stmt: &IfStmt<'_>, out: &mut FunctionBuilder) {
        self.lower_expr(if_stmt.test, out);
        out.emit(Instruction::If);
        self.lower_stmts(if_stmt.consequence.stmts, out);
        if let Some(alternative) = &if_stmt.alternative {
            out.emit(Instruction::Else);
            self.lower_stmts(alternative.stmts, out);
        }
        out.emit(Instruction::EndIf);
    }

    fn lower_while(&mut self, while_stmt: &WhileStmt<'_>, out: &mut FunctionBuilder) {
        out.emit(Instruction::Loop);
        self.lower_expr(while_stmt.test, out);
        out.emit(Instruction::Eqz);
        out.emit(Instruction::BreakIf);
        self.lower_stmts(while_stmt.body.stmts, out);
        out.emit(Instruction::EndLoop);
    }
}
