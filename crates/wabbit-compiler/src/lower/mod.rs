//! Instruction lowering.
//!
//! Turns a [`CheckedProgram`] into an [`IrModule`]:
//!
//! - Variables and constants defined at the top level become module globals.
//!   Initializers that fold to a constant are embedded in the global
//!   declaration; any other initializer leaves a zero placeholder and is
//!   stored by the entry function when the definition is reached.
//! - Top-level function definitions become functions, with parameters bound
//!   to local slots `0..n`.
//! - All other top-level statements go, in order, into the entry function.
//!   Definitions nested in their blocks become locals of the entry function.
//!
//! Lowering trusts the checker: it must only run on a program checked
//! without errors and does not re-validate anything.

mod builder;
mod expr;
mod stmt;

pub use builder::FunctionBuilder;

use rustc_hash::FxHashMap;
use wabbit_ast::{ConstantDef, Definition, Expr, FunctionDef, NodeId, Stmt, VariableDef};
use wabbit_core::ValueType;

use crate::check::{Annotations, CheckedProgram};
use crate::const_eval::{ConstEvaluator, ConstValue};
use crate::ir::{GlobalDecl, IrModule};

/// Name given to the entry function when the program defines a function
/// with the configured entry name itself.
pub const FALLBACK_ENTRY: &str = "_init";

/// Lower a checked program.
///
/// `entry` names the function holding the top-level statements.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn lower_program(checked: &CheckedProgram<'_>, entry: &str) -> IrModule {
    let entry_name = if checked.functions.contains_key(entry) {
        FALLBACK_ENTRY
    } else {
        entry
    };

    let global_names = checked
        .program
        .stmts
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Def(def @ (Definition::Variable(_) | Definition::Constant(_))) => {
                Some(def.name())
            }
            _ => None,
        })
        .collect();

    let mut lowerer = Lowerer::new(&checked.annotations, global_names);
    let mut entry_builder = lowerer.builder(entry_name, None);

    for stmt in checked.program.stmts {
        match stmt {
            Stmt::Def(Definition::Variable(var)) => {
                lowerer.lower_global_variable(var, &mut entry_builder)
            }
            Stmt::Def(Definition::Constant(constant)) => {
                lowerer.lower_global_constant(constant, &mut entry_builder)
            }
            Stmt::Def(Definition::Function(func)) => lowerer.lower_function(func),
            _ => lowerer.lower_stmt(stmt, &mut entry_builder),
        }
    }

    let mut module = IrModule {
        globals: lowerer.globals,
        functions: lowerer.functions,
        entry: entry_name.to_string(),
        uses_memory: checked.annotations.uses_memory(),
    };
    module.functions.push(entry_builder.finish());

    tracing::debug!(
        globals = module.globals.len(),
        functions = module.functions.len(),
        entry = %module.entry,
        "lowered program"
    );
    module
}

/// Lowering state shared by every function of one program.
struct Lowerer<'a> {
    annotations: &'a Annotations,
    /// Names of all module globals.
    global_names: Vec<&'a str>,
    /// Storage name of every lowered definition, by definition node.
    slots: FxHashMap<NodeId, String>,
    /// Folded values of global constants.
    constants: FxHashMap<NodeId, ConstValue>,
    globals: Vec<GlobalDecl>,
    functions: Vec<crate::ir::IrFunction>,
}

impl<'a> Lowerer<'a> {
    fn new(annotations: &'a Annotations, global_names: Vec<&'a str>) -> Self {
        Self {
            annotations,
            global_names,
            slots: FxHashMap::default(),
            constants: FxHashMap::default(),
            globals: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn builder(&self, name: &str, result: Option<ValueType>) -> FunctionBuilder {
        let mut builder = FunctionBuilder::new(name, result);
        for global in &self.global_names {
            builder.reserve(global);
        }
        builder
    }

    /// Resolved type of a definition. Falls back to the declared type, then
    /// to int; a checked program always has a resolved type.
    fn def_type(&self, id: NodeId, declared: Option<ValueType>) -> ValueType {
        self.annotations
            .def(id)
            .and_then(|info| info.ty)
            .or(declared)
            .unwrap_or(ValueType::Int)
    }

    fn fold(&self, expr: &Expr<'_>) -> Option<ConstValue> {
        ConstEvaluator::new(self.annotations, &self.constants).eval(expr)
    }

    /// Storage name a named location resolves to.
    fn slot_for(&self, reference: NodeId, name: &str) -> String {
        self.annotations
            .resolution(reference)
            .and_then(|def| self.slots.get(&def))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    // ==========================================================================
    // Globals
    // ==========================================================================

    fn lower_global_variable(&mut self, var: &VariableDef<'_>, entry: &mut FunctionBuilder) {
        let ty = self.def_type(var.id, var.ty);
        self.declare_global(var.id, var.name, ty, true, var.value, entry);
    }

    fn lower_global_constant(&mut self, constant: &ConstantDef<'_>, entry: &mut FunctionBuilder) {
        let ty = self.def_type(constant.id, constant.ty);
        self.declare_global(constant.id, constant.name, ty, false, Some(constant.value), entry);
    }

    fn declare_global(
        &mut self,
        id: NodeId,
        name: &str,
        ty: ValueType,
        is_constant: bool,
        value: Option<&Expr<'_>>,
        entry: &mut FunctionBuilder,
    ) {
        let folded = value.and_then(|value| self.fold(value));
        let (init, mutable) = match folded {
            Some(init) => {
                if is_constant {
                    self.constants.insert(id, init);
                }
                (init, !is_constant)
            }
            // Initialized at run time, so the global must be writable.
            None => (ConstValue::zero(ty), true),
        };

        self.slots.insert(id, name.to_string());
        self.globals.push(GlobalDecl {
            name: name.to_string(),
            ty,
            mutable,
            init,
        });

        if folded.is_none()
            && let Some(value) = value
        {
            self.lower_expr(value, entry);
            entry.emit_store(name);
        }
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    fn lower_function(&mut self, func: &FunctionDef<'_>) {
        let mut builder = self.builder(func.name, Some(func.return_type));
        for param in func.params {
            let slot = builder.declare_param(param.name, param.ty);
            self.slots.insert(param.id, slot);
        }
        for stmt in func.body.stmts {
            self.lower_stmt(stmt, &mut builder);
        }

        let lowered = builder.finish();
        tracing::debug!(
            function = %lowered.name,
            instructions = lowered.body.len(),
            "lowered function"
        );
        self.functions.push(lowered);
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use wabbit_ast::{AstBuilder, BinaryOp, Program};
    use wabbit_core::CompilationError;

    use super::*;
    use crate::check::check_program;
    use crate::ir::{Instruction, IrFunction};

    fn lower(program: &Program<'_>) -> IrModule {
        let mut errors: Vec<CompilationError> = Vec::new();
        let checked = check_program(program, &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        lower_program(&checked, "main")
    }

    fn entry(module: &IrModule) -> &IrFunction {
        module.entry_function().expect("entry function")
    }

    #[test]
    fn print_arithmetic() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let product = b.binary(BinaryOp::Mul, b.int(3), b.int(4));
        let sum = b.binary(BinaryOp::Add, b.int(2), product);
        let module = lower(&b.program(&[b.print(sum)]));

        assert!(module.globals.is_empty());
        assert_eq!(module.functions.len(), 1);
        assert_eq!(
            entry(&module).body,
            vec![
                Instruction::ConstI32(2),
                Instruction::ConstI32(3),
                Instruction::ConstI32(4),
                Instruction::MulI,
                Instruction::AddI,
                Instruction::Print(ValueType::Int),
            ]
        );
    }

    #[test]
    fn constant_globals_are_folded() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let double = b.binary(BinaryOp::Mul, b.var("pi"), b.int(2));
        let module = lower(&b.program(&[
            b.constant("pi", None, b.int(3)),
            b.constant("tau", None, double),
            b.print(b.var("tau")),
        ]));

        assert_eq!(
            module.globals,
            vec![
                GlobalDecl {
                    name: "pi".into(),
                    ty: ValueType::Int,
                    mutable: false,
                    init: ConstValue::Int(3),
                },
                GlobalDecl {
                    name: "tau".into(),
                    ty: ValueType::Int,
                    mutable: false,
                    init: ConstValue::Int(6),
                },
            ]
        );
        assert_eq!(
            entry(&module).body,
            vec![
                Instruction::Load("tau".into()),
                Instruction::Print(ValueType::Int)
            ]
        );
    }

    #[test]
    fn runtime_initializer_stores_into_placeholder() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[b.return_stmt(Some(b.int(7)))]);
        let module = lower(&b.program(&[
            b.function("seven", &[], ValueType::Int, body),
            b.constant("c", None, b.call("seven", &[])),
        ]));

        assert_eq!(
            module.globals,
            vec![GlobalDecl {
                name: "c".into(),
                ty: ValueType::Int,
                mutable: true,
                init: ConstValue::Int(0),
            }]
        );
        assert_eq!(
            entry(&module).body,
            vec![
                Instruction::Call {
                    name: "seven".into(),
                    params: 0,
                    results: 1
                },
                Instruction::Store("c".into()),
            ]
        );
    }

    #[test]
    fn variable_initializer_is_embedded() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let module = lower(&b.program(&[
            b.variable("x", None, Some(b.float(1.5))),
            b.variable("y", Some(ValueType::Bool), None),
        ]));

        assert_eq!(module.globals[0].init, ConstValue::Float(1.5));
        assert!(module.globals[0].mutable);
        assert_eq!(module.globals[1].init, ConstValue::Bool(false));
        assert!(entry(&module).body.is_empty());
    }

    #[test]
    fn entry_renamed_when_main_is_defined() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[b.return_stmt(Some(b.int(0)))]);
        let module = lower(&b.program(&[
            b.function("main", &[], ValueType::Int, body),
            b.print(b.call("main", &[])),
        ]));

        assert_eq!(module.entry, FALLBACK_ENTRY);
        assert_eq!(module.functions.len(), 2);
        assert_eq!(module.functions[0].name, "main");
        assert_eq!(module.functions[1].name, FALLBACK_ENTRY);
    }
}
