//! Definition checking: variables, constants and functions.
//!
//! A redefinition in the same scope is an error. Variables, constants and
//! parameters are still rebound to the latest definition; a duplicate
//! function leaves the first one bound.

use wabbit_ast::{ConstantDef, Definition, Expr, FunctionDef, NodeId, VariableDef};
use wabbit_core::{CompilationError, Span, ValueType};

use super::{
    Checker, DefInfo, ErrorSink, FunctionContext, FunctionSig, Storage, Symbol, SymbolKind,
};

impl<S: ErrorSink + ?Sized> Checker<'_, S> {
    pub(super) fn check_definition(&mut self, def: &Definition<'_>) {
        match def {
            Definition::Variable(var) => self.check_variable(var),
            Definition::Constant(constant) => self.check_constant(constant),
            Definition::Function(func) => self.check_function(func),
        }
    }

    fn check_variable(&mut self, var: &VariableDef<'_>) {
        if var.ty.is_none() && var.value.is_none() {
            self.report(CompilationError::MissingTypeAndValue {
                name: var.name.to_string(),
                span: var.span,
            });
        }
        let ty = self.resolve_declared_type(var.name, var.ty, var.value, var.span);
        self.bind_value(var.id, var.name, SymbolKind::Variable, ty, var.span);
    }

    fn check_constant(&mut self, constant: &ConstantDef<'_>) {
        let ty = self.resolve_declared_type(
            constant.name,
            constant.ty,
            Some(constant.value),
            constant.span,
        );
        self.bind_value(
            constant.id,
            constant.name,
            SymbolKind::Constant,
            ty,
            constant.span,
        );
    }

    /// Check the initializer and reconcile it with the declared type.
    ///
    /// The declared type wins when both are present.
    fn resolve_declared_type(
        &mut self,
        name: &str,
        declared: Option<ValueType>,
        value: Option<&Expr<'_>>,
        span: Span,
    ) -> Option<ValueType> {
        let found = value.and_then(|value| self.check_expr(value));
        match (declared, found) {
            (Some(declared), Some(found)) if declared != found => {
                self.report(CompilationError::DeclarationMismatch {
                    name: name.to_string(),
                    declared,
                    found,
                    span,
                });
                Some(declared)
            }
            (Some(declared), _) => Some(declared),
            (None, found) => found,
        }
    }

    /// Register a variable, constant or parameter in the current scope.
    fn bind_value(
        &mut self,
        id: NodeId,
        name: &str,
        kind: SymbolKind,
        ty: Option<ValueType>,
        span: Span,
    ) {
        let storage = self.storage();
        self.annotations.record_def(id, DefInfo { ty, storage });

        if self.scopes.lookup_local(name).is_some() {
            self.report(CompilationError::DuplicateDefinition {
                name: name.to_string(),
                span,
            });
        }
        self.scopes.declare(
            name,
            Symbol {
                kind,
                ty,
                storage,
                def: id,
                span,
            },
        );
    }

    fn check_function(&mut self, func: &FunctionDef<'_>) {
        let sig = FunctionSig {
            params: func.params.iter().map(|param| param.ty).collect(),
            return_type: func.return_type,
        };
        self.annotations.record_def(
            func.id,
            DefInfo {
                ty: Some(func.return_type),
                storage: Storage::Global,
            },
        );

        if !self.scopes.is_global() || self.function.is_some() {
            self.report(CompilationError::NestedFunction {
                name: func.name.to_string(),
                span: func.span,
            });
        } else if self.scopes.lookup_global(func.name).is_some() {
            self.report(CompilationError::DuplicateDefinition {
                name: func.name.to_string(),
                span: func.span,
            });
        } else {
            self.functions.insert(func.name.to_string(), sig.clone());
            self.scopes.declare_global(
                func.name,
                Symbol {
                    kind: SymbolKind::Function(sig),
                    ty: Some(func.return_type),
                    storage: Storage::Global,
                    def: func.id,
                    span: func.span,
                },
            );
        }

        if func.body.is_empty() {
            self.report(CompilationError::EmptyFunctionBody {
                name: func.name.to_string(),
                span: func.span,
            });
        }

        self.scopes.push();
        for param in func.params {
            self.bind_value(
                param.id,
                param.name,
                SymbolKind::Parameter,
                Some(param.ty),
                param.span,
            );
        }

        let outer_function = self.function.replace(FunctionContext {
            name: func.name.to_string(),
            return_type: func.return_type,
        });
        let outer_loops = std::mem::replace(&mut self.loop_depth, 0);

        self.check_stmts(func.body.stmts);

        self.loop_depth = outer_loops;
        self.function = outer_function;
        self.scopes.pop();
    }
}
