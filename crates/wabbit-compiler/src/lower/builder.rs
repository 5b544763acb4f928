//! Per-function instruction builder.

use rustc_hash::FxHashMap;
use wabbit_core::ValueType;

use crate::ir::{Instruction, IrFunction, LocalDecl};

/// Collects the instructions and local slots of one function.
///
/// Every local gets a name that is unique within the function: the first
/// declaration of `x` keeps its name, later ones (shadowing or sibling
/// blocks) become `x.1`, `x.2`, ...
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    params: Vec<LocalDecl>,
    locals: Vec<LocalDecl>,
    result: Option<ValueType>,
    body: Vec<Instruction>,
    /// Times each source name has been declared in this function.
    name_uses: FxHashMap<String, u32>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, result: Option<ValueType>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            locals: Vec::new(),
            result,
            body: Vec::new(),
            name_uses: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ==========================================================================
    // Slots
    // ==========================================================================

    /// Declare a parameter, returning its slot name.
    pub fn declare_param(&mut self, name: &str, ty: ValueType) -> String {
        let unique = self.unique_name(name);
        self.params.push(LocalDecl {
            name: unique.clone(),
            ty,
        });
        unique
    }

    /// Declare a body local, returning its slot name.
    pub fn declare_local(&mut self, name: &str, ty: ValueType) -> String {
        let unique = self.unique_name(name);
        self.locals.push(LocalDecl {
            name: unique.clone(),
            ty,
        });
        unique
    }

    /// Keep `name` free for a module global, so locals never hide it from
    /// the encoder's local-then-global lookup.
    pub fn reserve(&mut self, name: &str) {
        self.name_uses.entry(name.to_string()).or_insert(1);
    }

    fn unique_name(&mut self, name: &str) -> String {
        let uses = self.name_uses.entry(name.to_string()).or_insert(0);
        let unique = match *uses {
            0 => name.to_string(),
            n => format!("{name}.{n}"),
        };
        *uses += 1;
        unique
    }

    // ==========================================================================
    // Emission
    // ==========================================================================

    pub fn emit(&mut self, instr: Instruction) {
        self.body.push(instr);
    }

    pub fn emit_int(&mut self, value: i32) {
        self.emit(Instruction::ConstI32(value));
    }

    pub fn emit_float(&mut self, value: f64) {
        self.emit(Instruction::const_f64(value));
    }

    pub fn emit_load(&mut self, name: impl Into<String>) {
        self.emit(Instruction::Load(name.into()));
    }

    pub fn emit_store(&mut self, name: impl Into<String>) {
        self.emit(Instruction::Store(name.into()));
    }

    /// Push the zero value of a type.
    pub fn emit_zero(&mut self, ty: ValueType) {
        if ty.is_float() {
            self.emit_float(0.0);
        } else {
            self.emit_int(0);
        }
    }

    /// Finish the function.
    ///
    /// A function with a result gets a trailing trap so a path that falls off
    /// the end is still a well-typed body.
    pub fn finish(mut self) -> IrFunction {
        if self.result.is_some() {
            self.emit(Instruction::Unreachable);
        }
        IrFunction {
            name: self.name,
            params: self.params,
            locals: self.locals,
            result: self.result,
            body: self.body,
        }
    }
}
