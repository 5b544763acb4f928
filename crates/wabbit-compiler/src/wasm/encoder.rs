//! Module encoder.
//!
//! Registration comes first: imports, globals and function signatures are
//! declared up front so every name has its final index. Bodies are encoded
//! afterwards, in any order, and [`ModuleEncoder::finish`] assembles the
//! sections.

use rustc_hash::FxHashMap;
use wabbit_core::{EncodeError, ValueType};

use super::control::ControlStack;
use super::leb128;
use super::opcode::{BLOCK_EMPTY, ExportKind, FUNC_TYPE, I32_ALIGN, Opcode, ValType};
use super::section::{SectionId, write_name, write_section, write_sized, write_vec};
use crate::const_eval::ConstValue;
use crate::ir::{Cmp, GlobalDecl, Instruction, IrFunction};

/// `\0asm`
pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];
pub const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Name the linear memory is exported under.
pub const MEMORY_EXPORT: &str = "memory";

/// A function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FuncType {
    params: Vec<ValType>,
    results: Vec<ValType>,
}

impl FuncType {
    fn new(params: &[ValueType], result: Option<ValueType>) -> Self {
        Self {
            params: params.iter().copied().map(ValType::from).collect(),
            results: result.into_iter().map(ValType::from).collect(),
        }
    }
}

#[derive(Debug)]
struct Import {
    module: String,
    name: String,
    type_index: u32,
}

#[derive(Debug)]
struct Function {
    name: String,
    type_index: u32,
    body: Option<Vec<u8>>,
}

#[derive(Debug)]
struct Global {
    ty: ValType,
    mutable: bool,
    init: ConstValue,
}

/// Builds one binary module.
#[derive(Debug, Default)]
pub struct ModuleEncoder {
    types: Vec<FuncType>,
    type_indices: FxHashMap<FuncType, u32>,
    imports: Vec<Import>,
    functions: Vec<Function>,
    /// Index of every import and defined function, by name.
    function_indices: FxHashMap<String, u32>,
    globals: Vec<Global>,
    global_indices: FxHashMap<String, u32>,
    /// `Some(exported)` once memory is enabled.
    memory: Option<bool>,
}

impl ModuleEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern_type(&mut self, ty: FuncType) -> u32 {
        if let Some(&index) = self.type_indices.get(&ty) {
            return index;
        }
        let index = self.types.len() as u32;
        self.types.push(ty.clone());
        self.type_indices.insert(ty, index);
        index
    }

    fn reserve_function_name(&mut self, name: &str) -> Result<u32, EncodeError> {
        if self.function_indices.contains_key(name) {
            return Err(EncodeError::DuplicateFunction {
                name: name.to_string(),
            });
        }
        let index = (self.imports.len() + self.functions.len()) as u32;
        self.function_indices.insert(name.to_string(), index);
        Ok(index)
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Import a host function. Imports take the lowest function indices, so
    /// all of them must be declared before the first defined function.
    pub fn import_function(
        &mut self,
        module: &str,
        name: &str,
        params: &[ValueType],
        result: Option<ValueType>,
    ) -> Result<u32, EncodeError> {
        if !self.functions.is_empty() {
            return Err(EncodeError::ImportAfterFunction {
                name: name.to_string(),
            });
        }
        let index = self.reserve_function_name(name)?;
        let type_index = self.intern_type(FuncType::new(params, result));
        self.imports.push(Import {
            module: module.to_string(),
            name: name.to_string(),
            type_index,
        });
        Ok(index)
    }

    /// Declare a defined function. Its body is supplied later through
    /// [`encode_function`](Self::encode_function).
    pub fn declare_function(
        &mut self,
        name: &str,
        params: &[ValueType],
        result: Option<ValueType>,
    ) -> Result<u32, EncodeError> {
        let index = self.reserve_function_name(name)?;
        let type_index = self.intern_type(FuncType::new(params, result));
        self.functions.push(Function {
            name: name.to_string(),
            type_index,
            body: None,
        });
        Ok(index)
    }

    /// Register a global; slots are assigned in declaration order.
    pub fn declare_global(&mut self, global: &GlobalDecl) -> Result<u32, EncodeError> {
        if self.global_indices.contains_key(&global.name) {
            return Err(EncodeError::DuplicateGlobal {
                name: global.name.clone(),
            });
        }
        let index = self.globals.len() as u32;
        self.globals.push(Global {
            ty: global.ty.into(),
            mutable: global.mutable,
            init: global.init,
        });
        self.global_indices.insert(global.name.clone(), index);
        Ok(index)
    }

    /// Add a one-page linear memory.
    pub fn enable_memory(&mut self, export: bool) {
        self.memory = Some(export);
    }

    pub fn function_index(&self, name: &str) -> Option<u32> {
        self.function_indices.get(name).copied()
    }

    pub fn global_index(&self, name: &str) -> Option<u32> {
        self.global_indices.get(name).copied()
    }

    // ==========================================================================
    // Bodies
    // ==========================================================================

    /// Encode the body of a declared function.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn encode_function(&mut self, func: &IrFunction) -> Result<(), EncodeError> {
        let position = self
            .function_indices
            .get(&func.name)
            .and_then(|&index| (index as usize).checked_sub(self.imports.len()))
            .ok_or_else(|| EncodeError::UnknownFunction {
                name: func.name.clone(),
            })?;
        if self.functions[position].body.is_some() {
            return Err(EncodeError::DuplicateBody {
                name: func.name.clone(),
            });
        }

        let body = BodyEncoder::new(self, func).encode()?;
        tracing::trace!(function = %func.name, size = body.len(), "encoded body");
        self.functions[position].body = Some(body);
        Ok(())
    }

    // ==========================================================================
    // Assembly
    // ==========================================================================

    /// Assemble the module. Every declared function must have a body.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finish(self) -> Result<Vec<u8>, EncodeError> {
        let mut bodies = Vec::with_capacity(self.functions.len());
        for func in &self.functions {
            let body = func.body.as_deref().ok_or_else(|| EncodeError::MissingBody {
                name: func.name.clone(),
            })?;
            bodies.push(body);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION);

        let mut payload = Vec::new();

        if !self.types.is_empty() {
            write_vec(&mut payload, &self.types, |out, ty| {
                out.push(FUNC_TYPE);
                write_vec(out, &ty.params, |out, v| out.push((*v).into()));
                write_vec(out, &ty.results, |out, v| out.push((*v).into()));
            });
            emit_section(&mut out, SectionId::Type, &mut payload);
        }

        if !self.imports.is_empty() {
            write_vec(&mut payload, &self.imports, |out, import| {
                write_name(out, &import.module);
                write_name(out, &import.name);
                out.push(ExportKind::Func.into());
                leb128::write_unsigned(out, u64::from(import.type_index));
            });
            emit_section(&mut out, SectionId::Import, &mut payload);
        }

        if !self.functions.is_empty() {
            write_vec(&mut payload, &self.functions, |out, func| {
                leb128::write_unsigned(out, u64::from(func.type_index));
            });
            emit_section(&mut out, SectionId::Function, &mut payload);
        }

        if self.memory.is_some() {
            // One memory, limits flag 0 (no maximum), one page minimum.
            payload.extend_from_slice(&[0x01, 0x00, 0x01]);
            emit_section(&mut out, SectionId::Memory, &mut payload);
        }

        if !self.globals.is_empty() {
            write_vec(&mut payload, &self.globals, |out, global| {
                out.push(global.ty.into());
                out.push(u8::from(global.mutable));
                write_const(out, global.ty, global.init);
                out.push(Opcode::End.into());
            });
            emit_section(&mut out, SectionId::Global, &mut payload);
        }

        let export_memory = self.memory == Some(true);
        if !self.functions.is_empty() || export_memory {
            let count = self.functions.len() + usize::from(export_memory);
            leb128::write_unsigned(&mut payload, count as u64);
            for (i, func) in self.functions.iter().enumerate() {
                write_name(&mut payload, &func.name);
                payload.push(ExportKind::Func.into());
                leb128::write_unsigned(&mut payload, (self.imports.len() + i) as u64);
            }
            if export_memory {
                write_name(&mut payload, MEMORY_EXPORT);
                payload.push(ExportKind::Memory.into());
                leb128::write_unsigned(&mut payload, 0);
            }
            emit_section(&mut out, SectionId::Export, &mut payload);
        }

        if !bodies.is_empty() {
            write_vec(&mut payload, &bodies, |out, body| write_sized(out, body));
            emit_section(&mut out, SectionId::Code, &mut payload);
        }

        tracing::debug!(
            size = out.len(),
            types = self.types.len(),
            imports = self.imports.len(),
            functions = self.functions.len(),
            globals = self.globals.len(),
            "encoded module"
        );
        Ok(out)
    }
}

/// Write a finished section payload and reset the scratch buffer.
fn emit_section(out: &mut Vec<u8>, id: SectionId, payload: &mut Vec<u8>) {
    tracing::trace!(section = ?id, size = payload.len(), "section");
    write_section(out, id, payload);
    payload.clear();
}

/// Constant push of `value` in the representation of `ty`.
fn write_const(out: &mut Vec<u8>, ty: ValType, value: ConstValue) {
    match ty {
        ValType::I32 => {
            out.push(Opcode::I32Const.into());
            leb128::write_signed(out, i64::from(value.as_i32().unwrap_or(0)));
        }
        ValType::F64 => {
            out.push(Opcode::F64Const.into());
            out.extend_from_slice(&value.as_f64().unwrap_or(0.0).to_le_bytes());
        }
    }
}

/// Encodes one function body against the module's registered names.
struct BodyEncoder<'m> {
    module: &'m ModuleEncoder,
    func: &'m IrFunction,
    /// Local index of every parameter and local, by slot name.
    locals: FxHashMap<&'m str, u32>,
    control: ControlStack,
    code: Vec<u8>,
}

impl<'m> BodyEncoder<'m> {
    fn new(module: &'m ModuleEncoder, func: &'m IrFunction) -> Self {
        let locals = func
            .params
            .iter()
            .chain(&func.locals)
            .enumerate()
            .map(|(i, local)| (local.name.as_str(), i as u32))
            .collect();
        let mut code = Vec::new();
        write_local_groups(&mut code, func);
        Self {
            module,
            func,
            locals,
            control: ControlStack::new(),
            code,
        }
    }

    fn encode(mut self) -> Result<Vec<u8>, EncodeError> {
        let func = self.func;
        for instr in &func.body {
            self.instruction(instr)?;
        }
        if !self.control.is_empty() {
            return Err(self.unbalanced("unclosed control construct"));
        }
        self.op(Opcode::End);
        Ok(self.code)
    }

    fn unbalanced(&self, detail: &'static str) -> EncodeError {
        EncodeError::UnbalancedControl {
            function: self.func.name.clone(),
            detail,
        }
    }

    fn op(&mut self, op: Opcode) {
        self.code.push(op.into());
    }

    fn op_index(&mut self, op: Opcode, index: u32) {
        self.op(op);
        leb128::write_unsigned(&mut self.code, u64::from(index));
    }

    fn call(&mut self, name: &str) -> Result<(), EncodeError> {
        let index = self
            .module
            .function_index(name)
            .ok_or_else(|| EncodeError::UnknownFunction {
                name: name.to_string(),
            })?;
        self.op_index(Opcode::Call, index);
        Ok(())
    }

    fn variable(&mut self, name: &str, local: Opcode, global: Opcode) -> Result<(), EncodeError> {
        if let Some(&index) = self.locals.get(name) {
            self.op_index(local, index);
        } else if let Some(index) = self.module.global_index(name) {
            self.op_index(global, index);
        } else {
            return Err(EncodeError::UnknownVariable {
                name: name.to_string(),
                function: self.func.name.clone(),
            });
        }
        Ok(())
    }

    fn instruction(&mut self, instr: &Instruction) -> Result<(), EncodeError> {
        use Instruction::*;
        match instr {
            ConstI32(value) => {
                self.op(Opcode::I32Const);
                leb128::write_signed(&mut self.code, i64::from(*value));
            }
            ConstF64(value) => {
                self.op(Opcode::F64Const);
                self.code.extend_from_slice(&value.0.to_le_bytes());
            }
            Load(name) => self.variable(name, Opcode::LocalGet, Opcode::GlobalGet)?,
            Store(name) => self.variable(name, Opcode::LocalSet, Opcode::GlobalSet)?,
            LoadMem => self.memory_access(Opcode::I32Load),
            StoreMem => self.memory_access(Opcode::I32Store),
            GrowMem => {
                self.op(Opcode::MemoryGrow);
                self.code.push(0x00);
            }
            AddI => self.op(Opcode::I32Add),
            SubI => self.op(Opcode::I32Sub),
            MulI => self.op(Opcode::I32Mul),
            DivI => self.op(Opcode::I32DivS),
            AddF => self.op(Opcode::F64Add),
            SubF => self.op(Opcode::F64Sub),
            MulF => self.op(Opcode::F64Mul),
            DivF => self.op(Opcode::F64Div),
            NegF => self.op(Opcode::F64Neg),
            CmpI(cmp) => self.op(int_comparison(*cmp)),
            CmpF(cmp) => self.op(float_comparison(*cmp)),
            And => self.op(Opcode::I32And),
            Or => self.op(Opcode::I32Or),
            Eqz => self.op(Opcode::I32Eqz),
            IntToFloat => self.op(Opcode::F64ConvertI32S),
            FloatToInt => self.op(Opcode::I32TruncF64S),
            Print(ty) => self.call(print_import(*ty))?,
            Call { name, .. } => self.call(name)?,
            Return => self.op(Opcode::Return),
            Drop => self.op(Opcode::Drop),
            Unreachable => self.op(Opcode::Unreachable),
            If => {
                self.control.enter_if();
                self.op(Opcode::If);
                self.code.push(BLOCK_EMPTY);
            }
            Else => {
                self.control.enter_else().map_err(|d| self.unbalanced(d))?;
                self.op(Opcode::Else);
            }
            EndIf => {
                self.control.exit_if().map_err(|d| self.unbalanced(d))?;
                self.op(Opcode::End);
            }
            Loop => {
                self.control.enter_loop();
                self.op(Opcode::Block);
                self.code.push(BLOCK_EMPTY);
                self.op(Opcode::Loop);
                self.code.push(BLOCK_EMPTY);
            }
            EndLoop => {
                self.control.exit_loop().map_err(|d| self.unbalanced(d))?;
                // Jump back to re-test, then close the loop and its block.
                self.op_index(Opcode::Br, 0);
                self.op(Opcode::End);
                self.op(Opcode::End);
            }
            BreakIf => {
                let depth = self.control.break_depth().map_err(|d| self.unbalanced(d))?;
                self.op_index(Opcode::BrIf, depth);
            }
            Break => {
                let depth = self.control.break_depth().map_err(|d| self.unbalanced(d))?;
                self.op_index(Opcode::Br, depth);
            }
            Continue => {
                let depth = self
                    .control
                    .continue_depth()
                    .map_err(|d| self.unbalanced(d))?;
                self.op_index(Opcode::Br, depth);
            }
        }
        Ok(())
    }

    fn memory_access(&mut self, op: Opcode) {
        self.op(op);
        leb128::write_unsigned(&mut self.code, u64::from(I32_ALIGN));
        leb128::write_unsigned(&mut self.code, 0);
    }
}

/// Local declarations as run-length groups of one value type.
fn write_local_groups(out: &mut Vec<u8>, func: &IrFunction) {
    let mut groups: Vec<(u32, ValType)> = Vec::new();
    for local in &func.locals {
        let ty = ValType::from(local.ty);
        match groups.last_mut() {
            Some((count, last)) if *last == ty => *count += 1,
            _ => groups.push((1, ty)),
        }
    }
    write_vec(out, &groups, |out, (count, ty)| {
        leb128::write_unsigned(out, u64::from(*count));
        out.push((*ty).into());
    });
}

/// Runtime import that prints a value of `ty`.
pub fn print_import(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Int => "_printi",
        ValueType::Float => "_printf",
        ValueType::Bool => "_printb",
        ValueType::Char => "_printc",
    }
}

fn int_comparison(cmp: Cmp) -> Opcode {
    match cmp {
        Cmp::Eq => Opcode::I32Eq,
        Cmp::Ne => Opcode::I32Ne,
        Cmp::Lt => Opcode::I32LtS,
        Cmp::Le => Opcode::I32LeS,
        Cmp::Gt => Opcode::I32GtS,
        Cmp::Ge => Opcode::I32GeS,
    }
}

fn float_comparison(cmp: Cmp) -> Opcode {
    match cmp {
        Cmp::Eq => Opcode::F64Eq,
        Cmp::Ne => Opcode::F64Ne,
        Cmp::Lt => Opcode::F64Lt,
        Cmp::Le => Opcode::F64Le,
        Cmp::Gt => Opcode::F64Gt,
        Cmp::Ge => Opcode::F64Ge,
    }
}
