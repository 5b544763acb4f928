//! Interpreter for lowered modules.
//!
//! Runs an [`IrModule`] with the semantics of the encoded module: wrapping
//! integer arithmetic, WebAssembly traps, and one page of linear memory when
//! the module uses memory. Printed values are captured instead of written
//! anywhere, which makes the interpreter a behavioral oracle for lowering.

use rustc_hash::FxHashMap;
use wabbit_core::{RuntimeError, ValueType};

use super::{Cmp, Instruction, IrFunction, IrModule};
use crate::const_eval::ConstValue;

/// Bytes in one page of linear memory.
pub const PAGE_SIZE: usize = 65536;

/// Default limit on nested calls.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Default limit on memory growth, in pages.
pub const DEFAULT_MAX_PAGES: u32 = 256;

// ============================================================================
// Values
// ============================================================================

/// A run-time value. Ints, bools and chars share the `I32` representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    F64(f64),
}

impl Value {
    pub fn zero(ty: ValueType) -> Self {
        if ty.is_float() {
            Value::F64(0.0)
        } else {
            Value::I32(0)
        }
    }

    /// Whether this value has the representation of `ty`.
    pub fn fits(self, ty: ValueType) -> bool {
        matches!(self, Value::F64(_)) == ty.is_float()
    }

    /// Read this value back as a `ty`.
    pub fn to_const(self, ty: ValueType) -> Option<ConstValue> {
        match (self, ty) {
            (Value::I32(v), ValueType::Int) => Some(ConstValue::Int(v)),
            (Value::I32(v), ValueType::Bool) => Some(ConstValue::Bool(v != 0)),
            (Value::I32(v), ValueType::Char) => char::from_u32(v as u32).map(ConstValue::Char),
            (Value::F64(v), ValueType::Float) => Some(ConstValue::Float(v)),
            _ => None,
        }
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        match value.as_f64() {
            Some(v) => Value::F64(v),
            None => Value::I32(value.as_i32().unwrap_or(0)),
        }
    }
}

// ============================================================================
// Branch targets
// ============================================================================

enum Open {
    If { at: usize, else_at: Option<usize> },
    Loop { at: usize, exits: Vec<usize> },
}

/// Resolve where each control instruction continues when its branch is
/// taken. Entries for other instructions are unused.
fn branch_targets(func: &IrFunction) -> Result<Vec<usize>, RuntimeError> {
    let unbalanced = |detail| RuntimeError::UnbalancedControl {
        function: func.name.clone(),
        detail,
    };

    let mut targets = vec![0; func.body.len()];
    let mut open: Vec<Open> = Vec::new();
    for (pc, instr) in func.body.iter().enumerate() {
        match instr {
            Instruction::If => open.push(Open::If {
                at: pc,
                else_at: None,
            }),
            Instruction::Else => match open.last_mut() {
                Some(Open::If { at, else_at }) if else_at.is_none() => {
                    targets[*at] = pc + 1;
                    *else_at = Some(pc);
                }
                _ => return Err(unbalanced("else without if")),
            },
            Instruction::EndIf => match open.pop() {
                Some(Open::If { at, else_at }) => targets[else_at.unwrap_or(at)] = pc,
                _ => return Err(unbalanced("endif without if")),
            },
            Instruction::Loop => open.push(Open::Loop {
                at: pc,
                exits: Vec::new(),
            }),
            Instruction::EndLoop => match open.pop() {
                Some(Open::Loop { at, exits }) => {
                    targets[pc] = at + 1;
                    for exit in exits {
                        targets[exit] = pc + 1;
                    }
                }
                _ => return Err(unbalanced("endloop without loop")),
            },
            Instruction::Break | Instruction::BreakIf | Instruction::Continue => {
                let innermost = open.iter_mut().rev().find_map(|block| match block {
                    Open::Loop { at, exits } => Some((*at, exits)),
                    Open::If { .. } => None,
                });
                let Some((at, exits)) = innermost else {
                    return Err(unbalanced("branch outside a loop"));
                };
                if *instr == Instruction::Continue {
                    targets[pc] = at + 1;
                } else {
                    exits.push(pc);
                }
            }
            _ => {}
        }
    }

    if open.is_empty() {
        Ok(targets)
    } else {
        Err(unbalanced("unclosed block"))
    }
}

// ============================================================================
// Machine state
// ============================================================================

/// State shared by every call: globals, memory and captured output.
#[derive(Debug)]
struct Machine {
    globals: FxHashMap<String, Value>,
    memory: Vec<u8>,
    max_pages: u32,
    output: Vec<ConstValue>,
    fuel: Option<u64>,
    steps: u64,
}

impl Machine {
    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        match self.fuel {
            Some(fuel) if self.steps > fuel => Err(RuntimeError::OutOfFuel { steps: fuel }),
            _ => Ok(()),
        }
    }

    fn word(&self, address: i32) -> Option<std::ops::Range<usize>> {
        let start = address as u32 as usize;
        let end = start.checked_add(4)?;
        (end <= self.memory.len()).then_some(start..end)
    }

    fn load(&self, address: i32) -> Option<i32> {
        let bytes = self.memory.get(self.word(address)?)?;
        Some(i32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn store(&mut self, address: i32, value: i32) -> Option<()> {
        let range = self.word(address)?;
        self.memory[range].copy_from_slice(&value.to_le_bytes());
        Some(())
    }

    /// Grow memory by `pages`, returning the previous size or -1.
    fn grow(&mut self, pages: i32) -> i32 {
        let current = (self.memory.len() / PAGE_SIZE) as u32;
        let Some(new) = current
            .checked_add(pages as u32)
            .filter(|&new| new <= self.max_pages)
        else {
            return -1;
        };
        self.memory.resize(new as usize * PAGE_SIZE, 0);
        current as i32
    }
}

/// One activation: locals by slot name and an operand stack.
struct Frame<'m> {
    func: &'m IrFunction,
    locals: FxHashMap<&'m str, Value>,
    stack: Vec<Value>,
}

impl<'m> Frame<'m> {
    fn new(func: &'m IrFunction, args: Vec<Value>) -> Result<Self, RuntimeError> {
        let args_fit = args.len() == func.params.len()
            && args.iter().zip(func.param_types()).all(|(arg, ty)| arg.fits(ty));
        if !args_fit {
            return Err(RuntimeError::OperandMismatch {
                function: func.name.clone(),
                instruction: format!("call {}", func.name),
            });
        }

        let mut locals = FxHashMap::default();
        for (param, arg) in func.params.iter().zip(args) {
            locals.insert(param.name.as_str(), arg);
        }
        for local in &func.locals {
            locals.insert(local.name.as_str(), Value::zero(local.ty));
        }
        Ok(Self {
            func,
            locals,
            stack: Vec::new(),
        })
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self, instr: &Instruction) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
            function: self.func.name.clone(),
            instruction: instr.to_string(),
        })
    }

    fn pop_i32(&mut self, instr: &Instruction) -> Result<i32, RuntimeError> {
        match self.pop(instr)? {
            Value::I32(v) => Ok(v),
            Value::F64(_) => Err(self.mismatch(instr)),
        }
    }

    fn pop_f64(&mut self, instr: &Instruction) -> Result<f64, RuntimeError> {
        match self.pop(instr)? {
            Value::F64(v) => Ok(v),
            Value::I32(_) => Err(self.mismatch(instr)),
        }
    }

    fn mismatch(&self, instr: &Instruction) -> RuntimeError {
        RuntimeError::OperandMismatch {
            function: self.func.name.clone(),
            instruction: instr.to_string(),
        }
    }

    fn trap(&self, make: fn(String) -> RuntimeError) -> RuntimeError {
        make(self.func.name.clone())
    }

    fn unknown(&self, name: &str) -> RuntimeError {
        RuntimeError::UnknownVariable {
            name: name.to_string(),
            function: self.func.name.clone(),
        }
    }

    /// Locals shadow globals, as in the encoder.
    fn load(&self, name: &str, globals: &FxHashMap<String, Value>) -> Result<Value, RuntimeError> {
        self.locals
            .get(name)
            .or_else(|| globals.get(name))
            .copied()
            .ok_or_else(|| self.unknown(name))
    }

    fn store(
        &mut self,
        name: &str,
        value: Value,
        globals: &mut FxHashMap<String, Value>,
    ) -> Result<(), RuntimeError> {
        if let Some(slot) = self.locals.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match globals.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.unknown(name)),
        }
    }

    fn int_op(
        &mut self,
        instr: &Instruction,
        op: impl FnOnce(i32, i32) -> Result<i32, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let right = self.pop_i32(instr)?;
        let left = self.pop_i32(instr)?;
        self.push(Value::I32(op(left, right)?));
        Ok(())
    }

    fn float_op(
        &mut self,
        instr: &Instruction,
        op: impl FnOnce(f64, f64) -> Value,
    ) -> Result<(), RuntimeError> {
        let right = self.pop_f64(instr)?;
        let left = self.pop_f64(instr)?;
        self.push(op(left, right));
        Ok(())
    }
}

fn compare<T: PartialOrd>(cmp: Cmp, left: T, right: T) -> i32 {
    let holds = match cmp {
        Cmp::Eq => left == right,
        Cmp::Ne => left != right,
        Cmp::Lt => left < right,
        Cmp::Le => left <= right,
        Cmp::Gt => left > right,
        Cmp::Ge => left >= right,
    };
    i32::from(holds)
}

// ============================================================================
// Interpreter
// ============================================================================

struct Compiled<'m> {
    func: &'m IrFunction,
    targets: Vec<usize>,
}

/// The immutable half of the interpreter: functions and their branch tables.
struct Code<'m> {
    functions: FxHashMap<&'m str, Compiled<'m>>,
    max_depth: usize,
}

impl<'m> Code<'m> {
    fn call(
        &self,
        machine: &mut Machine,
        name: &str,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        if depth >= self.max_depth {
            return Err(RuntimeError::CallStackExhausted { depth });
        }
        let compiled = self
            .functions
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownFunction {
                name: name.to_string(),
            })?;
        let func = compiled.func;
        let mut frame = Frame::new(func, args)?;

        let mut pc = 0;
        while let Some(instr) = func.body.get(pc) {
            machine.tick()?;
            let at = pc;
            pc += 1;

            use Instruction::*;
            match instr {
                ConstI32(v) => frame.push(Value::I32(*v)),
                ConstF64(v) => frame.push(Value::F64(v.0)),
                Load(name) => {
                    let value = frame.load(name, &machine.globals)?;
                    frame.push(value);
                }
                Store(name) => {
                    let value = frame.pop(instr)?;
                    frame.store(name, value, &mut machine.globals)?;
                }
                LoadMem => {
                    let address = frame.pop_i32(instr)?;
                    let value = machine.load(address).ok_or_else(|| {
                        RuntimeError::MemoryOutOfBounds {
                            address: address as u32,
                            function: func.name.clone(),
                        }
                    })?;
                    frame.push(Value::I32(value));
                }
                StoreMem => {
                    let value = frame.pop_i32(instr)?;
                    let address = frame.pop_i32(instr)?;
                    machine.store(address, value).ok_or_else(|| {
                        RuntimeError::MemoryOutOfBounds {
                            address: address as u32,
                            function: func.name.clone(),
                        }
                    })?;
                }
                GrowMem => {
                    let pages = frame.pop_i32(instr)?;
                    frame.push(Value::I32(machine.grow(pages)));
                }

                AddI => frame.int_op(instr, |a, b| Ok(a.wrapping_add(b)))?,
                SubI => frame.int_op(instr, |a, b| Ok(a.wrapping_sub(b)))?,
                MulI => frame.int_op(instr, |a, b| Ok(a.wrapping_mul(b)))?,
                DivI => {
                    let name = &func.name;
                    frame.int_op(instr, |a, b| {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero {
                                function: name.clone(),
                            });
                        }
                        a.checked_div(b)
                            .ok_or_else(|| RuntimeError::IntegerOverflow {
                                function: name.clone(),
                            })
                    })?
                }

                AddF => frame.float_op(instr, |a, b| Value::F64(a + b))?,
                SubF => frame.float_op(instr, |a, b| Value::F64(a - b))?,
                MulF => frame.float_op(instr, |a, b| Value::F64(a * b))?,
                DivF => frame.float_op(instr, |a, b| Value::F64(a / b))?,
                NegF => {
                    let value = frame.pop_f64(instr)?;
                    frame.push(Value::F64(-value));
                }

                CmpI(cmp) => frame.int_op(instr, |a, b| Ok(compare(*cmp, a, b)))?,
                CmpF(cmp) => frame.float_op(instr, |a, b| Value::I32(compare(*cmp, a, b)))?,
                And => frame.int_op(instr, |a, b| Ok(a & b))?,
                Or => frame.int_op(instr, |a, b| Ok(a | b))?,
                Eqz => {
                    let value = frame.pop_i32(instr)?;
                    frame.push(Value::I32(i32::from(value == 0)));
                }

                IntToFloat => {
                    let value = frame.pop_i32(instr)?;
                    frame.push(Value::F64(f64::from(value)));
                }
                FloatToInt => {
                    let value = frame.pop_f64(instr)?;
                    if value.is_nan() {
                        return Err(frame.trap(|function| RuntimeError::InvalidConversion {
                            function,
                        }));
                    }
                    let truncated = value.trunc();
                    if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
                        return Err(frame.trap(|function| RuntimeError::IntegerOverflow {
                            function,
                        }));
                    }
                    frame.push(Value::I32(truncated as i32));
                }

                Print(ty) => {
                    let value = frame.pop(instr)?;
                    let printed = value.to_const(*ty).ok_or_else(|| frame.mismatch(instr))?;
                    tracing::trace!(value = %printed, "print");
                    machine.output.push(printed);
                }
                Call {
                    name: callee,
                    params,
                    ..
                } => {
                    let count = *params as usize;
                    let Some(split) = frame.stack.len().checked_sub(count) else {
                        return Err(RuntimeError::StackUnderflow {
                            function: func.name.clone(),
                            instruction: instr.to_string(),
                        });
                    };
                    let args = frame.stack.split_off(split);
                    if let Some(result) = self.call(machine, callee, args, depth + 1)? {
                        frame.push(result);
                    }
                }
                Return => {
                    return match func.result {
                        Some(_) => frame.pop(instr).map(Some),
                        None => Ok(None),
                    };
                }
                Drop => {
                    frame.pop(instr)?;
                }
                Unreachable => {
                    return Err(frame.trap(|function| RuntimeError::Unreachable { function }));
                }

                If => {
                    if frame.pop_i32(instr)? == 0 {
                        pc = compiled.targets[at];
                    }
                }
                Else | EndLoop | Break | Continue => pc = compiled.targets[at],
                EndIf | Loop => {}
                BreakIf => {
                    if frame.pop_i32(instr)? != 0 {
                        pc = compiled.targets[at];
                    }
                }
            }
        }

        match func.result {
            None => Ok(None),
            Some(_) => Err(frame.trap(|function| RuntimeError::Unreachable { function })),
        }
    }
}

/// Runs lowered modules.
///
/// ```
/// use wabbit_compiler::ir::interp::Interpreter;
/// use wabbit_compiler::ir::{Instruction, IrFunction, IrModule};
/// use wabbit_compiler::ConstValue;
/// use wabbit_core::ValueType;
///
/// let module = IrModule {
///     functions: vec![IrFunction {
///         name: "main".into(),
///         params: vec![],
///         locals: vec![],
///         result: None,
///         body: vec![Instruction::ConstI32(7), Instruction::Print(ValueType::Int)],
///     }],
///     entry: "main".into(),
///     ..IrModule::default()
/// };
///
/// let mut interp = Interpreter::new(&module).unwrap();
/// interp.run().unwrap();
/// assert_eq!(interp.output(), [ConstValue::Int(7)]);
/// ```
pub struct Interpreter<'m> {
    code: Code<'m>,
    machine: Machine,
    entry: &'m str,
}

impl<'m> Interpreter<'m> {
    /// Prepare a module for running.
    ///
    /// # Errors
    ///
    /// Fails when a function's control instructions do not nest.
    pub fn new(module: &'m IrModule) -> Result<Self, RuntimeError> {
        let functions = module
            .functions
            .iter()
            .map(|func| {
                let targets = branch_targets(func)?;
                Ok((func.name.as_str(), Compiled { func, targets }))
            })
            .collect::<Result<_, RuntimeError>>()?;

        let globals = module
            .globals
            .iter()
            .map(|global| (global.name.clone(), Value::from(global.init)))
            .collect();
        let memory = if module.uses_memory {
            vec![0; PAGE_SIZE]
        } else {
            Vec::new()
        };

        Ok(Self {
            code: Code {
                functions,
                max_depth: DEFAULT_MAX_DEPTH,
            },
            machine: Machine {
                globals,
                memory,
                max_pages: DEFAULT_MAX_PAGES,
                output: Vec::new(),
                fuel: None,
                steps: 0,
            },
            entry: &module.entry,
        })
    }

    /// Limit nested calls.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.code.max_depth = depth;
        self
    }

    /// Limit memory growth, in pages.
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.machine.max_pages = pages;
        self
    }

    /// Stop with [`RuntimeError::OutOfFuel`] after `steps` instructions.
    pub fn with_fuel(mut self, steps: u64) -> Self {
        self.machine.fuel = Some(steps);
        self
    }

    /// Run the entry function.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let entry = self.entry;
        self.call(entry, &[])?;
        tracing::debug!(
            printed = self.machine.output.len(),
            steps = self.machine.steps,
            "ran module"
        );
        Ok(())
    }

    /// Call one function with arguments.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
        self.code.call(&mut self.machine, name, args.to_vec(), 0)
    }

    /// Values printed so far, in order.
    pub fn output(&self) -> &[ConstValue] {
        &self.machine.output
    }

    pub fn take_output(&mut self) -> Vec<ConstValue> {
        std::mem::take(&mut self.machine.output)
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.machine.globals.get(name).copied()
    }

    pub fn memory(&self) -> &[u8] {
        &self.machine.memory
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.machine.steps
    }
}

/// Run a module's entry function and return what it printed.
pub fn run_module(module: &IrModule) -> Result<Vec<ConstValue>, RuntimeError> {
    let mut interp = Interpreter::new(module)?;
    interp.run()?;
    Ok(interp.take_output())
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use wabbit_ast::{AstBuilder, BinaryOp, Program, UnaryOp};
    use wabbit_core::CompilationError;

    use super::*;
    use crate::check::check_program;
    use crate::lower::lower_program;

    fn lower(program: &Program<'_>) -> IrModule {
        let mut errors: Vec<CompilationError> = Vec::new();
        let checked = check_program(program, &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        lower_program(&checked, "main")
    }

    fn printed(program: &Program<'_>) -> Vec<ConstValue> {
        run_module(&lower(program)).expect("program should run")
    }

    fn entry_only(body: Vec<Instruction>) -> IrModule {
        IrModule {
            functions: vec![IrFunction {
                name: "main".into(),
                params: vec![],
                locals: vec![],
                result: None,
                body,
            }],
            entry: "main".into(),
            ..IrModule::default()
        }
    }

    #[test]
    fn globals_and_arithmetic() {
        // var x = 4; var y = 5; var d = x * x + y * y; print d;
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let squares = b.binary(
            BinaryOp::Add,
            b.binary(BinaryOp::Mul, b.var("x"), b.var("x")),
            b.binary(BinaryOp::Mul, b.var("y"), b.var("y")),
        );
        let program = b.program(&[
            b.variable("x", None, Some(b.int(4))),
            b.variable("y", None, Some(b.int(5))),
            b.variable("d", None, Some(squares)),
            b.print(b.var("d")),
        ]);

        let module = lower(&program);
        let mut interp = Interpreter::new(&module).unwrap();
        interp.run().unwrap();
        assert_eq!(interp.output(), [ConstValue::Int(41)]);
        assert_eq!(interp.global("d"), Some(Value::I32(41)));
    }

    #[test]
    fn recursive_factorial() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let less = b.binary(BinaryOp::Less, b.var("n"), b.int(2));
        let minus = b.binary(BinaryOp::Sub, b.var("n"), b.int(1));
        let recurse = b.binary(BinaryOp::Mul, b.var("n"), b.call("fact", &[minus]));
        let body = b.block(&[
            b.if_else(less, b.block(&[b.return_stmt(Some(b.int(1)))]), None),
            b.return_stmt(Some(recurse)),
        ]);
        let func = b.function("fact", &[b.param("n", ValueType::Int)], ValueType::Int, body);
        let program = b.program(&[func, b.print(b.call("fact", &[b.int(5)]))]);

        assert_eq!(printed(&program), [ConstValue::Int(120)]);

        let module = lower(&program);
        let mut interp = Interpreter::new(&module).unwrap();
        assert_eq!(
            interp.call("fact", &[Value::I32(10)]),
            Ok(Some(Value::I32(3628800)))
        );
    }

    #[test]
    fn loops_with_break_and_continue() {
        // var i = 0; var sum = 0;
        // while true {
        //     i = i + 1;
        //     if i > 10 { break; }
        //     if i == 3 { continue; }
        //     sum = sum + i;
        // }
        // print sum;
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[
            b.assign(b.name("i"), b.binary(BinaryOp::Add, b.var("i"), b.int(1))),
            b.if_else(
                b.binary(BinaryOp::Greater, b.var("i"), b.int(10)),
                b.block(&[b.break_stmt()]),
                None,
            ),
            b.if_else(
                b.binary(BinaryOp::Equal, b.var("i"), b.int(3)),
                b.block(&[b.continue_stmt()]),
                None,
            ),
            b.assign(
                b.name("sum"),
                b.binary(BinaryOp::Add, b.var("sum"), b.var("i")),
            ),
        ]);
        let program = b.program(&[
            b.variable("i", None, Some(b.int(0))),
            b.variable("sum", None, Some(b.int(0))),
            b.while_loop(b.bool(true), body),
            b.print(b.var("sum")),
        ]);

        assert_eq!(printed(&program), [ConstValue::Int(52)]);
    }

    #[test]
    fn nested_loops_and_else() {
        // var total = 0; var i = 0;
        // while i < 3 {
        //     var j = 0;
        //     while j < 3 {
        //         if i == j { total = total + 10; } else { total = total + 1; }
        //         j = j + 1;
        //     }
        //     i = i + 1;
        // }
        // print total;
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inner = b.block(&[
            b.if_else(
                b.binary(BinaryOp::Equal, b.var("i"), b.var("j")),
                b.block(&[b.assign(
                    b.name("total"),
                    b.binary(BinaryOp::Add, b.var("total"), b.int(10)),
                )]),
                Some(b.block(&[b.assign(
                    b.name("total"),
                    b.binary(BinaryOp::Add, b.var("total"), b.int(1)),
                )])),
            ),
            b.assign(b.name("j"), b.binary(BinaryOp::Add, b.var("j"), b.int(1))),
        ]);
        let outer = b.block(&[
            b.variable("j", None, Some(b.int(0))),
            b.while_loop(b.binary(BinaryOp::Less, b.var("j"), b.int(3)), inner),
            b.assign(b.name("i"), b.binary(BinaryOp::Add, b.var("i"), b.int(1))),
        ]);
        let program = b.program(&[
            b.variable("total", None, Some(b.int(0))),
            b.variable("i", None, Some(b.int(0))),
            b.while_loop(b.binary(BinaryOp::Less, b.var("i"), b.int(3)), outer),
            b.print(b.var("total")),
        ]);

        assert_eq!(printed(&program), [ConstValue::Int(36)]);
    }

    #[test]
    fn every_print_type() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.print(b.int(-3)),
            b.print(b.float(1.5)),
            b.print(b.bool(true)),
            b.print(b.char('w')),
            b.print(b.cast(ValueType::Int, b.float(2.75))),
            b.print(b.unary(UnaryOp::Neg, b.int(8))),
        ]);

        assert_eq!(
            printed(&program),
            [
                ConstValue::Int(-3),
                ConstValue::Float(1.5),
                ConstValue::Bool(true),
                ConstValue::Char('w'),
                ConstValue::Int(2),
                ConstValue::Int(-8),
            ]
        );
    }

    #[test]
    fn block_shadowing_reads_outer_after_block() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.variable("a", None, Some(b.int(2))),
            b.if_else(
                b.bool(true),
                b.block(&[
                    b.variable("a", None, Some(b.int(7))),
                    b.print(b.var("a")),
                ]),
                None,
            ),
            b.print(b.var("a")),
        ]);

        assert_eq!(printed(&program), [ConstValue::Int(7), ConstValue::Int(2)]);
    }

    #[test]
    fn memory_access_and_growth() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.assign(b.address(b.int(8)), b.int(42)),
            b.print(b.binary(BinaryOp::Add, b.load(b.address(b.int(8))), b.int(1))),
            b.print(b.unary(UnaryOp::Grow, b.int(1))),
        ]);

        let module = lower(&program);
        let mut interp = Interpreter::new(&module).unwrap();
        interp.run().unwrap();
        assert_eq!(interp.output(), [ConstValue::Int(43), ConstValue::Int(1)]);
        assert_eq!(interp.memory().len(), 2 * PAGE_SIZE);
        assert_eq!(interp.memory()[8..12], 42i32.to_le_bytes());
    }

    #[test]
    fn growth_past_limit_fails_softly() {
        let module = IrModule {
            uses_memory: true,
            ..entry_only(vec![
                Instruction::ConstI32(4),
                Instruction::GrowMem,
                Instruction::Print(ValueType::Int),
            ])
        };
        let mut interp = Interpreter::new(&module).unwrap().with_max_pages(2);
        interp.run().unwrap();
        assert_eq!(interp.output(), [ConstValue::Int(-1)]);
    }

    #[test]
    fn integer_traps() {
        let divide = |left, right| {
            entry_only(vec![
                Instruction::ConstI32(left),
                Instruction::ConstI32(right),
                Instruction::DivI,
                Instruction::Print(ValueType::Int),
            ])
        };

        assert!(matches!(
            run_module(&divide(1, 0)),
            Err(RuntimeError::DivisionByZero { .. })
        ));
        assert!(matches!(
            run_module(&divide(i32::MIN, -1)),
            Err(RuntimeError::IntegerOverflow { .. })
        ));
        assert_eq!(run_module(&divide(-7, 2)), Ok(vec![ConstValue::Int(-3)]));
    }

    #[test]
    fn float_to_int_traps() {
        let convert = |value| {
            entry_only(vec![
                Instruction::const_f64(value),
                Instruction::FloatToInt,
                Instruction::Print(ValueType::Int),
            ])
        };

        assert!(matches!(
            run_module(&convert(f64::NAN)),
            Err(RuntimeError::InvalidConversion { .. })
        ));
        assert!(matches!(
            run_module(&convert(3e9)),
            Err(RuntimeError::IntegerOverflow { .. })
        ));
        assert_eq!(run_module(&convert(-2.9)), Ok(vec![ConstValue::Int(-2)]));
    }

    #[test]
    fn out_of_bounds_memory() {
        let module = IrModule {
            uses_memory: true,
            ..entry_only(vec![
                Instruction::ConstI32(PAGE_SIZE as i32 - 2),
                Instruction::LoadMem,
                Instruction::Drop,
            ])
        };
        assert!(matches!(
            run_module(&module),
            Err(RuntimeError::MemoryOutOfBounds { .. })
        ));
    }

    #[test]
    fn unbounded_recursion_exhausts_the_stack() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[b.return_stmt(Some(b.call("spin", &[b.var("n")])))]);
        let func = b.function("spin", &[b.param("n", ValueType::Int)], ValueType::Int, body);
        let program = b.program(&[func, b.print(b.call("spin", &[b.int(0)]))]);

        let module = lower(&program);
        let mut interp = Interpreter::new(&module).unwrap().with_max_depth(64);
        assert_eq!(
            interp.run(),
            Err(RuntimeError::CallStackExhausted { depth: 64 })
        );
    }

    #[test]
    fn fuel_stops_infinite_loops() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.while_loop(b.bool(true), b.block(&[]))]);

        let module = lower(&program);
        let mut interp = Interpreter::new(&module).unwrap().with_fuel(1000);
        assert_eq!(interp.run(), Err(RuntimeError::OutOfFuel { steps: 1000 }));
    }

    #[test]
    fn falling_off_a_result_function_traps() {
        // func f() int { if false { return 1; } } print f();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[b.if_else(
            b.bool(false),
            b.block(&[b.return_stmt(Some(b.int(1)))]),
            None,
        )]);
        let func = b.function("f", &[], ValueType::Int, body);
        let program = b.program(&[func, b.print(b.call("f", &[]))]);

        assert!(matches!(
            run_module(&lower(&program)),
            Err(RuntimeError::Unreachable { function }) if function == "f"
        ));
    }

    #[test]
    fn malformed_streams_are_rejected() {
        let stray_else = entry_only(vec![Instruction::Else]);
        assert!(matches!(
            Interpreter::new(&stray_else),
            Err(RuntimeError::UnbalancedControl {
                detail: "else without if",
                ..
            })
        ));

        let stray_break = entry_only(vec![Instruction::Break]);
        assert!(matches!(
            Interpreter::new(&stray_break),
            Err(RuntimeError::UnbalancedControl { .. })
        ));

        let underflow = entry_only(vec![Instruction::AddI]);
        assert!(matches!(
            run_module(&underflow),
            Err(RuntimeError::StackUnderflow { .. })
        ));

        let unknown = entry_only(vec![Instruction::Load("ghost".into())]);
        assert!(matches!(
            run_module(&unknown),
            Err(RuntimeError::UnknownVariable { name, .. }) if name == "ghost"
        ));
    }
}
