//! Stack-machine instruction stream.
//!
//! Lowering turns a checked program into an [`IrModule`]: global declarations
//! plus one flat instruction sequence per function. Instructions operate on
//! an operand stack of unlimited depth and refer to storage by name; the
//! encoder resolves names to local or global slots.
//!
//! Control flow is structured. `If`/`Else`/`EndIf` and `Loop`/`EndLoop`
//! bracket their bodies, and `Break`, `BreakIf` and `Continue` always target
//! the innermost enclosing loop. The encoder computes the branch depths.
//!
//! Lowered modules can also be run directly with [`interp`], or rendered
//! back to source text with [`source`].

pub mod interp;
pub mod source;

use std::fmt;

use ordered_float::OrderedFloat;
use wabbit_core::ValueType;

use crate::const_eval::ConstValue;

/// Comparison operators, shared by the integer and float forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Cmp::Eq => "eq",
            Cmp::Ne => "ne",
            Cmp::Lt => "lt",
            Cmp::Le => "le",
            Cmp::Gt => "gt",
            Cmp::Ge => "ge",
        }
    }
}

/// One stack-machine instruction.
///
/// Stack effects are written `[popped] -> [pushed]`, top of stack last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    // === Constants ===
    /// `[] -> [i32]`
    ConstI32(i32),
    /// `[] -> [f64]`
    ConstF64(OrderedFloat<f64>),

    // === Storage ===
    /// Push the value of a local or global. `[] -> [value]`
    Load(String),
    /// Pop into a local or global. `[value] -> []`
    Store(String),
    /// Read the i32 at a byte address. `[address] -> [i32]`
    LoadMem,
    /// Write an i32 to a byte address. `[address, value] -> []`
    StoreMem,
    /// Grow memory by N pages, pushing the previous size in pages. `[pages] -> [i32]`
    GrowMem,

    // === Integer arithmetic ===
    /// `[a, b] -> [a + b]`
    AddI,
    /// `[a, b] -> [a - b]`
    SubI,
    /// `[a, b] -> [a * b]`
    MulI,
    /// Signed division. `[a, b] -> [a / b]`
    DivI,

    // === Float arithmetic ===
    /// `[a, b] -> [a + b]`
    AddF,
    /// `[a, b] -> [a - b]`
    SubF,
    /// `[a, b] -> [a * b]`
    MulF,
    /// `[a, b] -> [a / b]`
    DivF,
    /// `[a] -> [-a]`
    NegF,

    // === Comparison and logic ===
    /// Signed i32 comparison. `[a, b] -> [bool]`
    CmpI(Cmp),
    /// f64 comparison. `[a, b] -> [bool]`
    CmpF(Cmp),
    /// Bitwise and of two bools. `[a, b] -> [a & b]`
    And,
    /// Bitwise or of two bools. `[a, b] -> [a | b]`
    Or,
    /// `[a] -> [a == 0]`
    Eqz,

    // === Conversions ===
    /// `[i32] -> [f64]`
    IntToFloat,
    /// Truncating conversion. `[f64] -> [i32]`
    FloatToInt,

    // === Calls ===
    /// Print a value through the runtime. `[value] -> []`
    Print(ValueType),
    /// Call a function. `[args...] -> [result?]`
    Call {
        name: String,
        params: u32,
        results: u32,
    },
    /// Return from the current function. `[value] -> []`
    Return,
    /// `[value] -> []`
    Drop,
    /// Trap. `[] -> []`
    Unreachable,

    // === Control flow ===
    /// Pop a test and enter the consequence if it is non-zero. `[bool] -> []`
    If,
    /// Start the alternative of the innermost `If`. `[] -> []`
    Else,
    /// Close the innermost `If`. `[] -> []`
    EndIf,
    /// Open a loop. `[] -> []`
    Loop,
    /// Jump back to the start of the innermost loop and close it. `[] -> []`
    EndLoop,
    /// Leave the innermost loop if the popped value is non-zero. `[bool] -> []`
    BreakIf,
    /// Leave the innermost loop. `[] -> []`
    Break,
    /// Jump to the start of the innermost loop. `[] -> []`
    Continue,
}

impl Instruction {
    /// Float constant.
    pub fn const_f64(value: f64) -> Self {
        Instruction::ConstF64(OrderedFloat(value))
    }

    /// Push a constant value in its run-time representation.
    pub fn constant(value: ConstValue) -> Self {
        match (value.as_i32(), value.as_f64()) {
            (Some(v), _) => Instruction::ConstI32(v),
            (None, Some(v)) => Instruction::const_f64(v),
            (None, None) => Instruction::ConstI32(0),
        }
    }

    /// Number of values popped and pushed: `(pops, pushes)`.
    pub fn stack_effect(&self) -> (u32, u32) {
        use Instruction::*;
        match self {
            ConstI32(_) | ConstF64(_) | Load(_) => (0, 1),
            Store(_) => (1, 0),
            LoadMem | GrowMem => (1, 1),
            StoreMem => (2, 0),
            AddI | SubI | MulI | DivI | AddF | SubF | MulF | DivF => (2, 1),
            CmpI(_) | CmpF(_) | And | Or => (2, 1),
            NegF | Eqz | IntToFloat | FloatToInt => (1, 1),
            Print(_) | Return | Drop | If | BreakIf => (1, 0),
            Call {
                params, results, ..
            } => (*params, *results),
            Unreachable | Else | EndIf | Loop | EndLoop | Break | Continue => (0, 0),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match self {
            ConstI32(v) => write!(f, "const.i32 {v}"),
            ConstF64(v) => write!(f, "const.f64 {:?}", v.0),
            Load(name) => write!(f, "load {name}"),
            Store(name) => write!(f, "store {name}"),
            LoadMem => f.write_str("load.mem"),
            StoreMem => f.write_str("store.mem"),
            GrowMem => f.write_str("grow.mem"),
            AddI => f.write_str("add.i32"),
            SubI => f.write_str("sub.i32"),
            MulI => f.write_str("mul.i32"),
            DivI => f.write_str("div.i32"),
            AddF => f.write_str("add.f64"),
            SubF => f.write_str("sub.f64"),
            MulF => f.write_str("mul.f64"),
            DivF => f.write_str("div.f64"),
            NegF => f.write_str("neg.f64"),
            CmpI(cmp) => write!(f, "{}.i32", cmp.as_str()),
            CmpF(cmp) => write!(f, "{}.f64", cmp.as_str()),
            And => f.write_str("and"),
            Or => f.write_str("or"),
            Eqz => f.write_str("eqz"),
            IntToFloat => f.write_str("i32.to.f64"),
            FloatToInt => f.write_str("f64.to.i32"),
            Print(ty) => write!(f, "print.{ty}"),
            Call { name, .. } => write!(f, "call {name}"),
            Return => f.write_str("return"),
            Drop => f.write_str("drop"),
            Unreachable => f.write_str("unreachable"),
            If => f.write_str("if"),
            Else => f.write_str("else"),
            EndIf => f.write_str("endif"),
            Loop => f.write_str("loop"),
            EndLoop => f.write_str("endloop"),
            BreakIf => f.write_str("break_if"),
            Break => f.write_str("break"),
            Continue => f.write_str("continue"),
        }
    }
}

/// A module-level global variable or constant.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDecl {
    pub name: String,
    pub ty: ValueType,
    pub mutable: bool,
    /// Initial value embedded in the module.
    pub init: ConstValue,
}

/// A named local slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    pub name: String,
    pub ty: ValueType,
}

/// A lowered function.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    /// Parameters occupy local slots `0..params.len()`.
    pub params: Vec<LocalDecl>,
    /// Locals declared in the body, after the parameters.
    pub locals: Vec<LocalDecl>,
    pub result: Option<ValueType>,
    pub body: Vec<Instruction>,
}

impl IrFunction {
    pub fn param_types(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.params.iter().map(|param| param.ty)
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", param.name, param.ty)?;
        }
        f.write_str(")")?;
        if let Some(result) = self.result {
            write!(f, " {result}")?;
        }
        writeln!(f)?;
        for local in &self.locals {
            writeln!(f, "  local {} {}", local.name, local.ty)?;
        }
        for instr in &self.body {
            writeln!(f, "  {instr}")?;
        }
        Ok(())
    }
}

/// A lowered program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrModule {
    /// Globals in declaration order.
    pub globals: Vec<GlobalDecl>,
    /// Functions in definition order; the entry function comes last.
    pub functions: Vec<IrFunction>,
    /// Name of the function holding the top-level statements.
    pub entry: String,
    /// Whether any instruction touches linear memory.
    pub uses_memory: bool,
}

impl IrModule {
    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|func| func.name == name)
    }

    pub fn entry_function(&self) -> Option<&IrFunction> {
        self.function(&self.entry)
    }

    /// Whether any function prints a value of type `ty`.
    pub fn prints(&self, ty: ValueType) -> bool {
        self.functions
            .iter()
            .flat_map(|func| &func.body)
            .any(|instr| *instr == Instruction::Print(ty))
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            let keyword = if global.mutable { "global" } else { "const" };
            writeln!(f, "{keyword} {} {} = {}", global.name, global.ty, global.init)?;
        }
        for func in &self.functions {
            write!(f, "{func}")?;
        }
        Ok(())
    }
}
