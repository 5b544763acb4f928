//! WebAssembly binary format codes.
//!
//! Only the subset the encoder emits is listed.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use wabbit_core::ValueType;

/// Instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    // =========================================================================
    // Control
    // =========================================================================
    Unreachable = 0x00,
    Block = 0x02,
    Loop = 0x03,
    If = 0x04,
    Else = 0x05,
    End = 0x0b,
    Br = 0x0c,
    BrIf = 0x0d,
    Return = 0x0f,
    Call = 0x10,
    Drop = 0x1a,

    // =========================================================================
    // Variables
    // =========================================================================
    LocalGet = 0x20,
    LocalSet = 0x21,
    GlobalGet = 0x23,
    GlobalSet = 0x24,

    // =========================================================================
    // Memory
    // =========================================================================
    /// Operands: alignment, offset
    I32Load = 0x28,
    /// Operands: alignment, offset
    I32Store = 0x36,
    /// Operand: memory index
    MemoryGrow = 0x40,

    // =========================================================================
    // Constants
    // =========================================================================
    /// Operand: signed LEB128
    I32Const = 0x41,
    /// Operand: 8 bytes, little-endian
    F64Const = 0x44,

    // =========================================================================
    // Integer
    // =========================================================================
    I32Eqz = 0x45,
    I32Eq = 0x46,
    I32Ne = 0x47,
    I32LtS = 0x48,
    I32GtS = 0x4a,
    I32LeS = 0x4c,
    I32GeS = 0x4e,
    I32Add = 0x6a,
    I32Sub = 0x6b,
    I32Mul = 0x6c,
    I32DivS = 0x6d,
    I32And = 0x71,
    I32Or = 0x72,

    // =========================================================================
    // Float
    // =========================================================================
    F64Eq = 0x61,
    F64Ne = 0x62,
    F64Lt = 0x63,
    F64Gt = 0x64,
    F64Le = 0x65,
    F64Ge = 0x66,
    F64Neg = 0x9a,
    F64Add = 0xa0,
    F64Sub = 0xa1,
    F64Mul = 0xa2,
    F64Div = 0xa3,

    // =========================================================================
    // Conversions
    // =========================================================================
    I32TruncF64S = 0xaa,
    F64ConvertI32S = 0xb7,
}

/// Value type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ValType {
    I32 = 0x7f,
    F64 = 0x7c,
}

impl From<ValueType> for ValType {
    fn from(ty: ValueType) -> Self {
        if ty.is_float() {
            ValType::F64
        } else {
            ValType::I32
        }
    }
}

/// Export descriptor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ExportKind {
    Func = 0x00,
    Memory = 0x02,
}

/// Function type prefix.
pub const FUNC_TYPE: u8 = 0x60;

/// Empty block type.
pub const BLOCK_EMPTY: u8 = 0x40;

/// Natural alignment (log2) of a 32-bit access.
pub const I32_ALIGN: u32 = 2;
