//! WebAssembly module encoding.
//!
//! [`encode_module`] turns a lowered [`IrModule`] into a binary module:
//!
//! - the runtime print functions are imported first (`_printi`, `_printf`,
//!   plus `_printb`/`_printc` when the program prints those types)
//! - globals keep their declaration order
//! - every function is declared before any body is encoded, so calls may
//!   refer to functions defined later in the program
//! - linear memory is added when the program touches memory

pub mod control;
pub mod encoder;
pub mod leb128;
pub mod opcode;
pub mod section;

pub use encoder::{MAGIC, MEMORY_EXPORT, ModuleEncoder, VERSION, print_import};

use wabbit_core::{EncodeError, ValueType};

use crate::ir::IrModule;

/// Module name the runtime imports are taken from by default.
pub const DEFAULT_IMPORT_MODULE: &str = "runtime";

/// Encoding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Import module of the runtime print functions.
    pub import_module: String,
    /// Export the linear memory when the program uses one.
    pub export_memory: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            import_module: DEFAULT_IMPORT_MODULE.to_string(),
            export_memory: true,
        }
    }
}

/// Encode a lowered module.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn encode_module(module: &IrModule, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = ModuleEncoder::new();

    for ty in ValueType::ALL {
        let always = matches!(ty, ValueType::Int | ValueType::Float);
        if always || module.prints(ty) {
            encoder.import_function(&options.import_module, print_import(ty), &[ty], None)?;
        }
    }

    if module.uses_memory {
        encoder.enable_memory(options.export_memory);
    }

    for global in &module.globals {
        encoder.declare_global(global)?;
    }

    for func in &module.functions {
        let params: Vec<ValueType> = func.param_types().collect();
        encoder.declare_function(&func.name, &params, func.result)?;
    }

    for func in &module.functions {
        encoder.encode_function(func)?;
    }

    encoder.finish()
}
