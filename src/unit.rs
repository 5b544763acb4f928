//! Compilation unit API.
//!
//! A [`Unit`] drives one program through the whole pipeline: checking,
//! lowering and encoding. Each stage runs at most once and its result is
//! cached, so asking for the encoded module after inspecting the lowered
//! instructions does not redo any work.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use wabbit::{AstBuilder, BinaryOp, Unit};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let product = b.binary(BinaryOp::Mul, b.int(3), b.int(4));
//! let program = b.program(&[b.print(b.binary(BinaryOp::Add, b.int(2), product))]);
//!
//! let mut unit = Unit::new(&program);
//! unit.build().unwrap();
//! assert_eq!(&unit.module().unwrap()[..4], b"\0asm");
//! ```

use wabbit_ast::Program;
use wabbit_compiler::check::{CheckedProgram, TracingSink, check_program};
use wabbit_compiler::const_eval::ConstValue;
use wabbit_compiler::ir::IrModule;
use wabbit_compiler::ir::interp::run_module;
use wabbit_compiler::lower::lower_program;
use wabbit_compiler::wasm::{DEFAULT_IMPORT_MODULE, EncodeOptions, encode_module};
use wabbit_core::{CompilationError, EncodeError, RuntimeError, WabbitError};

/// Default name of the function holding the top-level statements.
pub const DEFAULT_ENTRY: &str = "main";

/// Run-time settings of a [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOptions {
    entry_name: String,
    import_module: String,
    export_memory: bool,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            entry_name: DEFAULT_ENTRY.to_string(),
            import_module: DEFAULT_IMPORT_MODULE.to_string(),
            export_memory: true,
        }
    }
}

impl UnitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the exported function running the top-level statements.
    ///
    /// When the program defines a function with this name itself, the
    /// entry is called `_init` instead.
    pub fn entry_name(mut self, name: impl Into<String>) -> Self {
        self.entry_name = name.into();
        self
    }

    /// Module the runtime print functions are imported from.
    pub fn import_module(mut self, module: impl Into<String>) -> Self {
        self.import_module = module.into();
        self
    }

    /// Export linear memory as `memory` when the program uses it.
    pub fn export_memory(mut self, export: bool) -> Self {
        self.export_memory = export;
        self
    }

    pub fn entry(&self) -> &str {
        &self.entry_name
    }

    fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            import_module: self.import_module.clone(),
            export_memory: self.export_memory,
        }
    }
}

/// A program on its way to a binary module.
///
/// Stages run on demand:
/// 1. [`check`](Self::check) resolves names and types
/// 2. [`lower`](Self::lower) produces the instruction streams
/// 3. [`encode`](Self::encode) writes the module bytes
///
/// [`build`](Self::build) runs all three. The pipeline stops after checking
/// when any error was recorded; lowering and encoding never see a program
/// with outstanding errors.
#[derive(Debug)]
pub struct Unit<'ast> {
    program: Program<'ast>,
    options: UnitOptions,
    checked: Option<CheckedProgram<'ast>>,
    lowered: Option<IrModule>,
    module: Option<Vec<u8>>,
    is_built: bool,
}

impl<'ast> Unit<'ast> {
    /// Create a unit with default options.
    pub fn new(program: &Program<'ast>) -> Self {
        Self::with_options(program, UnitOptions::default())
    }

    pub fn with_options(program: &Program<'ast>, options: UnitOptions) -> Self {
        Self {
            program: *program,
            options,
            checked: None,
            lowered: None,
            module: None,
            is_built: false,
        }
    }

    pub fn options(&self) -> &UnitOptions {
        &self.options
    }

    /// Check the program.
    ///
    /// # Errors
    ///
    /// Returns every recorded error, in traversal order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(&mut self) -> Result<&CheckedProgram<'ast>, BuildError> {
        let checked = match self.checked.take() {
            Some(checked) => checked,
            None => self.run_checker()?,
        };
        Ok(self.checked.insert(checked))
    }

    fn run_checker(&self) -> Result<CheckedProgram<'ast>, BuildError> {
        let mut sink = TracingSink::new(Vec::new());
        let checked = check_program(&self.program, &mut sink);
        let errors = sink.into_inner();
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "checking failed");
            return Err(BuildError::CompilationErrors(errors));
        }
        Ok(checked)
    }

    /// Lower the checked program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn lower(&mut self) -> Result<&IrModule, BuildError> {
        let lowered = match self.lowered.take() {
            Some(lowered) => lowered,
            None => {
                let entry = self.options.entry_name.clone();
                lower_program(self.check()?, &entry)
            }
        };
        Ok(self.lowered.insert(lowered))
    }

    /// Encode the lowered program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn encode(&mut self) -> Result<&[u8], BuildError> {
        let module = match self.module.take() {
            Some(module) => module,
            None => {
                let options = self.options.encode_options();
                encode_module(self.lower()?, &options)?
            }
        };
        Ok(self.module.insert(module))
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Fails on checking or encoding errors, or if the unit was already built.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.is_built {
            return Err(BuildError::AlreadyBuilt);
        }
        let size = self.encode()?.len();
        tracing::debug!(size, "built unit");
        self.is_built = true;
        Ok(())
    }

    /// Interpret the lowered program and return what it printed.
    ///
    /// Runs without encoding, so it works before or after [`build`](Self::build).
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self) -> Result<Vec<ConstValue>, BuildError> {
        let output = run_module(self.lower()?)?;
        tracing::debug!(printed = output.len(), "ran unit");
        Ok(output)
    }

    /// Build and return the module bytes.
    pub fn compile(mut self) -> Result<Vec<u8>, BuildError> {
        self.build()?;
        Ok(self.module.take().unwrap_or_default())
    }

    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// The checked program (available after checking succeeded).
    pub fn checked(&self) -> Option<&CheckedProgram<'ast>> {
        self.checked.as_ref()
    }

    /// The lowered module (available after lowering).
    pub fn lowered(&self) -> Option<&IrModule> {
        self.lowered.as_ref()
    }

    /// The encoded module (available after encoding).
    pub fn module(&self) -> Option<&[u8]> {
        self.module.as_deref()
    }
}

/// Errors that can occur during unit building.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Checking recorded errors
    #[error("{} compilation error(s)", .0.len())]
    CompilationErrors(Vec<CompilationError>),

    /// Encoding failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Interpreting the lowered program trapped
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Unit has already been built
    #[error("Unit has already been built")]
    AlreadyBuilt,
}

impl BuildError {
    /// Convert to a vector of [`WabbitError`].
    ///
    /// `AlreadyBuilt` carries no underlying error and yields an empty vector.
    pub fn into_errors(self) -> Vec<WabbitError> {
        match self {
            BuildError::CompilationErrors(errors) => {
                errors.into_iter().map(WabbitError::from).collect()
            }
            BuildError::Encode(err) => vec![err.into()],
            BuildError::Runtime(err) => vec![err.into()],
            BuildError::AlreadyBuilt => Vec::new(),
        }
    }

    /// Get the first error as a [`WabbitError`], if any.
    pub fn first_error(&self) -> Option<WabbitError> {
        match self {
            BuildError::CompilationErrors(errors) => {
                errors.first().cloned().map(WabbitError::from)
            }
            BuildError::Encode(err) => Some(err.clone().into()),
            BuildError::Runtime(err) => Some(err.clone().into()),
            BuildError::AlreadyBuilt => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use wabbit_ast::AstBuilder;

    use super::*;

    #[test]
    fn build_simple_unit() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.print(b.int(1))]);

        let mut unit = Unit::new(&program);
        assert!(!unit.is_built());
        unit.build().unwrap();

        assert!(unit.is_built());
        assert!(unit.checked().is_some());
        assert_eq!(unit.lowered().map(|m| m.functions.len()), Some(1));
        assert!(unit.module().is_some());
    }

    #[test]
    fn cannot_build_twice() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.print(b.int(1))]);

        let mut unit = Unit::new(&program);
        unit.build().unwrap();
        assert!(matches!(unit.build(), Err(BuildError::AlreadyBuilt)));
    }

    #[test]
    fn stages_are_cached() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.print(b.float(1.5))]);

        let mut unit = Unit::new(&program);
        let first = unit.encode().unwrap().to_vec();
        let second = unit.encode().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn check_errors_stop_the_pipeline() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.print(b.var("missing"))]);

        let mut unit = Unit::new(&program);
        let err = unit.build().unwrap_err();
        assert!(matches!(&err, BuildError::CompilationErrors(errors) if errors.len() == 1));
        assert!(unit.lowered().is_none());
        assert!(unit.module().is_none());

        let first = err.first_error().unwrap();
        assert!(matches!(
            first,
            WabbitError::Compilation(CompilationError::UndefinedName { .. })
        ));
        assert_eq!(err.into_errors().len(), 1);
    }

    #[test]
    fn run_reports_printed_values() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.print(b.int(1)), b.print(b.char('z'))]);

        let mut unit = Unit::new(&program);
        assert_eq!(
            unit.run().unwrap(),
            vec![ConstValue::Int(1), ConstValue::Char('z')]
        );
        unit.build().unwrap();
        assert_eq!(unit.run().unwrap().len(), 2);
    }

    #[test]
    fn run_surfaces_traps() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let zero = b.binary(wabbit_ast::BinaryOp::Sub, b.var("n"), b.var("n"));
        let program = b.program(&[
            b.variable("n", None, Some(b.int(3))),
            b.print(b.binary(wabbit_ast::BinaryOp::Div, b.int(1), zero)),
        ]);

        let err = Unit::new(&program).run().unwrap_err();
        assert!(matches!(
            err.first_error(),
            Some(WabbitError::Runtime(RuntimeError::DivisionByZero { .. }))
        ));
    }

    #[test]
    fn options_reach_the_encoder() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.print(b.int(1))]);

        let options = UnitOptions::new().entry_name("start").import_module("env");
        let bytes = Unit::with_options(&program, options).compile().unwrap();

        assert!(bytes.windows(6).any(|w| w == b"\x05start"));
        assert!(bytes.windows(4).any(|w| w == b"\x03env"));
    }
}
