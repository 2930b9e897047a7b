//! The embedding surface a host program uses to register functions,
//! load a script, and call into it. Grounded on
//! `original_source/Source/Library/h/Module.hpp`'s `module_impl::Module`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use sl_data::{LoadError, RuntimeError};
use sl_runtime::{new_handle, RuntimeContext, Variable, VariableHandle};

use crate::ExternalFunction;

/// A loadable SL program plus the host functions and public-function
/// declarations it was given ahead of time. Mirrors `Module::load`/
/// `try_load`/`reset_globals`/`create_public_function_caller`, with the
/// original's per-signature closure factory replaced by a single
/// `call_public` that looks the function up by name at call time - Rust's
/// lack of variadic templates makes pre-building a typed closure per
/// signature impractical, and the indirection buys nothing once the
/// lookup is a single hash-map probe.
pub struct Module {
    externals: Vec<ExternalFunction>,
    public_declarations: Vec<String>,
    runtime: Option<RuntimeContext>,
    public_functions: HashMap<String, usize>,
}

impl Module {
    pub fn new() -> Self {
        return Self { externals: Vec::new(), public_declarations: Vec::new(), runtime: None, public_functions: HashMap::new() };
    }

    /// Registers a host function, built by one of `host_fn0`..`host_fn3`.
    pub fn add_external_function(&mut self, external: ExternalFunction) {
        self.externals.push(external);
    }

    /// Declares that the loaded script must define `public function
    /// <declaration>`; `load`/`try_load` raise a semantic error if no
    /// matching definition turns up, mirroring the unmatched-entry check
    /// at the end of the original's `Compiler::compile`.
    pub fn declare_public_function(&mut self, declaration: impl Into<String>) {
        self.public_declarations.push(declaration.into());
    }

    fn read_source(path: &Path) -> Result<String, LoadError> {
        return fs::read_to_string(path).map_err(|_| LoadError::FileNotFound(path.display().to_string()));
    }

    /// Compiles `source` and replaces this module's runtime, re-using
    /// whatever external functions and public declarations were already
    /// registered. Exposed directly (not just through `load`) so a host
    /// can embed a script as a string resource instead of a file path.
    pub fn load_str(&mut self, source: &str) -> Result<(), LoadError> {
        let program = sl_compiler::compile(source, self.externals.clone(), &self.public_declarations)?;
        let function_count = program.functions.len();
        let public_count = program.public_functions.len();
        let runtime = RuntimeContext::with_program(program.functions, program.initializers)?;
        log::debug!("loaded program: {} functions, {} public", function_count, public_count);
        self.public_functions = program.public_functions;
        self.runtime = Some(runtime);
        return Ok(());
    }

    /// Reads `path` and compiles it, raising on the first failure.
    pub fn load(&mut self, path: &Path) -> Result<(), LoadError> {
        let source = Self::read_source(path)?;
        return self.load_str(&source);
    }

    /// Like [`load`](Self::load), but never raises: every failure is
    /// rendered into a diagnostic string (with a source excerpt and caret
    /// for compile errors) and returned as `Err`, matching `try_load`'s
    /// "report, don't throw" contract in the original.
    pub fn try_load(&mut self, path: &Path) -> Result<(), String> {
        let source = match Self::read_source(path) {
            Ok(source) => source,
            Err(err) => {
                log::error!("{}", err);
                return Err(err.format_with_source(""));
            }
        };
        return match self.load_str(&source) {
            Ok(()) => Ok(()),
            Err(err) => {
                let rendered = err.format_with_source(&source);
                log::error!("{}", rendered);
                Err(rendered)
            }
        };
    }

    /// Re-runs every global initializer, discarding whatever mutations the
    /// running program made to its globals. A thin pass-through to
    /// `RuntimeContext::initialize`, matching `Module::reset_globals`.
    pub fn reset_globals(&mut self) -> Result<(), RuntimeError> {
        return self.runtime_mut()?.initialize();
    }

    /// Calls a loaded `public function` by name, boxing `args` into fresh
    /// variable handles. Mirrors `create_public_function_caller`'s boxing
    /// of arguments before `get_runtime_context()->call(...)`.
    pub fn call_public(&mut self, name: &str, args: Vec<Variable>) -> Result<VariableHandle, RuntimeError> {
        let index = *self
            .public_functions
            .get(name)
            .ok_or_else(|| RuntimeError::new(format!("'{}' is not a loaded public function", name)))?;
        let handles: Vec<VariableHandle> = args.into_iter().map(new_handle).collect();
        return self.runtime_mut()?.call(index, handles);
    }

    fn runtime_mut(&mut self) -> Result<&mut RuntimeContext, RuntimeError> {
        return self.runtime.as_mut().ok_or_else(|| RuntimeError::new("module is not loaded"));
    }
}

impl Default for Module {
    fn default() -> Self {
        return Self::new();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loading_a_program_from_a_string_makes_its_public_function_callable() {
        let mut module = Module::new();
        module.declare_public_function("function number answer()");
        module.load_str("public function number answer() { return 42; }").unwrap();
        let result = module.call_public("answer", vec![]).unwrap();
        assert_eq!(result.borrow().as_number(), 42.0);
    }

    #[test]
    fn calling_before_loading_is_a_runtime_error() {
        let mut module = Module::new();
        let err = module.call_public("answer", vec![]).unwrap_err();
        assert_eq!(err.message, "module is not loaded");
    }

    #[test]
    fn a_compile_error_is_rendered_with_a_source_excerpt_and_caret() {
        let mut module = Module::new();
        let err = module.load_str("number x = ;").unwrap_err();
        assert!(matches!(err, LoadError::Compile(_)));
    }

    #[test]
    fn reset_globals_reruns_initializers_from_scratch() {
        let mut module = Module::new();
        module.declare_public_function("function number bump()");
        module.load_str("number counter = 0; public function number bump() { counter = counter + 1; return counter; }").unwrap();
        module.call_public("bump", vec![]).unwrap();
        module.call_public("bump", vec![]).unwrap();
        module.reset_globals().unwrap();
        let result = module.call_public("bump", vec![]).unwrap();
        assert_eq!(result.borrow().as_number(), 1.0);
    }
}
