//! The stack machine that executes compiled SL programs, grounded on
//! `original_source/Source/Library/RuntimeContext.cpp/hpp`.

use std::collections::VecDeque;
use std::rc::Rc;

use sl_data::RuntimeError;

use crate::evaluator::Evaluator;
use crate::function::Function;
use crate::statement::Statement;
use crate::variable::{new_handle, Variable, VariableHandle};

/// A running SL program: its globals, its value stack, and its function
/// table. Produced by `sl-compiler`'s `compile()` and then driven by
/// `sl-host`.
pub struct RuntimeContext {
    globals: Vec<VariableHandle>,
    stack: VecDeque<VariableHandle>,
    functions: Vec<Function>,
    /// Stack index of the current call frame's return slot; `local(i)`
    /// addresses `stack[retval_idx + i]`.
    retval_idx: usize,
    /// Global initializer expressions, in declaration order, kept around so
    /// `initialize()` can be replayed by `sl-host`'s `reset_globals`. An
    /// `Rc` slice (rather than a plain `Vec`) so `initialize()` can hold a
    /// cloned handle to it while mutably borrowing the rest of `self`.
    initializers: Rc<[Evaluator]>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        return Self { globals: Vec::new(), stack: VecDeque::new(), functions: Vec::new(), retval_idx: 0, initializers: Rc::from(Vec::new()) };
    }

    /// Builds a runtime ready to execute: registers `functions`, then runs
    /// `initializers` once to populate the globals. Mirrors the original's
    /// `RuntimeContext` constructor, which takes the same two collections
    /// and calls `initialize()` immediately.
    pub fn with_program(functions: Vec<Function>, initializers: Vec<Evaluator>) -> Result<Self, RuntimeError> {
        let mut ctx = Self { globals: Vec::new(), stack: VecDeque::new(), functions, retval_idx: 0, initializers: Rc::from(initializers) };
        ctx.initialize()?;
        return Ok(ctx);
    }

    /// Re-runs every global initializer in declaration order, replacing
    /// whatever is currently in `globals`. A later initializer may read an
    /// earlier global (`number a = 1; number b = a + 1;`), so this can't
    /// evaluate them against a pre-sized placeholder vector the way
    /// [`reserve_globals`](Self::reserve_globals) does for unit tests -
    /// each initializer's result is pushed as soon as it's ready.
    pub fn initialize(&mut self) -> Result<(), RuntimeError> {
        let initializers = self.initializers.clone();
        self.globals.clear();
        self.stack.clear();
        self.retval_idx = 0;
        for initializer in initializers.iter() {
            let value = initializer.eval(self)?.borrow().clone_value();
            self.globals.push(new_handle(value));
        }
        return Ok(());
    }

    /// Reserves `count` global slots, each holding an independent
    /// `Variable::Number(0.0)` placeholder. Used directly by unit tests that
    /// want to poke at globals without going through a real initializer
    /// list; real programs go through [`with_program`](Self::with_program).
    pub fn reserve_globals(&mut self, count: usize) {
        self.globals = (0..count).map(|_| Variable::number(0.0)).collect();
    }

    pub fn set_global(&mut self, index: usize, value: Variable) {
        self.globals[index] = new_handle(value);
    }

    pub fn global(&self, index: usize) -> Result<VariableHandle, RuntimeError> {
        RuntimeError::assert(index < self.globals.len(), format!("Global index {} out of range", index))?;
        return Ok(self.globals[index].clone());
    }

    /// `local(i)`: `i` is negative for parameters (closest to the return
    /// slot is `-1`, the first declared parameter), zero or positive for
    /// locals declared in the running function's body.
    pub fn local(&self, offset: i32) -> Result<VariableHandle, RuntimeError> {
        let index = self.retval_idx as i64 + offset as i64;
        RuntimeError::assert(index >= 0 && (index as usize) < self.stack.len(), format!("Local offset {} out of range", offset))?;
        return Ok(self.stack[index as usize].clone());
    }

    pub fn retval(&self) -> VariableHandle {
        return self.stack[self.retval_idx].clone();
    }

    pub fn set_retval(&mut self, value: Variable) {
        self.stack[self.retval_idx] = new_handle(value);
    }

    /// Pushes a new local onto the stack; local offsets are assigned by the
    /// compiler in declaration order, so pushes must happen in that same
    /// order for offsets to line up.
    pub fn push_local(&mut self, value: VariableHandle) {
        self.stack.push_back(value);
    }

    pub fn register_function(&mut self, function: Function) -> usize {
        self.functions.push(function);
        return self.functions.len() - 1;
    }

    pub fn function_count(&self) -> usize {
        return self.functions.len();
    }

    /// Marks the current stack height so a scope guard can truncate back to
    /// it on every exit path (normal, break, continue, return, or an
    /// early `?`).
    pub fn enter_scope(&mut self) -> ScopeGuard {
        return ScopeGuard { mark: self.stack.len() };
    }

    pub fn leave_scope(&mut self, guard: ScopeGuard) {
        self.stack.truncate(guard.mark);
    }

    /// Invokes the function at `function_index` with `args` already
    /// evaluated (and, for by-value parameters, already deep-cloned by the
    /// caller). Pushes parameters in reverse so the first parameter ends up
    /// closest to the return slot (offset `-1`), matching `call()` in the
    /// original.
    pub fn call(&mut self, function_index: usize, mut args: Vec<VariableHandle>) -> Result<VariableHandle, RuntimeError> {
        let param_count = args.len();
        for arg in args.drain(..).rev() {
            self.stack.push_back(arg);
        }

        let saved_retval_idx = self.retval_idx;
        self.retval_idx = self.stack.len();
        self.stack.push_back(Variable::number(0.0));

        let function = self.functions.get(function_index).cloned();
        let function = match function {
            Some(f) => f,
            None => {
                self.retval_idx = saved_retval_idx;
                self.stack.truncate(self.stack.len().saturating_sub(param_count + 1));
                return Err(RuntimeError::new("Call to undefined function"));
            }
        };

        let result = function.invoke(self);
        let retval = self.stack[self.retval_idx].clone();
        self.stack.truncate(self.retval_idx - param_count);
        self.retval_idx = saved_retval_idx;
        result?;
        return Ok(retval);
    }

    pub fn execute_function_body(&mut self, body: &Statement) -> Result<(), RuntimeError> {
        body.execute(self)?;
        return Ok(());
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        return Self::new();
    }
}

/// RAII marker returned by [`RuntimeContext::enter_scope`]. Callers are
/// expected to pass it back to [`RuntimeContext::leave_scope`] on every exit
/// path; it carries no `Drop` impl of its own because the context it would
/// need to truncate isn't reachable from `Drop::drop`.
pub struct ScopeGuard {
    mark: usize,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::function::{Function, ScriptFunction};
    use std::rc::Rc as StdRc;

    #[test]
    fn call_leaves_stack_size_unchanged() {
        let mut ctx = RuntimeContext::new();
        let body = Statement::ReturnValue(crate::evaluator::Evaluator::NumberLiteral(7.0));
        let idx = ctx.register_function(Function::Script(StdRc::new(ScriptFunction { body })));

        let before = ctx.stack.len();
        let result = ctx.call(idx, vec![Variable::number(1.0)]).unwrap();
        assert_eq!(ctx.stack.len(), before);
        assert_eq!(result.borrow().as_number(), 7.0);
    }

    #[test]
    fn later_global_initializer_can_read_an_earlier_global() {
        use crate::evaluator::{ArithOp, Evaluator};
        let initializers = vec![Evaluator::NumberLiteral(1.0), Evaluator::Arithmetic(ArithOp::Add, Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::NumberLiteral(1.0)))];
        let ctx = RuntimeContext::with_program(Vec::new(), initializers).unwrap();
        assert_eq!(ctx.global(0).unwrap().borrow().as_number(), 1.0);
        assert_eq!(ctx.global(1).unwrap().borrow().as_number(), 2.0);
    }

    #[test]
    fn first_parameter_sits_at_offset_minus_one() {
        let mut ctx = RuntimeContext::new();
        let body = Statement::ReturnValue(crate::evaluator::Evaluator::LocalRef(-1));
        let idx = ctx.register_function(Function::Script(StdRc::new(ScriptFunction { body })));

        let result = ctx.call(idx, vec![Variable::number(1.0), Variable::number(2.0)]).unwrap();
        assert_eq!(result.borrow().as_number(), 1.0);
    }
}
