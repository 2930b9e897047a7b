//! Callable entries in a [`crate::context::RuntimeContext`]'s function
//! table: either a compiled script body or a host closure, grounded on
//! `original_source/Source/Library/h/Module.hpp`'s `external_functions`
//! table.

use std::rc::Rc;

use sl_data::RuntimeError;

use crate::context::RuntimeContext;
use crate::statement::Statement;

/// A function callable through the value stack. Cloning a `Function` only
/// clones the `Rc`, so the function table can hand out cheap copies when a
/// script takes a function's value (spec §3, "function" as a first-class
/// value).
#[derive(Clone)]
pub enum Function {
    Script(Rc<ScriptFunction>),
    /// A host function: reads its arguments with `ctx.local(-1)`,
    /// `ctx.local(-2)`, ... and writes its result with `ctx.set_retval`.
    /// A handful of concrete-arity adapters in `sl-host` build these from
    /// plain Rust closures, standing in for the original's variadic
    /// template unpacker (`details::unpacker` in `Module.hpp`).
    Host(Rc<dyn Fn(&mut RuntimeContext) -> Result<(), RuntimeError>>),
}

pub struct ScriptFunction {
    pub body: Statement,
}

impl Function {
    pub fn invoke(&self, ctx: &mut RuntimeContext) -> Result<(), RuntimeError> {
        return match self {
            Function::Script(f) => ctx.execute_function_body(&f.body),
            Function::Host(f) => f(ctx),
        };
    }
}
