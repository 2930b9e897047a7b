//! The value model, evaluators, statements, and stack machine that execute
//! a compiled SL program. Depends only on `sl-data`; the typed expression
//! tree (`sl-ast`) is lowered into the types here by `sl-compiler`, which
//! keeps this crate free of a dependency cycle back to the parser.

mod context;
mod evaluator;
mod function;
mod statement;
mod variable;

pub use context::{RuntimeContext, ScopeGuard};
pub use evaluator::{ArithOp, CallArg, CompareOp, Evaluator, IncDec};
pub use function::{Function, ScriptFunction};
pub use statement::{ExecSignal, ForInit, Statement};
pub use variable::{new_handle, FunctionIndex, Variable, VariableHandle};
