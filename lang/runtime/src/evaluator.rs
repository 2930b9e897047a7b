//! The typed expression builder's output (spec §4.6): a single recursive
//! tagged-variant tree whose `eval` always produces a [`VariableHandle`],
//! whether the underlying expression is an lvalue or an rvalue - lvalue-ness
//! falls out for free because every `Variable` already lives behind a
//! shared handle. Spec §9's own design notes suggest exactly this over
//! generating one generic evaluator shape per result-type/lvalue pairing.

use std::rc::Rc;

use sl_data::RuntimeError;

use crate::context::RuntimeContext;
use crate::variable::{new_handle, Variable, VariableHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Idiv,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl ArithOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        return match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Idiv => (a / b).trunc(),
            ArithOp::Mod => a % b,
            ArithOp::BitAnd => ((a as i64) & (b as i64)) as f64,
            ArithOp::BitOr => ((a as i64) | (b as i64)) as f64,
            ArithOp::BitXor => ((a as i64) ^ (b as i64)) as f64,
            ArithOp::Shl => ((a as i64) << (b as i64)) as f64,
            ArithOp::Shr => ((a as i64) >> (b as i64)) as f64,
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    fn apply(self, a: f64, b: f64) -> bool {
        return match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Gt => a > b,
            CompareOp::Le => a <= b,
            CompareOp::Ge => a >= b,
        };
    }

    fn apply_str(self, a: &str, b: &str) -> bool {
        return match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Gt => a > b,
            CompareOp::Le => a <= b,
            CompareOp::Ge => a >= b,
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncDec {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

/// One call argument, already marked by the typed expression builder as
/// by-value or by-reference (spec §4.5's `Param` wrapper presence/absence).
pub struct CallArg {
    pub by_ref: bool,
    pub value: Evaluator,
}

pub enum Evaluator {
    NumberLiteral(f64),
    StringLiteral(Rc<str>),
    /// A reference to a global, by its index in the function's global
    /// table.
    GlobalRef(usize),
    /// A reference to a parameter or local, by its offset from the return
    /// slot (negative for parameters).
    LocalRef(i32),
    /// A bare reference to a named function, lowered to a fresh
    /// `Variable::Function(Some(index))` handle so `Call` can always
    /// unwrap its callee the same way regardless of whether it was named
    /// directly or reached through a function-typed variable.
    FunctionRef(usize),

    Arithmetic(ArithOp, Box<Evaluator>, Box<Evaluator>),
    Concat(Box<Evaluator>, Box<Evaluator>),
    Compare(CompareOp, Box<Evaluator>, Box<Evaluator>),
    LogicalAnd(Box<Evaluator>, Box<Evaluator>),
    LogicalOr(Box<Evaluator>, Box<Evaluator>),
    LogicalNot(Box<Evaluator>),
    Negate(Box<Evaluator>),
    BitwiseNot(Box<Evaluator>),

    IncDec(IncDec, Box<Evaluator>),

    /// Plain assignment: rebinds the lvalue's contents to the already-
    /// evaluated rhs value without an extra deep clone (`t1->value =
    /// std::move(t2)` in the original's `Assign` operator) - so assigning
    /// one array/tuple to another leaves their elements aliased until
    /// either side is reassigned wholesale again.
    Assign(Box<Evaluator>, Box<Evaluator>),
    /// Compound assignment (`+=`, `&=`, ...): reads the lvalue's current
    /// number, applies `op`, writes the result back in place.
    ArithAssign(ArithOp, Box<Evaluator>, Box<Evaluator>),
    ConcatAssign(Box<Evaluator>, Box<Evaluator>),

    Comma(Box<Evaluator>, Box<Evaluator>),
    Ternary(Box<Evaluator>, Box<Evaluator>, Box<Evaluator>),

    /// Indexes into an array, lazily growing it with `default_factory()`
    /// placeholders if `index` lands past the current length (spec §4.6).
    Index { array: Box<Evaluator>, index: Box<Evaluator>, default_factory: Rc<dyn Fn() -> Variable> },
    /// Indexes into a tuple at a constant, compile-time-checked position.
    TupleIndex(Box<Evaluator>, usize),

    Call { callee: Box<Evaluator>, args: Vec<CallArg> },
    /// Wraps an rvalue into a temporary, freshly allocated lvalue handle -
    /// the runtime counterpart of the expression tree's `Param` wrapper.
    Param(Box<Evaluator>),
    /// Deep-clones the evaluated value: used wherever the builder needs an
    /// independent copy rather than a shared handle (by-value call
    /// arguments, value-initialized locals).
    CloneValue(Box<Evaluator>),

    /// `sizeof` on a non-array operand is a compile-time constant (spec's
    /// own wording: "constant value 1"); the builder never even
    /// constructs this variant for that case. This variant only exists for
    /// the array case, which must read the live length.
    ArrayLen(Box<Evaluator>),
    ToString(Box<Evaluator>),

    ArrayInitList(Vec<Evaluator>),
    TupleInitList(Vec<Evaluator>),

    /// Produces a fresh default-initialized value on every evaluation - used
    /// for declarations with no initializer and for a function's synthesized
    /// trailing `return default()`. A closure rather than a fixed handle so
    /// each declaration (e.g. one re-executed per loop iteration) gets its
    /// own independent value instead of sharing mutable state across runs.
    DefaultValue(Rc<dyn Fn() -> Variable>),
}

impl Evaluator {
    pub fn eval(&self, ctx: &mut RuntimeContext) -> Result<VariableHandle, RuntimeError> {
        return match self {
            Evaluator::NumberLiteral(n) => Ok(Variable::number(*n)),
            Evaluator::StringLiteral(s) => Ok(Variable::string(s.clone())),
            Evaluator::GlobalRef(index) => ctx.global(*index),
            Evaluator::LocalRef(offset) => ctx.local(*offset),
            Evaluator::FunctionRef(index) => Ok(new_handle(Variable::Function(Some(*index)))),

            Evaluator::Arithmetic(op, lhs, rhs) => {
                let a = lhs.eval(ctx)?.borrow().as_number();
                let b = rhs.eval(ctx)?.borrow().as_number();
                Ok(Variable::number(op.apply(a, b)))
            }
            Evaluator::Concat(lhs, rhs) => {
                let a = lhs.eval(ctx)?.borrow().as_string();
                let b = rhs.eval(ctx)?.borrow().as_string();
                Ok(Variable::string(format!("{}{}", a, b)))
            }
            Evaluator::Compare(op, lhs, rhs) => {
                let a = lhs.eval(ctx)?;
                let b = rhs.eval(ctx)?;
                let a_ref = a.borrow();
                let b_ref = b.borrow();
                let result = match (&*a_ref, &*b_ref) {
                    (Variable::String(sa), Variable::String(sb)) => op.apply_str(sa, sb),
                    _ => op.apply(a_ref.as_number(), b_ref.as_number()),
                };
                Ok(Variable::number(if result { 1.0 } else { 0.0 }))
            }
            Evaluator::LogicalAnd(lhs, rhs) => {
                if !lhs.eval(ctx)?.borrow().truthy() {
                    return Ok(Variable::number(0.0));
                }
                let truthy = rhs.eval(ctx)?.borrow().truthy();
                Ok(Variable::number(if truthy { 1.0 } else { 0.0 }))
            }
            Evaluator::LogicalOr(lhs, rhs) => {
                if lhs.eval(ctx)?.borrow().truthy() {
                    return Ok(Variable::number(1.0));
                }
                let truthy = rhs.eval(ctx)?.borrow().truthy();
                Ok(Variable::number(if truthy { 1.0 } else { 0.0 }))
            }
            Evaluator::LogicalNot(inner) => {
                let truthy = inner.eval(ctx)?.borrow().truthy();
                Ok(Variable::number(if truthy { 0.0 } else { 1.0 }))
            }
            Evaluator::Negate(inner) => Ok(Variable::number(-inner.eval(ctx)?.borrow().as_number())),
            Evaluator::BitwiseNot(inner) => {
                let n = inner.eval(ctx)?.borrow().as_number();
                Ok(Variable::number(!(n as i64) as f64))
            }

            Evaluator::IncDec(kind, operand) => {
                let handle = operand.eval(ctx)?;
                let current = handle.borrow().as_number();
                let updated = match kind {
                    IncDec::PreInc | IncDec::PostInc => current + 1.0,
                    IncDec::PreDec | IncDec::PostDec => current - 1.0,
                };
                *handle.borrow_mut() = Variable::Number(updated);
                match kind {
                    IncDec::PreInc | IncDec::PreDec => Ok(handle),
                    IncDec::PostInc | IncDec::PostDec => Ok(Variable::number(current)),
                }
            }

            Evaluator::Assign(lhs, rhs) => {
                let handle = lhs.eval(ctx)?;
                let value = rhs.eval(ctx)?.borrow().clone();
                *handle.borrow_mut() = value;
                Ok(handle)
            }
            Evaluator::ArithAssign(op, lhs, rhs) => {
                let handle = lhs.eval(ctx)?;
                let a = handle.borrow().as_number();
                let b = rhs.eval(ctx)?.borrow().as_number();
                *handle.borrow_mut() = Variable::Number(op.apply(a, b));
                Ok(handle)
            }
            Evaluator::ConcatAssign(lhs, rhs) => {
                let handle = lhs.eval(ctx)?;
                let a = handle.borrow().as_string();
                let b = rhs.eval(ctx)?.borrow().as_string();
                *handle.borrow_mut() = Variable::String(Rc::from(format!("{}{}", a, b)));
                Ok(handle)
            }

            Evaluator::Comma(first, second) => {
                first.eval(ctx)?;
                second.eval(ctx)
            }
            Evaluator::Ternary(cond, if_true, if_false) => {
                if cond.eval(ctx)?.borrow().truthy() {
                    if_true.eval(ctx)
                } else {
                    if_false.eval(ctx)
                }
            }

            Evaluator::Index { array, index, default_factory } => {
                let array_handle = array.eval(ctx)?;
                let i = index.eval(ctx)?.borrow().as_number();
                RuntimeError::assert(i >= 0.0, format!("Negative array index {}", i))?;
                let i = i as usize;
                let mut array_ref = array_handle.borrow_mut();
                let Variable::Array(elements) = &mut *array_ref else {
                    return Err(RuntimeError::new("Index applied to a non-array variable"));
                };
                while elements.len() <= i {
                    elements.push(new_handle(default_factory()));
                }
                Ok(elements[i].clone())
            }
            Evaluator::TupleIndex(tuple, position) => {
                let handle = tuple.eval(ctx)?;
                let element = match &*handle.borrow() {
                    Variable::Tuple(elements) => elements.get(*position).cloned(),
                    _ => None,
                };
                element.ok_or_else(|| RuntimeError::new("Tuple index out of range"))
            }

            Evaluator::Call { callee, args } => {
                let callee_handle = callee.eval(ctx)?;
                let function_index = match &*callee_handle.borrow() {
                    Variable::Function(Some(index)) => *index,
                    Variable::Function(None) => return Err(RuntimeError::new("Call on uninitialized function")),
                    _ => return Err(RuntimeError::new("Call applied to a non-function variable")),
                };
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.value.eval(ctx)?);
                }
                ctx.call(function_index, evaluated)
            }
            Evaluator::Param(inner) => Ok(new_handle(inner.eval(ctx)?.borrow().clone_value())),
            Evaluator::CloneValue(inner) => Ok(new_handle(inner.eval(ctx)?.borrow().clone_value())),

            Evaluator::ArrayLen(array) => Ok(Variable::number(array.eval(ctx)?.borrow().as_array().len() as f64)),
            Evaluator::ToString(inner) => Ok(Variable::string(inner.eval(ctx)?.borrow().to_display_string())),

            Evaluator::ArrayInitList(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(element.eval(ctx)?);
                }
                Ok(new_handle(Variable::Array(values)))
            }
            Evaluator::TupleInitList(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(element.eval(ctx)?);
                }
                Ok(new_handle(Variable::Tuple(values)))
            }

            Evaluator::DefaultValue(factory) => Ok(new_handle(factory())),
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logical_and_short_circuits() {
        let mut ctx = RuntimeContext::new();
        let expr = Evaluator::LogicalAnd(
            Box::new(Evaluator::NumberLiteral(0.0)),
            Box::new(Evaluator::Call { callee: Box::new(Evaluator::FunctionRef(99)), args: vec![] }),
        );
        let result = expr.eval(&mut ctx).unwrap();
        assert_eq!(result.borrow().as_number(), 0.0);
    }

    #[test]
    fn post_increment_returns_old_value_but_mutates() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(1);
        ctx.set_global(0, Variable::Number(5.0));
        let expr = Evaluator::IncDec(IncDec::PostInc, Box::new(Evaluator::GlobalRef(0)));
        let result = expr.eval(&mut ctx).unwrap();
        assert_eq!(result.borrow().as_number(), 5.0);
        assert_eq!(ctx.global(0).unwrap().borrow().as_number(), 6.0);
    }

    #[test]
    fn index_lazily_grows_array_with_default_values() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(1);
        ctx.set_global(0, Variable::Array(vec![]));
        let expr =
            Evaluator::Index { array: Box::new(Evaluator::GlobalRef(0)), index: Box::new(Evaluator::NumberLiteral(2.0)), default_factory: Rc::new(|| Variable::Number(0.0)) };
        let handle = expr.eval(&mut ctx).unwrap();
        assert_eq!(handle.borrow().as_number(), 0.0);
        let Variable::Array(elements) = &*ctx.global(0).unwrap().borrow() else { panic!("expected array") };
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn assign_aliases_array_elements_between_two_variables() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(2);
        ctx.set_global(0, Variable::Array(vec![Variable::number(1.0)]));
        ctx.set_global(1, Variable::Array(vec![]));
        let assign = Evaluator::Assign(Box::new(Evaluator::GlobalRef(1)), Box::new(Evaluator::GlobalRef(0)));
        assign.eval(&mut ctx).unwrap();

        let a = ctx.global(0).unwrap();
        let b = ctx.global(1).unwrap();
        let Variable::Array(a_elements) = &*a.borrow() else { panic!() };
        *a_elements[0].borrow_mut() = Variable::Number(42.0);
        let Variable::Array(b_elements) = &*b.borrow() else { panic!() };
        assert_eq!(b_elements[0].borrow().as_number(), 42.0);
    }

    #[test]
    fn default_value_produces_an_independent_handle_each_time() {
        let mut ctx = RuntimeContext::new();
        let expr = Evaluator::DefaultValue(Rc::new(|| Variable::Array(vec![])));
        let first = expr.eval(&mut ctx).unwrap();
        match &mut *first.borrow_mut() {
            Variable::Array(elements) => elements.push(Variable::number(1.0)),
            _ => panic!(),
        }
        let second = expr.eval(&mut ctx).unwrap();
        assert_eq!(second.borrow().as_array().len(), 0);
    }

    #[test]
    fn compare_dispatches_to_lexicographic_comparison_for_strings() {
        let mut ctx = RuntimeContext::new();
        let expr = Evaluator::Compare(CompareOp::Lt, Box::new(Evaluator::StringLiteral(Rc::from("a"))), Box::new(Evaluator::StringLiteral(Rc::from("b"))));
        assert_eq!(expr.eval(&mut ctx).unwrap().borrow().as_number(), 1.0);

        let expr = Evaluator::Compare(CompareOp::Eq, Box::new(Evaluator::StringLiteral(Rc::from("same"))), Box::new(Evaluator::StringLiteral(Rc::from("same"))));
        assert_eq!(expr.eval(&mut ctx).unwrap().borrow().as_number(), 1.0);
    }

    #[test]
    fn param_wrapper_deep_clones_so_callee_owns_an_independent_copy() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(1);
        ctx.set_global(0, Variable::Array(vec![Variable::number(1.0)]));
        let param = Evaluator::Param(Box::new(Evaluator::GlobalRef(0)));
        let copy = param.eval(&mut ctx).unwrap();

        let original = ctx.global(0).unwrap();
        let Variable::Array(original_elements) = &*original.borrow() else { panic!() };
        *original_elements[0].borrow_mut() = Variable::Number(42.0);

        let Variable::Array(copy_elements) = &*copy.borrow() else { panic!() };
        assert_eq!(copy_elements[0].borrow().as_number(), 1.0);
    }
}
