//! Concrete-arity adapters turning a plain Rust closure into a host
//! [`sl_runtime::Function`]. Grounded on
//! `original_source/Source/Library/h/Module.hpp`'s `details::unpacker<R,
//! Unpacked, Left>`, which recursively unpacks stack locals into typed
//! C++ arguments via a variadic template; Rust has no variadic generics,
//! so a small closed set of hand-written arities covers the same ground
//! (SPEC_FULL §4.10).

use std::rc::Rc;

use sl_runtime::{Function, RuntimeContext, Variable};

use crate::ExternalFunction;

/// A value that can cross the host/script boundary. Implemented for the
/// two scalar SL types plus `()` for void-returning host functions;
/// arrays/tuples stay script-side, matching the original's unpacker
/// which only ever specializes on `Lnumber`/`Lstring`.
pub trait HostValue: Sized {
    const SL_TYPE: &'static str;
    fn from_variable(value: &Variable) -> Self;
    fn into_variable(self) -> Variable;
}

impl HostValue for f64 {
    const SL_TYPE: &'static str = "number";
    fn from_variable(value: &Variable) -> Self {
        return value.as_number();
    }
    fn into_variable(self) -> Variable {
        return Variable::Number(self);
    }
}

impl HostValue for Rc<str> {
    const SL_TYPE: &'static str = "string";
    fn from_variable(value: &Variable) -> Self {
        return value.as_string();
    }
    fn into_variable(self) -> Variable {
        return Variable::String(self);
    }
}

impl HostValue for String {
    const SL_TYPE: &'static str = "string";
    fn from_variable(value: &Variable) -> Self {
        return value.as_string().to_string();
    }
    fn into_variable(self) -> Variable {
        return Variable::String(self.into());
    }
}

impl HostValue for () {
    const SL_TYPE: &'static str = "void";
    fn from_variable(_value: &Variable) -> Self {}
    fn into_variable(self) -> Variable {
        return Variable::Number(0.0);
    }
}

/// Builds a nullary host function, e.g. a clock or a random-number source.
pub fn host_fn0<R: HostValue>(name: &str, f: impl Fn() -> R + 'static) -> ExternalFunction {
    let declaration = format!("function {} {}()", R::SL_TYPE, name);
    let function = Function::Host(Rc::new(move |ctx: &mut RuntimeContext| {
        ctx.set_retval(f().into_variable());
        return Ok(());
    }));
    return ExternalFunction { declaration, function };
}

pub fn host_fn1<A: HostValue, R: HostValue>(name: &str, f: impl Fn(A) -> R + 'static) -> ExternalFunction {
    let declaration = format!("function {} {}({})", R::SL_TYPE, name, A::SL_TYPE);
    let function = Function::Host(Rc::new(move |ctx: &mut RuntimeContext| {
        let a = A::from_variable(&ctx.local(-1)?.borrow());
        ctx.set_retval(f(a).into_variable());
        return Ok(());
    }));
    return ExternalFunction { declaration, function };
}

pub fn host_fn2<A: HostValue, B: HostValue, R: HostValue>(name: &str, f: impl Fn(A, B) -> R + 'static) -> ExternalFunction {
    let declaration = format!("function {} {}({}, {})", R::SL_TYPE, name, A::SL_TYPE, B::SL_TYPE);
    let function = Function::Host(Rc::new(move |ctx: &mut RuntimeContext| {
        let a = A::from_variable(&ctx.local(-1)?.borrow());
        let b = B::from_variable(&ctx.local(-2)?.borrow());
        ctx.set_retval(f(a, b).into_variable());
        return Ok(());
    }));
    return ExternalFunction { declaration, function };
}

pub fn host_fn3<A: HostValue, B: HostValue, C: HostValue, R: HostValue>(name: &str, f: impl Fn(A, B, C) -> R + 'static) -> ExternalFunction {
    let declaration = format!("function {} {}({}, {}, {})", R::SL_TYPE, name, A::SL_TYPE, B::SL_TYPE, C::SL_TYPE);
    let function = Function::Host(Rc::new(move |ctx: &mut RuntimeContext| {
        let a = A::from_variable(&ctx.local(-1)?.borrow());
        let b = B::from_variable(&ctx.local(-2)?.borrow());
        let c = C::from_variable(&ctx.local(-3)?.borrow());
        ctx.set_retval(f(a, b, c).into_variable());
        return Ok(());
    }));
    return ExternalFunction { declaration, function };
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn host_fn1_reads_its_one_argument_from_offset_minus_one() {
        let external = host_fn1("double", |n: f64| n * 2.0);
        assert_eq!(external.declaration, "function number double(number)");
        let mut ctx = RuntimeContext::new();
        let idx = ctx.register_function(external.function);
        let result = ctx.call(idx, vec![Variable::number(21.0)]).unwrap();
        assert_eq!(result.borrow().as_number(), 42.0);
    }

    #[test]
    fn host_fn1_void_is_used_for_side_effecting_sinks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let external = host_fn1("trace", move |s: String| -> () { sink.borrow_mut().push(s); });
        assert_eq!(external.declaration, "function void trace(string)");
        let mut ctx = RuntimeContext::new();
        let idx = ctx.register_function(external.function);
        ctx.call(idx, vec![Variable::string("hi")]).unwrap();
        assert_eq!(log.borrow().as_slice(), &["hi".to_string()]);
    }
}
