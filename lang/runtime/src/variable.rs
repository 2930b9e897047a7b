//! The runtime value model (spec §3, §4.8), grounded on
//! `original_source/Source/Library/Variable.cpp/hpp`.

use std::cell::RefCell;
use std::rc::Rc;

/// Index of a function in a [`crate::context::RuntimeContext`]'s function
/// table. `Variable::Function(None)` is the default-initialized, callable-
/// never function value.
pub type FunctionIndex = usize;

/// Every value shape a variable can hold. `InitList` is never constructed by
/// the evaluator: the typed expression builder always lowers a brace literal
/// into an `Array`- or `Tuple`-shaped construction once its target type is
/// known, so this variant exists only so the runtime's value model names the
/// same six shapes spec §3 does.
#[derive(Clone, Debug)]
pub enum Variable {
    Number(f64),
    String(Rc<str>),
    Function(Option<FunctionIndex>),
    Array(Vec<VariableHandle>),
    Tuple(Vec<VariableHandle>),
    InitList(Vec<VariableHandle>),
}

/// A shared, mutable handle to a variable. Every lvalue the evaluator
/// produces, and every element of an array or tuple, is one of these; two
/// handles that point at the same `RefCell` are the same storage location.
pub type VariableHandle = Rc<RefCell<Variable>>;

pub fn new_handle(value: Variable) -> VariableHandle {
    return Rc::new(RefCell::new(value));
}

impl Variable {
    pub fn number(n: f64) -> VariableHandle {
        return new_handle(Variable::Number(n));
    }

    pub fn string(s: impl Into<Rc<str>>) -> VariableHandle {
        return new_handle(Variable::String(s.into()));
    }

    pub fn as_number(&self) -> f64 {
        return match self {
            Variable::Number(n) => *n,
            _ => 0.0,
        };
    }

    pub fn as_string(&self) -> Rc<str> {
        return match self {
            Variable::String(s) => s.clone(),
            _ => Rc::from(""),
        };
    }

    pub fn as_array(&self) -> &[VariableHandle] {
        return match self {
            Variable::Array(elements) => elements,
            Variable::Tuple(elements) => elements,
            _ => &[],
        };
    }

    /// Truthiness for conditions: any nonzero number is true, matching the
    /// original's `bool(double)` condition checks.
    pub fn truthy(&self) -> bool {
        return self.as_number() != 0.0;
    }

    /// Deep clone: composites recurse into fresh handles. Mirrors
    /// `VariableImpl<T>::clone()` (`Variable.cpp:21`, composite recursion at
    /// `:58`/`:68`). Used wherever an independent copy is needed - by-value
    /// call arguments and value-initialized locals - never for plain
    /// assignment, which rebinds in place instead (see
    /// [`crate::evaluator::Evaluator::Assign`]).
    pub fn clone_value(&self) -> Variable {
        return match self {
            Variable::Number(n) => Variable::Number(*n),
            Variable::String(s) => Variable::String(s.clone()),
            Variable::Function(f) => Variable::Function(*f),
            Variable::Array(elements) => Variable::Array(clone_elements(elements)),
            Variable::Tuple(elements) => Variable::Tuple(clone_elements(elements)),
            Variable::InitList(elements) => Variable::InitList(clone_elements(elements)),
        };
    }

    /// Mirrors `convertToString` in `Variable.cpp`: integer-valued numbers
    /// render without a decimal point, arrays and tuples render
    /// `[a, b, c]`, functions render as the literal string `FUNCTION`.
    pub fn to_display_string(&self) -> String {
        return match self {
            Variable::Number(n) => format_number(*n),
            Variable::String(s) => s.to_string(),
            Variable::Function(_) => "FUNCTION".to_string(),
            Variable::Array(elements) | Variable::Tuple(elements) | Variable::InitList(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.borrow().to_display_string()).collect();
                format!("[{}]", parts.join(", "))
            }
        };
    }
}

fn clone_elements(elements: &[VariableHandle]) -> Vec<VariableHandle> {
    return elements.iter().map(|e| new_handle(e.borrow().clone_value())).collect();
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e18 {
        return format!("{}", n as i64);
    }
    return format!("{}", n);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clone_value_does_not_alias_array_elements() {
        let inner = Variable::number(1.0);
        let array = new_handle(Variable::Array(vec![inner.clone()]));
        let cloned = new_handle(array.borrow().clone_value());

        *inner.borrow_mut() = Variable::Number(99.0);

        let Variable::Array(cloned_elements) = &*cloned.borrow() else { panic!("expected array") };
        assert_eq!(cloned_elements[0].borrow().as_number(), 1.0);
    }

    #[test]
    fn plain_clone_shares_element_handles() {
        let inner = Variable::number(1.0);
        let array = Variable::Array(vec![inner.clone()]);
        let shallow = array.clone();

        *inner.borrow_mut() = Variable::Number(42.0);

        let Variable::Array(shallow_elements) = &shallow else { panic!("expected array") };
        assert_eq!(shallow_elements[0].borrow().as_number(), 42.0);
    }

    #[test]
    fn integer_valued_numbers_format_without_decimal_point() {
        assert_eq!(Variable::Number(3.0).to_display_string(), "3");
        assert_eq!(Variable::Number(3.5).to_display_string(), "3.5");
    }

    #[test]
    fn array_formats_as_bracketed_list() {
        let array = Variable::Array(vec![Variable::number(1.0), Variable::string("x")]);
        assert_eq!(array.to_display_string(), "[1, x]");
    }

    #[test]
    fn uninitialized_function_is_none() {
        let f = Variable::Function(None);
        assert!(matches!(f, Variable::Function(None)));
    }
}
