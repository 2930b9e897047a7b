//! The typed expression builder (spec §4.6): lowers a type-checked
//! `sl_ast::Node` tree into an `sl_runtime::Evaluator` tree. By the time a
//! node reaches here every type/lvalue question has already been settled by
//! the parser - this stage only picks the matching runtime shape.

use std::rc::Rc;

use sl_ast::{IdentifierInfo, Node, NodeValue, Operation, ScopeKind};
use sl_runtime::{ArithOp, CallArg, CompareOp, Evaluator, IncDec, Variable};
use sl_types::{Type, TypeHandle};

use crate::context::CompilerContext;

/// Builds the default-initialized value for `handle` (spec: 0 for number,
/// empty string, empty array, an uninitialized function, element-wise
/// default for tuples), resolved once at compile time since every
/// composite type is already fully interned.
pub fn default_variable(handle: TypeHandle, ctx: &CompilerContext) -> Variable {
    return match ctx.types.get(handle).clone() {
        Type::Void => Variable::Number(0.0),
        Type::Number => Variable::Number(0.0),
        Type::String => Variable::String(Rc::from("")),
        Type::Array(_) => Variable::Array(vec![]),
        Type::Function { .. } => Variable::Function(None),
        Type::Tuple(elements) => Variable::Tuple(elements.into_iter().map(|e| sl_runtime::new_handle(default_variable(e, ctx))).collect()),
        Type::InitList(_) => unreachable!("init-list is never a declared or element type"),
    };
}

/// Builds the evaluator for a declaration with no initializer, or for a
/// function's synthesized trailing `return default()`: produces a fresh
/// independent default value on every evaluation (spec §4.6's "Default
/// initialization").
pub fn build_default(handle: TypeHandle, ctx: &CompilerContext) -> Evaluator {
    let default = default_variable(handle, ctx);
    return Evaluator::DefaultValue(Rc::new(move || default.clone_value()));
}

pub fn build(node: &Node, ctx: &CompilerContext) -> Evaluator {
    match &node.value {
        NodeValue::NumberLiteral(n) => Evaluator::NumberLiteral(*n),
        NodeValue::StringLiteral(s) => Evaluator::StringLiteral(Rc::from(s.as_str())),
        NodeValue::Identifier(info) => build_identifier(info),
        NodeValue::Operation(op) => build_operation(*op, node, ctx),
    }
}

/// Like [`build`], but inserts a `Number -> String` coercion - or re-stamps
/// a nested init-list's target type - when `node`'s own static type isn't
/// already `target`. Used for each element of an array/tuple initializer,
/// whose individual elements aren't coerced by the parser the way a whole
/// assignment's right-hand side is.
fn build_into(node: &Node, target: TypeHandle, ctx: &CompilerContext) -> Evaluator {
    if node.type_handle == target {
        return build(node, ctx);
    }
    if ctx.types.get(node.type_handle) == &Type::Number && ctx.types.get(target) == &Type::String {
        return Evaluator::ToString(Box::new(build(node, ctx)));
    }
    if matches!(ctx.types.get(node.type_handle), Type::InitList(_)) {
        let mut retyped = node.clone();
        retyped.type_handle = target;
        return build(&retyped, ctx);
    }
    return build(node, ctx);
}

fn build_identifier(info: &IdentifierInfo) -> Evaluator {
    return match info.scope {
        ScopeKind::Global => Evaluator::GlobalRef(info.index as usize),
        ScopeKind::Local => Evaluator::LocalRef(info.index),
        ScopeKind::Function => Evaluator::FunctionRef(info.index as usize),
    };
}

fn build_operation(op: Operation, node: &Node, ctx: &CompilerContext) -> Evaluator {
    let children = &node.children;
    return match op {
        Operation::Add => arithmetic(ArithOp::Add, children, ctx),
        Operation::Sub => arithmetic(ArithOp::Sub, children, ctx),
        Operation::Mul => arithmetic(ArithOp::Mul, children, ctx),
        Operation::Div => arithmetic(ArithOp::Div, children, ctx),
        Operation::Idiv => arithmetic(ArithOp::Idiv, children, ctx),
        Operation::Mod => arithmetic(ArithOp::Mod, children, ctx),
        Operation::BitwiseAnd => arithmetic(ArithOp::BitAnd, children, ctx),
        Operation::BitwiseOr => arithmetic(ArithOp::BitOr, children, ctx),
        Operation::BitwiseXor => arithmetic(ArithOp::BitXor, children, ctx),
        Operation::Shiftl => arithmetic(ArithOp::Shl, children, ctx),
        Operation::Shiftr => arithmetic(ArithOp::Shr, children, ctx),

        Operation::Concat => Evaluator::Concat(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx))),

        Operation::Eq => compare(CompareOp::Eq, children, ctx),
        Operation::Ne => compare(CompareOp::Ne, children, ctx),
        Operation::Lt => compare(CompareOp::Lt, children, ctx),
        Operation::Gt => compare(CompareOp::Gt, children, ctx),
        Operation::Le => compare(CompareOp::Le, children, ctx),
        Operation::Ge => compare(CompareOp::Ge, children, ctx),

        Operation::LogicalAnd => Evaluator::LogicalAnd(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx))),
        Operation::LogicalOr => Evaluator::LogicalOr(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx))),
        Operation::LogicalNot => Evaluator::LogicalNot(Box::new(build(&children[0], ctx))),
        Operation::Negate => Evaluator::Negate(Box::new(build(&children[0], ctx))),
        Operation::BitwiseNot => Evaluator::BitwiseNot(Box::new(build(&children[0], ctx))),

        Operation::PreInc => Evaluator::IncDec(IncDec::PreInc, Box::new(build(&children[0], ctx))),
        Operation::PreDec => Evaluator::IncDec(IncDec::PreDec, Box::new(build(&children[0], ctx))),
        Operation::PostInc => Evaluator::IncDec(IncDec::PostInc, Box::new(build(&children[0], ctx))),
        Operation::PostDec => Evaluator::IncDec(IncDec::PostDec, Box::new(build(&children[0], ctx))),

        Operation::Assign => Evaluator::Assign(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx))),
        Operation::AddAssign => arith_assign(ArithOp::Add, children, ctx),
        Operation::SubAssign => arith_assign(ArithOp::Sub, children, ctx),
        Operation::MulAssign => arith_assign(ArithOp::Mul, children, ctx),
        Operation::DivAssign => arith_assign(ArithOp::Div, children, ctx),
        Operation::IdivAssign => arith_assign(ArithOp::Idiv, children, ctx),
        Operation::ModAssign => arith_assign(ArithOp::Mod, children, ctx),
        Operation::AndAssign => arith_assign(ArithOp::BitAnd, children, ctx),
        Operation::OrAssign => arith_assign(ArithOp::BitOr, children, ctx),
        Operation::XorAssign => arith_assign(ArithOp::BitXor, children, ctx),
        Operation::ShiftlAssign => arith_assign(ArithOp::Shl, children, ctx),
        Operation::ShiftrAssign => arith_assign(ArithOp::Shr, children, ctx),
        Operation::ConcatAssign => Evaluator::ConcatAssign(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx))),

        Operation::Comma => Evaluator::Comma(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx))),
        Operation::Ternary => Evaluator::Ternary(Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx)), Box::new(build(&children[2], ctx))),

        Operation::Index => build_index(children, ctx),
        Operation::Call => build_call(children, ctx),
        Operation::Param => Evaluator::Param(Box::new(build(&children[0], ctx))),

        // `sizeof` on a non-array operand is the compile-time constant `1`
        // (spec's literal wording); the operand is never built, matching
        // "does not evaluate its operand at all."
        Operation::Sizeof => match ctx.types.get(children[0].type_handle) {
            Type::Array(_) => Evaluator::ArrayLen(Box::new(build(&children[0], ctx))),
            _ => Evaluator::NumberLiteral(1.0),
        },
        Operation::ToString => Evaluator::ToString(Box::new(build(&children[0], ctx))),

        Operation::InitList => build_init_list(node, ctx),
    };
}

fn arithmetic(op: ArithOp, children: &[Node], ctx: &CompilerContext) -> Evaluator {
    return Evaluator::Arithmetic(op, Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx)));
}

fn compare(op: CompareOp, children: &[Node], ctx: &CompilerContext) -> Evaluator {
    return Evaluator::Compare(op, Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx)));
}

fn arith_assign(op: ArithOp, children: &[Node], ctx: &CompilerContext) -> Evaluator {
    return Evaluator::ArithAssign(op, Box::new(build(&children[0], ctx)), Box::new(build(&children[1], ctx)));
}

fn build_index(children: &[Node], ctx: &CompilerContext) -> Evaluator {
    let array_node = &children[0];
    let index_node = &children[1];
    return match ctx.types.get(array_node.type_handle).clone() {
        Type::Array(element) => {
            let default = default_variable(element, ctx);
            Evaluator::Index { array: Box::new(build(array_node, ctx)), index: Box::new(build(index_node, ctx)), default_factory: Rc::new(move || default.clone_value()) }
        }
        Type::Tuple(_) => {
            let NodeValue::NumberLiteral(position) = &index_node.value else {
                unreachable!("the parser only ever builds a tuple Index node with a literal position")
            };
            Evaluator::TupleIndex(Box::new(build(array_node, ctx)), *position as usize)
        }
        _ => unreachable!("the parser only ever builds an Index node over an array or tuple"),
    };
}

fn build_call(children: &[Node], ctx: &CompilerContext) -> Evaluator {
    let callee = Box::new(build(&children[0], ctx));
    let args = children[1..]
        .iter()
        .map(|child| match &child.value {
            NodeValue::Operation(Operation::Param) => CallArg { by_ref: false, value: Evaluator::Param(Box::new(build(&child.children[0], ctx))) },
            _ => CallArg { by_ref: true, value: build(child, ctx) },
        })
        .collect();
    return Evaluator::Call { callee, args };
}

fn build_init_list(node: &Node, ctx: &CompilerContext) -> Evaluator {
    return match ctx.types.get(node.type_handle).clone() {
        Type::Array(element) => Evaluator::ArrayInitList(node.children.iter().map(|child| build_into(child, element, ctx)).collect()),
        Type::Tuple(elements) => {
            Evaluator::TupleInitList(node.children.iter().zip(elements.iter()).map(|(child, element)| build_into(child, *element, ctx)).collect())
        }
        // An init-list literal used directly with no declared array/tuple
        // context (e.g. passed straight to a variadic host sink) falls back
        // to building it as an array of its own elements' types.
        Type::InitList(_) => Evaluator::ArrayInitList(node.children.iter().map(|child| build(child, ctx)).collect()),
        _ => unreachable!("the parser only ever gives an InitList node an Array/Tuple/InitList static type"),
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use sl_ast::Operation as Op;
    use sl_data::Span;

    fn span() -> Span {
        return Span::point(0, 0, 0);
    }

    fn number(n: f64, ctx: &CompilerContext) -> Node {
        return Node::new(NodeValue::NumberLiteral(n), vec![], ctx.types.number(), false, span());
    }

    #[test]
    fn builds_arithmetic_from_a_binary_node() {
        let ctx = CompilerContext::new();
        let node = Node::new(NodeValue::Operation(Op::Add), vec![number(1.0, &ctx), number(2.0, &ctx)], ctx.types.number(), false, span());
        match build(&node, &ctx) {
            Evaluator::Arithmetic(ArithOp::Add, _, _) => {}
            _ => panic!("expected an Arithmetic(Add) evaluator"),
        }
    }

    #[test]
    fn sizeof_on_a_number_becomes_a_constant_without_building_the_operand() {
        let ctx = CompilerContext::new();
        let node = Node::new(NodeValue::Operation(Op::Sizeof), vec![number(5.0, &ctx)], ctx.types.number(), false, span());
        match build(&node, &ctx) {
            Evaluator::NumberLiteral(n) => assert_eq!(n, 1.0),
            _ => panic!("expected a constant 1.0"),
        }
    }

    #[test]
    fn sizeof_on_an_array_reads_the_live_length() {
        let mut ctx = CompilerContext::new();
        let array_type = ctx.types.array(ctx.types.number());
        let identifier = Node::new(
            NodeValue::Identifier(IdentifierInfo { name: "a".to_string(), type_handle: array_type, index: 0, scope: ScopeKind::Global }),
            vec![],
            array_type,
            true,
            span(),
        );
        let node = Node::new(NodeValue::Operation(Op::Sizeof), vec![identifier], ctx.types.number(), false, span());
        match build(&node, &ctx) {
            Evaluator::ArrayLen(_) => {}
            _ => panic!("expected ArrayLen"),
        }
    }

    #[test]
    fn default_variable_for_a_tuple_is_element_wise() {
        let mut ctx = CompilerContext::new();
        let tuple_type = ctx.types.tuple(vec![ctx.types.number(), ctx.types.string()]);
        let default = default_variable(tuple_type, &ctx);
        let Variable::Tuple(elements) = default else { panic!("expected a tuple") };
        assert_eq!(elements[0].borrow().as_number(), 0.0);
        assert_eq!(elements[1].borrow().as_string().as_ref(), "");
    }
}
