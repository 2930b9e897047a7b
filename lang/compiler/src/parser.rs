//! The expression-tree parser (spec §4.5): precedence-climbing over the
//! precedence/associativity table in
//! `original_source/Source/Library/ExpressionTreeParser.cpp`'s
//! `OperatorInfo`, type-checking each node the moment its children are
//! known rather than in a separate pass. The original drives this with an
//! explicit two-stack shunting-yard machine; precedence climbing gets the
//! same precedence/associativity/type-checking semantics with ordinary
//! recursion, which reads more naturally in Rust.

use sl_ast::{IdentifierInfo, Node, NodeValue, Operation, ScopeKind};
use sl_data::{Operator, ParsingError, Span, TokenValue};
use sl_types::{Type, TypeHandle};

use crate::context::CompilerContext;
use crate::cursor::Cursor;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Assoc {
    Left,
    Right,
}

fn binary_binding_power(op: Operator) -> Option<(u8, Assoc)> {
    return match op {
        Operator::Comma => Some((1, Assoc::Left)),
        Operator::Assign
        | Operator::AddAssign
        | Operator::SubAssign
        | Operator::ConcatAssign
        | Operator::MulAssign
        | Operator::DivAssign
        | Operator::IdivAssign
        | Operator::ModAssign
        | Operator::AndAssign
        | Operator::OrAssign
        | Operator::XorAssign
        | Operator::ShiftlAssign
        | Operator::ShiftrAssign => Some((2, Assoc::Right)),
        Operator::LogicalOr => Some((3, Assoc::Left)),
        Operator::LogicalAnd => Some((4, Assoc::Left)),
        Operator::BitwiseOr => Some((5, Assoc::Left)),
        Operator::BitwiseXor => Some((6, Assoc::Left)),
        Operator::BitwiseAnd => Some((7, Assoc::Left)),
        Operator::Eq | Operator::Ne => Some((8, Assoc::Left)),
        Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge => Some((9, Assoc::Left)),
        Operator::Shiftl | Operator::Shiftr => Some((10, Assoc::Left)),
        Operator::Add | Operator::Sub | Operator::Concat => Some((11, Assoc::Left)),
        Operator::Mul | Operator::Div | Operator::Idiv | Operator::Mod => Some((12, Assoc::Left)),
        _ => None,
    };
}

/// `?:` sits at the same precedence as assignment, right-associative.
const TERNARY_BP: u8 = 2;

pub fn parse_expression(cursor: &mut Cursor, ctx: &mut CompilerContext, allow_comma: bool) -> Result<Node, ParsingError> {
    let min_bp = if allow_comma { 0 } else { 2 };
    return parse_bp(cursor, ctx, min_bp);
}

fn parse_bp(cursor: &mut Cursor, ctx: &mut CompilerContext, min_bp: u8) -> Result<Node, ParsingError> {
    let mut lhs = parse_unary(cursor, ctx)?;

    loop {
        if cursor.check(&TokenValue::Operator(Operator::Question)) && TERNARY_BP >= min_bp {
            lhs = parse_ternary(cursor, ctx, lhs)?;
            continue;
        }

        let op = match cursor.peek().value {
            TokenValue::Operator(op) => op,
            _ => break,
        };
        let Some((bp, assoc)) = binary_binding_power(op) else { break };
        if bp < min_bp {
            break;
        }

        let op_span = cursor.span();
        cursor.advance();
        let next_min_bp = if assoc == Assoc::Left { bp + 1 } else { bp };
        let rhs = parse_bp(cursor, ctx, next_min_bp)?;
        lhs = build_binary(op, lhs, rhs, op_span, ctx)?;
    }

    return Ok(lhs);
}

fn parse_ternary(cursor: &mut Cursor, ctx: &mut CompilerContext, cond: Node) -> Result<Node, ParsingError> {
    let span = cursor.span();
    cursor.advance();
    let if_true = parse_expression(cursor, ctx, false)?;
    cursor.expect_value(&TokenValue::Operator(Operator::Colon))?;
    let if_false = parse_bp(cursor, ctx, TERNARY_BP)?;
    return build_ternary(cond, if_true, if_false, span, ctx);
}

fn parse_unary(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
    let span = cursor.span();
    if let TokenValue::Operator(op) = cursor.peek().value {
        let unary = match op {
            Operator::Add => Some(None),
            Operator::Sub => Some(Some(Operation::Negate)),
            Operator::BitwiseNot => Some(Some(Operation::BitwiseNot)),
            Operator::LogicalNot => Some(Some(Operation::LogicalNot)),
            Operator::Inc => Some(Some(Operation::PreInc)),
            Operator::Dec => Some(Some(Operation::PreDec)),
            _ => None,
        };
        if let Some(operation) = unary {
            cursor.advance();
            let operand = parse_unary(cursor, ctx)?;
            return match operation {
                None => {
                    require_number(&operand, ctx, span)?;
                    Ok(operand)
                }
                Some(op) => build_unary(op, operand, span, ctx),
            };
        }
    }

    if let TokenValue::Keyword(kw) = cursor.peek().value {
        match kw {
            sl_data::Keyword::Sizeof => {
                cursor.advance();
                let operand = parse_unary(cursor, ctx)?;
                let number = ctx.types.number();
                return Ok(Node::new(NodeValue::Operation(Operation::Sizeof), vec![operand], number, false, span));
            }
            sl_data::Keyword::ToString => {
                cursor.advance();
                let operand = parse_unary(cursor, ctx)?;
                let string = ctx.types.string();
                return Ok(Node::new(NodeValue::Operation(Operation::ToString), vec![operand], string, false, span));
            }
            _ => {}
        }
    }

    return parse_postfix(cursor, ctx);
}

fn parse_postfix(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
    let mut node = parse_primary(cursor, ctx)?;
    loop {
        let span = cursor.span();
        match cursor.peek().value {
            TokenValue::Operator(Operator::Inc) => {
                cursor.advance();
                node = build_unary(Operation::PostInc, node, span, ctx)?;
            }
            TokenValue::Operator(Operator::Dec) => {
                cursor.advance();
                node = build_unary(Operation::PostDec, node, span, ctx)?;
            }
            TokenValue::Operator(Operator::OpenSquare) => {
                cursor.advance();
                let index = parse_expression(cursor, ctx, false)?;
                cursor.expect_value(&TokenValue::Operator(Operator::CloseSquare))?;
                node = build_index(node, index, span, ctx)?;
            }
            TokenValue::Operator(Operator::OpenRound) => {
                cursor.advance();
                let args = parse_call_args(cursor, ctx)?;
                cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
                node = build_call(node, args, span, ctx)?;
            }
            _ => break,
        }
    }
    return Ok(node);
}

/// An argument's explicit by-reference request (a leading `&`) plus the
/// expression itself. The `&` is what the caller writes to ask for
/// reference passing (spec §4.5); `build_call` checks it against the
/// callee's declared per-parameter by-ref-ness.
struct CallArgNode {
    by_ref: bool,
    span: Span,
    node: Node,
}

fn parse_call_args(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Vec<CallArgNode>, ParsingError> {
    let mut args = Vec::new();
    if cursor.check(&TokenValue::Operator(Operator::CloseRound)) {
        return Ok(args);
    }
    loop {
        let span = cursor.span();
        let by_ref = cursor.check(&TokenValue::Operator(Operator::BitwiseAnd));
        if by_ref {
            cursor.advance();
        }
        let node = parse_expression(cursor, ctx, false)?;
        if by_ref && !node.lvalue {
            return Err(ParsingError::semantic("A by-reference argument must be an lvalue", span));
        }
        args.push(CallArgNode { by_ref, span, node });
        if cursor.check(&TokenValue::Operator(Operator::Comma)) {
            cursor.advance();
            continue;
        }
        break;
    }
    return Ok(args);
}

fn parse_primary(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
    let span = cursor.span();
    let token = cursor.peek().value.clone();
    return match token {
        TokenValue::Number(n) => {
            cursor.advance();
            Ok(Node::new(NodeValue::NumberLiteral(n), vec![], ctx.types.number(), false, span))
        }
        TokenValue::Str(s) => {
            cursor.advance();
            Ok(Node::new(NodeValue::StringLiteral(s), vec![], ctx.types.string(), false, span))
        }
        TokenValue::Identifier(name) => {
            cursor.advance();
            let info = ctx.find(&name).cloned().ok_or_else(|| ParsingError::semantic(format!("'{}' was not declared", name), span))?;
            Ok(identifier_node(info, span))
        }
        TokenValue::Operator(Operator::OpenRound) => {
            cursor.advance();
            let inner = parse_expression(cursor, ctx, true)?;
            cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
            Ok(inner)
        }
        TokenValue::Operator(Operator::OpenCurly) => parse_init_list(cursor, ctx),
        other => Err(ParsingError::unexpected(other, span)),
    };
}

fn parse_init_list(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
    let span = cursor.span();
    cursor.advance();
    let mut elements = Vec::new();
    if !cursor.check(&TokenValue::Operator(Operator::CloseCurly)) {
        loop {
            elements.push(parse_expression(cursor, ctx, false)?);
            if cursor.check(&TokenValue::Operator(Operator::Comma)) {
                cursor.advance();
                continue;
            }
            break;
        }
    }
    cursor.expect_value(&TokenValue::Operator(Operator::CloseCurly))?;
    let element_types = elements.iter().map(|e| e.type_handle).collect();
    let type_handle = ctx.types.init_list(element_types);
    return Ok(Node::new(NodeValue::Operation(Operation::InitList), elements, type_handle, false, span));
}

fn identifier_node(info: IdentifierInfo, span: Span) -> Node {
    let lvalue = !matches!(info.scope, ScopeKind::Function);
    return Node::new(NodeValue::Identifier(info.clone()), vec![], info.type_handle, lvalue, span);
}

fn require_number(node: &Node, ctx: &CompilerContext, span: Span) -> Result<(), ParsingError> {
    if ctx.types.get(node.type_handle) == &Type::Number {
        return Ok(());
    }
    return Err(ParsingError::semantic("Expected a number operand", span));
}

fn build_unary(op: Operation, operand: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    match op {
        Operation::Negate | Operation::BitwiseNot | Operation::LogicalNot => {
            require_number(&operand, ctx, span)?;
            let type_handle = operand.type_handle;
            return Ok(Node::new(NodeValue::Operation(op), vec![operand], type_handle, false, span));
        }
        Operation::PreInc | Operation::PreDec => {
            if !operand.lvalue {
                return Err(ParsingError::semantic("Increment/decrement requires an lvalue", span));
            }
            require_number(&operand, ctx, span)?;
            let type_handle = operand.type_handle;
            return Ok(Node::new(NodeValue::Operation(op), vec![operand], type_handle, true, span));
        }
        Operation::PostInc | Operation::PostDec => {
            if !operand.lvalue {
                return Err(ParsingError::semantic("Increment/decrement requires an lvalue", span));
            }
            require_number(&operand, ctx, span)?;
            let type_handle = operand.type_handle;
            return Ok(Node::new(NodeValue::Operation(op), vec![operand], type_handle, false, span));
        }
        _ => unreachable!(),
    }
}

fn build_binary(op: Operator, lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    return match op {
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Idiv | Operator::Mod | Operator::BitwiseAnd | Operator::BitwiseOr | Operator::BitwiseXor | Operator::Shiftl | Operator::Shiftr => {
            build_arithmetic(arith_operation(op), lhs, rhs, span, ctx)
        }
        Operator::Concat => build_concat(lhs, rhs, span, ctx),
        Operator::Eq | Operator::Ne | Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge => build_comparison(compare_operation(op), lhs, rhs, span, ctx),
        Operator::LogicalAnd => build_logical(Operation::LogicalAnd, lhs, rhs, span, ctx),
        Operator::LogicalOr => build_logical(Operation::LogicalOr, lhs, rhs, span, ctx),
        Operator::Assign => build_assign(lhs, rhs, span, ctx),
        Operator::AddAssign
        | Operator::SubAssign
        | Operator::MulAssign
        | Operator::DivAssign
        | Operator::IdivAssign
        | Operator::ModAssign
        | Operator::AndAssign
        | Operator::OrAssign
        | Operator::XorAssign
        | Operator::ShiftlAssign
        | Operator::ShiftrAssign => build_compound_assign(compound_assign_operation(op), lhs, rhs, span, ctx),
        Operator::ConcatAssign => build_concat_assign(lhs, rhs, span, ctx),
        Operator::Comma => {
            let type_handle = rhs.type_handle;
            let lvalue = rhs.lvalue;
            Ok(Node::new(NodeValue::Operation(Operation::Comma), vec![lhs, rhs], type_handle, lvalue, span))
        }
        _ => Err(ParsingError::compiler(format!("Unhandled binary operator '{:?}'", op), span)),
    };
}

fn arith_operation(op: Operator) -> Operation {
    return match op {
        Operator::Add => Operation::Add,
        Operator::Sub => Operation::Sub,
        Operator::Mul => Operation::Mul,
        Operator::Div => Operation::Div,
        Operator::Idiv => Operation::Idiv,
        Operator::Mod => Operation::Mod,
        Operator::BitwiseAnd => Operation::BitwiseAnd,
        Operator::BitwiseOr => Operation::BitwiseOr,
        Operator::BitwiseXor => Operation::BitwiseXor,
        Operator::Shiftl => Operation::Shiftl,
        Operator::Shiftr => Operation::Shiftr,
        _ => unreachable!(),
    };
}

fn compare_operation(op: Operator) -> Operation {
    return match op {
        Operator::Eq => Operation::Eq,
        Operator::Ne => Operation::Ne,
        Operator::Lt => Operation::Lt,
        Operator::Gt => Operation::Gt,
        Operator::Le => Operation::Le,
        Operator::Ge => Operation::Ge,
        _ => unreachable!(),
    };
}

fn compound_assign_operation(op: Operator) -> Operation {
    return match op {
        Operator::AddAssign => Operation::AddAssign,
        Operator::SubAssign => Operation::SubAssign,
        Operator::MulAssign => Operation::MulAssign,
        Operator::DivAssign => Operation::DivAssign,
        Operator::IdivAssign => Operation::IdivAssign,
        Operator::ModAssign => Operation::ModAssign,
        Operator::AndAssign => Operation::AndAssign,
        Operator::OrAssign => Operation::OrAssign,
        Operator::XorAssign => Operation::XorAssign,
        Operator::ShiftlAssign => Operation::ShiftlAssign,
        Operator::ShiftrAssign => Operation::ShiftrAssign,
        _ => unreachable!(),
    };
}

/// Coerces `node` into `target`. A Number source converting to String is
/// wrapped in an explicit `ToString` node; an init-list source converting to
/// a matching array/tuple shape just gets re-stamped with `target` as its
/// static type, since its `Operation::InitList` children are exactly the
/// array/tuple's elements either way and the typed expression builder reads
/// off the final type handle to decide which runtime shape to build.
/// Anything else requires the types to already match exactly.
pub(crate) fn coerce(node: Node, target: TypeHandle, ctx: &CompilerContext, span: Span) -> Result<Node, ParsingError> {
    if node.type_handle == target {
        return Ok(node);
    }
    if !ctx.types.convertible(node.type_handle, target) {
        return Err(ParsingError::semantic(format!("Cannot convert '{}' to '{}'", ctx.types.display(node.type_handle), ctx.types.display(target)), span));
    }
    if matches!(ctx.types.get(node.type_handle), Type::InitList(_)) {
        return Ok(Node { type_handle: target, ..node });
    }
    return Ok(Node::new(NodeValue::Operation(Operation::ToString), vec![node], target, false, span));
}

fn build_arithmetic(op: Operation, lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    require_number(&lhs, ctx, span)?;
    require_number(&rhs, ctx, span)?;
    if lhs.type_handle != rhs.type_handle {
        return Err(ParsingError::semantic("Arithmetic requires matching number operands", span));
    }
    let type_handle = lhs.type_handle;
    return Ok(Node::new(NodeValue::Operation(op), vec![lhs, rhs], type_handle, false, span));
}

/// `..` accepts any pair of operands convertible to string, inserting a
/// `ToString` coercion on a Number side exactly as `buildStringExpression`
/// does in the original.
fn build_concat(lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    let string = ctx.types.string();
    let lhs = coerce(lhs, string, ctx, span)?;
    let rhs = coerce(rhs, string, ctx, span)?;
    return Ok(Node::new(NodeValue::Operation(Operation::Concat), vec![lhs, rhs], string, false, span));
}

/// Numbers compare as numbers; anything else must convert to `string` on
/// both sides, mirroring `lt(String, String)` in the original (the
/// remaining five comparisons are all built on `lt`). Either way the
/// result is a `number`.
fn build_comparison(op: Operation, lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    let number = ctx.types.number();
    let (lhs, rhs) = if ctx.types.get(lhs.type_handle) == &Type::Number && ctx.types.get(rhs.type_handle) == &Type::Number {
        (lhs, rhs)
    } else {
        let string = ctx.types.string();
        (coerce(lhs, string, ctx, span)?, coerce(rhs, string, ctx, span)?)
    };
    return Ok(Node::new(NodeValue::Operation(op), vec![lhs, rhs], number, false, span));
}

fn build_logical(op: Operation, lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    require_number(&lhs, ctx, span)?;
    require_number(&rhs, ctx, span)?;
    let number = ctx.types.number();
    return Ok(Node::new(NodeValue::Operation(op), vec![lhs, rhs], number, false, span));
}

fn build_assign(lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    if !lhs.lvalue {
        return Err(ParsingError::semantic("Left side of '=' must be an lvalue", span));
    }
    let type_handle = lhs.type_handle;
    let rhs = coerce(rhs, type_handle, ctx, span)?;
    return Ok(Node::new(NodeValue::Operation(Operation::Assign), vec![lhs, rhs], type_handle, true, span));
}

fn build_compound_assign(op: Operation, lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    if !lhs.lvalue {
        return Err(ParsingError::semantic("Left side of a compound assignment must be an lvalue", span));
    }
    require_number(&lhs, ctx, span)?;
    require_number(&rhs, ctx, span)?;
    let type_handle = lhs.type_handle;
    return Ok(Node::new(NodeValue::Operation(op), vec![lhs, rhs], type_handle, true, span));
}

fn build_concat_assign(lhs: Node, rhs: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    if !lhs.lvalue {
        return Err(ParsingError::semantic("Left side of '..=' must be an lvalue", span));
    }
    if ctx.types.get(lhs.type_handle) != &Type::String {
        return Err(ParsingError::semantic("'..=' requires a string lvalue", span));
    }
    let string = ctx.types.string();
    let rhs = coerce(rhs, string, ctx, span)?;
    let type_handle = lhs.type_handle;
    return Ok(Node::new(NodeValue::Operation(Operation::ConcatAssign), vec![lhs, rhs], type_handle, true, span));
}

fn build_ternary(cond: Node, if_true: Node, if_false: Node, span: Span, ctx: &CompilerContext) -> Result<Node, ParsingError> {
    require_number(&cond, ctx, span)?;
    if if_true.type_handle == if_false.type_handle {
        let lvalue = if_true.lvalue && if_false.lvalue;
        let type_handle = if_true.type_handle;
        return Ok(Node::new(NodeValue::Operation(Operation::Ternary), vec![cond, if_true, if_false], type_handle, lvalue, span));
    }
    let target = if_true.type_handle;
    if let Ok(if_false) = coerce(if_false.clone(), target, ctx, span) {
        return Ok(Node::new(NodeValue::Operation(Operation::Ternary), vec![cond, if_true, if_false], target, false, span));
    }
    let target = if_false.type_handle;
    if let Ok(if_true) = coerce(if_true, target, ctx, span) {
        return Ok(Node::new(NodeValue::Operation(Operation::Ternary), vec![cond, if_true, if_false], target, false, span));
    }
    return Err(ParsingError::semantic("Both branches of '?:' must convert to a common type", span));
}

fn build_index(array: Node, index: Node, span: Span, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
    let lvalue = array.lvalue;
    match ctx.types.get(array.type_handle).clone() {
        Type::Array(element) => {
            if ctx.types.get(index.type_handle) != &Type::Number {
                return Err(ParsingError::semantic("Array index must be a number", span));
            }
            return Ok(Node::new(NodeValue::Operation(Operation::Index), vec![array, index], element, lvalue, span));
        }
        Type::Tuple(elements) => {
            let NodeValue::NumberLiteral(n) = &index.value else {
                return Err(ParsingError::semantic("Tuple index must be a literal integer", span));
            };
            let n = *n;
            let i = n as usize;
            if n < 0.0 || n.fract() != 0.0 || i >= elements.len() {
                return Err(ParsingError::semantic("Tuple index out of range", span));
            }
            let element = elements[i];
            return Ok(Node::new(NodeValue::Operation(Operation::Index), vec![array, index], element, lvalue, span));
        }
        _ => return Err(ParsingError::semantic("Indexing requires an array or tuple", span)),
    }
}

fn build_call(callee: Node, args: Vec<CallArgNode>, span: Span, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
    let (return_type, params) = match ctx.types.get(callee.type_handle).clone() {
        Type::Function { ret, params } => (ret, params),
        _ => return Err(ParsingError::semantic("Call target is not a function", span)),
    };
    if params.len() != args.len() {
        return Err(ParsingError::semantic(format!("Expected {} argument(s), found {}", params.len(), args.len()), span));
    }
    let mut children = vec![callee];
    for (arg, (param_type, declared_by_ref)) in args.into_iter().zip(params.into_iter()) {
        let CallArgNode { by_ref, span: arg_span, node } = arg;
        if declared_by_ref {
            if !by_ref {
                return Err(ParsingError::semantic("This parameter is by-reference; pass the argument with '&'", arg_span));
            }
            if node.type_handle != param_type {
                return Err(ParsingError::semantic("A by-reference argument must have the exact parameter type", arg_span));
            }
            children.push(node);
        } else {
            if by_ref {
                return Err(ParsingError::semantic("This parameter is by-value; it cannot be passed with '&'", arg_span));
            }
            let node = coerce(node, param_type, ctx, arg_span)?;
            children.push(Node::new(NodeValue::Operation(Operation::Param), vec![node], param_type, true, arg_span));
        }
    }
    return Ok(Node::new(NodeValue::Operation(Operation::Call), children, return_type, false, span));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokenize;
    use sl_data::ParsingErrorKind;

    fn parse_expr(source: &str, ctx: &mut CompilerContext) -> Result<Node, ParsingError> {
        let tokens = tokenize(source).unwrap();
        let mut cursor = Cursor::new(&tokens);
        return parse_expression(&mut cursor, ctx, true);
    }

    fn declare_by_ref_sink(ctx: &mut CompilerContext) {
        let number = ctx.types.number();
        let void = ctx.types.void();
        let function_type = ctx.types.function(void, vec![(number, true)]);
        ctx.create_function("bump", function_type);
        ctx.create_identifier("x", number);
    }

    #[test]
    fn by_reference_argument_without_ampersand_is_a_semantic_error() {
        let mut ctx = CompilerContext::new();
        declare_by_ref_sink(&mut ctx);
        let err = parse_expr("bump(x)", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::Semantic);
    }

    #[test]
    fn by_reference_argument_with_ampersand_passes_the_bare_lvalue_unwrapped() {
        let mut ctx = CompilerContext::new();
        declare_by_ref_sink(&mut ctx);
        let node = parse_expr("bump(&x)", &mut ctx).unwrap();
        assert!(matches!(node.children[1].value, NodeValue::Identifier(_)));
    }

    #[test]
    fn ampersand_on_a_by_value_parameter_is_a_semantic_error() {
        let mut ctx = CompilerContext::new();
        let number = ctx.types.number();
        let void = ctx.types.void();
        let function_type = ctx.types.function(void, vec![(number, false)]);
        ctx.create_function("show", function_type);
        ctx.create_identifier("x", number);
        let err = parse_expr("show(&x)", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::Semantic);
    }

    #[test]
    fn by_value_argument_is_wrapped_in_param() {
        let mut ctx = CompilerContext::new();
        let number = ctx.types.number();
        let void = ctx.types.void();
        let function_type = ctx.types.function(void, vec![(number, false)]);
        ctx.create_function("show", function_type);
        ctx.create_identifier("x", number);
        let node = parse_expr("show(x)", &mut ctx).unwrap();
        assert!(matches!(node.children[1].value, NodeValue::Operation(Operation::Param)));
    }

    #[test]
    fn comparing_two_strings_is_accepted_and_yields_a_number() {
        let mut ctx = CompilerContext::new();
        let node = parse_expr("\"a\" == \"b\"", &mut ctx).unwrap();
        assert_eq!(ctx.types.get(node.type_handle), &Type::Number);
        assert!(matches!(node.value, NodeValue::Operation(Operation::Eq)));
        assert_eq!(node.children[0].type_handle, ctx.types.string());
        assert_eq!(node.children[1].type_handle, ctx.types.string());
    }

    #[test]
    fn comparing_a_number_against_a_string_coerces_the_number_to_a_string() {
        let mut ctx = CompilerContext::new();
        let node = parse_expr("1 < \"2\"", &mut ctx).unwrap();
        assert!(matches!(node.children[0].value, NodeValue::Operation(Operation::ToString)));
        assert_eq!(node.children[0].type_handle, ctx.types.string());
    }
}
