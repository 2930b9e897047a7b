//! The statement compiler (spec §4.7): parses statements into
//! `sl_runtime::Statement` trees. Grounded on
//! `original_source/Source/Library/Compiler.cpp`'s `compileStatement`
//! family and its `PossibleFlow` struct.

use sl_data::{Keyword, Operator, ParsingError, TokenValue};
use sl_runtime::{Evaluator, ForInit, Statement};
use sl_types::Type;

use crate::builder::{build, build_default};
use crate::context::CompilerContext;
use crate::cursor::Cursor;
use crate::parser::{coerce, parse_expression};
use crate::types_syntax::parse_type;

/// Mirrors the original's `PossibleFlow`: how many enclosing `break`
/// levels are available, whether `continue` is legal here, and the
/// return type `return` must coerce its expression to.
#[derive(Clone, Copy)]
pub struct FlowContext {
    break_level: u32,
    can_continue: bool,
    return_type: sl_types::TypeHandle,
}

impl FlowContext {
    pub fn in_function(return_type: sl_types::TypeHandle) -> Self {
        return Self { break_level: 0, can_continue: false, return_type };
    }

    fn add_loop(self) -> Self {
        return Self { break_level: self.break_level + 1, can_continue: true, ..self };
    }

    fn add_switch(self) -> Self {
        return Self { break_level: self.break_level + 1, ..self };
    }
}

fn looks_like_type(cursor: &Cursor) -> bool {
    return matches!(
        cursor.peek().value,
        TokenValue::Keyword(Keyword::Void) | TokenValue::Keyword(Keyword::Number) | TokenValue::Keyword(Keyword::String) | TokenValue::Operator(Operator::OpenSquare)
    );
}

fn require_number_type(node: &sl_ast::Node, ctx: &CompilerContext, span: sl_data::Span) -> Result<(), ParsingError> {
    if ctx.types.get(node.type_handle) == &Type::Number {
        return Ok(());
    }
    return Err(ParsingError::semantic("Expected a number condition", span));
}

fn parse_declaration_name(cursor: &mut Cursor, ctx: &CompilerContext) -> Result<String, ParsingError> {
    let span = cursor.span();
    let TokenValue::Identifier(name) = cursor.peek().value.clone() else {
        return Err(ParsingError::syntax(format!("Expected an identifier, found '{}'", cursor.peek().value), span));
    };
    if !ctx.can_declare(&name) {
        return Err(ParsingError::semantic(format!("'{}' is already declared", name), span));
    }
    cursor.advance();
    return Ok(name);
}

/// Compiles `type name1 [= expr1 | (expr1)], name2, ...` (no trailing
/// `;` - callers each consume the terminator their own grammar calls
/// for). Each name is registered via `ctx.create_identifier` only after
/// its own initializer is built, so `number x = x;` fails to resolve the
/// right-hand `x` (spec §4.8).
pub fn compile_variable_declaration(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Vec<Evaluator>, ParsingError> {
    let type_span = cursor.span();
    let type_handle = parse_type(cursor, ctx)?;
    if ctx.types.get(type_handle).is_void() {
        return Err(ParsingError::syntax("Cannot declare a void variable", type_span));
    }

    let mut initializers = Vec::new();
    loop {
        let name = parse_declaration_name(cursor, ctx)?;
        let span = cursor.span();

        let evaluator = if cursor.check(&TokenValue::Operator(Operator::OpenRound)) {
            cursor.advance();
            let node = parse_expression(cursor, ctx, false)?;
            cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
            let node = coerce(node, type_handle, ctx, span)?;
            Evaluator::CloneValue(Box::new(build(&node, ctx)))
        } else if cursor.check(&TokenValue::Operator(Operator::Assign)) {
            cursor.advance();
            let node = parse_expression(cursor, ctx, false)?;
            let node = coerce(node, type_handle, ctx, span)?;
            Evaluator::CloneValue(Box::new(build(&node, ctx)))
        } else {
            build_default(type_handle, ctx)
        };

        initializers.push(evaluator);
        ctx.create_identifier(name, type_handle);

        if cursor.check(&TokenValue::Operator(Operator::Comma)) {
            cursor.advance();
            continue;
        }
        break;
    }
    return Ok(initializers);
}

/// Dispatches on the leading token, mirroring `compileStatement`.
/// `in_switch` forbids a bare declaration statement directly in a
/// `switch` body (spec: "Declarations are not allowed directly in a
/// switch body").
pub fn compile_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext, in_switch: bool) -> Result<Statement, ParsingError> {
    if let TokenValue::Keyword(kw) = cursor.peek().value {
        match kw {
            Keyword::For => return compile_for_statement(cursor, ctx, flow.add_loop()),
            Keyword::While => return compile_while_statement(cursor, ctx, flow.add_loop()),
            Keyword::Do => return compile_do_statement(cursor, ctx, flow.add_loop()),
            Keyword::If => return compile_if_statement(cursor, ctx, flow),
            Keyword::Switch => return compile_switch_statement(cursor, ctx, flow.add_switch()),
            Keyword::Break => return compile_break_statement(cursor, flow),
            Keyword::Continue => return compile_continue_statement(cursor, flow),
            Keyword::Return => return compile_return_statement(cursor, ctx, flow),
            _ => {}
        }
    }

    if looks_like_type(cursor) {
        if in_switch {
            let span = cursor.span();
            return Err(ParsingError::syntax("Declarations are not allowed directly in a switch body", span));
        }
        return compile_var_statement(cursor, ctx);
    }

    if cursor.check(&TokenValue::Operator(Operator::OpenCurly)) {
        return compile_block_statement(cursor, ctx, flow);
    }

    return compile_simple_statement(cursor, ctx);
}

fn compile_simple_statement(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Statement, ParsingError> {
    let node = parse_expression(cursor, ctx, true)?;
    let expr = build(&node, ctx);
    cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
    return Ok(Statement::Expr(expr));
}

fn compile_var_statement(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Statement, ParsingError> {
    let initializers = compile_variable_declaration(cursor, ctx)?;
    cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
    return Ok(Statement::LocalDecl(initializers));
}

fn compile_break_statement(cursor: &mut Cursor, flow: FlowContext) -> Result<Statement, ParsingError> {
    let span = cursor.span();
    if flow.break_level == 0 {
        return Err(ParsingError::syntax("'break' is not valid here", span));
    }
    cursor.expect_value(&TokenValue::Keyword(Keyword::Break))?;

    let level = if let TokenValue::Number(n) = cursor.peek().value {
        let span = cursor.span();
        if n < 1.0 || n.fract() != 0.0 || n > flow.break_level as f64 {
            return Err(ParsingError::syntax("Invalid break level", span));
        }
        cursor.advance();
        n as u32
    } else {
        1
    };

    cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
    return Ok(Statement::Break(level));
}

fn compile_continue_statement(cursor: &mut Cursor, flow: FlowContext) -> Result<Statement, ParsingError> {
    let span = cursor.span();
    if !flow.can_continue {
        return Err(ParsingError::syntax("'continue' is not valid here", span));
    }
    cursor.expect_value(&TokenValue::Keyword(Keyword::Continue))?;
    cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
    return Ok(Statement::Continue);
}

fn compile_return_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    cursor.expect_value(&TokenValue::Keyword(Keyword::Return))?;

    if ctx.types.get(flow.return_type).is_void() {
        cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
        return Ok(Statement::Return);
    }

    let span = cursor.span();
    let node = parse_expression(cursor, ctx, true)?;
    let node = coerce(node, flow.return_type, ctx, span)?;
    let expr = build(&node, ctx);
    cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
    return Ok(Statement::ReturnValue(expr));
}

pub fn compile_block_contents(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Vec<Statement>, ParsingError> {
    let mut statements = Vec::new();
    if cursor.check(&TokenValue::Operator(Operator::OpenCurly)) {
        cursor.advance();
        while !cursor.check(&TokenValue::Operator(Operator::CloseCurly)) {
            statements.push(compile_statement(cursor, ctx, flow, false)?);
        }
        cursor.advance();
    } else {
        statements.push(compile_statement(cursor, ctx, flow, false)?);
    }
    return Ok(statements);
}

fn compile_block_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    ctx.enter_scope();
    let result = compile_block_contents(cursor, ctx, flow);
    ctx.leave_scope();
    return Ok(Statement::Block(result?));
}

fn compile_for_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    ctx.enter_scope();
    let result = (|| -> Result<Statement, ParsingError> {
        cursor.expect_value(&TokenValue::Keyword(Keyword::For))?;
        cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;

        let init = if looks_like_type(cursor) {
            let initializers = compile_variable_declaration(cursor, ctx)?;
            Some(ForInit::Decl(Box::new(Statement::LocalDecl(initializers))))
        } else if cursor.check(&TokenValue::Operator(Operator::Semicolon)) {
            None
        } else {
            let node = parse_expression(cursor, ctx, true)?;
            Some(ForInit::Expr(build(&node, ctx)))
        };
        cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;

        let span = cursor.span();
        let condition_node = parse_expression(cursor, ctx, true)?;
        require_number_type(&condition_node, ctx, span)?;
        let condition = build(&condition_node, ctx);
        cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;

        let step = if cursor.check(&TokenValue::Operator(Operator::CloseRound)) {
            None
        } else {
            let node = parse_expression(cursor, ctx, true)?;
            Some(build(&node, ctx))
        };
        cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;

        let body = compile_block_statement(cursor, ctx, flow)?;
        Ok(Statement::For { init, condition, step, body: Box::new(body) })
    })();
    ctx.leave_scope();
    return result;
}

fn compile_while_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    cursor.expect_value(&TokenValue::Keyword(Keyword::While))?;
    cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;
    let span = cursor.span();
    let node = parse_expression(cursor, ctx, true)?;
    require_number_type(&node, ctx, span)?;
    let condition = build(&node, ctx);
    cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
    let body = compile_block_statement(cursor, ctx, flow)?;
    return Ok(Statement::While { condition, body: Box::new(body) });
}

fn compile_do_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    cursor.expect_value(&TokenValue::Keyword(Keyword::Do))?;
    let body = compile_block_statement(cursor, ctx, flow)?;
    cursor.expect_value(&TokenValue::Keyword(Keyword::While))?;
    cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;
    let span = cursor.span();
    let node = parse_expression(cursor, ctx, true)?;
    require_number_type(&node, ctx, span)?;
    let condition = build(&node, ctx);
    cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
    return Ok(Statement::DoWhile { condition, body: Box::new(body) });
}

/// An optional `decls;` ahead of `if`/`switch`'s own condition scopes over
/// the entire chain (spec: "declarations, if present, scope over the
/// entire chain"). Represented by wrapping the compiled chain statement in
/// a `Statement::Block` alongside a `LocalDecl` for those declarations,
/// rather than adding a dedicated field to `If`/`Switch` - the block's own
/// scope is exactly the lifetime the declarations need.
fn compile_leading_decls(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Option<Statement>, ParsingError> {
    if !looks_like_type(cursor) {
        return Ok(None);
    }
    let initializers = compile_variable_declaration(cursor, ctx)?;
    cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
    return Ok(Some(Statement::LocalDecl(initializers)));
}

fn wrap_with_decls(decls: Option<Statement>, body: Statement) -> Statement {
    return match decls {
        Some(decl) => Statement::Block(vec![decl, body]),
        None => body,
    };
}

fn compile_if_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    ctx.enter_scope();
    let result = (|| -> Result<Statement, ParsingError> {
        cursor.expect_value(&TokenValue::Keyword(Keyword::If))?;
        cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;
        let decls = compile_leading_decls(cursor, ctx)?;

        let mut branches = Vec::new();
        loop {
            let span = cursor.span();
            let cond_node = parse_expression(cursor, ctx, true)?;
            require_number_type(&cond_node, ctx, span)?;
            let condition = build(&cond_node, ctx);
            cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
            let body = compile_block_statement(cursor, ctx, flow)?;
            branches.push((condition, body));

            if cursor.check(&TokenValue::Keyword(Keyword::Elif)) {
                cursor.advance();
                cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;
                continue;
            }
            break;
        }

        let otherwise = if cursor.check(&TokenValue::Keyword(Keyword::Else)) {
            cursor.advance();
            Some(Box::new(compile_block_statement(cursor, ctx, flow)?))
        } else {
            None
        };

        Ok(wrap_with_decls(decls, Statement::If { branches, otherwise }))
    })();
    ctx.leave_scope();
    return result;
}

fn compile_switch_statement(cursor: &mut Cursor, ctx: &mut CompilerContext, flow: FlowContext) -> Result<Statement, ParsingError> {
    ctx.enter_scope();
    let result = (|| -> Result<Statement, ParsingError> {
        cursor.expect_value(&TokenValue::Keyword(Keyword::Switch))?;
        cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;
        let decls = compile_leading_decls(cursor, ctx)?;

        let span = cursor.span();
        let subject_node = parse_expression(cursor, ctx, true)?;
        require_number_type(&subject_node, ctx, span)?;
        let subject = build(&subject_node, ctx);
        cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;

        cursor.expect_value(&TokenValue::Operator(Operator::OpenCurly))?;
        let mut body = Vec::new();
        let mut labels = Vec::new();
        let mut default_index = None;

        while !cursor.check(&TokenValue::Operator(Operator::CloseCurly)) {
            if cursor.check(&TokenValue::Keyword(Keyword::Case)) {
                cursor.advance();
                let span = cursor.span();
                let TokenValue::Number(n) = cursor.peek().value else {
                    return Err(ParsingError::syntax(format!("Expected a number, found '{}'", cursor.peek().value), span));
                };
                cursor.advance();
                cursor.expect_value(&TokenValue::Operator(Operator::Colon))?;
                labels.push((Some(n as i64), body.len()));
                continue;
            }
            if cursor.check(&TokenValue::Keyword(Keyword::Default)) {
                cursor.advance();
                cursor.expect_value(&TokenValue::Operator(Operator::Colon))?;
                default_index = Some(body.len());
                continue;
            }
            body.push(compile_statement(cursor, ctx, flow, true)?);
        }
        cursor.advance();

        labels.push((None, default_index.unwrap_or(body.len())));

        Ok(wrap_with_decls(decls, Statement::Switch { subject, labels, body }))
    })();
    ctx.leave_scope();
    return result;
}

/// Compiles a function's body under `FlowContext::in_function(return_type)`,
/// then appends a synthesized trailing `return default()` when the return
/// type isn't void - the same "falling off the end returns a default
/// value" guarantee `compileFunctionBlock` gives the original.
pub fn compile_function_block(cursor: &mut Cursor, ctx: &mut CompilerContext, return_type: sl_types::TypeHandle) -> Result<Statement, ParsingError> {
    let flow = FlowContext::in_function(return_type);
    let mut statements = compile_block_contents(cursor, ctx, flow)?;
    if !ctx.types.get(return_type).is_void() {
        statements.push(Statement::ReturnValue(build_default(return_type, ctx)));
    }
    return Ok(Statement::Block(statements));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokenize;

    fn compile_body(source: &str, ctx: &mut CompilerContext, return_type: sl_types::TypeHandle) -> Result<Statement, ParsingError> {
        let tokens = tokenize(source).unwrap();
        let mut cursor = Cursor::new(&tokens);
        return compile_function_block(&mut cursor, ctx, return_type);
    }

    #[test]
    fn break_with_no_enclosing_loop_or_switch_is_a_syntax_error() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let err = compile_body("{ break; }", &mut ctx, void).unwrap_err();
        assert_eq!(err.kind, sl_data::ParsingErrorKind::Syntax);
    }

    #[test]
    fn break_two_unwinds_out_of_a_nested_loop() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let stmt = compile_body("{ while (1) { while (1) { break 2; } } }", &mut ctx, void).unwrap();
        assert!(matches!(stmt, Statement::Block(_)));
    }

    #[test]
    fn break_level_exceeding_enclosing_nesting_is_a_syntax_error() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let err = compile_body("{ while (1) { break 2; } }", &mut ctx, void).unwrap_err();
        assert_eq!(err.kind, sl_data::ParsingErrorKind::Syntax);
    }

    #[test]
    fn continue_outside_a_loop_is_a_syntax_error() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let err = compile_body("{ continue; }", &mut ctx, void).unwrap_err();
        assert_eq!(err.kind, sl_data::ParsingErrorKind::Syntax);
    }

    #[test]
    fn declaration_directly_in_switch_body_is_a_syntax_error() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let err = compile_body("{ switch (1) { number x = 1; } }", &mut ctx, void).unwrap_err();
        assert_eq!(err.kind, sl_data::ParsingErrorKind::Syntax);
    }

    #[test]
    fn declaring_a_name_twice_in_one_scope_is_a_semantic_error() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let err = compile_body("{ number x = 1; number x = 2; }", &mut ctx, void).unwrap_err();
        assert_eq!(err.kind, sl_data::ParsingErrorKind::Semantic);
    }

    #[test]
    fn initializer_cannot_reference_its_own_not_yet_declared_name() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let err = compile_body("{ number x = x; }", &mut ctx, void).unwrap_err();
        assert_eq!(err.kind, sl_data::ParsingErrorKind::Semantic);
    }

    #[test]
    fn non_void_function_gets_a_synthesized_trailing_default_return() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let number = ctx.types.number();
        let stmt = compile_body("{ }", &mut ctx, number).unwrap();
        let Statement::Block(statements) = stmt else { panic!("expected a block") };
        assert!(matches!(statements.last(), Some(Statement::ReturnValue(_))));
    }

    #[test]
    fn if_chain_declaration_is_visible_in_every_branch() {
        let mut ctx = CompilerContext::new();
        ctx.enter_function();
        let void = ctx.types.void();
        let stmt = compile_body("{ if (number x = 1; x > 0) { } elif (x > -1) { } else { } }", &mut ctx, void).unwrap();
        assert!(matches!(stmt, Statement::Block(_)));
    }
}
