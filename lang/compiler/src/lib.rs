//! The top-level two-pass program compiler (spec §4, §6), grounded on
//! `original_source/Source/Library/Compiler.cpp`'s `compile` function and
//! `IncompleteFunction.cpp`'s capture-then-compile split.
//!
//! A program is compiled in two passes over the same token stream:
//!
//! 1. Every top-level item is scanned once, in source order. A `function`
//!    or `public function` item has its declaration parsed and its name
//!    registered immediately (so later items can call it before its body
//!    is compiled), but its `{ ... }` body is only located - the matching
//!    close brace is found and the raw token range is stashed for later.
//!    Anything else is a global-variable declaration, compiled immediately
//!    as an initializer.
//! 2. Once every name is known, each stashed function body is compiled in
//!    the order its declaration was scanned.
//!
//! This mirrors the original's reason for existing: a global initializer
//! or a function body may call a function declared later in the file.

pub mod builder;
pub mod context;
pub mod cursor;
pub mod declaration;
pub mod parser;
pub mod statement;
pub mod tokenizer;
pub mod types_syntax;

use std::collections::HashMap;

use sl_data::{Keyword, Operator, ParsingError, Span, Token, TokenValue};
use sl_runtime::{Evaluator, Function, ScriptFunction};
use sl_types::TypeHandle;

use crate::context::CompilerContext;
use crate::cursor::Cursor;
use crate::declaration::{parse_function_declaration, FunctionDeclaration};
use crate::statement::{compile_function_block, compile_variable_declaration};
use crate::tokenizer::tokenize;

/// A host function registered before the source is compiled: its
/// declaration string is parsed the same way a `function` signature in
/// the source would be, so its name and type enter the compiler's
/// function table right alongside script functions. `sl-host` is the one
/// crate that builds these.
#[derive(Clone)]
pub struct ExternalFunction {
    pub declaration: String,
    pub function: Function,
}

/// The result of compiling a complete program: a function table ready to
/// hand to `sl_runtime::RuntimeContext::with_program`, the global
/// initializers to run in order, and a lookup from `public function` name
/// to its index in `functions`.
pub struct Program {
    pub functions: Vec<Function>,
    pub initializers: Vec<Evaluator>,
    pub public_functions: HashMap<String, usize>,
}

/// A `function`/`public function` item whose declaration has been parsed
/// and whose name is already registered, but whose body is still raw
/// tokens awaiting the second pass.
struct PendingFunction<'a> {
    decl: FunctionDeclaration,
    body: &'a [Token],
    is_public: bool,
}

/// Compiles `source` against a fixed set of externally-provided host
/// functions and public-function declarations (the two pieces of
/// information a host module supplies ahead of time, standing in for the
/// original's `externalFunctions`/`public_declarations` constructor
/// arguments).
pub fn compile(source: &str, externals: Vec<ExternalFunction>, public_declarations: &[String]) -> Result<Program, ParsingError> {
    let mut ctx = CompilerContext::new();

    let mut functions = Vec::with_capacity(externals.len());
    for external in externals {
        let decl_tokens = tokenize(&external.declaration)?;
        let mut decl_cursor = Cursor::new(&decl_tokens);
        let decl = parse_function_declaration(&mut decl_cursor, &mut ctx)?;
        ctx.create_function(decl.name, decl.type_handle);
        functions.push(external.function);
    }

    let mut expected_public: HashMap<String, TypeHandle> = HashMap::new();
    for declaration in public_declarations {
        let decl_tokens = tokenize(declaration)?;
        let mut decl_cursor = Cursor::new(&decl_tokens);
        let decl = parse_function_declaration(&mut decl_cursor, &mut ctx)?;
        expected_public.insert(decl.name, decl.type_handle);
    }

    let tokens = tokenize(source)?;
    let mut cursor = Cursor::new(&tokens);

    let mut pending: Vec<PendingFunction> = Vec::new();
    let mut initializers = Vec::new();
    let mut public_functions = HashMap::new();

    while !matches!(cursor.peek().value, TokenValue::Eof) {
        let is_public = cursor.check(&TokenValue::Keyword(Keyword::Public));
        if is_public {
            cursor.advance();
        }

        if cursor.check(&TokenValue::Keyword(Keyword::Function)) {
            let decl = parse_function_declaration(&mut cursor, &mut ctx)?;
            let body_span = cursor.span();
            let body_start = cursor.position();
            let body_end = find_matching_close_brace(&tokens, body_start, body_span)?;
            let body = &tokens[body_start..=body_end];
            cursor.seek(body_end + 1);

            if is_public {
                match expected_public.remove(&decl.name) {
                    Some(expected_type) if expected_type == decl.type_handle => {}
                    Some(_) => return Err(ParsingError::semantic(format!("Public function '{}' does not match its declaration", decl.name), body_span)),
                    None => return Err(ParsingError::semantic(format!("'{}' was not declared as a public function", decl.name), body_span)),
                }
            }

            ctx.create_function(decl.name.clone(), decl.type_handle);
            if is_public {
                public_functions.insert(decl.name.clone(), functions.len() + pending.len());
            }
            pending.push(PendingFunction { decl, body, is_public });
            continue;
        }

        if is_public {
            let span = cursor.span();
            return Err(ParsingError::syntax(format!("Expected 'function' after 'public', found '{}'", cursor.peek().value), span));
        }

        let decl_initializers = compile_variable_declaration(&mut cursor, &mut ctx)?;
        cursor.expect_value(&TokenValue::Operator(Operator::Semicolon))?;
        initializers.extend(decl_initializers);
    }

    if let Some((name, _)) = expected_public.into_iter().next() {
        return Err(ParsingError::semantic(format!("Public function '{}' is not defined", name), cursor.span()));
    }

    for item in pending {
        ctx.enter_function();
        for (name, type_handle, _by_ref) in &item.decl.params {
            ctx.create_param(name.clone(), *type_handle);
        }
        let mut body_cursor = Cursor::new(item.body);
        let body = compile_function_block(&mut body_cursor, &mut ctx, item.decl.return_type)?;
        ctx.leave_scope();

        let _ = item.is_public;
        functions.push(Function::Script(std::rc::Rc::new(ScriptFunction { body })));
    }

    return Ok(Program { functions, initializers, public_functions });
}

/// Scans forward from `start` (which must index a `{`) counting brace
/// nesting, returning the index of the matching `}`. Mirrors the raw
/// token capture loop in `incomplete_function`'s constructor, which walks
/// the stream one token at a time incrementing/decrementing a depth
/// counter until it returns to zero.
fn find_matching_close_brace(tokens: &[Token], start: usize, span: Span) -> Result<usize, ParsingError> {
    let mut depth = 0i32;
    let mut pos = start;
    loop {
        let token = tokens.get(pos).ok_or_else(|| ParsingError::syntax("Unexpected end of file inside function body", span))?;
        match token.value {
            TokenValue::Operator(Operator::OpenCurly) => depth += 1,
            TokenValue::Operator(Operator::CloseCurly) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
            TokenValue::Eof => return Err(ParsingError::syntax("Unexpected end of file inside function body", token.span)),
            _ => {}
        }
        pos += 1;
    }
}
